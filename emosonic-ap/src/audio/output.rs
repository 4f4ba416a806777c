//! Audio output using cpal
//!
//! Opens the output device and drives a frame-pulling callback on cpal's
//! real-time thread. The callback must not block; the mixer behind it only
//! drains a lock-free command ring.

use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Names of the available output devices
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output device (None = default).
    ///
    /// A named device that cannot be found falls back to the default device.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("Failed to enumerate devices: {}", e))
                })?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("Found requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!("Requested device '{}' not found, falling back to default device", name);
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };

        let device_label = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", device_label);

        let (config, sample_format) = Self::get_best_config(&device)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            error_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Device default rate, preferring a stereo f32 configuration
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let default = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        let rate = default.sample_rate();

        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.channels() == 2
                && config.min_sample_rate() <= rate
                && config.max_sample_rate() >= rate
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            return Ok((supported_config.with_sample_rate(rate).config(), sample_format));
        }

        let sample_format = default.sample_format();
        Ok((default.config(), sample_format))
    }

    /// Output sample rate; sample buffers are resampled to this
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start the stream, pulling one frame from `callback` per device frame
    pub fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut() -> AudioFrame + Send + 'static,
    {
        info!("Starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, F>(callback)?,
            SampleFormat::I16 => self.build_stream::<i16, F>(callback)?,
            SampleFormat::U16 => self.build_stream::<u16, F>(callback)?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!("Audio stream started successfully");
        Ok(())
    }

    fn build_stream<T, F>(&self, mut callback: F) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
        F: FnMut() -> AudioFrame + Send + 'static,
    {
        let channels = self.config.channels as usize;
        let error_flag = Arc::clone(&self.error_flag);

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let audio_frame = callback();
                        let left = audio_frame.left.clamp(-1.0, 1.0);
                        let right = audio_frame.right.clamp(-1.0, 1.0);

                        match frame.len() {
                            0 => {}
                            1 => frame[0] = T::from_sample(0.5 * (left + right)),
                            _ => {
                                frame[0] = T::from_sample(left);
                                frame[1] = T::from_sample(right);
                                for extra in &mut frame[2..] {
                                    *extra = T::EQUILIBRIUM;
                                }
                            }
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Whether the stream error callback has fired; polled by the frame loop
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }

    /// Stop and drop the stream
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!("Audio stream stopped");
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
