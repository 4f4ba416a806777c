//! Audio decoder using symphonia
//!
//! Decodes a whole sample file into memory as stereo f32.
//!
//! # Sample Format
//!
//! - Output: Stereo f32 samples (interleaved: [L, R, L, R, ...])
//! - Mono files: duplicated to stereo
//! - Multi-channel: even channels summed left, odd channels right

use crate::error::{Error, Result};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Decoded file at its native sample rate
#[derive(Debug)]
pub struct DecodedAudio {
    /// Interleaved stereo f32 samples
    pub samples: Vec<f32>,

    pub sample_rate: u32,
}

/// Decode an entire file to stereo f32
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path)
        .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create hint from file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("{}: unsupported format: {}", path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode(format!("{}: no audio track found", path.display())))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("{}: unsupported codec: {}", path.display(), e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<(SignalSpec, SampleBuffer<f32>)> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break; // EOF
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(Error::Decode(format!("{}: {}", path.display(), e)));
            }
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet; keep going
                warn!("{}: skipping undecodable packet: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("{}: {}", path.display(), e))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 {
            continue;
        }

        let needed = decoded.capacity() * channels;
        if !buffer_fits(sample_buf.as_ref(), spec, needed) {
            sample_buf = Some((spec, SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)));
        }
        if let Some((_, buf)) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            append_stereo(&mut samples, buf.samples(), channels);
        }
    }

    debug!(
        "Decoded {}: {} frames at {}Hz",
        path.display(),
        samples.len() / 2,
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Whether the interleave buffer can take a packet of `spec` needing `needed` samples
///
/// The buffer's layout is fixed at creation, so a spec change always means a new one.
fn buffer_fits(current: Option<&(SignalSpec, SampleBuffer<f32>)>, spec: SignalSpec, needed: usize) -> bool {
    current.is_some_and(|(buf_spec, buf)| *buf_spec == spec && buf.capacity() >= needed)
}

/// Append interleaved `channels`-channel samples as interleaved stereo
fn append_stereo(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    match channels {
        1 => {
            out.reserve(interleaved.len() * 2);
            for &sample in interleaved {
                out.push(sample);
                out.push(sample);
            }
        }
        2 => out.extend_from_slice(interleaved),
        _ => {
            let scale = 2.0 / channels as f32;
            for frame in interleaved.chunks_exact(channels) {
                let mut left = 0.0f32;
                let mut right = 0.0f32;
                for (ch, &sample) in frame.iter().enumerate() {
                    if ch % 2 == 0 {
                        left += sample;
                    } else {
                        right += sample;
                    }
                }
                out.push(left * scale);
                out.push(right * scale);
            }
        }
    }
}
