//! Per-emotion sample buffers
//!
//! Every configured sample is decoded once at startup, resampled to the
//! output rate and shared as `Arc<SoundBuffer>`. A file listed under more
//! than one emotion is decoded once and shared.

use crate::audio::decode::decode_file;
use crate::audio::resampler::resample_stereo;
use crate::audio::types::SoundBuffer;
use crate::error::Result;
use emosonic_common::config::InstallationConfig;
use emosonic_common::Emotion;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of a bank load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Sample entries that produced a buffer
    pub loaded: usize,
    /// Sample entries that failed to open or decode
    pub missing: usize,
}

/// Loaded buffers by emotion
#[derive(Debug, Clone)]
pub struct SampleBank {
    buffers: HashMap<Emotion, Vec<Arc<SoundBuffer>>>,
    sample_rate: u32,
}

impl SampleBank {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            buffers: HashMap::new(),
            sample_rate,
        }
    }

    pub fn insert(&mut self, emotion: Emotion, buffer: Arc<SoundBuffer>) {
        self.buffers.entry(emotion).or_default().push(buffer);
    }

    /// Buffers for `emotion`; None when nothing loaded for it
    pub fn buffers(&self, emotion: Emotion) -> Option<&[Arc<SoundBuffer>]> {
        self.buffers
            .get(&emotion)
            .filter(|b| !b.is_empty())
            .map(Vec::as_slice)
    }

    /// Emotions with at least one buffer
    pub fn emotions(&self) -> impl Iterator<Item = Emotion> + '_ {
        Emotion::ALL
            .into_iter()
            .filter(move |e| self.buffers(*e).is_some())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode every configured sample on the calling thread
    pub fn load_blocking(config: &InstallationConfig, output_rate: u32) -> (Self, LoadReport) {
        let mut bank = Self::new(output_rate);
        let mut report = LoadReport::default();
        let mut cache: HashMap<PathBuf, Option<Arc<SoundBuffer>>> = HashMap::new();

        for (emotion, sound) in &config.emotions {
            for sample in &sound.samples {
                let path = config.sample_path(sample);
                let entry = cache
                    .entry(path.clone())
                    .or_insert_with(|| match load_buffer(&path, output_rate) {
                        Ok(buffer) => Some(Arc::new(buffer)),
                        Err(e) => {
                            warn!("Sample for {} unavailable: {}", emotion, e);
                            None
                        }
                    });

                match entry {
                    Some(buffer) => {
                        bank.insert(*emotion, Arc::clone(buffer));
                        report.loaded += 1;
                    }
                    None => report.missing += 1,
                }
            }
        }

        info!(
            "Sample bank ready: {} loaded, {} missing ({} files decoded)",
            report.loaded,
            report.missing,
            cache.values().filter(|b| b.is_some()).count()
        );
        (bank, report)
    }

    /// Decode on the blocking pool; the frame loop polls the handle
    pub fn spawn_load(config: InstallationConfig, output_rate: u32) -> JoinHandle<(Self, LoadReport)> {
        tokio::task::spawn_blocking(move || Self::load_blocking(&config, output_rate))
    }
}

fn load_buffer(path: &Path, output_rate: u32) -> Result<SoundBuffer> {
    let decoded = decode_file(path)?;
    let samples = resample_stereo(&decoded.samples, decoded.sample_rate, output_rate)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Loaded sample {} ({} frames)", name, samples.len() / 2);
    Ok(SoundBuffer::new(name, samples, output_rate))
}
