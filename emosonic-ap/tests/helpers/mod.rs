//! Shared helpers for emosonic-ap integration tests
//!
//! - RecordingBackend: records play / set_gain / stop calls
//! - audio_generator: WAV fixtures written with hound
//! - sample bank and timing shortcuts

#![allow(dead_code)]

pub mod audio_generator;
pub mod recording_backend;

pub use audio_generator::generate_sine_wav;
pub use recording_backend::{BackendCall, RecordingBackend};

use emosonic_ap::audio::{SampleBank, SoundBuffer};
use emosonic_common::Emotion;
use std::sync::Arc;
use std::time::Duration;

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Bank with short silent buffers, named as given
pub fn bank_with(entries: &[(Emotion, &[&str])]) -> Arc<SampleBank> {
    let mut bank = SampleBank::new(44100);
    for (emotion, names) in entries {
        for name in names.iter() {
            bank.insert(*emotion, Arc::new(SoundBuffer::silent(*name, 441, 44100)));
        }
    }
    Arc::new(bank)
}

/// happy -> forest + flute, sad -> violin, neutral -> piano
pub fn default_bank() -> Arc<SampleBank> {
    bank_with(&[
        (Emotion::Happy, &["forest", "flute"]),
        (Emotion::Sad, &["violin"]),
        (Emotion::Neutral, &["piano"]),
    ])
}
