//! Core audio data types
//!
//! Buffers are f32, stereo interleaved: [L, R, L, R, ...], already at the
//! output device's sample rate once they reach the sample bank.

/// One decoded sample file, shared read-only between voices
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    /// File name, for logging
    pub name: String,

    /// PCM samples (interleaved stereo)
    pub samples: Vec<f32>,

    pub sample_rate: u32,
}

impl SoundBuffer {
    pub fn new(name: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            samples,
            sample_rate,
        }
    }

    /// Buffer of `frames` silent stereo frames
    pub fn silent(name: impl Into<String>, frames: usize, sample_rate: u32) -> Self {
        Self::new(name, vec![0.0; frames * 2], sample_rate)
    }

    /// Number of stereo frames
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }

    pub fn frame(&self, index: usize) -> Option<AudioFrame> {
        let i = index * 2;
        if i + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[i],
                right: self.samples[i + 1],
            })
        } else {
            None
        }
    }
}

/// A single stereo sample pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Accumulate `other` scaled by per-side gains
    pub fn add_scaled(&mut self, other: AudioFrame, left_gain: f32, right_gain: f32) {
        self.left += other.left * left_gain;
        self.right += other.right * right_gain;
    }
}
