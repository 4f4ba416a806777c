//! Audio I/O
//!
//! Decoding (symphonia), resampling (rubato), the per-emotion sample bank
//! and the cpal output device.

pub mod decode;
pub mod output;
pub mod resampler;
pub mod sample_bank;
pub mod types;

pub use decode::decode_file;
pub use output::AudioOutput;
pub use resampler::resample_stereo;
pub use sample_bank::{LoadReport, SampleBank};
pub use types::{AudioFrame, SoundBuffer};
