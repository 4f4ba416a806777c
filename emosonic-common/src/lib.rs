//! # emosonic Common Library
//!
//! Shared code for the emosonic installation crates:
//! - Emotion labels, per-frame score sets and ranked results
//! - Configuration loading (TOML)
//! - Event and snapshot types published to renderers
//! - Fade curve definitions and gain interpolation

pub mod config;
pub mod emotion;
pub mod error;
pub mod events;
pub mod fade_curves;

pub use emotion::{Emotion, EmotionScores, RankedEmotion};
pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
