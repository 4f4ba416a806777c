//! # emosonic Audio Player Library (emosonic-ap)
//!
//! Turns per-frame facial-expression scores into a two-channel ambient
//! soundscape.
//!
//! **Purpose:** Smooth the classifier's emotion scores, rank a primary and a
//! secondary emotion, and crossfade per-emotion sample sets on two
//! independent channels (primary centred, secondary panned off-centre).
//!
//! **Architecture:** One cooperative frame loop drives
//! [`installation::Installation`], which owns the
//! [`estimator::EmotionEstimator`] and the
//! [`playback::CrossfadeController`]. The controller schedules voice starts
//! and releases on per-channel timer queues and talks to the real-time mixer
//! (symphonia + rubato + cpal) through a lock-free command ring.

pub mod audio;
pub mod detection;
pub mod error;
pub mod estimator;
pub mod installation;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use installation::Installation;
pub use state::SharedState;
