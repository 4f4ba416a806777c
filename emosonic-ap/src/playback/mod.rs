//! Crossfade playback
//!
//! Timer queue and gain envelopes, the per-channel state machine, the
//! dual-channel controller, and the mixer that renders voices on the audio
//! thread.

pub mod backend;
pub mod channel;
pub mod controller;
pub mod envelope;
pub mod mixer;
pub mod timer_queue;

pub use backend::{AudioBackend, NullBackend, VoiceId};
pub use channel::{AudioChannel, ChannelConfig, ChannelEvent};
pub use controller::CrossfadeController;
pub use envelope::GainEnvelope;
pub use mixer::{MixerHandle, VoiceMixer};
pub use timer_queue::TimerQueue;
