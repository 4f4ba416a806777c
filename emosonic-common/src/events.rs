//! Event and snapshot types for the emosonic event system
//!
//! The frame driver publishes one [`EmotionSnapshot`] per frame and a stream
//! of [`InstallationEvent`]s describing state changes. Renderers and the
//! event logger consume both.

use crate::emotion::{Emotion, RankedEmotion};
use serde::{Deserialize, Serialize};

/// Which audio slot a channel fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Follows the highest-ranked emotion
    Primary,
    /// Follows the second-ranked emotion, panned off-centre
    Secondary,
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRole::Primary => f.write_str("primary"),
            ChannelRole::Secondary => f.write_str("secondary"),
        }
    }
}

/// Crossfade state of one audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Nothing current, nothing fading
    Idle,
    /// Current label's voices are pending start or ramping up
    FadingIn,
    /// Current label's voices hold their target gain
    Sustained,
    /// No current label; older voices still decaying toward release
    FadingOut,
}

/// 2-D landmark position in source-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Per-frame data shared with the renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub primary: Option<RankedEmotion>,
    pub secondary: Option<RankedEmotion>,
    /// Face landmark positions of the last detection (68 points when present)
    pub landmarks: Vec<Point>,
    pub scale: f32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Set when this frame carried a fresh detection; cleared by the consumer
    pub has_new_data: bool,
    /// Primary label differs from the previous detection's primary label
    pub is_new_emotion: bool,
    /// Person considered present (detection within the timeout)
    pub detected: bool,
}

impl Default for EmotionSnapshot {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            landmarks: Vec::new(),
            scale: 1.0,
            timestamp: chrono::Utc::now(),
            has_new_data: false,
            is_new_emotion: false,
            detected: false,
        }
    }
}

impl EmotionSnapshot {
    /// Palette of the current primary emotion (neutral when unknown)
    pub fn palette(&self) -> (&'static str, &'static str) {
        self.primary
            .map(|p| p.emotion)
            .unwrap_or(Emotion::Neutral)
            .palette()
    }
}

/// emosonic event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallationEvent {
    /// Ranked primary or secondary label changed
    EmotionChanged {
        primary: RankedEmotion,
        secondary: RankedEmotion,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Text readout for a slot moved by more than the readout hysteresis
    ReadoutChanged {
        slot: ChannelRole,
        emotion: Emotion,
        percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Person detected / not detected
    DetectionStatusChanged {
        detected: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio channel changed crossfade state
    ChannelStateChanged {
        channel: ChannelRole,
        state: ChannelState,
        emotion: Option<Emotion>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Voices for an emotion started on a channel
    VoicesStarted {
        channel: ChannelRole,
        emotion: Emotion,
        voices: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pending start was superseded before its voices were created
    ActivationCancelled {
        channel: ChannelRole,
        emotion: Emotion,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An emotion's voices finished fading out and were released
    FadeOutCompleted {
        channel: ChannelRole,
        emotion: Emotion,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sample bank finished loading
    SamplesLoaded {
        loaded: usize,
        missing: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio output could not be initialized; installation runs silent
    AudioUnavailable {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}
