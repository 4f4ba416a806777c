//! Emotion labels and per-frame score sets
//!
//! The expression classifier reports one score per label for every frame.
//! Label order is fixed and matters: it is the tie-break order when two
//! smoothed values are equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven expression categories reported by the classifier
///
/// Declaration order is the canonical enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Emotion {
    /// Number of labels
    pub const COUNT: usize = 7;

    /// All labels in enumeration order
    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Surprised,
    ];

    /// Position in the enumeration order (0..7)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase label as used by the classifier and in config files
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Surprised => "surprised",
        }
    }

    /// Parse a label (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Emotion::ALL.iter().copied().find(|e| e.as_str() == lower)
    }

    /// Two-colour palette (primary, shade) used by the renderers
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            Emotion::Happy => ("#00E5B7", "#008B72"),
            Emotion::Angry => ("#FF4D4D", "#800000"),
            Emotion::Sad => ("#4D4DFF", "#000080"),
            Emotion::Neutral => ("#7fdbff", "#2a5566"),
            Emotion::Surprised => ("#FFD700", "#B8860B"),
            Emotion::Fearful => ("#800080", "#4B0082"),
            Emotion::Disgusted => ("#32CD32", "#006400"),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classifier score per label for a single frame
///
/// Field names match the classifier's JSON keys. Values are nominally in
/// [0, 1] but are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionScores {
    pub neutral: f32,
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
    pub fearful: f32,
    pub disgusted: f32,
    pub surprised: f32,
}

impl EmotionScores {
    /// Build a score set by evaluating `f` for every label
    pub fn from_fn(mut f: impl FnMut(Emotion) -> f32) -> Self {
        let mut scores = Self::default();
        for emotion in Emotion::ALL {
            scores.set(emotion, f(emotion));
        }
        scores
    }

    /// Score set with a single label at `value` and the rest at zero
    pub fn single(emotion: Emotion, value: f32) -> Self {
        let mut scores = Self::default();
        scores.set(emotion, value);
        scores
    }

    pub fn get(&self, emotion: Emotion) -> f32 {
        match emotion {
            Emotion::Neutral => self.neutral,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Fearful => self.fearful,
            Emotion::Disgusted => self.disgusted,
            Emotion::Surprised => self.surprised,
        }
    }

    pub fn set(&mut self, emotion: Emotion, value: f32) {
        let slot = match emotion {
            Emotion::Neutral => &mut self.neutral,
            Emotion::Happy => &mut self.happy,
            Emotion::Sad => &mut self.sad,
            Emotion::Angry => &mut self.angry,
            Emotion::Fearful => &mut self.fearful,
            Emotion::Disgusted => &mut self.disgusted,
            Emotion::Surprised => &mut self.surprised,
        };
        *slot = value;
    }

    /// Iterate `(label, score)` pairs in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}

/// A label with its smoothed confidence, as ranked by the estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedEmotion {
    pub emotion: Emotion,
    pub value: f32,
}

impl RankedEmotion {
    pub fn new(emotion: Emotion, value: f32) -> Self {
        Self { emotion, value }
    }

    /// Rounded percentage, as shown in the text readout
    pub fn percent(&self) -> u8 {
        (self.value * 100.0).round().clamp(0.0, 255.0) as u8
    }
}

impl fmt::Display for RankedEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.emotion, self.percent())
    }
}
