//! Configuration loading and config file resolution
//!
//! A single TOML file configures the installation. Every field has a
//! built-in default, so an absent file yields a working setup.
//!
//! # Config file priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `<user config dir>/emosonic/config.toml`
//! 4. Built-in defaults (no file)

use crate::emotion::Emotion;
use crate::events::ChannelRole;
use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "EMOSONIC_CONFIG";

/// Longest accepted fade or crossfade time, in seconds
pub const MAX_FADE_SECS: f64 = 3600.0;

/// Seconds to a Duration, clamped to 0..=[`MAX_FADE_SECS`] (NaN gives zero)
fn fade_duration(secs: f64) -> Duration {
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.clamp(0.0, MAX_FADE_SECS))
}

/// Complete installation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationConfig {
    /// Frames per second of the detection / estimation loop
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    /// Sound mapping per emotion. A table in the file replaces the
    /// built-in table entirely.
    #[serde(default = "default_emotion_table")]
    pub emotions: BTreeMap<Emotion, EmotionSound>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Emotion smoothing and presence detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Moving-average window per label, in frames
    pub smoothing_window: usize,

    /// Person counts as absent this long after the last detection
    pub detection_timeout_ms: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
            detection_timeout_ms: 1000,
        }
    }
}

impl EstimatorConfig {
    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }
}

/// Audio output, envelope timing and channel gates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name (None = default device)
    pub device: Option<String>,

    /// Directory that relative sample paths are resolved against
    pub sample_root: PathBuf,

    /// Master volume applied by the mixer (0.0-1.0)
    pub master_volume: f32,

    /// Restart samples when they reach their end
    pub loop_samples: bool,

    pub fade_in_secs: f64,

    /// Crossfade window; new voices start after half of it
    pub crossfade_secs: f64,

    pub fade_out_secs: f64,

    /// Fade-out used for immediate stops (shutdown)
    pub forced_fade_out_secs: f64,

    /// Level an exponential fade-out decays toward before the hard stop
    pub fade_floor: f32,

    pub fade_in_curve: FadeCurve,

    pub fade_out_curve: FadeCurve,

    pub primary: ChannelSettings,

    pub secondary: ChannelSettings,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_root: PathBuf::from("sound"),
            master_volume: 1.0,
            loop_samples: false,
            fade_in_secs: 1.2,
            crossfade_secs: 1.5,
            fade_out_secs: 2.0,
            forced_fade_out_secs: 0.1,
            fade_floor: 0.001,
            fade_in_curve: FadeCurve::Linear,
            fade_out_curve: FadeCurve::Exponential,
            primary: ChannelSettings {
                min_confidence: 0.8,
                max_confidence: None,
                pan: 0.0,
            },
            secondary: ChannelSettings {
                min_confidence: 0.05,
                max_confidence: Some(0.8),
                pan: 0.5,
            },
        }
    }
}

impl AudioConfig {
    pub fn fade_in(&self) -> Duration {
        fade_duration(self.fade_in_secs)
    }

    /// Delay between an activation and its voices starting
    pub fn stagger_delay(&self) -> Duration {
        fade_duration(self.crossfade_secs / 2.0)
    }

    pub fn fade_out(&self) -> Duration {
        fade_duration(self.fade_out_secs)
    }

    pub fn forced_fade_out(&self) -> Duration {
        fade_duration(self.forced_fade_out_secs)
    }

    /// Gate and pan settings for a channel role
    pub fn channel(&self, role: ChannelRole) -> &ChannelSettings {
        match role {
            ChannelRole::Primary => &self.primary,
            ChannelRole::Secondary => &self.secondary,
        }
    }
}

/// Confidence gate and stereo position of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Inclusive lower bound
    pub min_confidence: f32,

    /// Exclusive upper bound (None = unbounded)
    #[serde(default)]
    pub max_confidence: Option<f32>,

    /// -1.0 (left) .. 1.0 (right)
    #[serde(default)]
    pub pan: f32,
}

impl ChannelSettings {
    /// Whether `confidence` passes this channel's gate
    pub fn accepts(&self, confidence: f32) -> bool {
        confidence >= self.min_confidence
            && self.max_confidence.map_or(true, |max| confidence < max)
    }
}

/// Samples and target gains for one emotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSound {
    /// Sample files, relative to `audio.sample_root` unless absolute
    #[serde(default)]
    pub samples: Vec<PathBuf>,

    #[serde(default = "default_gain")]
    pub primary_gain: f32,

    #[serde(default = "default_gain")]
    pub secondary_gain: f32,
}

impl EmotionSound {
    fn new(samples: &[&str], primary_gain: f32, secondary_gain: f32) -> Self {
        Self {
            samples: samples.iter().map(PathBuf::from).collect(),
            primary_gain,
            secondary_gain,
        }
    }

    /// Target gain for a channel role
    pub fn gain(&self, role: ChannelRole) -> f32 {
        match role {
            ChannelRole::Primary => self.primary_gain,
            ChannelRole::Secondary => self.secondary_gain,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_frame_rate() -> u32 {
    30
}

fn default_gain() -> f32 {
    1.0
}

/// Built-in emotion → sound table
pub fn default_emotion_table() -> BTreeMap<Emotion, EmotionSound> {
    BTreeMap::from([
        (Emotion::Neutral, EmotionSound::new(&["Steinway Grand Piano_1.wav"], 1.0, 0.4)),
        (Emotion::Happy, EmotionSound::new(&["Forest_1.wav", "flute_1.wav"], 1.4, 0.5)),
        (Emotion::Sad, EmotionSound::new(&["violin_1.wav"], 1.2, 0.5)),
        (Emotion::Angry, EmotionSound::new(&["Inst 2_1.wav"], 1.0, 0.4)),
        (Emotion::Fearful, EmotionSound::new(&["piccolo_1.wav"], 1.1, 0.45)),
        (Emotion::Disgusted, EmotionSound::new(&["Forest_1.wav"], 0.9, 0.35)),
        (Emotion::Surprised, EmotionSound::new(&["Brooklyn_1.wav"], 1.2, 0.5)),
    ])
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            estimator: EstimatorConfig::default(),
            audio: AudioConfig::default(),
            emotions: default_emotion_table(),
            logging: LoggingConfig::default(),
        }
    }
}

impl InstallationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: InstallationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or return validated defaults when `path` is None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Period of one frame
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    /// Absolute path of a configured sample
    pub fn sample_path(&self, sample: &Path) -> PathBuf {
        if sample.is_absolute() {
            sample.to_path_buf()
        } else {
            self.audio.sample_root.join(sample)
        }
    }

    /// Reject configurations the installation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 || self.frame_rate > 240 {
            return Err(Error::Config(format!(
                "frame_rate must be 1-240, got {}",
                self.frame_rate
            )));
        }
        if self.estimator.smoothing_window == 0 {
            return Err(Error::Config("estimator.smoothing_window must be at least 1".into()));
        }

        let audio = &self.audio;
        for (name, secs) in [
            ("fade_in_secs", audio.fade_in_secs),
            ("crossfade_secs", audio.crossfade_secs),
            ("fade_out_secs", audio.fade_out_secs),
            ("forced_fade_out_secs", audio.forced_fade_out_secs),
        ] {
            if !secs.is_finite() || !(0.0..=MAX_FADE_SECS).contains(&secs) {
                return Err(Error::Config(format!(
                    "audio.{} must be 0-{} seconds, got {}",
                    name, MAX_FADE_SECS, secs
                )));
            }
        }
        if !(audio.fade_floor > 0.0 && audio.fade_floor.is_finite()) {
            return Err(Error::Config(format!(
                "audio.fade_floor must be positive, got {}",
                audio.fade_floor
            )));
        }
        if !(0.0..=1.0).contains(&audio.master_volume) {
            return Err(Error::Config(format!(
                "audio.master_volume must be 0.0-1.0, got {}",
                audio.master_volume
            )));
        }

        for (name, channel) in [("primary", &audio.primary), ("secondary", &audio.secondary)] {
            if let Some(max) = channel.max_confidence {
                if max <= channel.min_confidence {
                    return Err(Error::Config(format!(
                        "audio.{}: max_confidence {} must exceed min_confidence {}",
                        name, max, channel.min_confidence
                    )));
                }
            }
            if !(-1.0..=1.0).contains(&channel.pan) {
                return Err(Error::Config(format!(
                    "audio.{}.pan must be -1.0..1.0, got {}",
                    name, channel.pan
                )));
            }
        }

        for (emotion, sound) in &self.emotions {
            if sound.primary_gain < 0.0 || sound.secondary_gain < 0.0 {
                return Err(Error::Config(format!(
                    "emotions.{}: gains must be non-negative",
                    emotion
                )));
            }
        }

        Ok(())
    }
}

/// Resolve which config file to load, following the priority order
///
/// Returns None when no file applies (built-in defaults).
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config dir
    let user_config = dirs::config_dir().map(|d| d.join("emosonic").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
        debug!("No user config at {}", path.display());
    }

    // Priority 4: built-in defaults
    None
}
