//! Per-frame driver
//!
//! [`Installation`] owns the estimator, the detection tracker and the
//! crossfade controller, and is stepped once per frame by the main loop.
//!
//! Frames without a face leave the smoothing histories untouched. The last
//! ranking keeps feeding the controller while the person still counts as
//! detected; once the detection timeout passes, the controller sees no input
//! and both channels fade out.

use crate::audio::sample_bank::SampleBank;
use crate::detection::{Detection, DetectionTracker};
use crate::estimator::EmotionEstimator;
use crate::playback::backend::AudioBackend;
use crate::playback::controller::CrossfadeController;
use emosonic_common::config::InstallationConfig;
use emosonic_common::events::{ChannelRole, EmotionSnapshot, InstallationEvent, Point};
use emosonic_common::{Emotion, RankedEmotion};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Minimum change before the text readout is refreshed
pub const READOUT_HYSTERESIS: f32 = 0.1;

/// Result of one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub snapshot: EmotionSnapshot,
    pub events: Vec<InstallationEvent>,
}

pub struct Installation<B: AudioBackend> {
    estimator: EmotionEstimator,
    tracker: DetectionTracker,
    controller: CrossfadeController<B>,
    /// Last readout value shown per slot (primary, secondary)
    readout: [f32; 2],
    /// (primary, secondary) labels of the last detection
    last_labels: Option<(Emotion, Emotion)>,
    landmarks: Vec<Point>,
}

impl<B: AudioBackend> Installation<B> {
    pub fn new(config: &InstallationConfig, backend: B) -> Self {
        Self {
            estimator: EmotionEstimator::new(config.estimator.smoothing_window),
            tracker: DetectionTracker::new(config.estimator.detection_timeout()),
            controller: CrossfadeController::new(config, backend),
            readout: [0.0; 2],
            last_labels: None,
            landmarks: Vec::new(),
        }
    }

    pub fn install_samples(&mut self, bank: Arc<SampleBank>) {
        self.controller.install_samples(bank);
    }

    pub fn estimator(&self) -> &EmotionEstimator {
        &self.estimator
    }

    pub fn controller(&self) -> &CrossfadeController<B> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CrossfadeController<B> {
        &mut self.controller
    }

    pub fn is_detected(&self) -> bool {
        self.tracker.is_detected()
    }

    /// Advance one frame at session time `now`
    pub fn step(&mut self, detection: Option<Detection>, now: Duration) -> FrameOutput {
        let timestamp = chrono::Utc::now();
        let mut events = Vec::new();
        let has_new_data = detection.is_some();
        let mut is_new_emotion = false;

        if let Some(detection) = detection {
            self.tracker.record(now);
            let (primary, secondary) = self.estimator.update(&detection.expressions);
            self.landmarks = detection.landmarks;

            is_new_emotion = self.last_labels.map(|(p, _)| p) != Some(primary.emotion);
            let labels = (primary.emotion, secondary.emotion);
            if self.last_labels != Some(labels) {
                debug!("Emotion ranking: {} / {}", primary, secondary);
                events.push(InstallationEvent::EmotionChanged {
                    primary,
                    secondary,
                    timestamp,
                });
                self.last_labels = Some(labels);
            }

            self.update_readout(ChannelRole::Primary, primary, timestamp, &mut events);
            self.update_readout(ChannelRole::Secondary, secondary, timestamp, &mut events);
        }

        if let Some(detected) = self.tracker.poll(now) {
            info!(
                "PERSON: {}",
                if detected { "DETECTED" } else { "NOT DETECTED" }
            );
            if !detected {
                self.landmarks.clear();
            }
            events.push(InstallationEvent::DetectionStatusChanged {
                detected,
                timestamp,
            });
        }

        let detected = self.tracker.is_detected();
        let (primary, secondary) = if detected {
            self.estimator.last_ranking().unzip()
        } else {
            (None, None)
        };

        self.controller.handle_emotions(primary, secondary, now);
        events.extend(
            self.controller
                .tick(now)
                .into_iter()
                .map(|(role, event)| event.into_installation_event(role, timestamp)),
        );

        FrameOutput {
            snapshot: EmotionSnapshot {
                primary,
                secondary,
                landmarks: self.landmarks.clone(),
                scale: 1.0,
                timestamp,
                has_new_data,
                is_new_emotion,
                detected,
            },
            events,
        }
    }

    /// Start the forced fade-out on both channels
    pub fn shutdown(&mut self, now: Duration) -> Vec<InstallationEvent> {
        self.controller.stop_all(now);
        self.tick(now)
    }

    /// Advance timers and envelopes without new input
    pub fn tick(&mut self, now: Duration) -> Vec<InstallationEvent> {
        let timestamp = chrono::Utc::now();
        self.controller
            .tick(now)
            .into_iter()
            .map(|(role, event)| event.into_installation_event(role, timestamp))
            .collect()
    }

    /// Nothing playing or fading on either channel
    pub fn is_quiet(&self) -> bool {
        self.controller.is_quiet()
    }

    fn update_readout(
        &mut self,
        slot: ChannelRole,
        ranked: RankedEmotion,
        timestamp: chrono::DateTime<chrono::Utc>,
        events: &mut Vec<InstallationEvent>,
    ) {
        let index = match slot {
            ChannelRole::Primary => 0,
            ChannelRole::Secondary => 1,
        };
        if (ranked.value - self.readout[index]).abs() > READOUT_HYSTERESIS {
            self.readout[index] = ranked.value;
            events.push(InstallationEvent::ReadoutChanged {
                slot,
                emotion: ranked.emotion,
                percent: ranked.percent(),
                timestamp,
            });
        }
    }
}
