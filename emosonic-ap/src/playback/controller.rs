//! Dual-channel crossfade controller
//!
//! Routes the estimator's primary and secondary emotions to two
//! [`AudioChannel`]s. Each channel has its own confidence gate, pan and
//! per-emotion target gain; otherwise both run the same state machine.

use crate::audio::sample_bank::SampleBank;
use crate::playback::backend::AudioBackend;
use crate::playback::channel::{AudioChannel, ChannelConfig, ChannelEvent};
use emosonic_common::config::{ChannelSettings, EmotionSound, InstallationConfig};
use emosonic_common::events::ChannelRole;
use emosonic_common::{Emotion, RankedEmotion};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A channel plus the gate that feeds it
struct ChannelSlot {
    channel: AudioChannel,
    gate: ChannelSettings,
    /// Label whose unready activation was last logged
    skipped: Option<Emotion>,
}

impl ChannelSlot {
    fn route<B: AudioBackend>(
        &mut self,
        input: Option<RankedEmotion>,
        samples: Option<&SampleBank>,
        sounds: &BTreeMap<Emotion, EmotionSound>,
        backend: &mut B,
        now: Duration,
    ) {
        let role = self.channel.role();

        let Some(ranked) = input.filter(|r| self.gate.accepts(r.value)) else {
            // Absent, or outside this channel's range
            self.channel.fade_out(backend, now, false);
            self.skipped = None;
            return;
        };

        if self.channel.current_emotion() == Some(ranked.emotion) {
            self.skipped = None;
            return;
        }

        match samples.and_then(|bank| bank.buffers(ranked.emotion)) {
            Some(buffers) => {
                let gain = sounds
                    .get(&ranked.emotion)
                    .map_or(1.0, |sound| sound.gain(role));
                self.channel
                    .activate(ranked.emotion, gain, buffers, backend, now);
                self.skipped = None;
            }
            None => {
                if self.skipped != Some(ranked.emotion) {
                    debug!(
                        "{} channel: no samples ready for {}, ignoring activation",
                        role, ranked.emotion
                    );
                    self.skipped = Some(ranked.emotion);
                }
            }
        }
    }
}

pub struct CrossfadeController<B: AudioBackend> {
    primary: ChannelSlot,
    secondary: ChannelSlot,
    sounds: BTreeMap<Emotion, EmotionSound>,
    samples: Option<Arc<SampleBank>>,
    backend: B,
}

impl<B: AudioBackend> CrossfadeController<B> {
    pub fn new(config: &InstallationConfig, backend: B) -> Self {
        let slot = |role| ChannelSlot {
            channel: AudioChannel::new(ChannelConfig::from_audio(&config.audio, role)),
            gate: *config.audio.channel(role),
            skipped: None,
        };

        Self {
            primary: slot(ChannelRole::Primary),
            secondary: slot(ChannelRole::Secondary),
            sounds: config.emotions.clone(),
            samples: None,
            backend,
        }
    }

    /// Make loaded samples available; activations are no-ops until then
    pub fn install_samples(&mut self, bank: Arc<SampleBank>) {
        info!(
            "Crossfade controller ready ({} emotions with samples)",
            bank.emotions().count()
        );
        self.samples = Some(bank);
    }

    pub fn is_ready(&self) -> bool {
        self.samples.is_some()
    }

    /// Feed one frame's ranked emotions (None = absent)
    pub fn handle_emotions(
        &mut self,
        primary: Option<RankedEmotion>,
        secondary: Option<RankedEmotion>,
        now: Duration,
    ) {
        let samples = self.samples.as_deref();
        self.primary
            .route(primary, samples, &self.sounds, &mut self.backend, now);
        self.secondary
            .route(secondary, samples, &self.sounds, &mut self.backend, now);
    }

    /// Advance both channels and collect what happened since the last tick
    pub fn tick(&mut self, now: Duration) -> Vec<(ChannelRole, ChannelEvent)> {
        let mut events = Vec::new();
        for slot in [&mut self.primary, &mut self.secondary] {
            slot.channel.tick(&mut self.backend, now);
            let role = slot.channel.role();
            events.extend(slot.channel.drain_events().into_iter().map(|e| (role, e)));
        }
        events
    }

    /// Forced fade-out of every voice on both channels
    pub fn stop_all(&mut self, now: Duration) {
        info!("Stopping all channels");
        self.primary.channel.force_all(&mut self.backend, now);
        self.secondary.channel.force_all(&mut self.backend, now);
    }

    /// Both channels idle with nothing fading
    pub fn is_quiet(&self) -> bool {
        self.primary.channel.is_quiet() && self.secondary.channel.is_quiet()
    }

    pub fn channel(&self, role: ChannelRole) -> &AudioChannel {
        match role {
            ChannelRole::Primary => &self.primary.channel,
            ChannelRole::Secondary => &self.secondary.channel,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
