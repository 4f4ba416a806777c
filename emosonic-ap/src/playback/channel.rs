//! One crossfading audio slot
//!
//! A channel holds at most one *current* label (pending start, fading in or
//! sustained) plus any number of *tails*: earlier voice sets that are fading
//! out on their own and will be released when their ramp ends.
//!
//! **State machine:** `Idle → FadingIn → Sustained → FadingOut → Idle`
//! - FadingIn: current label pending its stagger delay or ramping up
//! - Sustained: current label's ramp has elapsed
//! - FadingOut: no current label, tails still decaying
//!
//! Deferred work (voice start after the stagger delay, release after the
//! fade-out) lives in a [`TimerQueue`] polled by [`AudioChannel::tick`].
//! Superseded entries are either removed from the queue or find nothing to
//! act on, so every tail is released exactly once.

use crate::audio::types::SoundBuffer;
use crate::playback::backend::{AudioBackend, VoiceId};
use crate::playback::envelope::GainEnvelope;
use crate::playback::timer_queue::TimerQueue;
use emosonic_common::config::AudioConfig;
use emosonic_common::events::{ChannelRole, ChannelState, InstallationEvent};
use emosonic_common::{Emotion, FadeCurve};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timing and placement of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    pub role: ChannelRole,
    pub pan: f32,
    pub fade_in: Duration,
    /// Delay between an activate request and its voices starting
    pub stagger: Duration,
    pub fade_out: Duration,
    pub forced_fade_out: Duration,
    pub fade_in_curve: FadeCurve,
    pub fade_out_curve: FadeCurve,
    pub floor: f32,
}

impl ChannelConfig {
    pub fn from_audio(audio: &AudioConfig, role: ChannelRole) -> Self {
        Self {
            role,
            pan: audio.channel(role).pan,
            fade_in: audio.fade_in(),
            stagger: audio.stagger_delay(),
            fade_out: audio.fade_out(),
            forced_fade_out: audio.forced_fade_out(),
            fade_in_curve: audio.fade_in_curve,
            fade_out_curve: audio.fade_out_curve,
            floor: audio.fade_floor,
        }
    }
}

/// Something that happened on a channel during a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelEvent {
    StateChanged {
        state: ChannelState,
        emotion: Option<Emotion>,
    },
    VoicesStarted {
        emotion: Emotion,
        voices: usize,
    },
    ActivationCancelled {
        emotion: Emotion,
    },
    FadeOutCompleted {
        emotion: Emotion,
    },
}

impl ChannelEvent {
    pub fn into_installation_event(
        self,
        channel: ChannelRole,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> InstallationEvent {
        match self {
            ChannelEvent::StateChanged { state, emotion } => InstallationEvent::ChannelStateChanged {
                channel,
                state,
                emotion,
                timestamp,
            },
            ChannelEvent::VoicesStarted { emotion, voices } => InstallationEvent::VoicesStarted {
                channel,
                emotion,
                voices,
                timestamp,
            },
            ChannelEvent::ActivationCancelled { emotion } => {
                InstallationEvent::ActivationCancelled {
                    channel,
                    emotion,
                    timestamp,
                }
            }
            ChannelEvent::FadeOutCompleted { emotion } => InstallationEvent::FadeOutCompleted {
                channel,
                emotion,
                timestamp,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelAction {
    StartVoices { generation: u64 },
    ReleaseTail { tail_id: u64 },
}

/// The channel's current label
#[derive(Debug)]
struct ActiveSet {
    emotion: Emotion,
    generation: u64,
    envelope: GainEnvelope,
    buffers: Vec<Arc<SoundBuffer>>,
    voices: Vec<VoiceId>,
    started: bool,
    /// Last gain pushed to the backend
    applied_gain: f32,
}

/// Voices that left the current slot and are decaying toward release
#[derive(Debug)]
struct FadingTail {
    id: u64,
    emotion: Emotion,
    voices: Vec<VoiceId>,
    envelope: GainEnvelope,
}

pub struct AudioChannel {
    config: ChannelConfig,
    state: ChannelState,
    current: Option<ActiveSet>,
    tails: Vec<FadingTail>,
    timers: TimerQueue<ChannelAction>,
    next_generation: u64,
    next_tail_id: u64,
    events: Vec<ChannelEvent>,
}

impl AudioChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            state: ChannelState::Idle,
            current: None,
            tails: Vec::new(),
            timers: TimerQueue::new(),
            next_generation: 0,
            next_tail_id: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn role(&self) -> ChannelRole {
        self.config.role
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Label currently pending, fading in or sustained
    pub fn current_emotion(&self) -> Option<Emotion> {
        self.current.as_ref().map(|c| c.emotion)
    }

    /// Voices of the current label (empty before its start fires)
    pub fn current_voices(&self) -> &[VoiceId] {
        self.current.as_ref().map_or(&[], |c| c.voices.as_slice())
    }

    /// Labels of the tails still fading, oldest first
    pub fn fading_emotions(&self) -> Vec<Emotion> {
        self.tails.iter().map(|t| t.emotion).collect()
    }

    /// Gain the current label's envelope prescribes at `now`
    pub fn current_gain(&self, now: Duration) -> Option<f32> {
        self.current
            .as_ref()
            .filter(|c| c.started)
            .map(|c| c.envelope.gain_at(now))
    }

    /// Nothing current and nothing fading
    pub fn is_quiet(&self) -> bool {
        self.current.is_none() && self.tails.is_empty()
    }

    /// Make `emotion` the current label
    ///
    /// The previous label (if any) starts fading out in the same call. The
    /// new voices start at gain 0 once the stagger delay has elapsed, then
    /// ramp to `target_gain` over the fade-in time. Re-activating the
    /// current label does nothing.
    pub fn activate<B: AudioBackend + ?Sized>(
        &mut self,
        emotion: Emotion,
        target_gain: f32,
        buffers: &[Arc<SoundBuffer>],
        backend: &mut B,
        now: Duration,
    ) {
        if self.current_emotion() == Some(emotion) {
            return;
        }

        self.fade_out(backend, now, false);

        self.next_generation += 1;
        let generation = self.next_generation;
        let start_at = now + self.config.stagger;

        debug!(
            "{} channel: activating {} (gain {:.2}, {} buffers) at {:.3}s",
            self.config.role,
            emotion,
            target_gain,
            buffers.len(),
            start_at.as_secs_f64()
        );

        self.current = Some(ActiveSet {
            emotion,
            generation,
            envelope: GainEnvelope::new(
                start_at,
                self.config.fade_in,
                0.0,
                target_gain,
                self.config.fade_in_curve,
                self.config.floor,
            ),
            buffers: buffers.to_vec(),
            voices: Vec::new(),
            started: false,
            applied_gain: 0.0,
        });
        self.timers
            .schedule(start_at, ChannelAction::StartVoices { generation });
        self.update_state(now);
    }

    /// Send the current label to fade-out
    ///
    /// A label whose voices have not started yet is cancelled outright.
    /// Otherwise its gain is captured and ramped to the floor over the normal
    /// (or forced) fade-out time, after which the voices are released.
    pub fn fade_out<B: AudioBackend + ?Sized>(&mut self, backend: &mut B, now: Duration, forced: bool) {
        let Some(current) = self.current.take() else {
            return;
        };

        if !current.started {
            let generation = current.generation;
            self.timers.retain(|action| {
                *action != ChannelAction::StartVoices { generation }
            });
            debug!(
                "{} channel: cancelled pending {} before its voices started",
                self.config.role, current.emotion
            );
            self.events.push(ChannelEvent::ActivationCancelled {
                emotion: current.emotion,
            });
            self.update_state(now);
            return;
        }

        let gain = current.envelope.gain_at(now);
        let duration = self.fade_duration(forced);
        for &voice in &current.voices {
            backend.set_gain(voice, gain);
        }

        self.next_tail_id += 1;
        let tail_id = self.next_tail_id;
        debug!(
            "{} channel: fading out {} from {:.3} over {:?}",
            self.config.role, current.emotion, gain, duration
        );
        let envelope = self.fade_out_envelope(gain, now, duration);
        self.tails.push(FadingTail {
            id: tail_id,
            emotion: current.emotion,
            voices: current.voices,
            envelope,
        });
        self.timers
            .schedule(now + duration, ChannelAction::ReleaseTail { tail_id });
        self.update_state(now);
    }

    /// Force everything on this channel into the short fade-out
    ///
    /// Tails whose normal release is further away than the forced fade are
    /// re-ramped from their present gain; their original release entry then
    /// finds nothing to release.
    pub fn force_all<B: AudioBackend + ?Sized>(&mut self, backend: &mut B, now: Duration) {
        self.fade_out(backend, now, true);

        let forced = self.config.forced_fade_out;
        let release_at = now + forced;
        let mut reschedule = Vec::new();
        for tail in &mut self.tails {
            if tail.envelope.end() <= release_at {
                continue;
            }
            let gain = tail.envelope.gain_at(now);
            tail.envelope = GainEnvelope::new(
                now,
                forced,
                gain,
                0.0,
                self.config.fade_out_curve,
                self.config.floor,
            );
            reschedule.push(tail.id);
        }
        for tail_id in reschedule {
            self.timers
                .schedule(release_at, ChannelAction::ReleaseTail { tail_id });
        }
    }

    /// Run due timer actions and push envelope gains to the backend
    pub fn tick<B: AudioBackend + ?Sized>(&mut self, backend: &mut B, now: Duration) {
        while let Some(action) = self.timers.pop_due(now) {
            match action {
                ChannelAction::StartVoices { generation } => self.start_voices(generation, backend),
                ChannelAction::ReleaseTail { tail_id } => self.release_tail(tail_id, backend),
            }
        }

        if let Some(current) = self.current.as_mut().filter(|c| c.started) {
            let gain = current.envelope.gain_at(now);
            if gain != current.applied_gain {
                for &voice in &current.voices {
                    backend.set_gain(voice, gain);
                }
                current.applied_gain = gain;
            }
        }

        for tail in &self.tails {
            let gain = tail.envelope.gain_at(now);
            for &voice in &tail.voices {
                backend.set_gain(voice, gain);
            }
        }

        self.update_state(now);
    }

    /// Events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<ChannelEvent> {
        std::mem::take(&mut self.events)
    }

    fn start_voices<B: AudioBackend + ?Sized>(&mut self, generation: u64, backend: &mut B) {
        let pan = self.config.pan;
        let Some(current) = self
            .current
            .as_mut()
            .filter(|c| c.generation == generation && !c.started)
        else {
            return;
        };

        current.voices = current
            .buffers
            .iter()
            .map(|buffer| backend.play(buffer, 0.0, pan))
            .collect();
        current.started = true;

        debug!(
            "{} channel: started {} voices for {}",
            self.config.role,
            current.voices.len(),
            current.emotion
        );
        self.events.push(ChannelEvent::VoicesStarted {
            emotion: current.emotion,
            voices: current.voices.len(),
        });
    }

    fn release_tail<B: AudioBackend + ?Sized>(&mut self, tail_id: u64, backend: &mut B) {
        let Some(index) = self.tails.iter().position(|t| t.id == tail_id) else {
            return;
        };
        let tail = self.tails.remove(index);
        for &voice in &tail.voices {
            backend.set_gain(voice, 0.0);
            backend.stop(voice);
        }
        debug!(
            "{} channel: released {} ({} voices)",
            self.config.role,
            tail.emotion,
            tail.voices.len()
        );
        self.events.push(ChannelEvent::FadeOutCompleted {
            emotion: tail.emotion,
        });
    }

    fn fade_duration(&self, forced: bool) -> Duration {
        if forced {
            self.config.forced_fade_out
        } else {
            self.config.fade_out
        }
    }

    fn fade_out_envelope(&self, from: f32, now: Duration, duration: Duration) -> GainEnvelope {
        GainEnvelope::new(
            now,
            duration,
            from,
            0.0,
            self.config.fade_out_curve,
            self.config.floor,
        )
    }

    fn update_state(&mut self, now: Duration) {
        let state = match &self.current {
            Some(current) if current.started && current.envelope.is_complete(now) => {
                ChannelState::Sustained
            }
            Some(_) => ChannelState::FadingIn,
            None if !self.tails.is_empty() => ChannelState::FadingOut,
            None => ChannelState::Idle,
        };

        if state != self.state {
            let emotion = self
                .current_emotion()
                .or_else(|| self.tails.last().map(|t| t.emotion));
            debug!(
                "{} channel: {:?} -> {:?} ({:?})",
                self.config.role, self.state, state, emotion
            );
            self.state = state;
            self.events.push(ChannelEvent::StateChanged { state, emotion });
        }
    }
}
