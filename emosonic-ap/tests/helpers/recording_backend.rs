//! Backend that records every call for assertions

use emosonic_ap::audio::SoundBuffer;
use emosonic_ap::playback::{AudioBackend, VoiceId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Play {
        voice: VoiceId,
        buffer: String,
        gain: f32,
        pan: f32,
    },
    SetGain {
        voice: VoiceId,
        gain: f32,
    },
    Stop {
        voice: VoiceId,
    },
}

#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub buffer: String,
    pub gain: f32,
    pub pan: f32,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    next_id: VoiceId,
    live: HashMap<VoiceId, VoiceInfo>,
    stops: HashMap<VoiceId, usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_voices(&self) -> usize {
        self.live.len()
    }

    /// Live voices playing the named buffer
    pub fn voices_for(&self, buffer: &str) -> Vec<VoiceId> {
        let mut voices: Vec<_> = self
            .live
            .iter()
            .filter(|(_, info)| info.buffer == buffer)
            .map(|(id, _)| *id)
            .collect();
        voices.sort_unstable();
        voices
    }

    pub fn voice(&self, voice: VoiceId) -> Option<&VoiceInfo> {
        self.live.get(&voice)
    }

    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.live.get(&voice).map(|info| info.gain)
    }

    /// How many times `stop` was called for the voice
    pub fn stop_count(&self, voice: VoiceId) -> usize {
        self.stops.get(&voice).copied().unwrap_or(0)
    }

    pub fn play_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Play { .. }))
            .count()
    }

    /// Gains set on `voice`, in call order
    pub fn gain_history(&self, voice: VoiceId) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetGain { voice: v, gain } if *v == voice => Some(*gain),
                _ => None,
            })
            .collect()
    }
}

impl AudioBackend for RecordingBackend {
    fn play(&mut self, buffer: &Arc<SoundBuffer>, gain: f32, pan: f32) -> VoiceId {
        self.next_id += 1;
        let voice = self.next_id;
        self.live.insert(
            voice,
            VoiceInfo {
                buffer: buffer.name.clone(),
                gain,
                pan,
            },
        );
        self.calls.push(BackendCall::Play {
            voice,
            buffer: buffer.name.clone(),
            gain,
            pan,
        });
        voice
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(info) = self.live.get_mut(&voice) {
            info.gain = gain;
        }
        self.calls.push(BackendCall::SetGain { voice, gain });
    }

    fn stop(&mut self, voice: VoiceId) {
        self.live.remove(&voice);
        *self.stops.entry(voice).or_insert(0) += 1;
        self.calls.push(BackendCall::Stop { voice });
    }
}
