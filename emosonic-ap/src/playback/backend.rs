//! Voice playback primitive
//!
//! The crossfade controller only ever starts, re-gains and stops voices. The
//! real backend forwards these to the mixer thread; tests and the silent
//! fallback use in-process implementations.

use crate::audio::types::SoundBuffer;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Handle to one playing voice
pub type VoiceId = u64;

pub trait AudioBackend: Send {
    /// Start playing `buffer` at `gain` and stereo position `pan` (-1..1)
    fn play(&mut self, buffer: &Arc<SoundBuffer>, gain: f32, pan: f32) -> VoiceId;

    /// Set the voice's gain; unknown or stopped voices are ignored
    fn set_gain(&mut self, voice: VoiceId, gain: f32);

    /// Stop and release the voice. Stopping twice is harmless.
    fn stop(&mut self, voice: VoiceId);
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn play(&mut self, buffer: &Arc<SoundBuffer>, gain: f32, pan: f32) -> VoiceId {
        (**self).play(buffer, gain, pan)
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        (**self).set_gain(voice, gain)
    }

    fn stop(&mut self, voice: VoiceId) {
        (**self).stop(voice)
    }
}

/// Backend that produces no sound
///
/// Used when the audio device cannot be opened; voice bookkeeping still runs
/// so the crossfade state machine behaves the same.
#[derive(Debug, Default)]
pub struct NullBackend {
    next_id: VoiceId,
    live: HashSet<VoiceId>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Voices started and not yet stopped
    pub fn live_voices(&self) -> usize {
        self.live.len()
    }
}

impl AudioBackend for NullBackend {
    fn play(&mut self, buffer: &Arc<SoundBuffer>, gain: f32, pan: f32) -> VoiceId {
        self.next_id += 1;
        self.live.insert(self.next_id);
        trace!("null voice {} for {} (gain {:.3}, pan {:.2})", self.next_id, buffer.name, gain, pan);
        self.next_id
    }

    fn set_gain(&mut self, _voice: VoiceId, _gain: f32) {}

    fn stop(&mut self, voice: VoiceId) {
        self.live.remove(&voice);
    }
}
