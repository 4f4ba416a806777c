//! Real-time voice mixer
//!
//! The mixer runs inside the audio callback and owns every playing voice.
//! The frame loop never touches it directly: [`MixerHandle`] implements
//! [`AudioBackend`] by pushing [`MixerCommand`]s into a lock-free SPSC ring
//! (`ringbuf`), which the mixer drains before producing each frame.
//!
//! Gains change smoothly per sample toward the last requested value, so a
//! 30 fps stream of gain updates produces no zipper noise. Pan is
//! equal-power.

use crate::audio::types::{AudioFrame, SoundBuffer};
use crate::playback::backend::{AudioBackend, VoiceId};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;
use tracing::warn;

/// Commands queued per frame loop iteration are a handful per voice
const COMMAND_CAPACITY: usize = 1024;

/// Voices preallocated to avoid growing on the audio thread
const VOICE_CAPACITY: usize = 64;

/// Fraction of the remaining gain distance covered per output frame
const GAIN_SMOOTHING: f32 = 0.005;

pub enum MixerCommand {
    Play {
        id: VoiceId,
        buffer: Arc<SoundBuffer>,
        gain: f32,
        pan: f32,
    },
    SetGain {
        id: VoiceId,
        gain: f32,
    },
    Stop {
        id: VoiceId,
    },
}

struct MixerVoice {
    id: VoiceId,
    buffer: Arc<SoundBuffer>,
    position: usize,
    gain: f32,
    target_gain: f32,
    left: f32,
    right: f32,
}

/// Equal-power pan law: (left, right) gains for pan in -1..1
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

pub struct VoiceMixer {
    commands: HeapCons<MixerCommand>,
    voices: Vec<MixerVoice>,
    master_volume: f32,
    looping: bool,
}

impl VoiceMixer {
    /// Create a mixer and the handle that controls it
    pub fn new(master_volume: f32, looping: bool) -> (Self, MixerHandle) {
        let (producer, consumer) = HeapRb::<MixerCommand>::new(COMMAND_CAPACITY).split();
        let mixer = Self {
            commands: consumer,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            master_volume: master_volume.clamp(0.0, 1.0),
            looping,
        };
        let handle = MixerHandle {
            commands: producer,
            next_id: 0,
        };
        (mixer, handle)
    }

    /// Number of voices currently producing sound
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                MixerCommand::Play {
                    id,
                    buffer,
                    gain,
                    pan,
                } => {
                    let (left, right) = pan_gains(pan);
                    self.voices.push(MixerVoice {
                        id,
                        buffer,
                        position: 0,
                        gain,
                        target_gain: gain,
                        left,
                        right,
                    });
                }
                MixerCommand::SetGain { id, gain } => {
                    if let Some(voice) = self.voices.iter_mut().find(|v| v.id == id) {
                        voice.target_gain = gain;
                    }
                }
                MixerCommand::Stop { id } => {
                    self.voices.retain(|v| v.id != id);
                }
            }
        }
    }

    /// Produce the next stereo output frame
    pub fn next_frame(&mut self) -> AudioFrame {
        self.apply_commands();

        let looping = self.looping;
        let mut out = AudioFrame::zero();
        self.voices.retain_mut(|voice| {
            let frame = match voice.buffer.frame(voice.position) {
                Some(frame) => frame,
                None if looping && voice.buffer.frame_count() > 0 => {
                    voice.position = 0;
                    match voice.buffer.frame(0) {
                        Some(frame) => frame,
                        None => return false,
                    }
                }
                // Finished; a later Stop is a no-op
                None => return false,
            };
            voice.position += 1;
            voice.gain += (voice.target_gain - voice.gain) * GAIN_SMOOTHING;
            out.add_scaled(frame, voice.gain * voice.left, voice.gain * voice.right);
            true
        });

        AudioFrame {
            left: out.left * self.master_volume,
            right: out.right * self.master_volume,
        }
    }
}

/// Frame-loop side of the mixer
pub struct MixerHandle {
    commands: HeapProd<MixerCommand>,
    next_id: VoiceId,
}

impl MixerHandle {
    fn send(&mut self, command: MixerCommand) {
        if self.commands.try_push(command).is_err() {
            warn!("Mixer command ring full, dropping command");
        }
    }
}

impl AudioBackend for MixerHandle {
    fn play(&mut self, buffer: &Arc<SoundBuffer>, gain: f32, pan: f32) -> VoiceId {
        self.next_id += 1;
        let id = self.next_id;
        self.send(MixerCommand::Play {
            id,
            buffer: Arc::clone(buffer),
            gain,
            pan,
        });
        id
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        self.send(MixerCommand::SetGain { id: voice, gain });
    }

    fn stop(&mut self, voice: VoiceId) {
        self.send(MixerCommand::Stop { id: voice });
    }
}
