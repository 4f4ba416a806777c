//! Shared installation state
//!
//! Thread-safe state shared between the frame loop, renderers and the event
//! logger. Uses RwLock for concurrent read access with rare writes.

use emosonic_common::events::{EmotionSnapshot, InstallationEvent};
use tokio::sync::{broadcast, RwLock};

/// Audio subsystem status, set once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioStatus {
    Initializing,
    Ready,
    /// Output could not be opened; the installation runs silent
    Unavailable(String),
}

pub struct SharedState {
    /// Latest per-frame snapshot
    pub snapshot: RwLock<EmotionSnapshot>,

    pub audio_status: RwLock<AudioStatus>,

    /// Event broadcaster
    pub event_tx: broadcast::Sender<InstallationEvent>,
}

impl SharedState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            snapshot: RwLock::new(EmotionSnapshot::default()),
            audio_status: RwLock::new(AudioStatus::Initializing),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: InstallationEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<InstallationEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the current snapshot
    pub async fn publish_snapshot(&self, snapshot: EmotionSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Read the snapshot if it carries unseen data, clearing the flag
    pub async fn take_new_snapshot(&self) -> Option<EmotionSnapshot> {
        let mut snapshot = self.snapshot.write().await;
        if !snapshot.has_new_data {
            return None;
        }
        let taken = snapshot.clone();
        snapshot.has_new_data = false;
        Some(taken)
    }

    /// Current snapshot regardless of the new-data flag
    pub async fn get_snapshot(&self) -> EmotionSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn get_audio_status(&self) -> AudioStatus {
        self.audio_status.read().await.clone()
    }

    pub async fn set_audio_status(&self, status: AudioStatus) {
        *self.audio_status.write().await = status;
    }

    /// Mark audio unavailable and broadcast `AudioUnavailable`
    ///
    /// Only the first report takes effect; returns whether this call did.
    pub async fn report_audio_unavailable(&self, reason: String) -> bool {
        let mut status = self.audio_status.write().await;
        if matches!(*status, AudioStatus::Unavailable(_)) {
            return false;
        }
        *status = AudioStatus::Unavailable(reason.clone());
        self.broadcast_event(InstallationEvent::AudioUnavailable {
            reason,
            timestamp: chrono::Utc::now(),
        });
        true
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
