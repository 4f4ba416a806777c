//! Face detection input
//!
//! The face detector itself is an external collaborator. Frames reach the
//! installation through [`DetectionSource`]; the shipped source replays a
//! JSON-lines recording so the installation can run without a camera.
//!
//! Replay format: one JSON value per line, either a detection object
//! `{"box": {...}, "landmarks": [...], "expressions": {...}}` or `null` for a
//! frame without a face. Blank lines are ignored.

use crate::error::{Error, Result};
use emosonic_common::events::Point;
use emosonic_common::EmotionScores;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Landmark points per face
pub const LANDMARK_COUNT: usize = 68;

/// Face bounding box in source-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub face_box: FaceBox,
    #[serde(default)]
    pub landmarks: Vec<Point>,
    pub expressions: EmotionScores,
}

impl Detection {
    /// Detection with the given scores and no geometry
    pub fn from_scores(expressions: EmotionScores) -> Self {
        Self {
            face_box: FaceBox::default(),
            landmarks: Vec::new(),
            expressions,
        }
    }
}

/// Produces at most one detection per frame
pub trait DetectionSource: Send {
    /// Next frame's result: `Some(None)` is a frame without a face,
    /// `None` means the source is exhausted
    fn next_frame(&mut self) -> Option<Option<Detection>>;
}

/// Replays a recorded detection sequence
pub struct ReplaySource {
    frames: Vec<Option<Detection>>,
    position: usize,
    looping: bool,
}

impl ReplaySource {
    /// Load a JSON-lines recording
    pub fn from_path(path: &Path, looping: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Replay(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let source = Self::from_reader(BufReader::new(file), looping)?;
        info!(
            "Loaded {} replay frames from {}",
            source.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn from_reader<R: BufRead>(reader: R, looping: bool) -> Result<Self> {
        let mut frames = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let frame: Option<Detection> = serde_json::from_str(trimmed).map_err(|e| {
                Error::Replay(format!("Line {}: {}", index + 1, e))
            })?;
            frames.push(frame);
        }
        Ok(Self::from_frames(frames, looping))
    }

    pub fn from_frames(frames: Vec<Option<Detection>>, looping: bool) -> Self {
        Self {
            frames,
            position: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl DetectionSource for ReplaySource {
    fn next_frame(&mut self) -> Option<Option<Detection>> {
        if self.position >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return None;
            }
            debug!("Replay wrapped after {} frames", self.frames.len());
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Some(frame)
    }
}

/// Tracks whether a person is currently in front of the camera
///
/// A person counts as detected until `timeout` has passed since the last
/// successful detection. The session starts as detected so the first frames
/// don't flap the status.
#[derive(Debug, Clone)]
pub struct DetectionTracker {
    timeout: Duration,
    last_seen: Duration,
    detected: bool,
}

impl DetectionTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: Duration::ZERO,
            detected: true,
        }
    }

    /// Note a successful detection at `now`
    pub fn record(&mut self, now: Duration) {
        self.last_seen = now;
    }

    /// Re-evaluate at `now`; returns the new status when it changed
    pub fn poll(&mut self, now: Duration) -> Option<bool> {
        let detected = now.saturating_sub(self.last_seen) < self.timeout;
        if detected != self.detected {
            self.detected = detected;
            Some(detected)
        } else {
            None
        }
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RECORDING: &str = r#"
{"box": {"x": 10, "y": 20, "width": 100, "height": 120}, "landmarks": [{"x": 1, "y": 2}], "expressions": {"neutral": 0.1, "happy": 0.9, "sad": 0, "angry": 0, "fearful": 0, "disgusted": 0, "surprised": 0}}
null

{"box": {"x": 0, "y": 0, "width": 1, "height": 1}, "expressions": {"neutral": 1, "happy": 0, "sad": 0, "angry": 0, "fearful": 0, "disgusted": 0, "surprised": 0}}
"#;

    #[test]
    fn test_replay_parses_detections_and_gaps() {
        let mut source = ReplaySource::from_reader(Cursor::new(RECORDING), false).unwrap();
        assert_eq!(source.len(), 3);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.face_box.width, 100.0);
        assert_eq!(first.landmarks.len(), 1);
        assert!((first.expressions.happy - 0.9).abs() < 1e-6);

        assert_eq!(source.next_frame(), Some(None));
        assert!(source.next_frame().unwrap().unwrap().landmarks.is_empty());
        assert_eq!(source.next_frame(), None);
    }

    #[test]
    fn test_replay_loops() {
        let mut source = ReplaySource::from_frames(vec![None], true);
        for _ in 0..5 {
            assert_eq!(source.next_frame(), Some(None));
        }
    }

    #[test]
    fn test_empty_looping_replay_ends() {
        let mut source = ReplaySource::from_frames(Vec::new(), true);
        assert_eq!(source.next_frame(), None);
    }

    #[test]
    fn test_replay_rejects_malformed_line() {
        let result = ReplaySource::from_reader(Cursor::new("{\"box\": 3}\n"), false);
        assert!(matches!(result, Err(Error::Replay(_))));
    }

    #[test]
    fn test_tracker_times_out_and_recovers() {
        let mut tracker = DetectionTracker::new(Duration::from_secs(1));
        assert!(tracker.is_detected());
        assert_eq!(tracker.poll(Duration::from_millis(500)), None);
        assert_eq!(tracker.poll(Duration::from_millis(1000)), Some(false));
        assert_eq!(tracker.poll(Duration::from_millis(1500)), None);

        tracker.record(Duration::from_millis(1600));
        assert_eq!(tracker.poll(Duration::from_millis(1600)), Some(true));
        assert!(tracker.is_detected());
    }
}
