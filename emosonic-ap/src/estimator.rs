//! Emotion estimator
//!
//! Fixed-window moving average over the classifier's per-frame scores, one
//! window per label, ranked each frame into a primary and secondary emotion.

use emosonic_common::{Emotion, EmotionScores, RankedEmotion};
use std::collections::VecDeque;

/// Default smoothing window in frames
pub const DEFAULT_WINDOW: usize = 10;

/// Bounded FIFO of raw scores for one label
#[derive(Debug, Clone)]
pub struct EmotionHistory {
    values: VecDeque<f32>,
    capacity: usize,
}

impl EmotionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a score, evicting the oldest when full
    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Arithmetic mean of the retained scores (0.0 when empty)
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Per-label smoothing and ranking
///
/// Output depends only on the sequence of scores passed to
/// [`EmotionEstimator::update`]; there is no other state.
#[derive(Debug, Clone)]
pub struct EmotionEstimator {
    histories: [EmotionHistory; Emotion::COUNT],
    last: Option<(RankedEmotion, RankedEmotion)>,
}

impl EmotionEstimator {
    pub fn new(window: usize) -> Self {
        Self {
            histories: std::array::from_fn(|_| EmotionHistory::new(window)),
            last: None,
        }
    }

    /// Push one frame of scores and return (primary, secondary)
    pub fn update(&mut self, scores: &EmotionScores) -> (RankedEmotion, RankedEmotion) {
        for (emotion, value) in scores.iter() {
            self.histories[emotion.index()].push(value);
        }

        let ranked = self.ranked();
        let pair = (ranked[0], ranked[1]);
        self.last = Some(pair);
        pair
    }

    /// Current smoothed value of every label
    pub fn smoothed(&self) -> EmotionScores {
        EmotionScores::from_fn(|emotion| self.histories[emotion.index()].mean())
    }

    /// All labels sorted by smoothed value, highest first
    ///
    /// Equal values keep enumeration order.
    pub fn ranked(&self) -> [RankedEmotion; Emotion::COUNT] {
        let mut ranked = Emotion::ALL
            .map(|emotion| RankedEmotion::new(emotion, self.histories[emotion.index()].mean()));
        // sort_by is stable
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked
    }

    /// Ranking produced by the most recent update, if any
    pub fn last_ranking(&self) -> Option<(RankedEmotion, RankedEmotion)> {
        self.last
    }

    pub fn window(&self) -> usize {
        self.histories[0].capacity()
    }
}

impl Default for EmotionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
