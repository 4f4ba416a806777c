//! Deferred actions polled by the frame tick
//!
//! Min-heap keyed on due time (`BinaryHeap<Reverse<_>>`), FIFO among
//! entries due at the same instant.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// One scheduled action
#[derive(Debug, Clone)]
pub struct Deferred<A> {
    /// Session time at which the action fires
    pub due: Duration,
    seq: u64,
    pub action: A,
}

impl<A> PartialEq for Deferred<A> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<A> Eq for Deferred<A> {}

impl<A> Ord for Deferred<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, then insertion order
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl<A> PartialOrd for Deferred<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    entries: BinaryHeap<Reverse<Deferred<A>>>,
    next_seq: u64,
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            entries: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Duration, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Reverse(Deferred { due, seq, action }));
    }

    /// Remove and return the earliest action due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<A> {
        match self.entries.peek() {
            Some(Reverse(entry)) if entry.due <= now => {
                self.entries.pop().map(|Reverse(entry)| entry.action)
            }
            _ => None,
        }
    }

    /// Keep only the actions matching `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&A) -> bool) {
        self.entries.retain(|Reverse(entry)| keep(&entry.action));
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}
