//! # Frequency Stabilizer Module
//!
//! Single-frame autocorrelation estimates jump around (octave slips,
//! transients). A short median over the most recent valid estimates removes
//! those outliers while still following a real pitch change within a few
//! frames.

use std::collections::VecDeque;

use crate::error::{Result, TunerError};

/// Default number of estimates kept for the median.
pub const DEFAULT_HISTORY_CAPACITY: usize = 8;

/// Bounded FIFO of recent valid frequency estimates.
#[derive(Debug, Clone)]
pub struct FrequencyHistory {
    values: VecDeque<f32>,
    capacity: usize,
    scratch: Vec<f32>,
}

impl Default for FrequencyHistory {
    fn default() -> Self {
        Self {
            values: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
            scratch: Vec::with_capacity(DEFAULT_HISTORY_CAPACITY),
        }
    }
}

impl FrequencyHistory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TunerError::InvalidHistoryCapacity);
        }
        Ok(Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            scratch: Vec::with_capacity(capacity),
        })
    }

    /// Appends an estimate, evicting the oldest one at capacity, and returns
    /// the median of the updated history.
    pub fn push(&mut self, frequency: f32) -> f32 {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(frequency);
        // Non-empty after the push above.
        self.median().unwrap_or(frequency)
    }

    /// Median of the current history.
    ///
    /// For an even number of entries this is the mean of the two middle
    /// values.
    pub fn median(&mut self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        self.scratch.clear();
        self.scratch.extend(self.values.iter().copied());
        self.scratch.sort_by(|a, b| a.total_cmp(b));

        let mid = self.scratch.len() / 2;
        if self.scratch.len() % 2 == 0 {
            Some((self.scratch[mid - 1] + self.scratch[mid]) / 2.0)
        } else {
            Some(self.scratch[mid])
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
