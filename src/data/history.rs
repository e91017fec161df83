//! Bounded sample history for the rolling rain baseline.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A bounded, ordered ring of recent raw samples (oldest first).
///
/// Pushing past capacity evicts the oldest sample, so `len()` never
/// exceeds `capacity()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleHistory {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl SampleHistory {
    /// Create an empty history. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a sample, evicting the oldest if full.
    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Re-apply a (possibly different) capacity, dropping the oldest samples.
    ///
    /// Used when restoring a snapshot written under another configuration.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean of the stored samples.
    ///
    /// Returns None if the history is empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut history = SampleHistory::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(v);
            assert!(history.len() <= 3);
        }
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_mean() {
        let mut history = SampleHistory::new(4);
        assert!(history.mean().is_none());
        history.push(100.0);
        history.push(110.0);
        assert_eq!(history.mean(), Some(105.0));
    }

    #[test]
    fn test_shrinking_capacity_trims() {
        let mut history = SampleHistory::new(5);
        for v in 0..5 {
            history.push(v as f64);
        }
        history.set_capacity(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0]);
    }
}
