//! Bounded sample buffers
//!
//! Both estimators keep their raw samples and derived-event histories in
//! fixed-capacity FIFO buffers: inserting past capacity evicts the oldest
//! element. Order is always arrival order.

use crate::types::{AttentionSample, ColorSample, EyeSample, Fixation, Saccade};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default color buffer capacity (~5 seconds at 30 fps)
pub const DEFAULT_COLOR_CAPACITY: usize = 150;

/// Default eye buffer capacity (~10 seconds at 30 fps)
pub const DEFAULT_EYE_CAPACITY: usize = 300;

/// Fixed-capacity FIFO buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest item when full
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    /// The trailing `n` items in arrival order
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }
}

impl<T: Clone> SampleBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Anything carrying a capture timestamp (ms)
pub trait Timestamped {
    fn timestamp_ms(&self) -> f64;
}

impl<T: Timestamped> SampleBuffer<T> {
    /// Items strictly newer than `now - window_ms`
    pub fn within_window(&self, now: f64, window_ms: f64) -> impl Iterator<Item = &T> {
        let cutoff = now - window_ms;
        self.items.iter().filter(move |item| item.timestamp_ms() > cutoff)
    }
}

impl Timestamped for ColorSample {
    fn timestamp_ms(&self) -> f64 {
        self.t
    }
}

impl Timestamped for EyeSample {
    fn timestamp_ms(&self) -> f64 {
        self.t
    }
}

impl Timestamped for Saccade {
    fn timestamp_ms(&self) -> f64 {
        self.timestamp
    }
}

impl Timestamped for AttentionSample {
    fn timestamp_ms(&self) -> f64 {
        self.timestamp
    }
}

/// Fixations are windowed by when they started
impl Timestamped for Fixation {
    fn timestamp_ms(&self) -> f64 {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut buffer = SampleBuffer::new(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_is_coerced() {
        let mut buffer = SampleBuffer::new(0);
        buffer.push("a");
        buffer.push("b");
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_last_n() {
        let mut buffer = SampleBuffer::new(10);
        for i in 0..6 {
            buffer.push(i);
        }
        let tail: Vec<i32> = buffer.last_n(3).copied().collect();
        assert_eq!(tail, vec![3, 4, 5]);

        let all: Vec<i32> = buffer.last_n(100).copied().collect();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_within_window_is_exclusive_at_cutoff() {
        let mut buffer = SampleBuffer::new(10);
        for t in [0.0, 1000.0, 2000.0, 3000.0] {
            buffer.push(Saccade {
                timestamp: t,
                magnitude: 0.1,
            });
        }
        let recent: Vec<f64> = buffer
            .within_window(3000.0, 2000.0)
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(recent, vec![2000.0, 3000.0]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = SampleBuffer::new(DEFAULT_COLOR_CAPACITY);
        buffer.push(ColorSample::new(1.0, 2.0, 3.0, 0.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), DEFAULT_COLOR_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_buffer_keeps_most_recent(capacity in 1usize..64, count in 0usize..256) {
            let mut buffer = SampleBuffer::new(capacity);
            for i in 0..count {
                buffer.push(i);
            }
            prop_assert_eq!(buffer.len(), count.min(capacity));
            let expected: Vec<usize> = (count.saturating_sub(capacity)..count).collect();
            prop_assert_eq!(buffer.to_vec(), expected);
        }
    }
}
