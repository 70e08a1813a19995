use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Circular buffer of recent GPU usage samples, oldest first
#[derive(Debug, Clone)]
pub struct UsageHistory {
    capacity: usize,
    samples: VecDeque<f32>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    /// A zero capacity is bumped to one so the latest sample is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new()
    }
}
