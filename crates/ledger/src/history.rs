//! Fixed-capacity FIFO window of recent entries.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Oldest entries are evicted once the window exceeds its capacity.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone + Eq + Hash> BoundedHistory<T> {
    /// A capacity of zero is bumped to one so the window is never inert.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append an entry, returning the evicted oldest entry if the window overflowed.
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn contains(&self, entry: &T) -> bool {
        self.entries.contains(entry)
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn to_set(&self) -> HashSet<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn distinct_count(&self) -> usize {
        self.entries.iter().collect::<HashSet<_>>().len()
    }

    /// Up to `limit` distinct entries, most recent first.
    pub fn recent_distinct(&self, limit: usize) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for entry in self.entries.iter().rev() {
            if out.len() >= limit {
                break;
            }
            if seen.insert(entry) {
                out.push(entry.clone());
            }
        }
        out
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
