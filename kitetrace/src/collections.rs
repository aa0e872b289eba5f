//! Vec that gives memory back after bursts of removals.
//!
//! Trace tables grow while many mobiles announce and drain as their pending
//! interests expire. After a threshold of consecutive removals (1/16 of the
//! expected capacity) the backing storage is shrunk.

use core::ops::{Index, IndexMut};

/// Shrink threshold from expected capacity (1/16, minimum 1).
const fn shrink_threshold(max_capacity: usize) -> u8 {
    let threshold = max_capacity / 16;
    if threshold == 0 {
        1
    } else if threshold > u8::MAX as usize {
        u8::MAX
    } else {
        threshold as u8
    }
}

/// Insertion-ordered vector that shrinks after consecutive removals.
#[derive(Debug)]
pub struct ShrinkingVec<T> {
    inner: Vec<T>,
    removals_since_add: u8,
    shrink_threshold: u8,
}

impl<T> ShrinkingVec<T> {
    pub fn with_max_capacity(max_capacity: usize) -> Self {
        Self {
            inner: Vec::new(),
            removals_since_add: 0,
            shrink_threshold: shrink_threshold(max_capacity),
        }
    }

    /// Append at the end. Resets the removal counter.
    pub fn push(&mut self, value: T) {
        self.removals_since_add = 0;
        self.inner.push(value);
    }

    /// Remove the element at `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.inner.len() {
            return None;
        }
        let value = self.inner.remove(index);
        self.removals_since_add = self.removals_since_add.saturating_add(1);
        if self.removals_since_add >= self.shrink_threshold {
            self.inner.shrink_to_fit();
            self.removals_since_add = 0;
        }
        Some(value)
    }

    pub fn position<F>(&self, f: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.iter().position(f)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.inner.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<T> Index<usize> for ShrinkingVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T> IndexMut<usize> for ShrinkingVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.inner[index]
    }
}
