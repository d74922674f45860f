//! Fixed-capacity circular history buffer

use crate::domain::state::WorkflowState;

/// Default number of states retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Largest capacity accepted from configuration
pub const MAX_HISTORY_CAPACITY: usize = 1_000_000;

/// Slots reserved up front; the rest grow on demand
const PREALLOCATED_SLOTS: usize = DEFAULT_HISTORY_CAPACITY;

/// Circular buffer that overwrites its oldest element once full
///
/// `append` is O(1). A zero-capacity buffer silently drops every element.
#[derive(Debug, Clone, PartialEq)]
pub struct StateHistoryBuffer<T = WorkflowState> {
    slots: Vec<T>,
    capacity: usize,
    /// Index of the oldest element once the buffer has wrapped
    head: usize,
}

impl<T: Clone> StateHistoryBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.min(PREALLOCATED_SLOTS)),
            capacity,
            head: 0,
        }
    }

    pub fn append(&mut self, element: T) {
        if self.capacity == 0 {
            return;
        }

        if self.slots.len() < self.capacity {
            self.slots.push(element);
        } else {
            self.slots[self.head] = element;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// All elements, oldest first
    pub fn get_all_elements(&self) -> Vec<T> {
        let mut elements = Vec::with_capacity(self.slots.len());
        elements.extend_from_slice(&self.slots[self.head..]);
        elements.extend_from_slice(&self.slots[..self.head]);
        elements
    }

    /// Most recently appended element
    pub fn last(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots.get(idx)
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.slots.len() == self.capacity
    }
}

impl<T: Clone> Default for StateHistoryBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
