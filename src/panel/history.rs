//! Most-recently-used lists backing the "Use embedding from" and "Toolbox Output" boxes

use std::collections::VecDeque;

/// Newest-first list with a fixed capacity and a current selection
#[derive(Debug, Clone)]
pub struct MruList<T> {
    items: VecDeque<T>,
    capacity: usize,
    current: Option<usize>,
}

impl<T> MruList<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
            current: None,
        }
    }

    /// Insert at the front and select it; the oldest item past capacity is dropped
    pub fn push_front(&mut self, item: T) -> Option<T> {
        self.items.push_front(item);
        self.current = Some(0);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Select by index; out-of-range indices leave the selection unchanged
    pub fn select(&mut self, index: usize) -> Option<&T> {
        if index < self.items.len() {
            self.current = Some(index);
        }
        self.current()
    }

    pub fn current(&self) -> Option<&T> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn labels<F: Fn(&T) -> String>(&self, label: F) -> Vec<String> {
        self.items.iter().map(label).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }
}
