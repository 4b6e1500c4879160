//! Combo-box model: labelled items, a current index and an enabled flag

use rand_core::RngCore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionItem<T> {
    pub label: String,
    pub data: T,
}

impl<T> SelectionItem<T> {
    pub fn new(label: impl Into<String>, data: T) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

impl SelectionItem<()> {
    pub fn label(label: impl Into<String>) -> Self {
        Self::new(label, ())
    }
}

#[derive(Debug, Clone)]
pub struct SelectionBox<T> {
    items: Vec<SelectionItem<T>>,
    current: Option<usize>,
    enabled: bool,
}

impl<T> Default for SelectionBox<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            enabled: false,
        }
    }
}

/// What the view needs to render one box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSnapshot {
    pub items: Vec<String>,
    pub current: Option<usize>,
    pub enabled: bool,
}

impl<T> SelectionBox<T> {
    /// Replace all items and pick the first one, or a random one
    ///
    /// The box is disabled when left empty.
    pub fn repopulate<R: RngCore + ?Sized>(
        &mut self,
        items: Vec<SelectionItem<T>>,
        random: bool,
        rng: &mut R,
    ) {
        self.items = items;
        self.current = if self.items.is_empty() {
            None
        } else if random {
            Some(random_index(rng, self.items.len()))
        } else {
            Some(0)
        };
        self.enabled = !self.items.is_empty();
    }

    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Move to the following item, wrapping to the first
    pub fn select_next(&mut self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let next = self.current.map(|i| (i + 1) % self.items.len()).unwrap_or(0);
        self.current = Some(next);
        Some(next)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Label of the current item; empty when nothing is selected
    pub fn current_text(&self) -> &str {
        self.current_item().map(|i| i.label.as_str()).unwrap_or("")
    }

    pub fn current_data(&self) -> Option<&T> {
        self.current_item().map(|i| &i.data)
    }

    pub fn current_item(&self) -> Option<&SelectionItem<T>> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn items(&self) -> &[SelectionItem<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn snapshot(&self) -> BoxSnapshot {
        BoxSnapshot {
            items: self.items.iter().map(|i| i.label.clone()).collect(),
            current: self.current,
            enabled: self.enabled,
        }
    }
}

fn random_index<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> usize {
    (rng.next_u64() % len as u64) as usize
}
