//! # Rolling Feed Window
//!
//! The bounded, newest-first list of trials the feed shows.

use crate::models::Trial;

/// Default number of trials kept visible.
pub const WINDOW_CAPACITY: usize = 10;

/// Newest-first window of at most `capacity` trials with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWindow {
    items: Vec<Trial>,
    capacity: usize,
}

impl Default for FeedWindow {
    fn default() -> Self {
        Self::new(WINDOW_CAPACITY)
    }
}

impl FeedWindow {
    /// An empty window. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepends `trial` flagged new, clears the flag on everything already
    /// shown and trims the oldest entries beyond capacity.
    ///
    /// If the id is already in the window the old copy is dropped first, so
    /// an accepted duplicate moves to the front instead of appearing twice.
    /// Returns the trials pushed out of the window.
    pub fn insert(&mut self, mut trial: Trial) -> Vec<Trial> {
        self.items.retain(|t| t.id != trial.id);
        for existing in &mut self.items {
            existing.is_new = false;
        }
        trial.is_new = true;
        self.items.insert(0, trial);

        if self.items.len() > self.capacity {
            self.items.split_off(self.capacity)
        } else {
            Vec::new()
        }
    }

    /// Replaces the contents wholesale, keeping the first occurrence of each
    /// id and at most `capacity` entries. Nothing is flagged new.
    pub fn replace(&mut self, batch: Vec<Trial>) {
        self.items.clear();
        for mut trial in batch {
            if self.items.len() == self.capacity {
                break;
            }
            if self.items.iter().any(|t| t.id == trial.id) {
                continue;
            }
            trial.is_new = false;
            self.items.push(trial);
        }
    }

    /// Clears `is_new` on every trial currently in the window. Returns
    /// whether any flag was actually set.
    pub fn clear_new_flags(&mut self) -> bool {
        let mut changed = false;
        for trial in self.items.iter_mut().filter(|t| t.is_new) {
            trial.is_new = false;
            changed = true;
        }
        changed
    }

    /// The visible trials, newest first.
    pub fn items(&self) -> &[Trial] {
        &self.items
    }

    /// Looks a trial up by id.
    pub fn get(&self, id: &str) -> Option<&Trial> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Number of visible trials.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is shown.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of visible trials.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
