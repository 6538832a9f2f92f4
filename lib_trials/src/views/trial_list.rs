//! # Feed View
//!
//! Presentation-side state of the live feed: which visible trials the user
//! has selected, and the favorite actions taken from the feed. The view owns
//! the engine, so closing or dropping the view stops the timer.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::favorites::FavoritesStore;
use crate::ingestors::FeedEngine;
use crate::models::Trial;
use crate::upstream::{SearchStrategy, TrialSource};

/// The feed view: engine, selection and a favorites subscription.
pub struct TrialListView<S: TrialSource, G: SearchStrategy> {
    feed: FeedEngine<S, G>,
    favorites: Arc<FavoritesStore>,
    subscription: Option<watch::Receiver<Vec<Trial>>>,
    selection: HashSet<String>,
}

impl<S: TrialSource, G: SearchStrategy> TrialListView<S, G> {
    /// Wraps an engine and subscribes to the shared favorites.
    pub fn new(feed: FeedEngine<S, G>, favorites: Arc<FavoritesStore>) -> Self {
        let subscription = Some(favorites.subscribe());
        Self {
            feed,
            favorites,
            subscription,
            selection: HashSet::new(),
        }
    }

    /// The underlying engine.
    pub fn feed(&self) -> &FeedEngine<S, G> {
        &self.feed
    }

    /// Loads the first batch. The timer stays as it is; polling starts
    /// only through [`FeedEngine::start`] or [`FeedEngine::toggle`].
    ///
    /// A failed load is recorded on the engine's error.
    pub async fn open(&self) {
        if let Err(error) = self.feed.load_initial_batch().await {
            tracing::warn!(%error, "opening feed without an initial batch");
        }
    }

    /// Adds `id` to the selection, or removes it if already selected.
    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Number of selected ids.
    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// The visible trials with their `selected` flag filled in.
    pub fn trials(&self) -> Vec<Trial> {
        let mut trials = self.feed.window();
        for trial in &mut trials {
            trial.selected = self.selection.contains(&trial.id);
        }
        trials
    }

    /// Whether `id` is a favorite, according to the subscription.
    pub fn is_favorite(&self, id: &str) -> bool {
        match &self.subscription {
            Some(receiver) => receiver.borrow().iter().any(|t| t.id == id),
            None => false,
        }
    }

    /// Adds every selected trial that is still visible to the favorites as
    /// one batch, then clears the selection whatever the outcome.
    ///
    /// Selected ids that have scrolled out of the window are dropped. When
    /// nothing resolves, the store is not called at all.
    pub fn add_selected_to_favorites(&mut self) -> usize {
        let chosen: Vec<Trial> = self
            .feed
            .window()
            .into_iter()
            .filter(|t| self.selection.contains(&t.id))
            .collect();
        let added = if chosen.is_empty() {
            0
        } else {
            self.favorites.add_many(&chosen)
        };
        self.selection.clear();
        added
    }

    /// Adds one trial to the favorites.
    pub fn add_to_favorites(&self, trial: &Trial) -> bool {
        self.favorites.add_one(trial)
    }

    /// Stops the timer and releases the favorites subscription. In-flight
    /// fetch cycles may still finish.
    pub fn close(&mut self) {
        self.feed.stop();
        self.subscription = None;
    }
}

impl<S: TrialSource, G: SearchStrategy> Drop for TrialListView<S, G> {
    fn drop(&mut self) {
        self.close();
    }
}
