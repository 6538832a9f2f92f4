//! # Favorites Store
//!
//! The single source of truth for the favorites collection. State lives in a
//! `tokio::sync::watch` channel, which gives both a synchronous current-value
//! read and subscriptions that observe the current value first and every
//! later value after it. Each mutation is applied atomically inside the
//! channel and the full snapshot is written to one key-value slot under the
//! same writer lock, so storage always ends on the latest snapshot. One
//! notice follows each mutation.
//!
//! Persistence is best effort: a failed write is logged and the in-memory
//! mutation and its notice still go through. A missing or corrupt slot at
//! start-up yields an empty collection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::connections::KeyValueStore;
use crate::favorites::notifications::{FavoritesNotice, Notifier};
use crate::models::Trial;

/// Slot name the snapshot is persisted under.
pub const FAVORITES_KEY: &str = "trialFavorites";

/// Shared, observable, persisted favorites collection.
pub struct FavoritesStore {
    state: watch::Sender<Vec<Trial>>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    key: String,
    writer: Mutex<()>,
}

impl FavoritesStore {
    /// Opens the store on the default slot, loading any persisted snapshot.
    pub fn new(storage: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_key(storage, notifier, FAVORITES_KEY)
    }

    /// Opens the store on a custom slot.
    pub fn with_key(
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        key: &str,
    ) -> Self {
        let initial = load_snapshot(storage.as_ref(), key);
        tracing::debug!(key, count = initial.len(), "favorites loaded");
        let (state, _) = watch::channel(initial);
        Self {
            state,
            storage,
            notifier,
            key: key.to_string(),
            writer: Mutex::new(()),
        }
    }

    /// Synchronous read of the current collection.
    pub fn snapshot(&self) -> Vec<Trial> {
        self.state.borrow().clone()
    }

    /// Whether a trial with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().iter().any(|t| t.id == id)
    }

    /// Subscribes to the collection. The receiver already holds the current
    /// value and is marked changed, so its first `changed().await` returns
    /// immediately; every later mutation wakes it again.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Trial>> {
        let mut receiver = self.state.subscribe();
        receiver.mark_changed();
        receiver
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Appends `trial` unless its id is already present.
    ///
    /// Returns whether it was added. Either way exactly one notice fires.
    pub fn add_one(&self, trial: &Trial) -> bool {
        let candidate = trial.settled();
        let added = self.commit(false, |favorites| {
            if favorites.iter().any(|f| f.id == candidate.id) {
                return false;
            }
            favorites.push(candidate.clone());
            true
        });

        if added {
            self.notifier.notify(FavoritesNotice::Added(candidate));
        } else {
            self.notifier.notify(FavoritesNotice::AlreadyPresent(candidate));
        }
        added
    }

    /// Appends every trial whose id is not yet present, in input order, as
    /// one mutation. Within `trials` the first occurrence of an id wins.
    ///
    /// Returns the number of trials added.
    pub fn add_many(&self, trials: &[Trial]) -> usize {
        let mut added = 0;
        self.commit(false, |favorites| {
            let mut known: HashSet<String> = favorites.iter().map(|f| f.id.clone()).collect();
            for trial in trials {
                if known.insert(trial.id.clone()) {
                    favorites.push(trial.settled());
                    added += 1;
                }
            }
            added > 0
        });

        if added > 0 {
            self.notifier.notify(FavoritesNotice::BatchAdded(added));
        } else {
            self.notifier.notify(FavoritesNotice::NoNewItems);
        }
        added
    }

    /// Removes the trial with `id`. Unknown ids are a silent no-op: no
    /// mutation, no write, no notice.
    pub fn remove_one(&self, id: &str) -> Option<Trial> {
        let mut removed = None;
        self.commit(false, |favorites| {
            let Some(index) = favorites.iter().position(|f| f.id == id) else {
                return false;
            };
            removed = Some(favorites.remove(index));
            true
        });

        let trial = removed?;
        self.notifier.notify(FavoritesNotice::Removed(trial.name.clone()));
        Some(trial)
    }

    /// Removes every trial whose id is in `ids`, persisting once.
    ///
    /// The snapshot is written and the notice reports how many ids were
    /// requested even when none of them is present, an empty request
    /// included. Subscribers only wake when something was removed.
    pub fn remove_many(&self, ids: &[String]) {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.commit(true, |favorites| {
            let before = favorites.len();
            favorites.retain(|f| !doomed.contains(f.id.as_str()));
            favorites.len() != before
        });
        self.notifier.notify(FavoritesNotice::BatchRemoved(ids.len()));
    }

    /// Applies `edit` inside the channel and persists the resulting
    /// snapshot before releasing the writer lock. Subscribers wake when
    /// `edit` reports a change; the snapshot is written on a change or
    /// when `always_persist` is set. Returns whether anything changed.
    fn commit(
        &self,
        always_persist: bool,
        edit: impl FnOnce(&mut Vec<Trial>) -> bool,
    ) -> bool {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut payload = None;
        let changed = self.state.send_if_modified(|favorites| {
            let changed = edit(favorites);
            if changed || always_persist {
                payload = Some(serde_json::to_string(favorites));
            }
            changed
        });

        if let Some(payload) = payload {
            self.persist(payload);
        }
        changed
    }

    fn persist(&self, payload: Result<String, serde_json::Error>) {
        let result = payload
            .map_err(crate::error::StorageError::from)
            .and_then(|json| self.storage.set(&self.key, &json));
        if let Err(error) = result {
            tracing::warn!(key = %self.key, %error, "favorites snapshot not persisted");
        }
    }
}

/// Reads and decodes the persisted snapshot, discarding anything unusable.
fn load_snapshot(storage: &dyn KeyValueStore, key: &str) -> Vec<Trial> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(error) => {
            tracing::warn!(key, %error, "favorites slot unreadable; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Trial>>(&raw) {
        Ok(trials) => {
            // Repair a snapshot that somehow holds the same id twice.
            let mut seen = HashSet::new();
            trials.into_iter().filter(|t| seen.insert(t.id.clone())).collect()
        }
        Err(error) => {
            tracing::warn!(key, %error, "favorites slot is corrupt; discarding it");
            Vec::new()
        }
    }
}
