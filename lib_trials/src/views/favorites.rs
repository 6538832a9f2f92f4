//! # Favorites View
//!
//! A local mirror of the shared favorites, kept current through the store's
//! subscription, with confirmation-gated removals.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::favorites::FavoritesStore;
use crate::models::Trial;
use crate::views::confirm::{remove_one_prompt, remove_selected_prompt, Confirmer};

/// The favorites view.
pub struct FavoritesView<C> {
    store: Arc<FavoritesStore>,
    confirmer: C,
    subscription: Option<watch::Receiver<Vec<Trial>>>,
    selection: HashSet<String>,
}

impl<C: Confirmer> FavoritesView<C> {
    /// Subscribes to `store`; the mirror starts with its current contents.
    pub fn new(store: Arc<FavoritesStore>, confirmer: C) -> Self {
        let subscription = Some(store.subscribe());
        Self {
            store,
            confirmer,
            subscription,
            selection: HashSet::new(),
        }
    }

    /// The mirrored collection with `selected` filled in. Empty once closed.
    pub fn favorites(&self) -> Vec<Trial> {
        let Some(receiver) = &self.subscription else {
            return Vec::new();
        };
        let mut trials = receiver.borrow().clone();
        for trial in &mut trials {
            trial.selected = self.selection.contains(&trial.id);
        }
        trials
    }

    /// Waits for the next change to the favorites. Returns false once the
    /// view is closed or the store is gone.
    pub async fn changed(&mut self) -> bool {
        match self.subscription.as_mut() {
            Some(receiver) => receiver.changed().await.is_ok(),
            None => false,
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

    /// Asks for confirmation, then removes the favorite with `id`.
    ///
    /// Returns whether the user confirmed. Nothing changes on refusal.
    pub async fn remove_from_favorites(&mut self, id: &str) -> bool {
        let name = self
            .favorites()
            .into_iter()
            .find(|t| t.id == id)
            .map_or_else(|| id.to_string(), |t| t.name);

        if !self.confirmer.ask(&remove_one_prompt(&name)).await.confirmed {
            tracing::debug!(id, "removal declined");
            return false;
        }
        self.store.remove_one(id);
        self.selection.remove(id);
        true
    }

    /// Asks for confirmation carrying the selection size, then removes every
    /// selected favorite and clears the selection.
    ///
    /// With nothing selected no prompt is shown. On refusal the selection is
    /// kept. Returns whether anything was removed.
    pub async fn remove_selected_from_favorites(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let prompt = remove_selected_prompt(self.selection.len());
        if !self.confirmer.ask(&prompt).await.confirmed {
            tracing::debug!(count = self.selection.len(), "batch removal declined");
            return false;
        }
        let ids: Vec<String> = self.selection.drain().collect();
        self.store.remove_many(&ids);
        true
    }

    /// Releases the subscription. The view shows nothing afterwards.
    pub fn close(&mut self) {
        self.subscription = None;
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::MemoryStore;
    use crate::favorites::{ChannelNotifier, FavoritesNotice};
    use crate::views::confirm::Decision;
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn trial(id: &str, name: &str) -> Trial {
        Trial {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            phase: String::new(),
            status: String::new(),
            start_date: String::new(),
            detailed_description: None,
            is_new: false,
            selected: false,
        }
    }

    /// Records prompts and answers with a fixed decision.
    struct ScriptedConfirmer {
        answer: Decision,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl Confirmer for ScriptedConfirmer {
        async fn ask(&self, message: &str) -> Decision {
            self.prompts.lock().unwrap().push(message.to_string());
            self.answer
        }
    }

    fn setup(
        answer: Decision,
    ) -> (
        FavoritesView<ScriptedConfirmer>,
        Arc<FavoritesStore>,
        Arc<Mutex<Vec<String>>>,
        UnboundedReceiver<FavoritesNotice>,
    ) {
        let (notifier, notices) = ChannelNotifier::new();
        let store = Arc::new(FavoritesStore::new(Arc::new(MemoryStore::new()), Arc::new(notifier)));
        store.add_many(&[trial("1", "Alpha"), trial("2", "Beta"), trial("3", "Gamma")]);
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let confirmer = ScriptedConfirmer {
            answer,
            prompts: prompts.clone(),
        };
        let view = FavoritesView::new(store.clone(), confirmer);
        (view, store, prompts, notices)
    }

    #[tokio::test]
    async fn mirror_replays_and_follows_the_store() {
        let (mut view, store, _, _) = setup(Decision::YES);
        assert!(view.changed().await);
        assert_eq!(view.favorites().len(), 3);

        store.add_one(&trial("4", "Delta"));
        assert!(view.changed().await);
        assert_eq!(view.favorites().len(), 4);
    }

    #[tokio::test]
    async fn confirmed_single_removal_names_the_trial() {
        let (mut view, store, prompts, mut notices) = setup(Decision::YES);
        notices.try_recv().unwrap();

        assert!(view.remove_from_favorites("2").await);
        assert_eq!(
            prompts.lock().unwrap()[0],
            "Are you sure you want to remove \"Beta\" from your favorites?"
        );
        assert!(!store.contains("2"));
        assert_eq!(notices.try_recv().unwrap(), FavoritesNotice::Removed("Beta".into()));
    }

    #[tokio::test]
    async fn declined_single_removal_changes_nothing() {
        let (mut view, store, prompts, mut notices) = setup(Decision::NO);
        notices.try_recv().unwrap();

        assert!(!view.remove_from_favorites("2").await);
        assert_eq!(prompts.lock().unwrap().len(), 1);
        assert_eq!(store.snapshot().len(), 3);
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn confirmed_batch_removal_clears_the_selection() {
        let (mut view, store, prompts, mut notices) = setup(Decision::YES);
        notices.try_recv().unwrap();
        view.toggle_selection("1");
        view.toggle_selection("3");

        assert!(view.remove_selected_from_favorites().await);
        assert_eq!(
            prompts.lock().unwrap()[0],
            "Are you sure you want to remove 2 selected trials from your favorites?"
        );
        assert_eq!(view.selection_len(), 0);
        let left: Vec<String> = store.snapshot().into_iter().map(|t| t.id).collect();
        assert_eq!(left, vec!["2"]);
        assert_eq!(notices.try_recv().unwrap(), FavoritesNotice::BatchRemoved(2));
    }

    #[tokio::test]
    async fn declined_batch_removal_keeps_the_selection() {
        let (mut view, store, _, _) = setup(Decision::NO);
        view.toggle_selection("1");
        assert!(!view.remove_selected_from_favorites().await);
        assert!(view.is_selected("1"));
        assert_eq!(store.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn empty_selection_asks_nothing() {
        let (mut view, _, prompts, _) = setup(Decision::YES);
        assert!(!view.remove_selected_from_favorites().await);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_releases_the_subscription() {
        let (mut view, store, _, _) = setup(Decision::YES);
        assert_eq!(store.subscriber_count(), 1);
        view.close();
        assert_eq!(store.subscriber_count(), 0);
        assert!(view.favorites().is_empty());
        assert!(!view.changed().await);
    }
}
