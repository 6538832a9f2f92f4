//! # Feed and Favorites Scenarios
//!
//! End-to-end runs of the feed engine over the real upstream client and
//! adapter (raw study JSON in, normalized trials out), with the favorites
//! store persisting to disk.

use std::sync::Arc;
use std::time::Duration;

use lib_trials::connections::{FileStore, KeyValueStore, MemoryStore};
use lib_trials::favorites::{ChannelNotifier, FavoritesNotice, FAVORITES_KEY};
use lib_trials::views::FixedConfirmer;
use lib_trials::{
    ClinicalTrialsApi, CycleOutcome, Decision, FavoritesStore, FavoritesView, FeedEngine,
    FeedSettings, FeedState, TrialListView, UpstreamError,
};
use project_tests::{param, studies, trial, FixedStrategy, ScriptedTransport};
use serde_json::json;

type Api = Arc<ClinicalTrialsApi<ScriptedTransport>>;
type Engine = FeedEngine<Api, FixedStrategy>;

fn engine(script: Vec<Result<serde_json::Value, UpstreamError>>) -> (Engine, Api) {
    let api = Arc::new(ClinicalTrialsApi::new(ScriptedTransport::new(script)));
    (FeedEngine::new(api.clone(), FixedStrategy, FeedSettings::default()), api)
}

fn ids(engine: &Engine) -> Vec<String> {
    engine.window().into_iter().map(|t| t.id).collect()
}

#[tokio::test(start_paused = true)]
async fn raw_studies_flow_into_the_window_normalized() {
    let (feed, api) = engine(vec![Ok(studies(&["NCT1", "NCT2", "NCT3"])), Ok(studies(&["NCT4"]))]);
    assert_eq!(feed.load_initial_batch().await, Ok(3));
    feed.fetch_new_item().await;

    assert_eq!(ids(&feed), vec!["NCT4", "NCT1", "NCT2", "NCT3"]);
    let newest = &feed.window()[0];
    assert!(newest.is_new);
    assert_eq!(newest.name, "Study NCT4");
    assert_eq!(newest.phase, "PHASE3");
    assert_eq!(newest.start_date, "2023-05");

    let requests = api.transport().requests();
    assert_eq!(param(&requests[0], "pageSize"), Some("10"));
    assert_eq!(param(&requests[0], "format"), Some("json"));
    assert_eq!(param(&requests[1], "query.term"), Some("candidate-1"));
}

#[tokio::test(start_paused = true)]
async fn malformed_bodies_count_as_nothing_found() {
    let (feed, api) = engine(vec![
        Ok(studies(&["NCT1"])),
        Ok(json!({ "unexpected": true })),
        Ok(json!("just a string")),
        Ok(json!({ "studies": "not a list" })),
        Ok(studies(&["NCT1", "NCT9"])),
    ]);
    feed.fetch_new_item().await;

    let outcome = feed.fetch_new_item().await;
    assert_eq!(outcome, CycleOutcome::Fallback { id: "NCT9".into(), duplicate: false });
    assert_eq!(api.transport().requests().len(), 5);
    assert_eq!(feed.error(), None);
}

#[tokio::test(start_paused = true)]
async fn all_duplicates_issue_exactly_one_fallback() {
    let (feed, api) = engine(vec![
        Ok(studies(&["NCT1"])),
        Ok(studies(&["NCT1"])),
        Ok(studies(&["NCT1"])),
        Ok(studies(&["NCT1"])),
        Err(UpstreamError::Status { status: 500, body: "boom".into() }),
    ]);
    feed.fetch_new_item().await;

    let outcome = feed.fetch_new_item().await;
    assert!(matches!(outcome, CycleOutcome::Failed(_)));
    let fallbacks = api
        .transport()
        .requests()
        .iter()
        .filter(|r| param(r, "query.term") == Some("fallback"))
        .count();
    assert_eq!(fallbacks, 1);
    assert_eq!(feed.error().as_deref(), Some("API Error: HTTP 500: boom"));
    assert_eq!(ids(&feed), vec!["NCT1"]);
}

#[tokio::test(start_paused = true)]
async fn error_clears_on_the_next_insert() {
    let (feed, _) = engine(vec![
        Err(UpstreamError::Transport("down".into())),
        Err(UpstreamError::Transport("still down".into())),
        Ok(studies(&["NCT7"])),
    ]);
    feed.fetch_new_item().await;
    assert!(feed.error().is_some());
    feed.fetch_new_item().await;
    assert_eq!(feed.error(), None);
    assert_eq!(ids(&feed), vec!["NCT7"]);
}

#[tokio::test(start_paused = true)]
async fn polling_keeps_the_window_bounded_and_flags_expire() {
    let script = (0..20).map(|n| Ok(studies(&[format!("NCT{n}").as_str()]))).collect();
    let (feed, _) = engine(script);
    feed.start();
    tokio::time::sleep(Duration::from_millis(5000 * 14 + 10)).await;
    feed.stop();

    let window = feed.window();
    assert_eq!(window.len(), 10);
    assert_eq!(window[0].id, "NCT14");
    assert_eq!(window.iter().filter(|t| t.is_new).count(), 1);

    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert!(feed.window().iter().all(|t| !t.is_new));
    assert_eq!(feed.state(), FeedState::Idle);
}

#[tokio::test(start_paused = true)]
async fn feed_selection_to_favorites_and_back_out() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));
    let (notifier, mut notices) = ChannelNotifier::new();
    let store = Arc::new(FavoritesStore::new(storage.clone(), Arc::new(notifier)));

    let (feed, _) = engine(vec![Ok(studies(&["NCT1", "NCT2", "NCT3"]))]);
    let mut list = TrialListView::new(feed, store.clone());
    list.feed().load_initial_batch().await.unwrap();
    list.toggle_selection("NCT1");
    list.toggle_selection("NCT3");
    assert_eq!(list.add_selected_to_favorites(), 2);
    assert_eq!(notices.recv().await, Some(FavoritesNotice::BatchAdded(2)));

    let persisted = storage.get(FAVORITES_KEY).unwrap().unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&persisted).unwrap();
    assert_eq!(persisted.as_array().map(Vec::len), Some(2));
    assert!(persisted[0].get("isNew").is_none());

    let mut favorites = FavoritesView::new(store.clone(), FixedConfirmer(Decision::YES));
    favorites.toggle_selection("NCT1");
    favorites.toggle_selection("NCT3");
    assert!(favorites.remove_selected_from_favorites().await);
    assert_eq!(notices.recv().await, Some(FavoritesNotice::BatchRemoved(2)));
    assert!(favorites.favorites().is_empty());
    assert_eq!(storage.get(FAVORITES_KEY).unwrap().as_deref(), Some("[]"));

    list.close();
    favorites.close();
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn corrupt_snapshot_starts_empty_and_unknown_removal_is_silent() {
    let storage = Arc::new(MemoryStore::with_entry(FAVORITES_KEY, "not json"));
    let (notifier, mut notices) = ChannelNotifier::new();
    let store = FavoritesStore::new(storage.clone(), Arc::new(notifier));
    assert!(store.snapshot().is_empty());

    assert_eq!(store.remove_one("X"), None);
    assert_eq!(storage.writes(), 0);
    assert!(notices.try_recv().is_err());

    store.add_many(&[trial("A"), trial("B"), trial("A")]);
    store.remove_many(&["Z".to_string()]);
    assert_eq!(store.snapshot().len(), 2);
}
