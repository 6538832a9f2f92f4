//! # Live Trial Feed
//!
//! A self-scheduling ingestor that keeps pulling "new" trials out of a noisy,
//! randomized upstream search and shows them in a bounded rolling window.
//!
//! ## Lifecycle:
//! - **Idle → Polling**: `start()` spawns a repeating timer task. Its first
//!   tick fires immediately, then one tick per poll interval. Every tick
//!   spawns an independent fetch cycle.
//! - **Polling → Idle**: `stop()` cancels the timer task only. A cycle that is
//!   still retrying runs to completion and may update the window after the
//!   feed is nominally stopped.
//! - **Initial batch**: `load_initial_batch()` runs outside the timer and
//!   replaces the window wholesale.
//!
//! ## Fetch cycle:
//! 1. Ask the strategy for a candidate query and search.
//! 2. The first returned trial whose id this session has not seen is
//!    accepted and inserted.
//! 3. Empty or already-seen results wait the retry delay and try again, up
//!    to `max_attempts`. A transport failure skips the remaining attempts.
//! 4. Fallback: one broader batch search. An unseen trial is picked
//!    uniformly at random; if every id was seen, a duplicate is accepted so
//!    the window still advances. Only a failed fallback produces a
//!    user-visible error, and the timer keeps running.
//!
//! Overlapping cycles are not serialized. The seen set is checked and
//! updated atomically so two cycles never both claim one unseen id, but the
//! window only guarantees "at most capacity entries" and "the latest insert
//! is at the front, flagged new".

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::{sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::UpstreamError;
use crate::ingestors::window::{FeedWindow, WINDOW_CAPACITY};
use crate::models::Trial;
use crate::upstream::query::{SearchQuery, SearchStrategy, DEFAULT_STATUSES};
use crate::upstream::TrialSource;

/// Timing and sizing knobs of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Time between timer ticks.
    pub poll_interval: Duration,
    /// Pause between candidate attempts within one cycle.
    pub retry_delay: Duration,
    /// Candidate attempts per cycle before the fallback path.
    pub max_attempts: u32,
    /// How long a freshly inserted trial stays flagged new.
    pub new_flag_duration: Duration,
    /// Page size of the initial batch.
    pub batch_size: u32,
    /// Maximum number of visible trials.
    pub window_capacity: usize,
    /// Status filter of the initial batch.
    pub statuses: Vec<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(300),
            max_attempts: 3,
            new_flag_duration: Duration::from_millis(3000),
            batch_size: 10,
            window_capacity: WINDOW_CAPACITY,
            statuses: DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Whether the repeating timer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No timer.
    Idle,
    /// Timer running.
    Polling,
}

/// What one fetch cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A candidate query produced an unseen trial.
    Accepted {
        /// Id of the inserted trial.
        id: String,
        /// Attempt number that produced it, starting at 1.
        attempt: u32,
    },
    /// The fallback batch produced the inserted trial.
    Fallback {
        /// Id of the inserted trial.
        id: String,
        /// True when every id in the batch had been seen already.
        duplicate: bool,
    },
    /// The fallback failed; the window is unchanged and the message is now
    /// the feed's error.
    Failed(String),
}

/// Per-session mutable state that is not the window itself.
#[derive(Debug, Default)]
struct Session {
    seen: HashSet<String>,
    error: Option<String>,
    loading: bool,
}

struct FeedInner<S, G> {
    source: S,
    strategy: G,
    settings: FeedSettings,
    window: watch::Sender<FeedWindow>,
    session: Mutex<Session>,
    timer: Mutex<Option<CancellationToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The live feed engine.
///
/// Dropping it stops the timer.
pub struct FeedEngine<S, G> {
    inner: Arc<FeedInner<S, G>>,
}

impl<S: TrialSource, G: SearchStrategy> FeedEngine<S, G> {
    /// Creates an idle feed with an empty window.
    pub fn new(source: S, strategy: G, settings: FeedSettings) -> Self {
        let (window, _) = watch::channel(FeedWindow::new(settings.window_capacity));
        Self {
            inner: Arc::new(FeedInner {
                source,
                strategy,
                settings,
                window,
                session: Mutex::new(Session::default()),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Fetches a full batch and replaces the window with it.
    ///
    /// On failure the window is left as it was and the error message
    /// ("Failed to load trials: ...") becomes the feed's error.
    ///
    /// # Errors
    /// Returns the upstream error that aborted the load.
    pub async fn load_initial_batch(&self) -> Result<usize, UpstreamError> {
        {
            let mut session = lock(&self.inner.session);
            session.loading = true;
            session.error = None;
        }

        let settings = &self.inner.settings;
        let query = SearchQuery::batch(settings.batch_size, &settings.statuses);
        let result = self.inner.source.search(&query).await;

        let mut session = lock(&self.inner.session);
        session.loading = false;
        match result {
            Ok(batch) => {
                session.seen.extend(batch.iter().map(|t| t.id.clone()));
                drop(session);
                self.inner.window.send_modify(|window| window.replace(batch));
                let shown = self.inner.window.borrow().len();
                tracing::info!(shown, "initial batch loaded");
                Ok(shown)
            }
            Err(error) => {
                tracing::error!(%error, "initial batch failed");
                session.error = Some(format!("Failed to load trials: {error}"));
                Err(error)
            }
        }
    }

    /// Starts polling: one cycle right away, then one per interval. Does
    /// nothing when already polling. Must be called inside a tokio runtime.
    pub fn start(&self) {
        let token = {
            let mut timer = lock(&self.inner.timer);
            if timer.is_some() {
                return;
            }
            let token = CancellationToken::new();
            *timer = Some(token.clone());
            token
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.settings.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let chain = Arc::clone(&inner);
                        tokio::spawn(async move {
                            chain.run_cycle().await;
                        });
                    }
                }
            }
            tracing::debug!("feed timer stopped");
        });
        tracing::info!(
            interval_ms = self.inner.settings.poll_interval.as_millis() as u64,
            "feed polling started"
        );
    }

    /// Stops the timer. Safe to call when idle. In-flight cycles finish.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.inner.timer).take() {
            token.cancel();
            tracing::info!("feed polling stopped");
        }
    }

    /// Starts when idle, stops when polling.
    pub fn toggle(&self) {
        match self.state() {
            FeedState::Idle => self.start(),
            FeedState::Polling => self.stop(),
        }
    }

    /// Runs one fetch cycle to completion outside the timer.
    pub async fn fetch_new_item(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }

    /// Current timer state.
    pub fn state(&self) -> FeedState {
        if lock(&self.inner.timer).is_some() {
            FeedState::Polling
        } else {
            FeedState::Idle
        }
    }

    /// Copy of the visible trials, newest first.
    pub fn window(&self) -> Vec<Trial> {
        self.inner.window.borrow().items().to_vec()
    }

    /// Finds a visible trial by id.
    pub fn visible(&self, id: &str) -> Option<Trial> {
        self.inner.window.borrow().get(id).cloned()
    }

    /// Observes the window; the receiver starts with the current contents.
    pub fn subscribe(&self) -> watch::Receiver<FeedWindow> {
        let mut receiver = self.inner.window.subscribe();
        receiver.mark_changed();
        receiver
    }

    /// Last user-visible error, cleared by the next successful insert or load.
    pub fn error(&self) -> Option<String> {
        lock(&self.inner.session).error.clone()
    }

    /// True while the initial batch request is in flight.
    pub fn is_loading(&self) -> bool {
        lock(&self.inner.session).loading
    }

    /// Whether this session has already shown `id`.
    pub fn has_seen(&self, id: &str) -> bool {
        lock(&self.inner.session).seen.contains(id)
    }

    /// Number of distinct ids shown this session.
    pub fn seen_count(&self) -> usize {
        lock(&self.inner.session).seen.len()
    }

    /// The settings the feed runs with.
    pub fn settings(&self) -> &FeedSettings {
        &self.inner.settings
    }
}

impl<S, G> Drop for FeedEngine<S, G> {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.inner.timer).take() {
            token.cancel();
        }
    }
}

impl<S: TrialSource, G: SearchStrategy> FeedInner<S, G> {
    async fn run_cycle(self: &Arc<Self>) -> CycleOutcome {
        let max_attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let query = self.strategy.candidate(attempt);
            match self.source.search(&query).await {
                Ok(trials) => {
                    if let Some(trial) = self.claim_unseen(trials) {
                        let id = trial.id.clone();
                        self.accept(trial);
                        tracing::debug!(%id, attempt, "candidate accepted");
                        return CycleOutcome::Accepted { id, attempt };
                    }
                    tracing::debug!(attempt, max_attempts, "candidate empty or already seen");
                }
                Err(error) => {
                    tracing::warn!(attempt, %error, "candidate fetch failed; falling back");
                    return self.run_fallback().await;
                }
            }
            if attempt < max_attempts {
                sleep(self.settings.retry_delay).await;
            }
        }
        self.run_fallback().await
    }

    async fn run_fallback(self: &Arc<Self>) -> CycleOutcome {
        let query = self.strategy.fallback();
        match self.source.search(&query).await {
            Ok(batch) if !batch.is_empty() => {
                let (trial, duplicate) = self.pick_fallback(batch);
                let id = trial.id.clone();
                self.accept(trial);
                if duplicate {
                    tracing::info!(%id, "fallback batch held only seen trials; showing a repeat");
                }
                CycleOutcome::Fallback { id, duplicate }
            }
            Ok(_) => self.fail("no trials available".to_string()),
            Err(error) => self.fail(error.to_string()),
        }
    }

    /// Atomically takes the first trial whose id has not been seen.
    fn claim_unseen(&self, trials: Vec<Trial>) -> Option<Trial> {
        let mut session = lock(&self.session);
        let trial = trials.into_iter().find(|t| !session.seen.contains(&t.id))?;
        session.seen.insert(trial.id.clone());
        Some(trial)
    }

    /// Picks uniformly among unseen trials, or among all of them when none
    /// is unseen. `batch` must not be empty.
    fn pick_fallback(&self, mut batch: Vec<Trial>) -> (Trial, bool) {
        let mut session = lock(&self.session);
        let unseen: Vec<usize> = (0..batch.len())
            .filter(|&i| !session.seen.contains(&batch[i].id))
            .collect();
        let mut rng = rand::rng();
        let (index, duplicate) = if unseen.is_empty() {
            (rng.random_range(0..batch.len()), true)
        } else {
            (unseen[rng.random_range(0..unseen.len())], false)
        };
        let trial = batch.swap_remove(index);
        session.seen.insert(trial.id.clone());
        (trial, duplicate)
    }

    fn accept(self: &Arc<Self>, trial: Trial) {
        lock(&self.session).error = None;
        self.window.send_modify(|window| {
            window.insert(trial);
        });
        self.schedule_flag_clear();
    }

    /// Clears every `is_new` flag once the display delay has passed. The
    /// pass runs over whatever the window holds then, so a flag can never
    /// outlive its slot.
    fn schedule_flag_clear(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            sleep(inner.settings.new_flag_duration).await;
            inner.window.send_if_modified(FeedWindow::clear_new_flags);
        });
    }

    fn fail(&self, reason: String) -> CycleOutcome {
        let message = format!("API Error: {reason}");
        tracing::error!(%reason, "fallback fetch failed");
        lock(&self.session).error = Some(message.clone());
        CycleOutcome::Failed(message)
    }
}
