//! # lib_trials
//!
//! A live clinical-trial feed and a persisted favorites collection.
//!
//! The feed samples the ClinicalTrials.gov v2 search API with randomized
//! queries, dedupes against everything it has shown this session and keeps a
//! rolling window of the newest trials. Favorites are a shared, observable
//! collection persisted as one snapshot in a key-value slot.
//!
//! ## Feature gates
//! - `retrieve` (default): reqwest-based HTTP transport with retries.
//! - `configs` (default): layered JSON / environment configuration.
//! - `loggers` (default): tracing subscriber with rotated log files.
//! - `connections`: Redis backend for the favorites snapshot.
//!
//! The domain modules (`models`, `upstream`, `favorites`, `ingestors`,
//! `views`) are always compiled and only depend on the seams they declare.

pub mod connections;
pub mod error;
pub mod favorites;
pub mod ingestors;
pub mod models;
pub mod upstream;
pub mod views;

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(all(feature = "retrieve", feature = "configs"))]
pub mod app;

#[cfg(feature = "configs")]
pub use error::ConfigError;
pub use error::{AppError, LoggingError, StorageError, UpstreamError};
pub use favorites::{FavoritesNotice, FavoritesStore, Notifier};
pub use ingestors::{CycleOutcome, FeedEngine, FeedSettings, FeedState, FeedWindow};
pub use models::Trial;
pub use upstream::{ClinicalTrialsApi, SearchQuery, SearchStrategy, Transport, TrialSource};
pub use views::{Confirmer, Decision, FavoritesView, TrialListView};

#[cfg(all(feature = "retrieve", feature = "configs"))]
pub use app::App;
