//! # Data Ingestors Module
//!
//! Clients that pull trials out of the upstream registry and keep them
//! presentable.
//!
//! ## Purpose:
//! The upstream search has no "what's new" endpoint, so the feed manufactures
//! novelty: it samples random queries, remembers every id it has already
//! shown this session and keeps a small rolling window of the results.
//!
//! ## Contained Modules:
//! - **`trial_polling`**: The self-scheduling `FeedEngine` (timer, fetch
//!   cycle with retries and fallback, seen-set bookkeeping, new-flag expiry).
//! - **`window`**: `FeedWindow`, the bounded newest-first list the engine
//!   publishes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The self-scheduling live trial feed.
pub mod trial_polling;
/// The bounded rolling window of visible trials.
pub mod window;

// --- Public API Re-exports ---
pub use trial_polling::{CycleOutcome, FeedEngine, FeedSettings, FeedState};
pub use window::{FeedWindow, WINDOW_CAPACITY};
