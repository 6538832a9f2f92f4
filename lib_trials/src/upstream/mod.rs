//! # Upstream Module
//!
//! Everything that knows about the ClinicalTrials.gov v2 search API.
//!
//! ## Contained Modules:
//!
//! - **`adapter`**: Pure, total normalization of raw study JSON into `Trial`.
//!   All defensive field extraction lives here.
//! - **`query`**: The typed search request and the pluggable
//!   `SearchStrategy` the live feed uses to vary its candidate and fallback
//!   queries.
//! - **`client`**: The `Transport` and `TrialSource` seams and the
//!   `ClinicalTrialsApi` client joining them.
//!
//! Network concerns (retries at the HTTP layer, timeouts, headers) stay in
//! `retrieve`; this module only shapes requests and interprets responses.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Raw study record normalization.
pub mod adapter;
/// Upstream HTTP-agnostic client and its seams.
pub mod client;
/// Search query building and strategies.
pub mod query;

// --- Public API Re-exports ---
pub use adapter::{normalize, parse_search_response};
pub use client::{ClinicalTrialsApi, Transport, TrialSource};
pub use query::{FallbackMode, RandomTermStrategy, SearchQuery, SearchStrategy};
