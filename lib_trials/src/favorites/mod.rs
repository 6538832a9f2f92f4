//! # Favorites Module
//!
//! The persisted, observable favorites collection and the notices its
//! mutations produce.
//!
//! ## Contained Modules:
//! - **`store`**: `FavoritesStore`, the shared collection with idempotent
//!   single and batch add/remove, a replaying subscription and best-effort
//!   snapshot persistence.
//! - **`notifications`**: `FavoritesNotice` and the `Notifier` capability,
//!   with logging and channel-backed implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Favorites notices and notifier backends.
pub mod notifications;
/// The favorites collection itself.
pub mod store;

pub use notifications::{ChannelNotifier, FavoritesNotice, LogNotifier, Notifier};
pub use store::{FavoritesStore, FAVORITES_KEY};
