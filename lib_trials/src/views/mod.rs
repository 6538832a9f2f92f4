//! # Views Module
//!
//! Headless view-models for the two screens: the live feed and the
//! favorites list. Rendering is left to whatever consumes them.
//!
//! ## Contained Modules:
//! - **`trial_list`**: `TrialListView`, owning the feed engine, its
//!   selection and the favorite actions taken from the feed.
//! - **`favorites`**: `FavoritesView`, a subscribed mirror of the favorites
//!   with confirmation-gated removals.
//! - **`confirm`**: The `Confirmer` capability and prompt texts.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Confirmation capability.
pub mod confirm;
/// The favorites view.
pub mod favorites;
/// The live feed view.
pub mod trial_list;

pub use confirm::{Confirmer, Decision, FixedConfirmer};
pub use favorites::FavoritesView;
pub use trial_list::TrialListView;
