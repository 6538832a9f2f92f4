//! # Trial
//!
//! The normalized value entity every other module passes around.

use serde::{Deserialize, Serialize};

/// A normalized clinical trial record.
///
/// Display fields are always populated (the adapter fills defaults).
/// `is_new` and `selected` are view-only flags: they are skipped by serde so
/// they never reach the persisted favorites snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    /// Stable external identifier (NCT number).
    pub id: String,
    /// Brief title.
    pub name: String,
    /// Brief summary.
    pub description: String,
    /// First listed phase, or `"Not specified"`.
    pub phase: String,
    /// Overall recruitment status.
    pub status: String,
    /// Start date as reported upstream, empty when unknown.
    pub start_date: String,
    /// Long-form description, when the record carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    /// True for a short window after the trial entered the feed.
    #[serde(skip)]
    pub is_new: bool,
    /// Multi-select membership as rendered by a view.
    #[serde(skip)]
    pub selected: bool,
}

impl Trial {
    /// Returns a copy with both transient flags cleared, the form stored in
    /// favorites.
    pub fn settled(&self) -> Self {
        Self {
            is_new: false,
            selected: false,
            ..self.clone()
        }
    }
}
