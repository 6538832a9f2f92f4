//! The confirmation capability removals are gated on.

use std::future::Future;

use crate::favorites::notifications::trials_word;

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    /// True only on an explicit affirmative answer.
    pub confirmed: bool,
}

impl Decision {
    /// An affirmative answer.
    pub const YES: Self = Self { confirmed: true };
    /// A refusal or dismissal.
    pub const NO: Self = Self { confirmed: false };
}

/// Asks the user to confirm a destructive action.
pub trait Confirmer: Send + Sync {
    /// Shows `message` and resolves once the user has answered.
    fn ask(&self, message: &str) -> impl Future<Output = Decision> + Send;
}

/// Answers every prompt the same way. Useful for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmer(pub Decision);

impl Confirmer for FixedConfirmer {
    async fn ask(&self, message: &str) -> Decision {
        tracing::debug!(confirmed = self.0.confirmed, message, "confirmation answered");
        self.0
    }
}

/// Text of the single-removal prompt.
pub fn remove_one_prompt(name: &str) -> String {
    format!("Are you sure you want to remove \"{name}\" from your favorites?")
}

/// Text of the batch-removal prompt.
pub fn remove_selected_prompt(count: usize) -> String {
    format!(
        "Are you sure you want to remove {count} selected {} from your favorites?",
        trials_word(count)
    )
}
