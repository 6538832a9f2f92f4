//! # Favorites Notifications
//!
//! Every favorites mutation (and every refused one) produces exactly one
//! [`FavoritesNotice`], handed to a [`Notifier`] fire-and-forget. The notice
//! carries the minimal display data; [`FavoritesNotice::title`] and
//! [`FavoritesNotice::message`] render the text a toast would show.

use tokio::sync::mpsc;

use crate::models::Trial;

/// Outcome of one favorites operation, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesNotice {
    /// A single trial was appended.
    Added(Trial),
    /// A single add was refused because the id is already present.
    AlreadyPresent(Trial),
    /// A batch add appended this many trials.
    BatchAdded(usize),
    /// A batch add found nothing new.
    NoNewItems,
    /// A single trial, named here, was removed.
    Removed(String),
    /// A batch removal was requested for this many ids.
    BatchRemoved(usize),
}

pub(crate) fn trials_word(count: usize) -> &'static str {
    if count == 1 {
        "trial"
    } else {
        "trials"
    }
}

impl FavoritesNotice {
    /// Short headline.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Added(_) | Self::BatchAdded(_) => "Added to Favorites!",
            Self::AlreadyPresent(_) => "Already in Favorites",
            Self::NoNewItems => "No New Items",
            Self::Removed(_) | Self::BatchRemoved(_) => "Removed from Favorites",
        }
    }

    /// Body text.
    pub fn message(&self) -> String {
        match self {
            Self::Added(trial) => format!("\"{}\" has been added to your favorites", trial.name),
            Self::AlreadyPresent(trial) => {
                format!("\"{}\" is already in your favorites", trial.name)
            }
            Self::BatchAdded(n) => format!("{n} {} added to your favorites", trials_word(*n)),
            Self::NoNewItems => "All selected trials are already in your favorites".to_string(),
            Self::Removed(name) => format!("\"{name}\" has been removed from your favorites"),
            Self::BatchRemoved(n) => format!("{n} {} removed from your favorites", trials_word(*n)),
        }
    }

    /// Informational notices report a refused or empty operation.
    pub fn is_info(&self) -> bool {
        matches!(self, Self::AlreadyPresent(_) | Self::NoNewItems)
    }
}

/// Receives favorites notices. Must not block.
pub trait Notifier: Send + Sync {
    /// Delivers one notice.
    fn notify(&self, notice: FavoritesNotice);
}

/// Writes every notice to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: FavoritesNotice) {
        tracing::info!(title = notice.title(), "{}", notice.message());
    }
}

/// Forwards notices over an unbounded channel to whatever renders them.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<FavoritesNotice>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiving half for the UI task.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FavoritesNotice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: FavoritesNotice) {
        if self.sender.send(notice).is_err() {
            tracing::debug!("notice receiver dropped; notice discarded");
        }
    }
}
