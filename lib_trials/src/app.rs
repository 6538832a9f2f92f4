//! # Application Wiring
//!
//! Builds the live objects from an [`AppConfig`]: the HTTP transport, the
//! upstream client, the favorites storage backend and the shared favorites
//! store. Views are created on demand; each feed view gets its own engine
//! and therefore its own seen set.

use std::sync::Arc;
use std::time::Duration;

use crate::configs::AppConfig;
use crate::connections::{FileStore, KeyValueStore};
use crate::error::AppError;
use crate::favorites::{FavoritesStore, LogNotifier, Notifier};
use crate::ingestors::FeedEngine;
use crate::retrieve::HttpTransport;
use crate::upstream::{ClinicalTrialsApi, RandomTermStrategy};
use crate::views::{Confirmer, FavoritesView, TrialListView};

/// The production upstream client.
pub type LiveApi = ClinicalTrialsApi<HttpTransport>;
/// The production feed engine.
pub type LiveFeed = FeedEngine<Arc<LiveApi>, RandomTermStrategy>;
/// The production feed view.
pub type LiveTrialList = TrialListView<Arc<LiveApi>, RandomTermStrategy>;

/// Everything the views need, built once per process.
pub struct App {
    config: AppConfig,
    api: Arc<LiveApi>,
    favorites: Arc<FavoritesStore>,
}

impl App {
    /// Wires the application with notices going to the log.
    ///
    /// # Errors
    /// [`AppError`] when the transport or storage backend cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::with_notifier(config, Arc::new(LogNotifier))
    }

    /// Wires the application with a custom notifier, e.g. a
    /// [`crate::favorites::ChannelNotifier`] feeding a UI.
    ///
    /// # Errors
    /// [`AppError`] when the transport or storage backend cannot be built.
    pub fn with_notifier(
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let transport = HttpTransport::new(
            &config.api_base_url,
            config.transport_retries,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        let api = Arc::new(ClinicalTrialsApi::new(transport));

        let storage = open_storage(config)?;
        let favorites = Arc::new(FavoritesStore::with_key(
            storage,
            notifier,
            &config.favorites_key,
        ));

        tracing::info!(
            api = %config.api_base_url,
            favorites = favorites.snapshot().len(),
            "application wired"
        );
        Ok(Self {
            config: config.clone(),
            api,
            favorites,
        })
    }

    /// The configuration the app was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The upstream client, for lookups such as `get_trial`.
    pub fn api(&self) -> &LiveApi {
        &self.api
    }

    /// The shared favorites store.
    pub fn favorites(&self) -> Arc<FavoritesStore> {
        Arc::clone(&self.favorites)
    }

    /// A fresh, idle feed engine.
    pub fn feed(&self) -> LiveFeed {
        FeedEngine::new(
            Arc::clone(&self.api),
            self.config.search_strategy(),
            self.config.feed_settings(),
        )
    }

    /// A feed view over a fresh engine. `open()` loads the first batch;
    /// polling waits for the engine's `start()` or `toggle()`.
    pub fn trial_list(&self) -> LiveTrialList {
        TrialListView::new(self.feed(), self.favorites())
    }

    /// A favorites view using `confirmer` for removals.
    pub fn favorites_view<C: Confirmer>(&self, confirmer: C) -> FavoritesView<C> {
        FavoritesView::new(self.favorites(), confirmer)
    }
}

/// Redis when a URL is configured and the `connections` feature is on,
/// otherwise one JSON file per key under `storage_dir`.
fn open_storage(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    #[cfg(feature = "connections")]
    {
        if let Some(url) = &config.redis_url {
            let store = crate::connections::RedisStore::new(url, &format!("{}:", config.app_name))
                .map_err(|e| crate::error::StorageError::Backend(e.to_string()))?;
            tracing::info!("favorites stored in redis");
            return Ok(Arc::new(store));
        }
    }

    #[cfg(not(feature = "connections"))]
    {
        if config.redis_url.is_some() {
            tracing::warn!(
                "redisUrl is set but redis support is not compiled in; using file storage"
            );
        }
    }

    std::fs::create_dir_all(&config.storage_dir).map_err(crate::error::StorageError::from)?;
    tracing::info!(dir = %config.storage_dir.display(), "favorites stored on disk");
    Ok(Arc::new(FileStore::new(config.storage_dir.clone())))
}
