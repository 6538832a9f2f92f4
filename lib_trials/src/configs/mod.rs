//! # Configuration Modules
//!
//! Runtime configuration for the feed, the favorites storage and logging,
//! resolved through figment from defaults, an optional JSON file and `TRIALS_*` environment
//! variables (with `.env` support).

/// Layered application configuration.
pub mod app_config;

pub use app_config::{
    load_config, providers, AppConfig, CONFIG_FILE_ENV, DEFAULT_API_BASE_URL, ENV_PREFIX,
};
