//! Layered runtime configuration.
//!
//! Values are resolved through [`figment`] in three layers, later ones
//! winning field by field: built-in defaults, an optional camelCase JSON
//! file, then `TRIALS_*` environment variables (a `.env` file in the working
//! directory is loaded into the environment first).
//!
//! Environment names map onto the camelCase keys, so `TRIALS_POLL_INTERVAL_MS`
//! sets `pollIntervalMs`. List values use figment's array syntax:
//! `TRIALS_STATUSES=[RECRUITING,COMPLETED]`.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::favorites::FAVORITES_KEY;
use crate::ingestors::FeedSettings;
use crate::upstream::query::DEFAULT_STATUSES;
use crate::upstream::{FallbackMode, RandomTermStrategy};

/// Default upstream API root.
pub const DEFAULT_API_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/";
/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "TRIALS_";
/// Environment variable naming the JSON file when no path is passed.
pub const CONFIG_FILE_ENV: &str = "TRIALS_CONFIG_FILE";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub page_size: u32,
    pub window_capacity: usize,
    pub poll_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub max_attempts: u32,
    pub new_flag_ms: u64,
    pub statuses: Vec<String>,
    pub fallback: FallbackMode,
    pub conditions: Vec<String>,
    pub transport_retries: u32,
    pub request_timeout_ms: u64,
    pub favorites_key: String,
    pub storage_dir: PathBuf,
    pub redis_url: Option<String>,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: 10,
            window_capacity: 10,
            poll_interval_ms: 5000,
            retry_delay_ms: 300,
            max_attempts: 3,
            new_flag_ms: 3000,
            statuses: DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
            fallback: FallbackMode::Relaxed,
            conditions: ["cancer", "diabetes", "asthma", "alzheimer", "covid", "heart failure"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            transport_retries: 2,
            request_timeout_ms: 10_000,
            favorites_key: FAVORITES_KEY.to_string(),
            storage_dir: PathBuf::from("./data"),
            redis_url: None,
            log_dir: PathBuf::from("./logs"),
            log_level: "info".to_string(),
            app_name: "trial_feed".to_string(),
        }
    }
}

impl AppConfig {
    /// Rejects values the feed cannot run with.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid("windowCapacity must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("maxAttempts must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("pageSize must be at least 1".into()));
        }
        let absolute = ["http://", "https://"]
            .iter()
            .any(|scheme| {
                self.api_base_url.starts_with(scheme) && self.api_base_url.len() > scheme.len()
            });
        if !absolute {
            return Err(ConfigError::Invalid(format!(
                "apiBaseUrl must be an absolute http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if self.fallback == FallbackMode::Condition && self.conditions.is_empty() {
            return Err(ConfigError::Invalid(
                "fallback 'condition' needs at least one entry in conditions".into(),
            ));
        }
        Ok(())
    }

    /// Engine timing and sizing derived from this configuration.
    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_attempts: self.max_attempts,
            new_flag_duration: Duration::from_millis(self.new_flag_ms),
            batch_size: self.page_size,
            window_capacity: self.window_capacity,
            statuses: self.statuses.clone(),
        }
    }

    /// Logging options for [`crate::loggers::setup_logging`].
    #[cfg(feature = "loggers")]
    pub fn logging_config(&self) -> crate::loggers::LoggingConfig {
        crate::loggers::LoggingConfig {
            app_name: self.app_name.clone(),
            log_dir: self.log_dir.clone(),
            level: self.log_level.clone(),
            ..Default::default()
        }
    }

    /// The default search strategy configured by this file.
    pub fn search_strategy(&self) -> RandomTermStrategy {
        RandomTermStrategy::new(
            self.statuses.clone(),
            self.page_size,
            self.fallback,
            self.conditions.clone(),
        )
    }
}

/// Maps an environment name with the prefix stripped onto its camelCase
/// key: `POLL_INTERVAL_MS` becomes `pollIntervalMs`.
fn env_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = !key.is_empty();
        } else if upper {
            key.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            key.push(ch.to_ascii_lowercase());
        }
    }
    key
}

/// The provider stack behind [`load_config`], without `.env` loading or
/// validation.
pub fn providers(file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if let Some(file) = file {
        figment = figment.merge(Json::file(file));
    }
    figment.merge(
        Env::prefixed(ENV_PREFIX)
            .lowercase(false)
            .map(|name| env_key(name.as_str()).into()),
    )
}

/// Resolves the configuration from defaults, a JSON file and the
/// environment, then validates it.
///
/// The file is `path` when given, else the file named by
/// `TRIALS_CONFIG_FILE`, else none. A named file that does not exist is an
/// error. A blank `redisUrl` leaves Redis disabled.
///
/// # Errors
/// Any [`ConfigError`] from reading, parsing or validating.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match dotenvy::dotenv() {
        Ok(env_file) => tracing::debug!(path = %env_file.display(), ".env loaded"),
        Err(error) if error.not_found() => {}
        Err(error) => return Err(ConfigError::Invalid(format!(".env: {error}"))),
    }

    let file = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));
    if let Some(file) = &file {
        if !file.is_file() {
            return Err(ConfigError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("config file {} not found", file.display()),
            )));
        }
        tracing::debug!(path = %file.display(), "config file layered");
    }

    let mut config: AppConfig = providers(file.as_deref()).extract()?;
    config.redis_url = config.redis_url.filter(|url| !url.trim().is_empty());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_the_feed_constants() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        let settings = config.feed_settings();
        assert_eq!(settings, FeedSettings::default());
        assert_eq!(config.favorites_key, "trialFavorites");
    }

    #[test]
    fn env_names_map_to_camel_case_keys() {
        assert_eq!(env_key("POLL_INTERVAL_MS"), "pollIntervalMs");
        assert_eq!(env_key("api_base_url"), "apiBaseUrl");
        assert_eq!(env_key("FALLBACK"), "fallback");
    }

    #[test]
    fn file_layer_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "trials.json",
                r#"{ "pollIntervalMs": 1000, "fallback": "randomLetter",
                     "statuses": ["COMPLETED"] }"#,
            )?;
            let config = load_config(Some(Path::new("trials.json")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.poll_interval_ms, 1000);
            assert_eq!(config.fallback, FallbackMode::RandomLetter);
            assert_eq!(config.statuses, vec!["COMPLETED"]);
            assert_eq!(config.retry_delay_ms, 300);
            Ok(())
        });
    }

    #[test]
    fn env_layer_wins_over_the_file() {
        Jail::expect_with(|jail| {
            jail.create_file("trials.json", r#"{ "maxAttempts": 4, "pageSize": 20 }"#)?;
            jail.set_env("TRIALS_MAX_ATTEMPTS", "5");
            jail.set_env("TRIALS_STATUSES", "[RECRUITING, COMPLETED]");
            jail.set_env("TRIALS_FALLBACK", "condition");
            jail.set_env("TRIALS_REDIS_URL", "redis://127.0.0.1/");

            let config = load_config(Some(Path::new("trials.json")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.max_attempts, 5);
            assert_eq!(config.page_size, 20);
            assert_eq!(config.statuses, vec!["RECRUITING", "COMPLETED"]);
            assert_eq!(config.fallback, FallbackMode::Condition);
            assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
            Ok(())
        });
    }

    #[test]
    fn config_file_env_names_the_file() {
        Jail::expect_with(|jail| {
            jail.create_file("feed.json", r#"{ "windowCapacity": 4 }"#)?;
            jail.set_env(CONFIG_FILE_ENV, "feed.json");
            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.window_capacity, 4);
            Ok(())
        });
    }

    #[test]
    fn bad_env_numbers_are_reported() {
        Jail::expect_with(|jail| {
            jail.set_env("TRIALS_PAGE_SIZE", "ten");
            let err = load_config(None).err().map(|e| e.to_string()).unwrap_or_default();
            assert!(err.contains("pageSize"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn blank_redis_url_disables_redis() {
        Jail::expect_with(|jail| {
            jail.set_env("TRIALS_REDIS_URL", "  ");
            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.redis_url, None);
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_unusable_values() {
        let zero_window = AppConfig {
            window_capacity: 0,
            ..AppConfig::default()
        };
        assert!(zero_window.validate().is_err());

        let zero_attempts = AppConfig {
            max_attempts: 0,
            ..AppConfig::default()
        };
        assert!(zero_attempts.validate().is_err());

        let relative = AppConfig {
            api_base_url: "api/v2".into(),
            ..AppConfig::default()
        };
        assert!(relative.validate().is_err());

        let no_conditions = AppConfig {
            fallback: FallbackMode::Condition,
            conditions: Vec::new(),
            ..AppConfig::default()
        };
        assert!(no_conditions.validate().is_err());
    }
}
