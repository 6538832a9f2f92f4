//! # Redis Snapshot Store
//!
//! A [`KeyValueStore`] backed by Redis `GET`/`SET`, for deployments where
//! several processes share one favorites snapshot.

use redis::{Client, Commands, RedisResult};

use crate::connections::kv_store::KeyValueStore;
use crate::error::StorageError;

/// A handler for Redis key-value interactions.
pub struct RedisStore {
    /// The internal Redis client instance.
    client: Client,
    /// Prefix prepended to every slot key.
    namespace: String,
}

impl RedisStore {
    /// Creates a new store from a connection string.
    ///
    /// Opening the client does not connect yet; the first `get`/`set` does.
    ///
    /// # Arguments
    /// * `url` - The redis URL (e.g., "redis://127.0.0.1/").
    /// * `namespace` - Prefix for slot keys, e.g. `"trials:"`.
    pub fn new(url: &str, namespace: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    fn slot(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        conn.get(self.slot(key))
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let _: () = conn
            .set(self.slot(key), value)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let store = RedisStore::new("redis://127.0.0.1/", "trials:").unwrap();
        assert_eq!(store.slot("trialFavorites"), "trials:trialFavorites");
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(RedisStore::new("not a url", "").is_err());
    }

    #[test]
    #[ignore] // requires a running redis
    fn live_round_trip() {
        let store = RedisStore::new("redis://127.0.0.1/", "lib_trials_test:").unwrap();
        store.set("slot", "[]").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("[]"));
    }
}
