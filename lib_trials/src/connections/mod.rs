//! # Connections Module
//!
//! This module handles the storage backends the favorites snapshot is
//! persisted to.

/// The key-value capability plus in-memory and file backends.
pub mod kv_store;

/// Redis-backed key-value store.
#[cfg(feature = "connections")]
pub mod cache_redis;

pub use kv_store::{FileStore, KeyValueStore, MemoryStore};

#[cfg(feature = "connections")]
pub use cache_redis::RedisStore;
