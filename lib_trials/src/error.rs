//! # Error Types
//!
//! One `thiserror` enum per concern. Only [`UpstreamError`] ever reaches the
//! feed's caller, and then only as the user-visible message string; storage
//! failures are logged and swallowed by the favorites store.

use thiserror::Error;

/// Errors produced while talking to the upstream search API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Raw error body returned by the server, possibly empty.
        body: String,
    },

    /// The body could not be decoded as JSON.
    #[error("decode failure: {0}")]
    Decode(String),

    /// A request path or base URL could not be joined into an absolute URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Any other backend failure (network store, poisoned lock, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors raised while assembling the runtime configuration.
#[cfg(feature = "configs")]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file was named but could not be found.
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// A layer could not be read, parsed or extracted into the config.
    #[error("config extraction error: {0}")]
    Figment(#[from] figment::Error),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    /// The HTTP transport could not be built.
    #[error("upstream setup failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The favorites storage backend could not be opened.
    #[error("storage setup failed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created or scanned.
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber is already installed, or the filter is invalid.
    #[error("subscriber error: {0}")]
    Subscriber(String),
}
