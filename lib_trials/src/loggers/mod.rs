//! # Loggers Module
//!
//! Process-wide `tracing` setup: env filter, console output and a
//! timestamped, rotated log file written off the hot path.

/// Subscriber installation and log file rotation.
pub mod logger_file;

pub use logger_file::{log_file_name, rotate_logs, setup_logging, LoggingConfig, LoggingGuard};
