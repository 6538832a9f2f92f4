//! # Data Retrieval Module
//!
//! This module provides the concrete network plumbing behind the upstream
//! `Transport` seam, primarily focused on HTTP-based interactions.
//!
//! ## Purpose:
//! The goal of the `retrieve` module is to offer a consistent and robust way
//! to fetch data from external services, encapsulating common concerns such
//! as HTTP request building, status handling, and retry mechanisms. The
//! upstream client can then focus on query shaping and normalization.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `HttpTransport`, built on `reqwest` and
//!   `reqwest-middleware`, featuring automatic retries with exponential
//!   backoff for transient failures.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// JSON-over-HTTP transport with retry middleware.
pub mod ky_http;

pub use ky_http::HttpTransport;
