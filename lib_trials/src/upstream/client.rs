//! # ClinicalTrials.gov Client
//!
//! Two seams meet here. [`Transport`] is the raw "GET and parse JSON"
//! capability (the reqwest-backed implementation lives in
//! `retrieve::ky_http`). [`TrialSource`] is what the live feed consumes: a
//! search that already yields normalized trials. [`ClinicalTrialsApi`]
//! bridges the two through the adapter.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::UpstreamError;
use crate::models::Trial;
use crate::upstream::adapter::{normalize, parse_search_response};
use crate::upstream::query::SearchQuery;

/// Path of the search endpoint relative to the API base URL.
pub const STUDIES_PATH: &str = "studies";

/// Performs a GET against a path relative to the API base and returns the
/// decoded JSON body.
pub trait Transport: Send + Sync + 'static {
    /// Issues the request. Non-success statuses map to
    /// [`UpstreamError::Status`].
    fn get_json(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send;
}

/// A search capability returning normalized trials.
pub trait TrialSource: Send + Sync + 'static {
    /// Runs one search. A malformed body is an empty result, not an error.
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Trial>, UpstreamError>> + Send;
}

impl<S: TrialSource> TrialSource for Arc<S> {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Trial>, UpstreamError>> + Send {
        (**self).search(query)
    }
}

/// Upstream client for the ClinicalTrials.gov v2 API.
pub struct ClinicalTrialsApi<T> {
    transport: T,
}

impl<T: Transport> ClinicalTrialsApi<T> {
    /// Wraps a transport already pointed at the API base URL.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches a single study by NCT id.
    ///
    /// # Errors
    /// Returns [`UpstreamError::InvalidUrl`] for ids that are not plain
    /// alphanumerics, or whatever the transport reports.
    pub async fn get_trial(&self, nct_id: &str) -> Result<Trial, UpstreamError> {
        if nct_id.is_empty() || !nct_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(UpstreamError::InvalidUrl(format!("bad study id '{nct_id}'")));
        }
        let path = format!("{STUDIES_PATH}/{nct_id}");
        let body = self
            .transport
            .get_json(&path, &[("format", "json".to_string())])
            .await?;
        Ok(normalize(&body))
    }
}

impl<T: Transport> TrialSource for ClinicalTrialsApi<T> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Trial>, UpstreamError> {
        let params = query.to_params();
        let body = self.transport.get_json(STUDIES_PATH, &params).await?;
        let trials = parse_search_response(&body);
        tracing::trace!(count = trials.len(), term = ?query.term, "search completed");
        Ok(trials)
    }
}
