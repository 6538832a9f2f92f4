//! # Search Queries & Strategies
//!
//! [`SearchQuery`] is the typed form of one `GET /studies` request.
//! [`SearchStrategy`] decides which query the feed sends for a candidate
//! attempt and which one it sends on the fallback path; the default
//! [`RandomTermStrategy`] uses a random single-letter term to get varied
//! results out of an otherwise stable search index.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fields requested from the API; everything the adapter reads.
pub const STUDY_FIELDS: &str =
    "NCTId,BriefTitle,BriefSummary,DetailedDescription,Phase,OverallStatus,StartDate";

/// Status filter used when the configuration does not override it.
pub const DEFAULT_STATUSES: [&str; 2] = ["RECRUITING", "ACTIVE_NOT_RECRUITING"];

/// Highest random offset a candidate query may use.
const MAX_CANDIDATE_OFFSET: u32 = 20;

/// One search request against the studies endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Number of studies per page.
    pub page_size: u32,
    /// `filter.overallStatus` values; empty means no status filter.
    pub statuses: Vec<String>,
    /// Free-text `query.term`.
    pub term: Option<String>,
    /// Condition/topic `query.cond`.
    pub condition: Option<String>,
    /// Result offset.
    pub offset: Option<u32>,
}

impl SearchQuery {
    /// A plain batch query with the given page size and status filter.
    pub fn batch(page_size: u32, statuses: &[String]) -> Self {
        Self {
            page_size,
            statuses: statuses.to_vec(),
            term: None,
            condition: None,
            offset: None,
        }
    }

    /// Renders the query string pairs in the order the API documents them.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("countTotal", "false".to_string()),
            ("fields", STUDY_FIELDS.to_string()),
        ];
        if !self.statuses.is_empty() {
            params.push(("filter.overallStatus", self.statuses.join(",")));
        }
        if let Some(term) = &self.term {
            params.push(("query.term", term.clone()));
        }
        if let Some(condition) = &self.condition {
            params.push(("query.cond", condition.clone()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        params
    }
}

/// Which broader query the feed issues once its candidate retries are spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackMode {
    /// A full page with only the status filter applied.
    #[default]
    Relaxed,
    /// A full page for a randomly chosen condition/topic.
    Condition,
    /// A full page for a random single-letter term.
    RandomLetter,
}

/// Pluggable query policy for the live feed.
pub trait SearchStrategy: Send + Sync + 'static {
    /// Query for one candidate attempt; `attempt` starts at 1.
    fn candidate(&self, attempt: u32) -> SearchQuery;

    /// Query for the fallback batch.
    fn fallback(&self) -> SearchQuery;
}

/// Default strategy: single-result queries with a random letter and offset,
/// falling back to a full page chosen by [`FallbackMode`].
#[derive(Debug, Clone)]
pub struct RandomTermStrategy {
    statuses: Vec<String>,
    batch_size: u32,
    mode: FallbackMode,
    conditions: Vec<String>,
}

impl RandomTermStrategy {
    /// Builds the strategy.
    pub fn new(
        statuses: Vec<String>,
        batch_size: u32,
        mode: FallbackMode,
        conditions: Vec<String>,
    ) -> Self {
        Self {
            statuses,
            batch_size,
            mode,
            conditions,
        }
    }

    fn random_letter() -> String {
        let letter = rand::rng().random_range(b'a'..=b'z');
        char::from(letter).to_string()
    }
}

impl Default for RandomTermStrategy {
    fn default() -> Self {
        Self::new(
            DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
            10,
            FallbackMode::Relaxed,
            Vec::new(),
        )
    }
}

impl SearchStrategy for RandomTermStrategy {
    fn candidate(&self, _attempt: u32) -> SearchQuery {
        SearchQuery {
            term: Some(Self::random_letter()),
            offset: Some(rand::rng().random_range(0..=MAX_CANDIDATE_OFFSET)),
            ..SearchQuery::batch(1, &self.statuses)
        }
    }

    fn fallback(&self) -> SearchQuery {
        let mut query = SearchQuery::batch(self.batch_size, &self.statuses);
        match self.mode {
            FallbackMode::Relaxed => {}
            FallbackMode::Condition if !self.conditions.is_empty() => {
                let pick = rand::rng().random_range(0..self.conditions.len());
                query.condition = Some(self.conditions[pick].clone());
            }
            // No topics configured: a relaxed page is the closest thing.
            FallbackMode::Condition => {}
            FallbackMode::RandomLetter => query.term = Some(Self::random_letter()),
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_the_documented_shape() {
        let query = SearchQuery {
            term: Some("k".into()),
            offset: Some(4),
            ..SearchQuery::batch(1, &["RECRUITING".to_string(), "COMPLETED".to_string()])
        };
        let params = query.to_params();
        assert_eq!(params[0], ("format", "json".to_string()));
        assert_eq!(params[1], ("pageSize", "1".to_string()));
        assert_eq!(params[2], ("countTotal", "false".to_string()));
        assert_eq!(params[3], ("fields", STUDY_FIELDS.to_string()));
        assert!(params.contains(&("filter.overallStatus", "RECRUITING,COMPLETED".to_string())));
        assert!(params.contains(&("query.term", "k".to_string())));
        assert!(params.contains(&("offset", "4".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "query.cond"));
    }

    #[test]
    fn candidate_is_a_single_letter_single_result_query() {
        let strategy = RandomTermStrategy::default();
        for attempt in 1..=10 {
            let query = strategy.candidate(attempt);
            assert_eq!(query.page_size, 1);
            let term = query.term.unwrap();
            assert_eq!(term.len(), 1);
            assert!(term.chars().all(|c| c.is_ascii_lowercase()));
            assert!(query.offset.unwrap() <= MAX_CANDIDATE_OFFSET);
        }
    }

    #[test]
    fn fallback_modes_shape_the_batch() {
        let statuses = vec!["RECRUITING".to_string()];
        let relaxed = RandomTermStrategy::new(statuses.clone(), 10, FallbackMode::Relaxed, vec![]);
        let q = relaxed.fallback();
        assert_eq!(q.page_size, 10);
        assert!(q.term.is_none() && q.condition.is_none());

        let topics = vec!["asthma".to_string()];
        let cond = RandomTermStrategy::new(statuses.clone(), 10, FallbackMode::Condition, topics);
        assert_eq!(cond.fallback().condition.as_deref(), Some("asthma"));

        let letter = RandomTermStrategy::new(statuses, 10, FallbackMode::RandomLetter, vec![]);
        assert_eq!(letter.fallback().term.map(|t| t.len()), Some(1));
    }
}
