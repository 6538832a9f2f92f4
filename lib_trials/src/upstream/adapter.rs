//! # Study Record Adapter
//!
//! Turns ClinicalTrials.gov v2 study JSON into [`Trial`] values. Every lookup
//! here is defensive: missing modules, missing fields, empty strings and
//! wrongly-typed values all fall back to the documented defaults, so
//! [`normalize`] is total and [`parse_search_response`] never fails.

use serde_json::Value;

use crate::models::Trial;

/// Identifier used when a record carries no NCT id.
pub const UNKNOWN_ID: &str = "unknown";
/// Title used when a record carries no brief title.
pub const UNKNOWN_NAME: &str = "Unknown Trial";
/// Summary used when a record carries no brief summary.
pub const NO_DESCRIPTION: &str = "No description available";
/// Phase used when a record lists no phase.
pub const PHASE_NOT_SPECIFIED: &str = "Not specified";
/// Status used when a record carries no overall status.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Follows `path` through nested objects and returns a non-empty string leaf.
fn text_at<'a>(record: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(record, |node, key| node.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Phase is an array under `designModule.phases` in current records and a
/// scalar under `phaseModule.phase` in older ones.
fn phase_of(record: &Value) -> Option<&str> {
    let section = record.get("protocolSection")?;
    match section.get("designModule").and_then(|m| m.get("phases")) {
        Some(Value::Array(phases)) => phases.first().and_then(Value::as_str),
        Some(Value::String(phase)) => Some(phase.as_str()),
        _ => text_at(section, &["phaseModule", "phase"]),
    }
    .filter(|s| !s.is_empty())
}

fn start_date_of(record: &Value) -> Option<&str> {
    text_at(record, &["protocolSection", "statusModule", "startDateStruct", "date"])
        .or_else(|| text_at(record, &["protocolSection", "statusModule", "startDate"]))
        .or_else(|| text_at(record, &["protocolSection", "datesModule", "startDate"]))
}

/// Normalizes one raw study record.
///
/// Pure and total: the same input always yields the same `Trial`, and no
/// input shape makes it fail.
pub fn normalize(record: &Value) -> Trial {
    let ident = ["protocolSection", "identificationModule"];
    let descr = ["protocolSection", "descriptionModule"];

    Trial {
        id: text_at(record, &[ident[0], ident[1], "nctId"])
            .unwrap_or(UNKNOWN_ID)
            .to_string(),
        name: text_at(record, &[ident[0], ident[1], "briefTitle"])
            .unwrap_or(UNKNOWN_NAME)
            .to_string(),
        description: text_at(record, &[descr[0], descr[1], "briefSummary"])
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        phase: phase_of(record).unwrap_or(PHASE_NOT_SPECIFIED).to_string(),
        status: text_at(record, &["protocolSection", "statusModule", "overallStatus"])
            .unwrap_or(UNKNOWN_STATUS)
            .to_string(),
        start_date: start_date_of(record).unwrap_or_default().to_string(),
        detailed_description: text_at(record, &[descr[0], descr[1], "detailedDescription"])
            .map(str::to_string),
        is_new: false,
        selected: false,
    }
}

/// Extracts every study from a search response.
///
/// A response without a `studies` array (including non-object bodies) is
/// treated as "nothing found this round" and yields an empty vector.
pub fn parse_search_response(response: &Value) -> Vec<Trial> {
    match response.get("studies").and_then(Value::as_array) {
        Some(studies) => studies.iter().map(normalize).collect(),
        None => {
            tracing::debug!("search response carries no studies array");
            Vec::new()
        }
    }
}
