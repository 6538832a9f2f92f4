//! # Shared Test Fixtures
//!
//! Builders for trials and raw study records, a scripted upstream source and
//! a tiny local HTTP server speaking just enough HTTP/1.1 for the
//! reqwest-backed transport.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use lib_trials::upstream::Transport;
use lib_trials::{SearchQuery, SearchStrategy, Trial, UpstreamError};

/// A settled trial with a predictable name.
pub fn trial(id: &str) -> Trial {
    Trial {
        id: id.to_string(),
        name: format!("Trial {id}"),
        description: "A study".to_string(),
        phase: "PHASE2".to_string(),
        status: "RECRUITING".to_string(),
        start_date: "2024-01".to_string(),
        detailed_description: None,
        is_new: false,
        selected: false,
    }
}

/// A raw v2 study record with the fields the adapter reads.
pub fn study(id: &str) -> Value {
    json!({
        "protocolSection": {
            "identificationModule": { "nctId": id, "briefTitle": format!("Study {id}") },
            "descriptionModule": { "briefSummary": "Summary" },
            "designModule": { "phases": ["PHASE3"] },
            "statusModule": {
                "overallStatus": "RECRUITING",
                "startDateStruct": { "date": "2023-05" }
            }
        }
    })
}

/// A search response body holding `ids`.
pub fn studies(ids: &[&str]) -> Value {
    json!({ "studies": ids.iter().map(|id| study(id)).collect::<Vec<_>>() })
}

/// Replays canned responses in order and records every request. An
/// exhausted script answers with an empty result.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, UpstreamError>>>,
    requests: Mutex<Vec<Vec<(&'static str, String)>>>,
}

impl ScriptedTransport {
    /// A transport answering with `script`, front first.
    pub fn new(script: Vec<Result<Value, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::default(),
        }
    }

    /// Query parameters of every request so far.
    pub fn requests(&self) -> Vec<Vec<(&'static str, String)>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    async fn get_json(
        &self,
        _path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value, UpstreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(params.to_vec());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Ok(studies(&[])))
    }
}

/// Deterministic strategy: single-result candidates, ten-result fallback.
pub struct FixedStrategy;

impl SearchStrategy for FixedStrategy {
    fn candidate(&self, attempt: u32) -> SearchQuery {
        SearchQuery {
            term: Some(format!("candidate-{attempt}")),
            ..SearchQuery::batch(1, &[])
        }
    }

    fn fallback(&self) -> SearchQuery {
        SearchQuery {
            term: Some("fallback".to_string()),
            ..SearchQuery::batch(10, &[])
        }
    }
}

/// Looks up a query parameter by name.
pub fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
}

/// Serves `respond(request_target)` as JSON on a local port until the
/// runtime shuts down. Returns the API base URL and the log of request
/// targets (path plus query).
pub async fn spawn_api_server<F>(respond: F) -> std::io::Result<(String, Arc<Mutex<Vec<String>>>)>
where
    F: Fn(&str) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }
                let target = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
                if let Ok(mut log) = log.lock() {
                    log.push(target.clone());
                }
                let (status, body) = respond(&target);
                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 {status} X\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = write.write_all(response.as_bytes()).await;
                let _ = write.shutdown().await;
            });
        }
    });

    Ok((format!("http://{addr}/api/v2/"), seen))
}
