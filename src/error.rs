//! Error types for fetching and for the harness itself.
//!
//! [`FetchError`] describes a single URL that could not be counted. It never
//! aborts a run. [`HarnessError`] is fatal: the run cannot produce a result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one GET request.
///
/// Serializable so worker processes can report it back to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, broken body stream.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn network(url: &str, reason: impl Into<String>) -> Self {
        FetchError::Network {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure that aborts a whole run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to create HTTP session: {0}")]
    SessionSetup(String),

    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn worker process: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("I/O error talking to worker {worker}: {source}")]
    WorkerIo {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {worker} broke protocol: {reason}")]
    WorkerProtocol { worker: usize, reason: String },

    #[error("worker {worker} exited with {status}")]
    WorkerExited { worker: usize, status: String },

    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            url: "http://a/".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "http://a/ answered with HTTP 503");
    }

    #[test]
    fn test_fetch_error_wire_format() {
        let err = FetchError::network("http://b/", "timeout");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains(r#""kind":"network""#));

        let back: FetchError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
