//! Accumulation of per-fetch outcomes into an [`AggregateResult`].

use crate::error::FetchError;
use crate::models::AggregateResult;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Result of fetching one URL, as produced by any strategy.
///
/// Also the line format worker processes write back to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<u64, FetchError>,
}

/// Single-owner reducer. Strategies that run on several threads wrap it in a
/// mutex; the others own it outright.
#[derive(Default)]
pub struct Tally {
    result: AggregateResult,
    progress: Option<ProgressBar>,
}

impl Tally {
    pub fn new(progress: Option<ProgressBar>) -> Self {
        Self {
            result: AggregateResult::default(),
            progress,
        }
    }

    /// Fold one fetch into the counters. Failures touch only `failed_count`.
    pub fn record(&mut self, url: &str, result: Result<u64, FetchError>) {
        match result {
            Ok(bytes) => {
                self.result.request_count += 1;
                self.result.total_bytes += bytes;
            }
            Err(e) => {
                debug!("Skipping {}: {}", url, e);
                self.result.failed_count += 1;
            }
        }

        if let Some(ref pb) = self.progress {
            pb.inc(1);
        }
    }

    pub fn record_outcome(&mut self, outcome: FetchOutcome) {
        self.record(&outcome.url, outcome.result);
    }

    /// Fetches folded in so far, successful or not.
    pub fn completed(&self) -> u64 {
        self.result.request_count + self.result.failed_count
    }

    /// Stamp the elapsed time and hand back the final result.
    pub fn finish(self, elapsed: Duration) -> AggregateResult {
        if let Some(pb) = self.progress {
            pb.finish_and_clear();
        }
        AggregateResult {
            elapsed_seconds: elapsed.as_secs_f64(),
            ..self.result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_success_and_failure() {
        let mut tally = Tally::default();
        tally.record("http://a/", Ok(10));
        tally.record("http://b/", Ok(32));
        tally.record(
            "http://c/",
            Err(FetchError::network("http://c/", "timeout")),
        );

        assert_eq!(tally.completed(), 3);
        let result = tally.finish(Duration::from_millis(1500));
        assert_eq!(result.counters(), (2, 42, 1));
        assert_eq!(result.elapsed_seconds, 1.5);
    }

    #[test]
    fn test_outcome_line_round_trip() {
        let outcome = FetchOutcome {
            url: "http://a/".to_string(),
            result: Err(FetchError::Status {
                url: "http://a/".to_string(),
                status: 404,
            }),
        };
        let line = serde_json::to_string(&outcome).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(serde_json::from_str::<FetchOutcome>(&line).unwrap(), outcome);
    }

    #[test]
    fn test_progress_ticks_per_outcome() {
        let pb = ProgressBar::hidden();
        pb.set_length(2);
        let mut tally = Tally::new(Some(pb.clone()));
        tally.record_outcome(FetchOutcome {
            url: "http://a/".to_string(),
            result: Ok(1),
        });
        tally.record("http://b/", Err(FetchError::network("http://b/", "dns")));
        assert_eq!(pb.position(), 2);
    }
}
