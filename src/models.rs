//! Data models for benchmark runs.
//!
//! This module contains the strategy descriptions, the per-run aggregate
//! and the report record emitted for JSON output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of threads for the thread-pool strategy.
pub const DEFAULT_THREAD_WORKERS: usize = 5;

/// Strategy selector, as written in config files and on the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// One blocking request after another
    Sequential,
    /// OS threads sharing a mutex-guarded tally
    ThreadPool,
    /// Child processes reporting back over pipes
    ProcessPool,
    /// Single-threaded async tasks
    Cooperative,
}

impl StrategyKind {
    /// All strategies, in the order they are benchmarked by default.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Sequential,
        StrategyKind::ThreadPool,
        StrategyKind::ProcessPool,
        StrategyKind::Cooperative,
    ];
}

/// A fully configured scheduling model for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyStrategy {
    Sequential,
    ThreadPool { workers: usize },
    ProcessPool { workers: usize },
    CooperativeAsync,
}

impl ConcurrencyStrategy {
    /// Build a strategy from its kind and the configured pool sizes.
    pub fn from_kind(kind: StrategyKind, thread_workers: usize, process_workers: usize) -> Self {
        match kind {
            StrategyKind::Sequential => ConcurrencyStrategy::Sequential,
            StrategyKind::ThreadPool => ConcurrencyStrategy::ThreadPool {
                workers: thread_workers.max(1),
            },
            StrategyKind::ProcessPool => ConcurrencyStrategy::ProcessPool {
                workers: process_workers.max(1),
            },
            StrategyKind::Cooperative => ConcurrencyStrategy::CooperativeAsync,
        }
    }

    /// Human-readable label printed in the report line.
    pub fn label(&self) -> &'static str {
        match self {
            ConcurrencyStrategy::Sequential => "Non-concurrent",
            ConcurrencyStrategy::ThreadPool { .. } => "Multithreading",
            ConcurrencyStrategy::ProcessPool { .. } => "Multiprocessing",
            ConcurrencyStrategy::CooperativeAsync => "Multitask (async)",
        }
    }

    /// Pool size, for strategies that have one.
    pub fn workers(&self) -> Option<usize> {
        match self {
            ConcurrencyStrategy::ThreadPool { workers }
            | ConcurrencyStrategy::ProcessPool { workers } => Some(*workers),
            _ => None,
        }
    }
}

impl fmt::Display for ConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.workers() {
            Some(n) => write!(f, "{} ({} workers)", self.label(), n),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// Run-level tally of successful fetches and bytes received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Number of fetches that returned a 2xx response with a body.
    pub request_count: u64,
    /// Sum of body lengths of the counted fetches.
    pub total_bytes: u64,
    /// Number of fetches excluded from the counters above.
    pub failed_count: u64,
    /// Wall-clock duration of the whole run.
    pub elapsed_seconds: f64,
}

#[cfg(test)]
impl AggregateResult {
    /// Counters only, for comparing runs whose timings differ.
    pub fn counters(&self) -> (u64, u64, u64) {
        (self.request_count, self.total_bytes, self.failed_count)
    }
}

/// One strategy's run, as emitted in JSON reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub targets: usize,
    pub result: AggregateResult,
}

impl RunReport {
    pub fn new(
        strategy: ConcurrencyStrategy,
        started_at: DateTime<Utc>,
        targets: usize,
        result: AggregateResult,
    ) -> Self {
        Self {
            strategy: strategy.label().to_string(),
            workers: strategy.workers(),
            started_at,
            targets,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind_clamps_workers() {
        let strategy = ConcurrencyStrategy::from_kind(StrategyKind::ThreadPool, 0, 4);
        assert_eq!(strategy, ConcurrencyStrategy::ThreadPool { workers: 1 });

        let strategy = ConcurrencyStrategy::from_kind(StrategyKind::ProcessPool, 5, 4);
        assert_eq!(strategy, ConcurrencyStrategy::ProcessPool { workers: 4 });
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConcurrencyStrategy::Sequential.label(), "Non-concurrent");
        assert_eq!(
            ConcurrencyStrategy::ThreadPool { workers: 5 }.to_string(),
            "Multithreading (5 workers)"
        );
        assert_eq!(
            ConcurrencyStrategy::CooperativeAsync.to_string(),
            "Multitask (async)"
        );
    }

    #[test]
    fn test_strategy_kind_serde() {
        let kinds: Vec<StrategyKind> =
            serde_json::from_str(r#"["sequential", "thread-pool", "cooperative"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::Sequential,
                StrategyKind::ThreadPool,
                StrategyKind::Cooperative
            ]
        );
    }

    #[test]
    fn test_run_report_skips_missing_workers() {
        let report = RunReport::new(
            ConcurrencyStrategy::Sequential,
            Utc::now(),
            2,
            AggregateResult::default(),
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("workers"));
        assert!(json.contains(r#""strategy":"Non-concurrent""#));
    }
}
