//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the config file.

use crate::models::StrategyKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// fetchbench - download a URL list with different concurrency strategies
///
/// Fetches every target once per strategy and reports how many sites were
/// downloaded, how many bytes arrived and how long it took.
///
/// Examples:
///   fetchbench
///   fetchbench --strategy thread-pool --threads 10
///   fetchbench --strategy sequential,cooperative --url https://example.com --repeat 20
///   fetchbench --format json --timeout 5
///   fetchbench --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Strategies to run (comma-separated), in order
    ///
    /// Default: all four.
    #[arg(short, long, value_name = "STRATEGY", value_delimiter = ',')]
    pub strategy: Option<Vec<StrategyKind>>,

    /// Number of threads for the thread-pool strategy
    #[arg(long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Number of worker processes for the process-pool strategy
    ///
    /// Default: number of available CPUs.
    #[arg(long, value_name = "NUM")]
    pub processes: Option<usize>,

    /// URLs to fetch (comma-separated)
    #[arg(short, long, value_name = "URLS", value_delimiter = ',')]
    pub url: Option<Vec<String>>,

    /// How many times the URL list is repeated
    #[arg(long, value_name = "COUNT")]
    pub repeat: Option<usize>,

    /// Per-request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fetchbench.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Show a progress bar while fetching
    #[arg(long)]
    pub progress: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .fetchbench.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Serve a process-pool job on stdin/stdout
    #[arg(long, hide = true)]
    pub worker: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One summary line per strategy (default)
    #[default]
    Text,
    /// JSON array of run reports
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Workers get their settings from the job, not from flags
        if self.worker || self.init_config {
            return Ok(());
        }

        if let Some(ref urls) = self.url {
            for url in urls {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!(
                        "URL must start with 'http://' or 'https://': {}",
                        url
                    ));
                }
            }
        }

        if self.threads == Some(0) {
            return Err("Threads must be at least 1".to_string());
        }

        if self.processes == Some(0) {
            return Err("Processes must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("fetchbench").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_arguments_is_valid() {
        let args = parse(&[]);
        assert!(args.validate().is_ok());
        assert!(args.strategy.is_none());
        assert!(args.format.is_none());
    }

    #[test]
    fn test_strategy_list() {
        let args = parse(&["--strategy", "sequential,process-pool"]);
        assert_eq!(
            args.strategy,
            Some(vec![StrategyKind::Sequential, StrategyKind::ProcessPool])
        );
    }

    #[test]
    fn test_validation_invalid_url() {
        let args = parse(&["--url", "ftp://example.com"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_pool() {
        assert!(parse(&["--threads", "0"]).validate().is_err());
        assert!(parse(&["--processes", "0"]).validate().is_err());
        assert!(parse(&["--timeout", "0"]).validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_worker_skips_validation() {
        let args = parse(&["--worker", "--quiet", "--verbose"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&[]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
