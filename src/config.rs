//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fetchbench.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::models::{ConcurrencyStrategy, StrategyKind, DEFAULT_THREAD_WORKERS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".fetchbench.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Strategy and pool settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Workload settings.
    #[serde(default)]
    pub targets: TargetsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Show a progress bar per run.
    #[serde(default)]
    pub progress: bool,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Which strategies to run and how large their pools are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Strategies to benchmark, in order.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// Threads in the thread pool.
    #[serde(default = "default_thread_workers")]
    pub thread_workers: usize,

    /// Processes in the process pool (default: host parallelism).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_workers: Option<usize>,

    /// Per-request timeout in seconds (default: none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            thread_workers: default_thread_workers(),
            process_workers: None,
            timeout_seconds: None,
        }
    }
}

fn default_strategies() -> Vec<StrategyKind> {
    StrategyKind::ALL.to_vec()
}

fn default_thread_workers() -> usize {
    DEFAULT_THREAD_WORKERS
}

/// The workload: a base URL list repeated `repeat` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            repeat: default_repeat(),
        }
    }
}

fn default_urls() -> Vec<String> {
    vec![
        "https://www.jython.org".to_string(),
        "http://olympus.realpython.org/dice".to_string(),
    ]
}

fn default_repeat() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.fetchbench.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref strategies) = args.strategy {
            self.run.strategies = strategies.clone();
        }
        if let Some(threads) = args.threads {
            self.run.thread_workers = threads;
        }
        if let Some(processes) = args.processes {
            self.run.process_workers = Some(processes);
        }
        if let Some(timeout) = args.timeout {
            self.run.timeout_seconds = Some(timeout);
        }

        if let Some(ref urls) = args.url {
            self.targets.urls = urls.clone();
        }
        if let Some(repeat) = args.repeat {
            self.targets.repeat = repeat;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.progress {
            self.general.progress = true;
        }
    }

    /// Log level for a benchmark run. `--quiet` beats a verbose config.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The full target list: the base URLs repeated `repeat` times.
    pub fn target_list(&self) -> Vec<String> {
        let mut urls = Vec::with_capacity(self.targets.urls.len() * self.targets.repeat);
        for _ in 0..self.targets.repeat {
            urls.extend(self.targets.urls.iter().cloned());
        }
        urls
    }

    /// Configured strategies with their pool sizes resolved.
    pub fn strategies(&self) -> Vec<ConcurrencyStrategy> {
        let process_workers = self.run.process_workers.unwrap_or_else(host_parallelism);
        self.run
            .strategies
            .iter()
            .map(|kind| {
                ConcurrencyStrategy::from_kind(*kind, self.run.thread_workers, process_workers)
            })
            .collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.run.timeout_seconds.map(Duration::from_secs)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
