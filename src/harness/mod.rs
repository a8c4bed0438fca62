//! The fetch-and-aggregate harness.
//!
//! [`FetchAggregator::run`] fetches every target with the chosen
//! [`ConcurrencyStrategy`] and returns the run's [`AggregateResult`].
//! Per-URL failures are counted separately and never abort the run;
//! a [`HarnessError`] means the run itself could not be carried out.

pub mod cooperative;
pub mod process;
pub mod sequential;
pub mod tally;
pub mod threaded;

use crate::client::HttpClient;
use crate::error::HarnessError;
use crate::models::{AggregateResult, ConcurrencyStrategy};
use indicatif::{ProgressBar, ProgressStyle};
use process::WorkerSpawner;
use std::time::{Duration, Instant};
use tally::Tally;
use tracing::{debug, info};

pub use process::{serve_worker, ProcessSpawner};

/// Runs target lists through any strategy with one client and spawner.
pub struct FetchAggregator<C> {
    client: C,
    spawner: Box<dyn WorkerSpawner>,
    timeout: Option<Duration>,
    show_progress: bool,
}

impl<C: HttpClient> FetchAggregator<C> {
    pub fn new(client: C, spawner: impl WorkerSpawner + 'static) -> Self {
        Self {
            client,
            spawner: Box::new(spawner),
            timeout: None,
            show_progress: false,
        }
    }

    /// Per-request timeout forwarded to worker processes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetch every URL in `urls` and tally the results.
    pub fn run(
        &self,
        urls: &[String],
        strategy: ConcurrencyStrategy,
    ) -> Result<AggregateResult, HarnessError> {
        let started = Instant::now();
        let mut tally = Tally::new(self.progress_bar(urls.len(), strategy));

        if urls.is_empty() {
            debug!("No targets for {}", strategy);
            return Ok(tally.finish(started.elapsed()));
        }

        info!("Running {} over {} targets", strategy, urls.len());

        match strategy {
            ConcurrencyStrategy::Sequential => sequential::run(&self.client, urls, &mut tally)?,
            ConcurrencyStrategy::ThreadPool { workers } => {
                threaded::run(&self.client, urls, workers, &mut tally)?
            }
            ConcurrencyStrategy::ProcessPool { workers } => process::run(
                self.spawner.as_ref(),
                urls,
                workers,
                self.timeout.map(|t| t.as_secs()),
                &mut tally,
            )?,
            ConcurrencyStrategy::CooperativeAsync => {
                cooperative::run(&self.client, urls, &mut tally)?
            }
        }

        let result = tally.finish(started.elapsed());
        info!(
            "{} finished: {} ok, {} failed, {} bytes in {:.2}s",
            strategy,
            result.request_count,
            result.failed_count,
            result.total_bytes,
            result.elapsed_seconds
        );
        Ok(result)
    }

    fn progress_bar(&self, len: usize, strategy: ConcurrencyStrategy) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(strategy.label());
        Some(pb)
    }
}
