//! Pool of worker processes that share nothing with the parent.
//!
//! The parent splits the target list into contiguous chunks, hands each chunk
//! to a child as a [`WorkerJob`] on stdin, and reduces the [`FetchOutcome`]
//! lines the children stream back on stdout. Counters live only in the
//! parent.

use super::tally::{FetchOutcome, Tally};
use crate::client::{BlockingSession, HttpClient};
use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, warn};

/// Work handed to one child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerJob {
    pub urls: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A running worker: its outcome stream and, for real processes, the child
/// to reap once the stream ends.
pub struct WorkerLink {
    pub reader: Box<dyn BufRead + Send>,
    pub child: Option<Child>,
}

/// Starts workers for a job. Production code spawns processes; tests can
/// serve the protocol in-process.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, job: &WorkerJob) -> Result<WorkerLink, HarnessError>;
}

/// Re-executes a program (normally this binary) with `--worker`.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
}

impl ProcessSpawner {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Spawner for the currently running executable.
    pub fn current_exe() -> Result<Self, HarnessError> {
        let program = std::env::current_exe().map_err(HarnessError::WorkerSpawn)?;
        Ok(Self::new(program))
    }
}

impl WorkerSpawner for ProcessSpawner {
    fn spawn(&self, job: &WorkerJob) -> Result<WorkerLink, HarnessError> {
        let mut child = Command::new(&self.program)
            .args(["--worker", "--quiet"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(HarnessError::WorkerSpawn)?;

        // Dropping stdin after writing closes it, so the child sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(job)
                .map_err(|e| HarnessError::WorkerSpawn(io::Error::other(e)))?;
            stdin.write_all(&payload).map_err(HarnessError::WorkerSpawn)?;
        }

        let stdout = child.stdout.take().ok_or_else(|| {
            HarnessError::WorkerSpawn(io::Error::other("worker stdout not captured"))
        })?;

        debug!("Spawned worker pid {} for {} URLs", child.id(), job.urls.len());
        Ok(WorkerLink {
            reader: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }
}

/// Parent side: fan the targets out to `workers` processes and reduce.
pub fn run(
    spawner: &dyn WorkerSpawner,
    urls: &[String],
    workers: usize,
    timeout_secs: Option<u64>,
    tally: &mut Tally,
) -> Result<(), HarnessError> {
    if urls.is_empty() {
        return Ok(());
    }

    let chunk_size = urls.len().div_ceil(workers.max(1));
    let mut links = Vec::new();
    for chunk in urls.chunks(chunk_size) {
        let job = WorkerJob {
            urls: chunk.to_vec(),
            timeout_secs,
        };
        let link = match spawner.spawn(&job) {
            Ok(link) => link,
            Err(e) => {
                for (started, _) in links {
                    reap(started);
                }
                return Err(e);
            }
        };
        links.push((link, job.urls.len()));
    }
    debug!("Started {} worker processes", links.len());

    let workers = links.len();
    let (tx, rx) = mpsc::channel::<FetchOutcome>();

    let result = thread::scope(|scope| {
        let handles: Vec<_> = links
            .into_iter()
            .enumerate()
            .map(|(id, (link, expected))| {
                let tx = tx.clone();
                scope.spawn(move || forward(id, link, expected, tx))
            })
            .collect();
        drop(tx);

        // Reduce in arrival order; ends once every forwarder hangs up.
        for outcome in rx {
            tally.record_outcome(outcome);
        }

        let mut result = Ok(());
        for (id, handle) in handles.into_iter().enumerate() {
            let joined = handle
                .join()
                .unwrap_or(Err(HarnessError::WorkerPanicked(id)));
            if result.is_ok() {
                result = joined;
            }
        }
        result
    });

    debug!("Reduced {} outcomes from {} workers", tally.completed(), workers);
    result
}

/// Relay one worker's outcome lines to the parent, then reap the child.
fn forward(
    id: usize,
    link: WorkerLink,
    expected: usize,
    tx: mpsc::Sender<FetchOutcome>,
) -> Result<(), HarnessError> {
    let WorkerLink { reader, child } = link;
    let relayed = relay(id, reader, expected, &tx);
    drop(tx);

    let received = match child {
        None => relayed?,
        Some(mut child) => {
            if relayed.is_err() {
                let _ = child.kill();
            }
            let status = child
                .wait()
                .map_err(|source| HarnessError::WorkerIo { worker: id, source })?;
            let received = relayed?;

            if !status.success() {
                return Err(HarnessError::WorkerExited {
                    worker: id,
                    status: status.to_string(),
                });
            }
            received
        }
    };

    if received < expected {
        return Err(HarnessError::WorkerProtocol {
            worker: id,
            reason: format!("reported {} of the {} URLs it was given", received, expected),
        });
    }
    Ok(())
}

/// Stream outcome lines to the parent; returns how many were relayed.
fn relay(
    id: usize,
    reader: Box<dyn BufRead + Send>,
    expected: usize,
    tx: &mpsc::Sender<FetchOutcome>,
) -> Result<usize, HarnessError> {
    let mut received = 0usize;

    for line in reader.lines() {
        let line = line.map_err(|source| HarnessError::WorkerIo { worker: id, source })?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome: FetchOutcome =
            serde_json::from_str(&line).map_err(|e| HarnessError::WorkerProtocol {
                worker: id,
                reason: format!("unparsable outcome line: {}", e),
            })?;

        received += 1;
        if received > expected {
            return Err(HarnessError::WorkerProtocol {
                worker: id,
                reason: format!("reported more than the {} URLs it was given", expected),
            });
        }

        // The receiver only hangs up after all forwarders finish.
        let _ = tx.send(outcome);
    }

    Ok(received)
}

/// Kill and wait for a worker that will never be read from.
fn reap(link: WorkerLink) {
    let WorkerLink { reader, child } = link;
    drop(reader);
    if let Some(mut child) = child {
        let _ = child.kill();
        if let Err(e) = child.wait() {
            warn!("Failed to reap worker pid {}: {}", child.id(), e);
        }
    }
}

/// Child side: read a job from `input`, fetch every URL with one session and
/// write one outcome line per URL to `output`.
pub fn serve_worker<C, R, W>(
    client_for: impl FnOnce(&WorkerJob) -> C,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    C: HttpClient,
    R: Read,
    W: Write,
{
    let job: WorkerJob = serde_json::from_reader(input)?;
    let client = client_for(&job);
    let mut session = client.blocking_session()?;

    for url in &job.urls {
        let outcome = FetchOutcome {
            url: url.clone(),
            result: session.get(url),
        };
        serde_json::to_writer(&mut output, &outcome)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    Ok(())
}
