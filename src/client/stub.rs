//! In-memory client used by the harness tests.

use super::{AsyncSession, BlockingSession, HttpClient};
use crate::error::{FetchError, HarnessError};
use crate::harness::process::{serve_worker, WorkerJob, WorkerLink, WorkerSpawner};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Answers every URL with a body of `body_size` bytes, except those listed
/// in `failing`. Records visit order and session count.
#[derive(Debug, Clone, Default)]
pub struct StubClient {
    pub body_size: u64,
    pub failing: HashSet<String>,
    pub refuse_sessions: bool,
    pub visits: Arc<Mutex<Vec<String>>>,
    pub sessions_opened: Arc<AtomicUsize>,
}

impl StubClient {
    pub fn new(body_size: u64) -> Self {
        Self {
            body_size,
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    fn answer(&self, url: &str) -> Result<u64, FetchError> {
        self.visits.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            })
        } else {
            Ok(self.body_size)
        }
    }

    fn open(&self) -> Result<StubSession, HarnessError> {
        if self.refuse_sessions {
            return Err(HarnessError::SessionSetup("stub refused".to_string()));
        }
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(StubSession {
            client: self.clone(),
        })
    }
}

pub struct StubSession {
    client: StubClient,
}

impl HttpClient for StubClient {
    type Blocking = StubSession;
    type Async = StubSession;

    fn blocking_session(&self) -> Result<StubSession, HarnessError> {
        self.open()
    }

    fn async_session(&self) -> Result<StubSession, HarnessError> {
        self.open()
    }
}

impl BlockingSession for StubSession {
    fn get(&mut self, url: &str) -> Result<u64, FetchError> {
        self.client.answer(url)
    }
}

impl AsyncSession for StubSession {
    async fn get(&self, url: &str) -> Result<u64, FetchError> {
        // Suspend once so tasks interleave like real I/O.
        tokio::task::yield_now().await;
        self.client.answer(url)
    }
}

/// `count` distinct stub URLs.
pub fn stub_urls(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("http://stub.test/{}", i)).collect()
}

/// Serves each worker job on the calling thread through the real protocol.
pub struct InlineSpawner {
    pub client: StubClient,
}

impl WorkerSpawner for InlineSpawner {
    fn spawn(&self, job: &WorkerJob) -> Result<WorkerLink, HarnessError> {
        let input = serde_json::to_vec(job).unwrap();
        let mut output = Vec::new();
        serve_worker(|_| self.client.clone(), input.as_slice(), &mut output)
            .map_err(|e| HarnessError::SessionSetup(e.to_string()))?;
        Ok(WorkerLink {
            reader: Box::new(Cursor::new(output)),
            child: None,
        })
    }
}
