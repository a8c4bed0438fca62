//! Fixed-size pool of OS threads sharing one mutex-guarded tally.
//!
//! Threads claim URLs through an atomic cursor, so the pool stays busy even
//! when response times vary. Each thread opens its own session when it claims
//! its first URL and drops it when the queue runs dry.

use super::tally::Tally;
use crate::client::{BlockingSession, HttpClient};
use crate::error::HarnessError;
use std::iter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::debug;

pub fn run<C: HttpClient>(
    client: &C,
    urls: &[String],
    workers: usize,
    tally: &mut Tally,
) -> Result<(), HarnessError> {
    let workers = workers.clamp(1, urls.len().max(1));
    let cursor = AtomicUsize::new(0);
    let shared = Mutex::new(tally);

    let claim = || urls.get(cursor.fetch_add(1, Ordering::Relaxed));

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let shared = &shared;
                scope.spawn(move || -> Result<(), HarnessError> {
                    let Some(first) = claim() else {
                        return Ok(());
                    };
                    let mut session = client.blocking_session()?;
                    debug!("Thread worker {} opened its session", id);

                    for url in iter::once(first).chain(iter::from_fn(claim)) {
                        let result = session.get(url);
                        shared
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .record(url, result);
                    }
                    Ok(())
                })
            })
            .collect();

        let mut outcome = Ok(());
        for (id, handle) in handles.into_iter().enumerate() {
            let joined = handle
                .join()
                .unwrap_or(Err(HarnessError::WorkerPanicked(id)));
            if outcome.is_ok() {
                outcome = joined;
            }
        }
        outcome
    })
}
