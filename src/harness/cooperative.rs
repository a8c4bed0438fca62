//! Single-threaded cooperative scheduling on a current-thread tokio runtime.
//!
//! Every URL becomes a future on one shared session. Outcomes are drained
//! as they complete, so a failing fetch never cancels its siblings.

use super::tally::Tally;
use crate::client::{AsyncSession, HttpClient};
use crate::error::HarnessError;
use futures::stream::{FuturesUnordered, StreamExt};

pub fn run<C: HttpClient>(client: &C, urls: &[String], tally: &mut Tally) -> Result<(), HarnessError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::Runtime)?;

    let session = client.async_session()?;
    runtime.block_on(gather(&session, urls, tally));
    Ok(())
}

/// Launch one task per URL, await them all and fold each outcome in.
pub async fn gather<S: AsyncSession>(session: &S, urls: &[String], tally: &mut Tally) {
    let mut pending: FuturesUnordered<_> = urls
        .iter()
        .map(|url| async move { (url, session.get(url).await) })
        .collect();

    while let Some((url, result)) = pending.next().await {
        tally.record(url, result);
    }
}
