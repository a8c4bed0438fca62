//! One session, one request at a time, in input order.

use super::tally::Tally;
use crate::client::{BlockingSession, HttpClient};
use crate::error::HarnessError;

pub fn run<C: HttpClient>(client: &C, urls: &[String], tally: &mut Tally) -> Result<(), HarnessError> {
    let mut session = client.blocking_session()?;

    for url in urls {
        tally.record(url, session.get(url));
    }

    Ok(())
}
