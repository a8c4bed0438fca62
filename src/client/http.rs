//! `reqwest`-backed sessions.

use super::{AsyncSession, BlockingSession, HttpClient};
use crate::error::{FetchError, HarnessError};
use std::time::Duration;
use tracing::debug;

/// Opens `reqwest` clients with a shared per-request timeout.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// `None` means requests never time out.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl HttpClient for ReqwestClient {
    type Blocking = ReqwestBlockingSession;
    type Async = ReqwestAsyncSession;

    fn blocking_session(&self) -> Result<Self::Blocking, HarnessError> {
        // The blocking builder defaults to a 30s timeout; pass ours explicitly.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| HarnessError::SessionSetup(e.to_string()))?;

        debug!("Opened blocking session (timeout: {:?})", self.timeout);
        Ok(ReqwestBlockingSession { client })
    }

    fn async_session(&self) -> Result<Self::Async, HarnessError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HarnessError::SessionSetup(e.to_string()))?;

        debug!("Opened async session (timeout: {:?})", self.timeout);
        Ok(ReqwestAsyncSession { client })
    }
}

pub struct ReqwestBlockingSession {
    client: reqwest::blocking::Client,
}

impl BlockingSession for ReqwestBlockingSession {
    fn get(&mut self, url: &str) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| network_error(url, &e))?;

        check_status(url, response.status())?;

        let body = response.bytes().map_err(|e| network_error(url, &e))?;
        Ok(body.len() as u64)
    }
}

pub struct ReqwestAsyncSession {
    client: reqwest::Client,
}

impl AsyncSession for ReqwestAsyncSession {
    async fn get(&self, url: &str) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, &e))?;

        check_status(url, response.status())?;

        // Content-Length may be absent or wrong; count what actually arrived.
        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(url, &e))?;
        Ok(body.len() as u64)
    }
}

fn check_status(url: &str, status: reqwest::StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn network_error(url: &str, err: &reqwest::Error) -> FetchError {
    let reason = if err.is_connect() {
        "connection refused or host unreachable".to_string()
    } else if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_body() || err.is_decode() {
        format!("failed reading body: {}", err)
    } else {
        err.to_string()
    };
    FetchError::network(url, reason)
}
