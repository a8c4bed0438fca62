//! HTTP client collaborator.
//!
//! The harness never talks to `reqwest` directly. It opens sessions through
//! [`HttpClient`], one per execution context, and asks each session for the
//! body size of a URL.

pub mod http;
#[cfg(test)]
pub mod stub;

use crate::error::{FetchError, HarnessError};

pub use http::ReqwestClient;

/// Factory for sessions. Shared by reference across worker threads.
pub trait HttpClient: Send + Sync {
    type Blocking: BlockingSession;
    type Async: AsyncSession;

    /// Open a session usable from a blocking thread.
    fn blocking_session(&self) -> Result<Self::Blocking, HarnessError>;

    /// Open a session shared by tasks on a single-threaded runtime.
    fn async_session(&self) -> Result<Self::Async, HarnessError>;
}

/// A reusable connection pool driven from one thread.
pub trait BlockingSession {
    /// GET `url` and return the number of body bytes received.
    fn get(&mut self, url: &str) -> Result<u64, FetchError>;
}

/// A reusable connection pool shared by cooperative tasks.
#[allow(async_fn_in_trait)] // futures only ever run on a current-thread runtime
pub trait AsyncSession {
    /// GET `url` and return the number of body bytes received.
    async fn get(&self, url: &str) -> Result<u64, FetchError>;
}
