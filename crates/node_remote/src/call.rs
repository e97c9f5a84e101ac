//! Deferred remote calls and the shape of what they return.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

/// I/O-level failure while executing a call. The remote never answered usefully.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not decode response body: {0}")]
    Decode(String),
}

/// What an executed call came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse<T> {
    Success(T),
    /// The remote answered with a non-success status.
    Failure { status: u16, message: String },
}

pub type CallFuture<T> =
    Pin<Box<dyn Future<Output = Result<RemoteResponse<T>, TransportError>> + Send + 'static>>;

/// A remote operation that has been built but not executed.
///
/// Nothing is sent until [`PendingCall::execute`] is awaited.
pub struct PendingCall<T> {
    target: String,
    future: CallFuture<T>,
}

impl<T> PendingCall<T> {
    pub fn new<F>(target: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<RemoteResponse<T>, TransportError>> + Send + 'static,
    {
        Self {
            target: target.into(),
            future: Box::pin(future),
        }
    }

    /// Where the call goes, for diagnostics.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn execute(self) -> Result<RemoteResponse<T>, TransportError> {
        self.future.await
    }
}

impl<T> fmt::Debug for PendingCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
