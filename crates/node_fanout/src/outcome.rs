//! Terminal state of one node's resolve, invoke, classify sequence.

use node_remote::{RemoteResponse, ResolutionFailure, TransportError};

#[derive(Debug)]
pub enum NodeOutcome<T> {
    Success(T),
    /// Node unknown to the registry, lookup error, or the client could not be built.
    ResolutionFailure(ResolutionFailure),
    TransportFailure {
        target: String,
        error: TransportError,
    },
    RemoteFailure {
        target: String,
        status: u16,
        message: String,
    },
}

impl<T> NodeOutcome<T> {
    /// Classify an executed call.
    pub fn from_call(target: String, result: Result<RemoteResponse<T>, TransportError>) -> Self {
        match result {
            Ok(RemoteResponse::Success(payload)) => Self::Success(payload),
            Ok(RemoteResponse::Failure { status, message }) => Self::RemoteFailure {
                target,
                status,
                message,
            },
            Err(error) => Self::TransportFailure { target, error },
        }
    }

    /// The payload, or nothing. Drops the cause.
    pub fn into_entry(self) -> Option<T> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }
}
