//! Diagnostics sink for per-node failures.
//!
//! Absent entries carry no cause; the observer is where the cause goes.

use std::sync::Mutex;

use tracing::warn;

use node_registry::NodeIdentity;
use node_remote::{ResolutionFailure, TransportError};

pub trait FanOutObserver: Send + Sync {
    fn resolution_failed(&self, failure: &ResolutionFailure);

    fn transport_failed(&self, node: &NodeIdentity, target: &str, error: &TransportError);

    fn remote_failed(&self, node: &NodeIdentity, target: &str, status: u16, message: &str);
}

/// Logs every failure as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FanOutObserver for TracingObserver {
    fn resolution_failed(&self, failure: &ResolutionFailure) {
        warn!("{failure}");
    }

    fn transport_failed(&self, node: &NodeIdentity, target: &str, error: &TransportError) {
        warn!("Unable to call {target} on node <{node}>, caught exception: {error}");
    }

    fn remote_failed(&self, node: &NodeIdentity, target: &str, status: u16, message: &str) {
        warn!("Unable to call {target} on node <{node}>, result: {message} (status {status})");
    }
}

/// Owned copy of one reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Unresolved {
        node: NodeIdentity,
        capability: &'static str,
        reason: String,
    },
    Transport {
        node: NodeIdentity,
        target: String,
        error: String,
    },
    Remote {
        node: NodeIdentity,
        target: String,
        status: u16,
        message: String,
    },
}

impl Diagnostic {
    pub fn node(&self) -> &NodeIdentity {
        match self {
            Self::Unresolved { node, .. } | Self::Transport { node, .. } | Self::Remote { node, .. } => {
                node
            }
        }
    }
}

/// Keeps every diagnostic in memory. For tests and debug endpoints.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, diagnostic: Diagnostic) {
        self.events.lock().unwrap().push(diagnostic);
    }
}

impl FanOutObserver for RecordingObserver {
    fn resolution_failed(&self, failure: &ResolutionFailure) {
        self.push(Diagnostic::Unresolved {
            node: failure.node().clone(),
            capability: failure.capability(),
            reason: failure.to_string(),
        });
    }

    fn transport_failed(&self, node: &NodeIdentity, target: &str, error: &TransportError) {
        self.push(Diagnostic::Transport {
            node: node.clone(),
            target: target.to_string(),
            error: error.to_string(),
        });
    }

    fn remote_failed(&self, node: &NodeIdentity, target: &str, status: u16, message: &str) {
        self.push(Diagnostic::Remote {
            node: node.clone(),
            target: target.to_string(),
            status,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let observer = RecordingObserver::new();
        observer.resolution_failed(&ResolutionFailure::NodeUnknown {
            node: "a".into(),
            capability: "SystemApi",
        });
        observer.remote_failed(&"b".into(), "http://b/api/system", 503, "starting");

        let events = observer.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].node().as_str(), "a");
        assert_eq!(
            events[1],
            Diagnostic::Remote {
                node: "b".into(),
                target: "http://b/api/system".into(),
                status: 503,
                message: "starting".into(),
            }
        );
        assert!(observer.take().is_empty());
    }

    #[test]
    fn tracing_observer_does_not_panic_without_subscriber() {
        let observer = TracingObserver;
        observer.transport_failed(
            &"a".into(),
            "http://a/api/system",
            &TransportError::Connection("refused".into()),
        );
    }
}
