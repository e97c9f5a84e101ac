//! Capability-typed clients and the factory seam that builds them per node.

use thiserror::Error;

use node_registry::Node;

use crate::credential::Credential;

/// A remote client shape. Each capability is its own type; the handle for a
/// node is a value of that type.
pub trait Capability: Send + Sync + Sized + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("client rejected: {0}")]
    Rejected(String),
}

/// Builds a capability handle bound to one node and one credential.
pub trait ClientFactory<C: Capability>: Send + Sync {
    fn build(&self, node: &Node, credential: &Credential) -> Result<C, BuildError>;
}
