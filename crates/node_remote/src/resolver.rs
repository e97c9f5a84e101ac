//! Resolves a node identity into a callable capability handle.
//!
//! The registry is consulted on every resolution; nothing is cached, so a node
//! that left after the fan-out snapshot was taken resolves as unknown.

use std::sync::Arc;

use thiserror::Error;

use node_registry::{NodeIdentity, NodeRegistry, RegistryError};

use crate::capability::{Capability, ClientFactory};
use crate::credential::Credential;

/// Why no handle could be produced for a node. Recoverable at node scope.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("Node <{node}> not found while trying to call {capability} on it.")]
    NodeUnknown {
        node: NodeIdentity,
        capability: &'static str,
    },
    #[error("Lookup of node <{node}> failed while trying to call {capability} on it: {reason}")]
    Lookup {
        node: NodeIdentity,
        capability: &'static str,
        reason: String,
    },
    #[error("Unable to build {capability} for node <{node}>: {reason}")]
    InterfaceBuild {
        node: NodeIdentity,
        capability: &'static str,
        reason: String,
    },
}

impl ResolutionFailure {
    pub fn node(&self) -> &NodeIdentity {
        match self {
            Self::NodeUnknown { node, .. }
            | Self::Lookup { node, .. }
            | Self::InterfaceBuild { node, .. } => node,
        }
    }

    pub fn capability(&self) -> &'static str {
        match self {
            Self::NodeUnknown { capability, .. }
            | Self::Lookup { capability, .. }
            | Self::InterfaceBuild { capability, .. } => capability,
        }
    }
}

/// Per-request resolver: registry + factory + the credential to forward.
pub struct RemoteInterfaceResolver<F> {
    registry: Arc<dyn NodeRegistry>,
    factory: Arc<F>,
    credential: Credential,
}

impl<F> RemoteInterfaceResolver<F> {
    pub fn new(registry: Arc<dyn NodeRegistry>, factory: Arc<F>, credential: Credential) -> Self {
        Self {
            registry,
            factory,
            credential,
        }
    }

    pub fn registry(&self) -> &Arc<dyn NodeRegistry> {
        &self.registry
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub async fn resolve<C>(&self, node_id: &NodeIdentity) -> Result<C, ResolutionFailure>
    where
        C: Capability,
        F: ClientFactory<C>,
    {
        let node = match self.registry.by_identity(node_id).await {
            Ok(node) => node,
            Err(RegistryError::NotFound(_)) => {
                return Err(ResolutionFailure::NodeUnknown {
                    node: node_id.clone(),
                    capability: C::NAME,
                })
            }
            Err(e) => {
                return Err(ResolutionFailure::Lookup {
                    node: node_id.clone(),
                    capability: C::NAME,
                    reason: e.to_string(),
                })
            }
        };

        self.factory
            .build(&node, &self.credential)
            .map_err(|e| ResolutionFailure::InterfaceBuild {
                node: node_id.clone(),
                capability: C::NAME,
                reason: e.to_string(),
            })
    }
}
