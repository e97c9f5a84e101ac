//! The read-only registry seam: the active node set and lookups by identity.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::membership::{Node, NodeIdentity};
use crate::directory::ClusterDirectory;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node <{0}> not found")]
    NotFound(NodeIdentity),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Source of cluster membership.
#[async_trait::async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Snapshot of every active node, keyed by identity.
    async fn all_active(&self) -> Result<BTreeMap<NodeIdentity, Node>>;

    /// Look up one node regardless of its membership state.
    async fn by_identity(&self, id: &NodeIdentity) -> Result<Node>;
}

#[async_trait::async_trait]
impl NodeRegistry for RwLock<ClusterDirectory> {
    async fn all_active(&self) -> Result<BTreeMap<NodeIdentity, Node>> {
        let dir = self.read().await;
        Ok(dir
            .active()
            .map(|node| (node.id.clone(), node.clone()))
            .collect())
    }

    async fn by_identity(&self, id: &NodeIdentity) -> Result<Node> {
        self.read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> RwLock<ClusterDirectory> {
        let mut dir = ClusterDirectory::new();
        dir.insert("n1", "10.0.0.1", 9900);
        dir.insert("n2", "10.0.0.2", 9900);
        dir.insert("n3", "10.0.0.3", 9900);
        dir.record_probe(&NodeIdentity::from("n2"), false);
        dir.get_mut(&NodeIdentity::from("n3")).unwrap().mark_dead();
        RwLock::new(dir)
    }

    #[tokio::test]
    async fn all_active_skips_dead_nodes() {
        let registry = directory();
        let active = registry.all_active().await.unwrap();
        let ids: Vec<&str> = active.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn by_identity_finds_any_known_node() {
        let registry = directory();
        let node = registry.by_identity(&"n3".into()).await.unwrap();
        assert_eq!(node.address, "10.0.0.3");
    }

    #[tokio::test]
    async fn by_identity_unknown_is_not_found() {
        let registry = directory();
        let err = registry.by_identity(&"ghost".into()).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref id) if id.as_str() == "ghost"));
        assert_eq!(err.to_string(), "node <ghost> not found");
    }
}
