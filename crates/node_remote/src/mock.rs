//! Scripted client factory for tests: canned per-node replies, no network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use node_registry::{Node, NodeIdentity};

use crate::call::{PendingCall, RemoteResponse, TransportError};
use crate::capability::{BuildError, Capability, ClientFactory};
use crate::credential::Credential;

#[derive(Debug, Clone)]
pub enum MockReply {
    Success(serde_json::Value),
    Transport(String),
    Remote { status: u16, message: String },
    /// The factory refuses to build a client for the node.
    BuildFailure(String),
    /// The call never completes.
    Hang,
}

/// Records every build and counts executed calls.
pub struct MockClientFactory {
    replies: Mutex<HashMap<NodeIdentity, MockReply>>,
    builds: Mutex<Vec<(NodeIdentity, Credential)>>,
    executed: Arc<AtomicUsize>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            builds: Mutex::new(Vec::new()),
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn script(&self, node: impl Into<NodeIdentity>, reply: MockReply) {
        self.replies.lock().unwrap().insert(node.into(), reply);
    }

    pub fn take_builds(&self) -> Vec<(NodeIdentity, Credential)> {
        std::mem::take(&mut *self.builds.lock().unwrap())
    }

    /// Number of calls that have actually run.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl Default for MockClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MockClient {
    node: NodeIdentity,
    reply: Option<MockReply>,
    executed: Arc<AtomicUsize>,
}

impl Capability for MockClient {
    const NAME: &'static str = "MockClient";
}

impl ClientFactory<MockClient> for MockClientFactory {
    fn build(&self, node: &Node, credential: &Credential) -> Result<MockClient, BuildError> {
        self.builds
            .lock()
            .unwrap()
            .push((node.id.clone(), credential.clone()));

        let reply = self.replies.lock().unwrap().get(&node.id).cloned();
        if let Some(MockReply::BuildFailure(reason)) = &reply {
            return Err(BuildError::Rejected(reason.clone()));
        }

        Ok(MockClient {
            node: node.id.clone(),
            reply,
            executed: self.executed.clone(),
        })
    }
}

impl MockClient {
    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    /// Deferred call answering with this node's scripted reply.
    pub fn fetch<T>(&self) -> PendingCall<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let target = format!("mock://{}/fetch", self.node);
        let reply = self.reply.clone();
        let executed = self.executed.clone();

        PendingCall::new(target, async move {
            executed.fetch_add(1, Ordering::SeqCst);
            match reply {
                Some(MockReply::Success(value)) => serde_json::from_value(value)
                    .map(RemoteResponse::Success)
                    .map_err(|e| TransportError::Decode(e.to_string())),
                Some(MockReply::Transport(message)) => Err(TransportError::Connection(message)),
                Some(MockReply::Remote { status, message }) => {
                    Ok(RemoteResponse::Failure { status, message })
                }
                Some(MockReply::Hang) => std::future::pending().await,
                Some(MockReply::BuildFailure(_)) | None => {
                    Err(TransportError::Connection("no scripted reply".into()))
                }
            }
        })
    }
}
