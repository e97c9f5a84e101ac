//! The member table behind a node's registry.
//!
//! Members are the configured cluster plus this node. They are never evicted;
//! the heartbeat only moves them between Alive, Suspect and Dead.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::membership::{MembershipState, Node, NodeIdentity};

/// How long a member may stay Suspect before it is considered Dead.
pub const DEAD_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct ClusterDirectory {
    members: BTreeMap<NodeIdentity, Node>,
}

impl ClusterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. A known identity keeps its state and only takes the
    /// new address. Returns true if the member is new.
    pub fn insert(&mut self, id: impl Into<NodeIdentity>, address: &str, port: u16) -> bool {
        let id = id.into();
        match self.members.get_mut(&id) {
            Some(existing) => {
                existing.address = address.to_string();
                existing.port = port;
                false
            }
            None => {
                self.members.insert(id.clone(), Node::new(id, address, port));
                true
            }
        }
    }

    pub fn get(&self, id: &NodeIdentity) -> Option<&Node> {
        self.members.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeIdentity) -> Option<&mut Node> {
        self.members.get_mut(id)
    }

    /// Every member, ordered by identity.
    pub fn members(&self) -> impl Iterator<Item = &Node> {
        self.members.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &Node> {
        self.members.values().filter(|n| n.is_active())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Apply one health probe result. Unknown identities are ignored.
    pub fn record_probe(&mut self, id: &NodeIdentity, healthy: bool) {
        let Some(node) = self.members.get_mut(id) else {
            return;
        };
        if healthy {
            node.mark_alive();
        } else {
            node.mark_suspect();
        }
    }

    /// Demote members that have gone quiet: Alive without a successful probe
    /// for `alive_timeout` becomes Suspect, Suspect for [`DEAD_AFTER`] becomes Dead.
    pub fn expire(&mut self, alive_timeout: Duration) {
        let now = Instant::now();
        for node in self.members.values_mut() {
            let stale = match node.state {
                MembershipState::Alive => now.duration_since(node.last_seen) > alive_timeout,
                MembershipState::Suspect => now.duration_since(node.state_since) > DEAD_AFTER,
                MembershipState::Dead => false,
            };
            if !stale {
                continue;
            }
            if node.state == MembershipState::Alive {
                node.mark_suspect();
            } else {
                node.mark_dead();
            }
        }
    }
}
