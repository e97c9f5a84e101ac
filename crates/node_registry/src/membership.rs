//! Node records and the heartbeat-driven membership state.

use std::fmt;
use std::net::IpAddr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Opaque identity of a cluster member. Used as the aggregation key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Alive and Suspect members are addressed by a fan-out; Dead ones are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    Alive,
    Suspect,
    Dead,
}

impl fmt::Display for MembershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alive => "Alive",
            Self::Suspect => "Suspect",
            Self::Dead => "Dead",
        };
        f.write_str(name)
    }
}

/// An addressable cluster member as the registry knows it.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeIdentity,
    /// Host name or IP literal. IPv6 literals may be given with or without brackets.
    pub address: String,
    pub port: u16,
    pub state: MembershipState,
    /// Last successful health probe (or joining, for a fresh member).
    pub last_seen: Instant,
    /// When `state` last changed.
    pub state_since: Instant,
}

impl Node {
    pub fn new(id: impl Into<NodeIdentity>, address: &str, port: u16) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            address: address.to_string(),
            port,
            state: MembershipState::Alive,
            last_seen: now,
            state_since: now,
        }
    }

    /// HTTP base URL of the node's API, without a trailing slash.
    pub fn base_url(&self) -> String {
        match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("http://[{ip}]:{}", self.port),
            _ => format!("http://{}:{}", self.address, self.port),
        }
    }

    pub fn mark_alive(&mut self) {
        let now = Instant::now();
        if self.state != MembershipState::Alive {
            self.state = MembershipState::Alive;
            self.state_since = now;
        }
        self.last_seen = now;
    }

    /// Only an Alive node turns Suspect; a Dead one stays Dead until it answers.
    pub fn mark_suspect(&mut self) {
        if self.state == MembershipState::Alive {
            self.state = MembershipState::Suspect;
            self.state_since = Instant::now();
        }
    }

    pub fn mark_dead(&mut self) {
        if self.state != MembershipState::Dead {
            self.state = MembershipState::Dead;
            self.state_since = Instant::now();
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != MembershipState::Dead
    }
}
