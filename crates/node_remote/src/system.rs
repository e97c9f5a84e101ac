//! The node-local system API: wire types shared with the serving side, plus
//! the capability that calls it.

use serde::{Deserialize, Serialize};

use crate::call::PendingCall;
use crate::capability::Capability;
use crate::http::{HttpCapability, HttpChannel};

pub const SYSTEM_PATH: &str = "/api/system";
pub const HEALTH_PATH: &str = "/api/system/health";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemOverview {
    pub node_id: String,
    pub version: String,
    pub status: String,
    pub known_nodes: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
}

pub struct SystemApi {
    channel: HttpChannel,
}

impl Capability for SystemApi {
    const NAME: &'static str = "SystemApi";
}

impl HttpCapability for SystemApi {
    fn from_channel(channel: HttpChannel) -> Self {
        Self { channel }
    }
}

impl SystemApi {
    pub fn overview(&self) -> PendingCall<SystemOverview> {
        self.channel.get_json(SYSTEM_PATH)
    }

    pub fn health(&self) -> PendingCall<HealthStatus> {
        self.channel.get_json(HEALTH_PATH)
    }
}
