//! Node wiring: configuration, registry seeding, heartbeat.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use node_fanout::FanOutConfig;
use node_registry::{ClusterDirectory, NodeIdentity};
use node_remote::{ClientFactory, Credential, HttpClientFactory, RemoteResponse, SystemApi};

pub const CONFIG_ENV: &str = "FANOUT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "fanout.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerConfig {
    pub node_id: String,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Address other nodes use to reach this one.
    #[serde(default = "default_advertise_address")]
    pub advertise_address: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_alive_timeout")]
    pub alive_timeout_secs: u64,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

fn default_node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
fn default_listen() -> String {
    "127.0.0.1:9900".into()
}
fn default_advertise_address() -> String {
    "127.0.0.1".into()
}
fn default_call_timeout_ms() -> u64 {
    5000
}
fn default_max_in_flight() -> usize {
    16
}
fn default_heartbeat_interval() -> u64 {
    10
}
fn default_alive_timeout() -> u64 {
    30
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            listen: default_listen(),
            advertise_address: default_advertise_address(),
            api_token: None,
            call_timeout_ms: default_call_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            alive_timeout_secs: default_alive_timeout(),
            peers: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// A zero timeout disables the per-call deadline.
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }

    pub fn fan_out_config(&self) -> FanOutConfig {
        FanOutConfig {
            max_in_flight: self.max_in_flight,
            call_timeout: self.call_timeout(),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn alive_timeout(&self) -> Duration {
        Duration::from_secs(self.alive_timeout_secs)
    }

    /// Credential the heartbeat presents to peers.
    pub fn heartbeat_credential(&self) -> Credential {
        self.api_token
            .as_deref()
            .map(Credential::bearer)
            .unwrap_or_default()
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Missing file means defaults.
pub fn load_config(path: &Path) -> Result<NodeConfig> {
    if !path.exists() {
        return Ok(NodeConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

/// Directory holding this node (at `port`) and every configured peer.
/// A peer entry naming this node is skipped; a repeated peer id keeps the
/// last address given.
pub fn seed_directory(config: &NodeConfig, port: u16) -> ClusterDirectory {
    let mut dir = ClusterDirectory::new();
    dir.insert(config.node_id.as_str(), &config.advertise_address, port);
    for peer in &config.peers {
        if peer.node_id == config.node_id {
            warn!("ignoring peer entry for this node ({})", peer.node_id);
            continue;
        }
        if dir.insert(peer.node_id.as_str(), &peer.address, peer.port) {
            info!("seeded peer {} at {}:{}", peer.node_id, peer.address, peer.port);
        } else {
            warn!("duplicate peer {} in config, using {}:{}", peer.node_id, peer.address, peer.port);
        }
    }
    dir
}

/// One heartbeat round: probe every other known node's health endpoint,
/// mark it accordingly, then demote stale entries.
pub async fn probe_peers(
    self_id: &NodeIdentity,
    registry: &RwLock<ClusterDirectory>,
    factory: &HttpClientFactory,
    credential: &Credential,
    alive_timeout: Duration,
) {
    let peers: Vec<_> = {
        let dir = registry.read().await;
        dir.members()
            .filter(|n| &n.id != self_id)
            .cloned()
            .collect()
    };

    for peer in &peers {
        let healthy = match ClientFactory::<SystemApi>::build(factory, peer, credential) {
            Ok(api) => match api.health().execute().await {
                Ok(RemoteResponse::Success(health)) => health.healthy,
                Ok(RemoteResponse::Failure { status, message }) => {
                    warn!("peer {} health returned {status}: {message}", peer.id);
                    false
                }
                Err(e) => {
                    warn!("peer {} unreachable: {e}", peer.id);
                    false
                }
            },
            Err(e) => {
                warn!("peer {} has no usable endpoint: {e}", peer.id);
                false
            }
        };

        if healthy {
            debug!("peer {} alive", peer.id);
        }
        registry.write().await.record_probe(&peer.id, healthy);
    }

    let mut dir = registry.write().await;
    dir.record_probe(self_id, true);
    dir.expire(alive_timeout);
}

pub async fn heartbeat_loop(
    self_id: NodeIdentity,
    registry: Arc<RwLock<ClusterDirectory>>,
    factory: Arc<HttpClientFactory>,
    credential: Credential,
    interval: Duration,
    alive_timeout: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        probe_peers(&self_id, &registry, &factory, &credential, alive_timeout).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_registry::MembershipState;

    #[test]
    fn defaults_from_empty_toml() {
        let config: NodeConfig = toml::from_str("").unwrap();
        assert!(!config.node_id.is_empty());
        assert_eq!(config.listen, "127.0.0.1:9900");
        assert_eq!(config.call_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.fan_out_config().max_in_flight, 16);
        assert!(config.peers.is_empty());
        assert!(!config.heartbeat_credential().is_present());
    }

    #[test]
    fn parses_peers_and_overrides() {
        let config: NodeConfig = toml::from_str(
            r#"
            node_id = "alpha"
            api_token = "s3cret"
            call_timeout_ms = 0
            max_in_flight = 4

            [[peers]]
            node_id = "beta"
            address = "10.0.0.2"
            port = 9900
            "#,
        )
        .unwrap();
        assert_eq!(config.node_id, "alpha");
        assert_eq!(config.call_timeout(), None);
        assert_eq!(config.fan_out_config().max_in_flight, 4);
        assert_eq!(config.peers.len(), 1);
        assert_eq!(
            config.heartbeat_credential().as_header_value(),
            Some("Bearer s3cret")
        );
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/fanout.toml")).unwrap();
        assert_eq!(config.max_in_flight, 16);
    }

    #[test]
    fn seed_includes_self_and_skips_duplicate_self() {
        let mut config = NodeConfig {
            node_id: "alpha".into(),
            ..NodeConfig::default()
        };
        config.peers = vec![
            PeerConfig {
                node_id: "alpha".into(),
                address: "10.0.0.1".into(),
                port: 1,
            },
            PeerConfig {
                node_id: "beta".into(),
                address: "10.0.0.2".into(),
                port: 9900,
            },
        ];

        let dir = seed_directory(&config, 9950);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get(&"alpha".into()).unwrap().port, 9950);
        assert_eq!(dir.get(&"beta".into()).unwrap().address, "10.0.0.2");
    }

    #[test]
    fn seed_keeps_self_in_large_cluster() {
        let config = NodeConfig {
            node_id: "self".into(),
            peers: (0..200)
                .map(|i| PeerConfig {
                    node_id: format!("peer-{i:03}"),
                    address: "10.0.0.2".into(),
                    port: 9000 + i,
                })
                .collect(),
            ..NodeConfig::default()
        };

        let dir = seed_directory(&config, 9900);
        assert_eq!(dir.len(), 201);
        assert_eq!(dir.get(&"self".into()).unwrap().port, 9900);
        assert!(dir.get(&"peer-000".into()).is_some());
        assert!(dir.get(&"peer-199".into()).is_some());
    }

    #[tokio::test]
    async fn probe_marks_unreachable_peer_suspect() {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = closed.local_addr().unwrap().port();
        drop(closed);

        let mut dir = ClusterDirectory::new();
        dir.insert("self", "127.0.0.1", 1);
        dir.insert("gone", "127.0.0.1", dead_port);
        let registry = RwLock::new(dir);
        let factory = HttpClientFactory::new(Some(Duration::from_secs(1))).unwrap();

        probe_peers(
            &"self".into(),
            &registry,
            &factory,
            &Credential::none(),
            Duration::from_secs(30),
        )
        .await;

        let dir = registry.read().await;
        assert_eq!(dir.get(&"self".into()).unwrap().state, MembershipState::Alive);
        assert_eq!(dir.get(&"gone".into()).unwrap().state, MembershipState::Suspect);
    }
}
