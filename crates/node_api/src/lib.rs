//! Axum API: the node-local system endpoints and the cluster-wide views
//! built on the fan-out.
//!
//! Endpoints:
//! - GET /api/system
//! - GET /api/system/health
//! - GET /cluster/nodes
//! - GET /cluster/system
//! - GET /cluster/health

pub mod proxied;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use node_fanout::{AggregateResult, FanOutConfig, FanOutError, FanOutObserver};
use node_registry::{ClusterDirectory, NodeIdentity};
use node_remote::system::{HEALTH_PATH, SYSTEM_PATH};
use node_remote::{Credential, HealthStatus, HttpClientFactory, SystemApi, SystemOverview};

pub use proxied::ProxiedResource;

/// Shared application state for all API handlers.
pub struct AppState {
    pub node_id: NodeIdentity,
    pub registry: Arc<RwLock<ClusterDirectory>>,
    pub factory: Arc<HttpClientFactory>,
    pub fan_out: FanOutConfig,
    pub observer: Arc<dyn FanOutObserver>,
    /// When set, the node-local endpoints require `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
    pub started_at: Instant,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SYSTEM_PATH, get(handle_system))
        .route(HEALTH_PATH, get(handle_health))
        .route("/cluster/nodes", get(handle_cluster_nodes))
        .route("/cluster/system", get(handle_cluster_system))
        .route("/cluster/health", get(handle_cluster_health))
        .with_state(state)
}

type Rejection = (StatusCode, &'static str);

// ---------- Data types ----------

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: String,
    pub address: String,
    pub port: u16,
    pub state: String,
}

// ---------- Handlers ----------

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let Some(token) = &state.api_token else {
        return Ok(());
    };
    let expected = Credential::bearer(token);
    if Credential::from_headers(headers) == expected {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "missing or invalid bearer token"))
    }
}

async fn handle_system(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SystemOverview>, Rejection> {
    authorize(&state, &headers)?;
    let known_nodes = state.registry.read().await.len();

    Ok(Json(SystemOverview {
        node_id: state.node_id.to_string(),
        version: env!("CARGO_PKG_VERSION").into(),
        status: "running".into(),
        known_nodes,
        uptime_secs: state.started_at.elapsed().as_secs(),
    }))
}

async fn handle_health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<HealthStatus>, Rejection> {
    authorize(&state, &headers)?;
    Ok(Json(HealthStatus {
        healthy: true,
        message: "ok".into(),
    }))
}

/// Member addresses are guarded like the node-local endpoints.
async fn handle_cluster_nodes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<NodeInfo>>, Rejection> {
    authorize(&state, &headers)?;
    let dir = state.registry.read().await;
    let nodes = dir
        .members()
        .map(|n| NodeInfo {
            node_id: n.id.to_string(),
            address: n.address.clone(),
            port: n.port,
            state: n.state.to_string(),
        })
        .collect();
    Ok(Json(nodes))
}

async fn handle_cluster_system(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AggregateResult<SystemOverview>>, StatusCode> {
    let resource = ProxiedResource::new(&state, &headers);
    resource
        .invoker()
        .get_for_all_nodes(SystemApi::overview)
        .await
        .map(Json)
        .map_err(unavailable)
}

async fn handle_cluster_health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AggregateResult<bool>>, StatusCode> {
    let resource = ProxiedResource::new(&state, &headers);
    resource
        .invoker()
        .get_for_all_nodes_with(SystemApi::health, |health| health.healthy)
        .await
        .map(Json)
        .map_err(unavailable)
}

fn unavailable(e: FanOutError) -> StatusCode {
    warn!("cluster request aborted: {e}");
    StatusCode::SERVICE_UNAVAILABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use node_fanout::TracingObserver;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_state(node_id: &str, api_token: Option<&str>) -> Arc<AppState> {
        let factory = HttpClientFactory::new(Some(Duration::from_secs(2))).unwrap();
        Arc::new(AppState {
            node_id: node_id.into(),
            registry: Arc::new(RwLock::new(ClusterDirectory::new())),
            factory: Arc::new(factory),
            fan_out: FanOutConfig::default(),
            observer: Arc::new(TracingObserver),
            api_token: api_token.map(str::to_string),
            started_at: Instant::now(),
        })
    }

    async fn spawn_node(state: Arc<AppState>) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        port
    }

    async fn get_json(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::get(uri);
        if let Some(value) = auth {
            req = req.header("authorization", value);
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn system_endpoint() {
        let state = create_test_state("test-node-001", None);
        state.registry.write().await.insert("peer-1", "192.168.1.10", 9000);
        let app = build_router(state);

        let (status, body) = get_json(app, "/api/system", None).await;
        assert_eq!(status, StatusCode::OK);
        let overview: SystemOverview = serde_json::from_value(body).unwrap();
        assert_eq!(overview.node_id, "test-node-001");
        assert_eq!(overview.status, "running");
        assert_eq!(overview.known_nodes, 1);
    }

    #[tokio::test]
    async fn local_endpoints_require_token_when_configured() {
        let state = create_test_state("n1", Some("s3cret"));

        let (status, _) = get_json(build_router(state.clone()), "/api/system/health", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get_json(
            build_router(state.clone()),
            "/api/system/health",
            Some("Bearer wrong"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            get_json(build_router(state), "/api/system/health", Some("Bearer s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[tokio::test]
    async fn cluster_nodes_lists_registry() {
        let state = create_test_state("n1", None);
        {
            let mut dir = state.registry.write().await;
            dir.insert("peer-b", "10.0.0.2", 9900);
            dir.insert("peer-a", "10.0.0.1", 9900);
        }
        let (status, body) = get_json(build_router(state), "/cluster/nodes", None).await;
        assert_eq!(status, StatusCode::OK);
        let nodes: Vec<NodeInfo> = serde_json::from_value(body).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_id, "peer-a");
        assert_eq!(nodes[1].state, "Alive");
    }

    #[tokio::test]
    async fn cluster_nodes_requires_token_when_configured() {
        let state = create_test_state("n1", Some("s3cret"));
        state.registry.write().await.insert("peer-a", "10.0.0.1", 9900);

        let (status, _) = get_json(build_router(state.clone()), "/cluster/nodes", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            get_json(build_router(state), "/cluster/nodes", Some("Bearer s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["address"], "10.0.0.1");
    }

    #[tokio::test]
    async fn cluster_system_with_no_nodes_is_empty_object() {
        let state = create_test_state("n1", None);
        let (status, body) = get_json(build_router(state), "/cluster/system", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({}));
    }

    #[tokio::test]
    async fn cluster_system_marks_unreachable_node_absent() {
        let peer_port = spawn_node(create_test_state("peer-up", None)).await;

        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = closed.local_addr().unwrap().port();
        drop(closed);

        let state = create_test_state("front", None);
        {
            let mut dir = state.registry.write().await;
            dir.insert("peer-up", "127.0.0.1", peer_port);
            dir.insert("peer-down", "127.0.0.1", dead_port);
        }

        let (status, body) = get_json(build_router(state), "/cluster/system", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["peer-up"]["node_id"], "peer-up");
        assert!(body["peer-down"].is_null());
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cluster_health_forwards_credential() {
        let peer_port = spawn_node(create_test_state("peer", Some("s3cret"))).await;

        let state = create_test_state("front", None);
        state.registry.write().await.insert("peer", "127.0.0.1", peer_port);

        let (status, body) =
            get_json(build_router(state.clone()), "/cluster/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["peer"].is_null());

        let (status, body) =
            get_json(build_router(state), "/cluster/health", Some("Bearer s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "peer": true }));
    }
}
