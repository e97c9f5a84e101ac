//! Per-request access to the rest of the cluster.
//!
//! A handler that needs a cluster-wide view builds a [`ProxiedResource`] from
//! the shared state and the inbound headers. The first `Authorization` value
//! becomes the credential every outbound per-node call carries.

use std::sync::Arc;

use axum::http::HeaderMap;

use node_fanout::FanOutInvoker;
use node_registry::NodeRegistry;
use node_remote::{Credential, HttpClientFactory, RemoteInterfaceResolver};

use crate::AppState;

pub struct ProxiedResource {
    invoker: FanOutInvoker<HttpClientFactory>,
}

impl ProxiedResource {
    pub fn new(state: &AppState, headers: &HeaderMap) -> Self {
        let credential = Credential::from_headers(headers);
        let registry: Arc<dyn NodeRegistry> = state.registry.clone();
        let resolver = RemoteInterfaceResolver::new(registry, state.factory.clone(), credential);
        let invoker = FanOutInvoker::new(resolver, state.fan_out.clone())
            .with_observer(state.observer.clone());
        Self { invoker }
    }

    pub fn credential(&self) -> &Credential {
        self.invoker.resolver().credential()
    }

    pub fn invoker(&self) -> &FanOutInvoker<HttpClientFactory> {
        &self.invoker
    }
}
