//! The fan-out invoker.
//!
//! One snapshot of the active node set defines the result's key set. Each node
//! then runs its own resolve, invoke, classify sequence; sequences run
//! concurrently up to `max_in_flight` and never see each other's failures.
//! Every sequence ends in a slot `(node, entry)`, and the slots are folded into
//! the map once all of them have settled.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::debug;

use node_registry::{NodeIdentity, RegistryError};
use node_remote::{Capability, ClientFactory, PendingCall, RemoteInterfaceResolver, TransportError};

use crate::aggregate::AggregateResult;
use crate::observer::{FanOutObserver, TracingObserver};
use crate::outcome::NodeOutcome;

const DEFAULT_MAX_IN_FLIGHT: usize = 16;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Per-node calls allowed to run at once. `1` runs nodes one after another.
    pub max_in_flight: usize,
    /// Deadline for a single call. Expiry is a transport failure for that node only.
    pub call_timeout: Option<Duration>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }
}

/// Raised only when the active node set itself cannot be read.
#[derive(Debug, Error)]
pub enum FanOutError {
    #[error("unable to read active nodes: {0}")]
    Registry(#[from] RegistryError),
}

pub struct FanOutInvoker<F> {
    resolver: RemoteInterfaceResolver<F>,
    config: FanOutConfig,
    observer: Arc<dyn FanOutObserver>,
}

impl<F> FanOutInvoker<F> {
    pub fn new(resolver: RemoteInterfaceResolver<F>, config: FanOutConfig) -> Self {
        Self {
            resolver,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FanOutObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn resolver(&self) -> &RemoteInterfaceResolver<F> {
        &self.resolver
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    /// Call every active node and keep the raw payloads.
    pub async fn get_for_all_nodes<C, R, B>(
        &self,
        call_builder: B,
    ) -> Result<AggregateResult<R>, FanOutError>
    where
        C: Capability,
        F: ClientFactory<C>,
        B: Fn(&C) -> PendingCall<R>,
    {
        self.get_for_all_nodes_with(call_builder, std::convert::identity)
            .await
    }

    /// Call every active node and run `transform` on each successful payload.
    pub async fn get_for_all_nodes_with<C, R, T, B, X>(
        &self,
        call_builder: B,
        transform: X,
    ) -> Result<AggregateResult<T>, FanOutError>
    where
        C: Capability,
        F: ClientFactory<C>,
        B: Fn(&C) -> PendingCall<R>,
        X: Fn(R) -> T,
    {
        let snapshot = self.resolver.registry().all_active().await?;
        Ok(self
            .fan_out(snapshot.into_keys(), call_builder, transform)
            .await)
    }

    /// Fan out over an explicit snapshot. Cannot fail: every node in `nodes`
    /// gets exactly one entry.
    pub async fn fan_out<C, R, T, B, X, I>(
        &self,
        nodes: I,
        call_builder: B,
        transform: X,
    ) -> AggregateResult<T>
    where
        C: Capability,
        F: ClientFactory<C>,
        B: Fn(&C) -> PendingCall<R>,
        X: Fn(R) -> T,
        I: IntoIterator<Item = NodeIdentity>,
    {
        let nodes: Vec<NodeIdentity> = nodes.into_iter().collect();
        debug!(nodes = nodes.len(), capability = C::NAME, "fanning out");

        let call_builder = &call_builder;
        let transform = &transform;
        let calls: Vec<_> = nodes
            .into_iter()
            .map(move |node| async move {
                let outcome = self.invoke::<C, R, B>(&node, call_builder).await;
                self.report(&node, &outcome);
                let entry = outcome.into_entry().map(transform);
                (node, entry)
            })
            .collect();

        let slots: Vec<(NodeIdentity, Option<T>)> = stream::iter(calls)
            .buffer_unordered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        let result: AggregateResult<T> = slots.into_iter().collect();
        debug!(
            present = result.present().count(),
            absent = result.absent().count(),
            capability = C::NAME,
            "fan-out complete"
        );
        result
    }

    async fn invoke<C, R, B>(&self, node: &NodeIdentity, call_builder: &B) -> NodeOutcome<R>
    where
        C: Capability,
        F: ClientFactory<C>,
        B: Fn(&C) -> PendingCall<R>,
    {
        let client = match self.resolver.resolve::<C>(node).await {
            Ok(client) => client,
            Err(failure) => return NodeOutcome::ResolutionFailure(failure),
        };

        let call = call_builder(&client);
        let target = call.target().to_string();
        let result = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call.execute())
                .await
                .unwrap_or_else(|_| Err(TransportError::Timeout(limit))),
            None => call.execute().await,
        };

        NodeOutcome::from_call(target, result)
    }

    fn report<T>(&self, node: &NodeIdentity, outcome: &NodeOutcome<T>) {
        match outcome {
            NodeOutcome::Success(_) => {}
            NodeOutcome::ResolutionFailure(failure) => self.observer.resolution_failed(failure),
            NodeOutcome::TransportFailure { target, error } => {
                self.observer.transport_failed(node, target, error)
            }
            NodeOutcome::RemoteFailure {
                target,
                status,
                message,
            } => self.observer.remote_failed(node, target, *status, message),
        }
    }
}
