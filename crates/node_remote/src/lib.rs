//! Remote interfaces to cluster nodes.
//!
//! A capability is a statically typed client shape (e.g. [`SystemApi`]).
//! A [`ClientFactory`] builds it for one node and one forwarded
//! [`Credential`]; the [`RemoteInterfaceResolver`] ties that to the registry.
//! Calls are deferred as [`PendingCall`]s and run by whoever holds them.

pub mod call;
pub mod capability;
pub mod credential;
pub mod http;
pub mod mock;
pub mod resolver;
pub mod system;

pub use call::{PendingCall, RemoteResponse, TransportError};
pub use capability::{BuildError, Capability, ClientFactory};
pub use credential::Credential;
pub use http::{HttpCapability, HttpChannel, HttpClientFactory};
pub use resolver::{RemoteInterfaceResolver, ResolutionFailure};
pub use system::{HealthStatus, SystemApi, SystemOverview};
