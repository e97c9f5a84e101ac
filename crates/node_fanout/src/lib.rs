//! Cluster fan-out: call every active node once, keep going when some of
//! them fail, and fold the outcomes into one map keyed by node identity.
//!
//! ```ignore
//! let invoker = FanOutInvoker::new(resolver, FanOutConfig::default());
//! let overviews = invoker.get_for_all_nodes(SystemApi::overview).await?;
//! let healthy = invoker
//!     .get_for_all_nodes_with(SystemApi::health, |h| h.healthy)
//!     .await?;
//! ```

pub mod aggregate;
pub mod invoker;
pub mod observer;
pub mod outcome;

pub use aggregate::AggregateResult;
pub use invoker::{FanOutConfig, FanOutError, FanOutInvoker};
pub use observer::{Diagnostic, FanOutObserver, RecordingObserver, TracingObserver};
pub use outcome::NodeOutcome;
