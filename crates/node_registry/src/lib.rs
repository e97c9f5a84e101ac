//! Cluster membership: node records, the configured member directory, and
//! the registry seam the fan-out reads its active node set from.

pub mod directory;
pub mod membership;
pub mod registry;

pub use directory::ClusterDirectory;
pub use membership::{MembershipState, Node, NodeIdentity};
pub use registry::{NodeRegistry, RegistryError};
