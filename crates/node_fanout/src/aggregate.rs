//! The aggregated fan-out result: exactly one entry per node in the snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use node_registry::NodeIdentity;

/// Node identity to `Some(value)` (present) or `None` (absent).
///
/// Serializes as a JSON object; absent entries become `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult<T> {
    entries: BTreeMap<NodeIdentity, Option<T>>,
}

impl<T> AggregateResult<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node: &NodeIdentity) -> bool {
        self.entries.contains_key(node)
    }

    /// The present value for `node`, if the node answered.
    pub fn get(&self, node: &NodeIdentity) -> Option<&T> {
        self.entries.get(node).and_then(Option::as_ref)
    }

    /// True if `node` is in the result but produced nothing.
    pub fn is_absent(&self, node: &NodeIdentity) -> bool {
        matches!(self.entries.get(node), Some(None))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeIdentity> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeIdentity, Option<&T>)> {
        self.entries.iter().map(|(node, entry)| (node, entry.as_ref()))
    }

    pub fn present(&self) -> impl Iterator<Item = (&NodeIdentity, &T)> {
        self.entries
            .iter()
            .filter_map(|(node, entry)| entry.as_ref().map(|value| (node, value)))
    }

    pub fn absent(&self) -> impl Iterator<Item = &NodeIdentity> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_none())
            .map(|(node, _)| node)
    }
}

impl<T> Default for AggregateResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(NodeIdentity, Option<T>)> for AggregateResult<T> {
    fn from_iter<I: IntoIterator<Item = (NodeIdentity, Option<T>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for AggregateResult<T> {
    type Item = (NodeIdentity, Option<T>);
    type IntoIter = std::collections::btree_map::IntoIter<NodeIdentity, Option<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
