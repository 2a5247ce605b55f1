//! Node identifier.
//!
//! Nodes are addressed by their position in the graph's node sequence:
//! the first node added is `NodeId(0)`, the last is `NodeId(N - 1)`.
//! Topology never changes during a simulation, so the index doubles as
//! a stable identity.

use std::fmt;

use petgraph::graph::NodeIndex;

/// Index of a node in insertion order, as handed to and from JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Position of this node in the graph's node sequence.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl From<NodeIndex> for NodeId {
    #[inline]
    fn from(index: NodeIndex) -> Self {
        Self(index.index() as u32)
    }
}

impl From<NodeId> for NodeIndex {
    #[inline]
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_index_round_trip() {
        let index: NodeIndex = NodeId(7).into();
        assert_eq!(index.index(), 7);
        assert_eq!(NodeId::from(index), NodeId(7));
    }
}
