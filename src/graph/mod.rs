//! Graph data structures.
//!
//! This module provides the graph consumed by the layout engine: topology in
//! petgraph's `UnGraph`, with Structure of Arrays (SoA) buffers for node
//! positions so the simulation and a renderer can share them cheaply.

mod node;
mod store;

pub use node::NodeId;
pub use store::Graph;
