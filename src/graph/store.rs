//! Graph - node positions and immutable topology.
//!
//! Topology lives in a petgraph `UnGraph`; positions are kept in SoA
//! (Structure of Arrays) buffers so a renderer can take zero-copy views of
//! each axis. The layout engine snapshots positions at the start of a step
//! and writes the new positions back once all forces are known.

use nalgebra::{Point3, Vector3};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::Rng;
use rstar::AABB;

use super::node::NodeId;
use crate::error::{LayoutError, Result};

/// Undirected graph with 3D node positions.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Topology only; node and edge weights are unused.
    topology: UnGraph<(), ()>,

    /// X positions (SoA layout)
    pos_x: Vec<f64>,

    /// Y positions (SoA layout)
    pos_y: Vec<f64>,

    /// Z positions (SoA layout)
    pos_z: Vec<f64>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            topology: UnGraph::with_capacity(node_capacity, edge_capacity),
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Add a node at the specified position.
    pub fn add_node(&mut self, position: Point3<f64>) -> NodeId {
        let id = NodeId::from(self.topology.add_node(()));
        self.pos_x.push(position.x);
        self.pos_y.push(position.y);
        self.pos_z.push(position.z);
        id
    }

    /// Add nodes from a flat positions array [x0, y0, z0, x1, y1, z1, ...].
    ///
    /// A trailing partial triple is ignored. Returns the number of nodes added.
    pub fn add_nodes_from_positions(&mut self, positions: &[f64]) -> u32 {
        let count = positions.len() / 3;

        self.pos_x.reserve(count);
        self.pos_y.reserve(count);
        self.pos_z.reserve(count);

        for xyz in positions.chunks_exact(3) {
            self.add_node(Point3::new(xyz[0], xyz[1], xyz[2]));
        }

        count as u32
    }

    /// Add an undirected edge between two existing nodes.
    ///
    /// Neighbors form a set: a pair that is already connected (in either
    /// direction) and self-loops are ignored. Returns whether an edge was added.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        for id in [a, b] {
            if id.index() >= self.node_count() {
                return Err(LayoutError::UnknownNode(id));
            }
        }
        if a == b || self.topology.find_edge(a.into(), b.into()).is_some() {
            return Ok(false);
        }
        self.topology.add_edge(a.into(), b.into(), ());
        Ok(true)
    }

    /// Add edges from pairs [a0, b0, a1, b1, ...].
    ///
    /// Pairs naming a missing node, self-loops and repeated pairs are skipped.
    /// Returns the number of edges added.
    pub fn add_edges_from_pairs(&mut self, edges: &[u32]) -> u32 {
        edges
            .chunks_exact(2)
            .filter(|pair| matches!(self.add_edge(NodeId(pair[0]), NodeId(pair[1])), Ok(true)))
            .count() as u32
    }

    /// Place every node uniformly at random inside `[0, width) x [0, height) x [0, depth)`.
    pub fn scatter_positions<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        width: f64,
        height: f64,
        depth: f64,
    ) -> Result<()> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(LayoutError::InvalidDimension { width, height });
        }
        if !(depth > 0.0 && depth.is_finite()) {
            return Err(LayoutError::InvalidParameter {
                name: "depth",
                value: depth,
                reason: "must be positive and finite",
            });
        }

        for i in 0..self.node_count() {
            self.pos_x[i] = rng.gen_range(0.0..width);
            self.pos_y[i] = rng.gen_range(0.0..height);
            self.pos_z[i] = rng.gen_range(0.0..depth);
        }
        Ok(())
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.topology.clear();
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.topology.edge_count()
    }

    /// Get the neighbors of a node. Unknown nodes have none.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let index = NodeIndex::from(id);
        let known = id.index() < self.node_count();
        known
            .then(|| self.topology.neighbors(index))
            .into_iter()
            .flatten()
            .map(NodeId::from)
    }

    /// Number of incident edges (a self-loop counts once).
    pub fn degree(&self, id: NodeId) -> usize {
        self.neighbors(id).count()
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Get a node's position.
    pub fn position(&self, id: NodeId) -> Option<Point3<f64>> {
        let i = id.index();
        (i < self.node_count()).then(|| Point3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i]))
    }

    /// Set a node's position. Unknown nodes are ignored.
    pub fn set_position(&mut self, id: NodeId, position: Point3<f64>) {
        let i = id.index();
        if i < self.node_count() {
            self.pos_x[i] = position.x;
            self.pos_y[i] = position.y;
            self.pos_z[i] = position.z;
        }
    }

    /// Copy of all positions, indexed by node.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        (0..self.node_count())
            .map(|i| Point3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i]))
            .collect()
    }

    /// Move a node by `delta`.
    pub(crate) fn translate(&mut self, index: usize, delta: &Vector3<f64>) {
        self.pos_x[index] += delta.x;
        self.pos_y[index] += delta.y;
        self.pos_z[index] += delta.z;
    }

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f64] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f64] {
        &self.pos_y
    }

    /// Get Z positions slice.
    pub fn positions_z(&self) -> &[f64] {
        &self.pos_z
    }

    /// Axis-aligned bounding box of all node positions as `(min, max)`.
    ///
    /// Returns None if the graph is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.node_count() == 0 {
            return None;
        }
        let corners: Vec<[f64; 3]> = (0..self.node_count())
            .map(|i| [self.pos_x[i], self.pos_y[i], self.pos_z[i]])
            .collect();
        let envelope = AABB::from_points(corners.iter());
        Some((Point3::from(envelope.lower()), Point3::from(envelope.upper())))
    }
}
