//! Arena-backed octree for Barnes-Hut repulsion.
//!
//! Cells are stored contiguously in a `Vec` and refer to each other by
//! [`CellId`]. Each cell is an axis-aligned cube holding either at most one
//! node (a leaf) or exactly eight children, and tracks the barycenter of every
//! node beneath it.
//!
//! # Invariants
//!
//! - Containment is half-open on every axis: `origin <= p < origin + dimension`.
//! - A leaf subdivides the moment its count reaches 2; both nodes are then
//!   pushed down into the child that contains them.
//! - Subdivision stops at [`MAX_DEPTH`]. A leaf at that depth keeps every node
//!   routed to it, which is what makes coincident nodes terminate.

use nalgebra::{Point3, Vector3};
use rstar::AABB;
use tracing::trace;

/// Maximum subdivision depth below the root.
pub const MAX_DEPTH: u32 = 32;

/// Padding added to every face of the bounding box before sizing the root.
const BOUNDS_MARGIN: f64 = 1.0;

/// Index of a cell in the octree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub u32);

impl CellId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One cube of the octree.
#[derive(Debug, Clone)]
pub struct Cell {
    origin: Point3<f64>,
    dimension: f64,
    barycenter: Point3<f64>,
    /// Nodes transitively contained.
    count: usize,
    /// Nodes held directly; empty once the cell is subdivided.
    members: Vec<(usize, Point3<f64>)>,
    parent: Option<CellId>,
    children: Option<[CellId; 8]>,
    depth: u32,
}

impl Cell {
    fn new(origin: Point3<f64>, dimension: f64, parent: Option<CellId>, depth: u32) -> Self {
        Self {
            origin,
            dimension,
            barycenter: Point3::origin(),
            count: 0,
            members: Vec::new(),
            parent,
            children: None,
            depth,
        }
    }

    /// Minimum corner of the cube.
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Side length of the cube.
    pub fn dimension(&self) -> f64 {
        self.dimension
    }

    /// Mean position of all nodes beneath this cell.
    pub fn barycenter(&self) -> Point3<f64> {
        self.barycenter
    }

    /// Number of nodes beneath this cell.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    pub fn children(&self) -> Option<&[CellId; 8]> {
        self.children.as_ref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Nodes held directly by this leaf, with the positions they were inserted at.
    pub fn members(&self) -> &[(usize, Point3<f64>)] {
        &self.members
    }

    /// Half-open containment test.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|axis| {
            let low = self.origin[axis];
            low <= p[axis] && p[axis] < low + self.dimension
        })
    }

    /// Child slot for a point already known to be inside this cell.
    ///
    /// Bit 0 selects the upper x half, bit 1 the upper y half, bit 2 the upper z half.
    fn octant(&self, p: &Point3<f64>) -> usize {
        let half = self.dimension / 2.0;
        (0..3)
            .filter(|&axis| p[axis] >= self.origin[axis] + half)
            .fold(0, |slot, axis| slot | (1 << axis))
    }
}

/// Barnes-Hut octree over a snapshot of node positions.
#[derive(Debug, Clone)]
pub struct Octree {
    cells: Vec<Cell>,
}

impl Octree {
    /// Build a tree over `positions`, inserting nodes in index order.
    ///
    /// The root is a cube anchored at the padded minimum corner of the
    /// positions, with side `2 x` the largest padded extent. Non-finite
    /// positions do not contribute to the bounds and are never inserted.
    pub fn build(positions: &[Point3<f64>]) -> Self {
        let (origin, dimension) = bounding_cube(positions);
        let mut tree = Self::with_bounds(origin, dimension);
        for (node, position) in positions.iter().enumerate() {
            tree.insert(node, *position);
        }

        trace!(
            nodes = tree.node_count(),
            cells = tree.cell_count(),
            dimension,
            "built octree"
        );
        tree
    }

    /// Create an empty tree whose root is the given cube.
    pub fn with_bounds(origin: Point3<f64>, dimension: f64) -> Self {
        Self {
            cells: vec![Cell::new(origin, dimension, None, 0)],
        }
    }

    /// Insert a node. Points outside the root cube are ignored.
    pub(crate) fn insert(&mut self, node: usize, position: Point3<f64>) {
        let root = self.root();
        if self.cell(root).contains(&position) {
            self.push_down(root, node, position);
        }
    }

    /// Record `node` in `id` and route it to the matching child.
    ///
    /// Routing uses the same midpoint the children were cut at, so a point
    /// inside a cell always lands in exactly one of its children.
    fn push_down(&mut self, id: CellId, node: usize, position: Point3<f64>) {
        let cell = &mut self.cells[id.index()];
        let n = cell.count as f64;
        cell.barycenter = Point3::from((cell.barycenter.coords * n + position.coords) / (n + 1.0));
        cell.count += 1;

        if let Some(children) = cell.children {
            let child = children[cell.octant(&position)];
            self.push_down(child, node, position);
            return;
        }

        cell.members.push((node, position));
        if cell.count == 2 && cell.depth < MAX_DEPTH {
            let members = std::mem::take(&mut cell.members);
            let children = self.subdivide(id);
            for (member, p) in members {
                let child = children[self.cell(id).octant(&p)];
                self.push_down(child, member, p);
            }
        }
    }

    fn subdivide(&mut self, id: CellId) -> [CellId; 8] {
        let cell = self.cell(id);
        let (origin, half, depth) = (cell.origin, cell.dimension / 2.0, cell.depth + 1);

        let first = self.cells.len();
        for slot in 0..8 {
            let offset = Vector3::new(
                if slot & 1 != 0 { half } else { 0.0 },
                if slot & 2 != 0 { half } else { 0.0 },
                if slot & 4 != 0 { half } else { 0.0 },
            );
            self.cells.push(Cell::new(origin + offset, half, Some(id), depth));
        }

        let children = std::array::from_fn(|slot| CellId((first + slot) as u32));
        self.cells[id.index()].children = Some(children);
        children
    }

    /// The leaf containing `p`, or None if `p` lies outside the root.
    pub fn smallest_container(&self, p: &Point3<f64>) -> Option<CellId> {
        let mut id = self.root();
        if !self.cell(id).contains(p) {
            return None;
        }
        while let Some(children) = self.cell(id).children {
            id = children[self.cell(id).octant(p)];
        }
        Some(id)
    }

    pub fn root(&self) -> CellId {
        CellId(0)
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    /// Number of cells in the arena, root included.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of nodes inserted.
    pub fn node_count(&self) -> usize {
        self.cell(self.root()).count
    }

    /// All leaf cells, in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_leaf())
            .map(|(i, _)| CellId(i as u32))
    }
}

/// Padded root cube `(origin, dimension)` for a set of positions.
fn bounding_cube(positions: &[Point3<f64>]) -> (Point3<f64>, f64) {
    let corners: Vec<[f64; 3]> = positions
        .iter()
        .filter(|p| p.coords.iter().all(|c| c.is_finite()))
        .map(|p| [p.x, p.y, p.z])
        .collect();

    let (lower, upper) = if corners.is_empty() {
        (Point3::origin(), Point3::origin())
    } else {
        let envelope = AABB::from_points(corners.iter());
        (Point3::from(envelope.lower()), Point3::from(envelope.upper()))
    };

    let margin = Vector3::repeat(BOUNDS_MARGIN);
    let (lower, upper) = (lower - margin, upper + margin);
    let extent = upper - lower;
    (lower, 2.0 * extent.x.max(extent.y).max(extent.z))
}
