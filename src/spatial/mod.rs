//! Spatial indexing for the Barnes-Hut repulsion approximation.
//!
//! This module provides an arena-backed octree that aggregates node positions
//! into per-cell barycenters. It is rebuilt from scratch every simulation step.

mod octree;

pub use octree::{Cell, CellId, MAX_DEPTH, Octree};
