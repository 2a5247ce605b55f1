//! Error type shared by the graph store and the layout engine.

use thiserror::Error;

use crate::graph::NodeId;

/// Failures raised while building a graph or configuring a layout.
///
/// Every variant is a configuration or sequencing problem detected before
/// the first step; a step itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// The graph has no vertices, so the natural spring length is undefined.
    #[error("input graph has no vertices; natural spring length is undefined")]
    EmptyGraph,

    /// The drawing area is not a positive, finite rectangle.
    #[error("drawing area must be positive and finite (got {width} x {height})")]
    InvalidDimension { width: f64, height: f64 },

    /// A tuning parameter is outside its admissible range.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// An edge endpoint does not refer to an existing node.
    #[error("{0} does not exist in the graph")]
    UnknownNode(NodeId),

    /// A step was requested before the layout was initialized.
    #[error("layout has not been initialized")]
    NotInitialized,

    /// The topology was edited after the layout was initialized.
    #[error("graph topology is fixed once the layout is initialized")]
    TopologyLocked,
}

pub type Result<T> = std::result::Result<T, LayoutError>;
