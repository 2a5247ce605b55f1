//! Force-directed layout.
//!
//! This module provides the Fruchterman-Reingold spring embedder in 3D:
//! a shared force law and cooling schedule, and one simulation engine
//! parameterised by how repulsion is evaluated (exact all-pairs or a
//! Barnes-Hut octree approximation). Callers drive the simulation one
//! [`SpringLayout::step`] at a time and decide for themselves when to stop.

pub mod config;
pub mod cooling;
pub mod engine;
pub mod forces;
pub mod repulsion;

pub use config::LayoutConfig;
pub use cooling::CoolingSchedule;
pub use engine::{BarnesHutLayout, ExactLayout, SpringLayout, StepReport};
pub use forces::ForceLaw;
pub use repulsion::{BarnesHutRepulsion, ExactRepulsion, RepulsionField, RepulsionStrategy};

#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
use rayon::prelude::*;

/// Evaluate `f` for every node index - parallel on native, sequential on WASM.
///
/// Each node's value is computed by one call in a fixed order, so results
/// are identical either way.
#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
pub(crate) fn per_node<T, F>(count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..count).into_par_iter().map(f).collect()
}

/// Sequential node map (WASM or when the parallel feature is disabled)
#[cfg(any(target_arch = "wasm32", not(feature = "parallel")))]
pub(crate) fn per_node<T, F>(count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..count).map(f).collect()
}
