//! Spring Embedder - WASM Module
//!
//! This crate computes 3D force-directed ("spring embedder") layouts using
//! the Fruchterman-Reingold method, with an optional Barnes-Hut octree
//! to bring the repulsion cost down from O(N^2) toward O(N log N). It is
//! usable as a plain Rust library and is also compiled to WebAssembly with
//! a JavaScript-friendly driver API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Node positions (SoA) and topology in petgraph's `UnGraph`
//! - `spatial`: Arena octree with per-cell barycenters
//! - `layout`: Force law, cooling schedule, repulsion strategies, step engine
//! - `error`: Configuration errors
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use spring_embedder::{ExactLayout, Graph, LayoutConfig};
//!
//! let mut graph = Graph::new();
//! graph.add_node(Point3::new(0.0, 0.0, 0.0));
//! graph.add_node(Point3::new(1.0, 0.0, 0.0));
//!
//! let mut layout = ExactLayout::exact(graph, LayoutConfig::new(10.0, 10.0)).unwrap();
//! let report = layout.step();
//! assert_eq!(report.iteration, 1);
//! ```

use js_sys::Float64Array;
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;

pub use error::{LayoutError, Result};
pub use graph::{Graph, NodeId};
pub use layout::{
    BarnesHutLayout, BarnesHutRepulsion, ExactLayout, ExactRepulsion, LayoutConfig,
    RepulsionStrategy, SpringLayout, StepReport,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Lifecycle of the driver: nodes and edges are loaded first, then the
/// layout takes ownership of the graph and topology is frozen.
enum Stage {
    Loading(Graph),
    Running(SpringLayout),
}

/// Main entry point for the layout engine.
///
/// This struct wraps the graph and its layout and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct SpringEmbedderWasm {
    stage: Stage,
    last_report: Option<StepReport>,
}

impl SpringEmbedderWasm {
    fn graph(&self) -> &Graph {
        match &self.stage {
            Stage::Loading(graph) => graph,
            Stage::Running(layout) => layout.graph(),
        }
    }

    fn loading_graph(&mut self) -> Result<&mut Graph> {
        match &mut self.stage {
            Stage::Loading(graph) => Ok(graph),
            Stage::Running(_) => Err(LayoutError::TopologyLocked),
        }
    }

    /// Build a layout over the current graph.
    ///
    /// The graph is cloned so that a rejected configuration leaves the
    /// driver untouched. Re-initializing a running layout restarts cooling
    /// from the current positions.
    fn start(&mut self, config: LayoutConfig, barnes_hut: bool) -> Result<()> {
        let strategy: Box<dyn RepulsionStrategy> = if barnes_hut {
            Box::new(BarnesHutRepulsion::new(config.opening_threshold))
        } else {
            Box::new(ExactRepulsion)
        };
        let layout = SpringLayout::new(self.graph().clone(), config, strategy)?;
        self.stage = Stage::Running(layout);
        self.last_report = None;
        Ok(())
    }

    fn advance(&mut self) -> Result<StepReport> {
        match &mut self.stage {
            Stage::Running(layout) => {
                let report = layout.step();
                self.last_report = Some(report);
                Ok(report)
            }
            Stage::Loading(_) => Err(LayoutError::NotInitialized),
        }
    }

    /// Drop the layout and go back to loading, keeping current positions.
    fn stop(&mut self) {
        let stage = std::mem::replace(&mut self.stage, Stage::Loading(Graph::new()));
        self.stage = match stage {
            Stage::Running(layout) => Stage::Loading(layout.into_graph()),
            loading => loading,
        };
        self.last_report = None;
    }
}

#[wasm_bindgen]
impl SpringEmbedderWasm {
    /// Create a driver with an empty graph.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            stage: Stage::Loading(Graph::new()),
            last_report: None,
        }
    }

    // =========================================================================
    // Graph Loading
    // =========================================================================

    /// Add a node at the specified position.
    ///
    /// Returns the node ID.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, x: f64, y: f64, z: f64) -> std::result::Result<u32, JsError> {
        Ok(self.loading_graph()?.add_node(Point3::new(x, y, z)).raw())
    }

    /// Add multiple nodes from a Float64Array of positions.
    ///
    /// The positions array should be [x0, y0, z0, x1, y1, z1, ...].
    /// Returns the number of nodes added.
    #[wasm_bindgen(js_name = addNodesFromPositions)]
    pub fn add_nodes_from_positions(&mut self, positions: &[f64]) -> std::result::Result<u32, JsError> {
        Ok(self.loading_graph()?.add_nodes_from_positions(positions))
    }

    /// Add an undirected edge between two nodes.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, a: u32, b: u32) -> std::result::Result<(), JsError> {
        self.loading_graph()?.add_edge(NodeId(a), NodeId(b))?;
        Ok(())
    }

    /// Add edges from a Uint32Array of pairs.
    ///
    /// The edges array should be [a0, b0, a1, b1, ...].
    /// Returns the number of edges added.
    #[wasm_bindgen(js_name = addEdgesFromPairs)]
    pub fn add_edges_from_pairs(&mut self, edges: &[u32]) -> std::result::Result<u32, JsError> {
        Ok(self.loading_graph()?.add_edges_from_pairs(edges))
    }

    /// Place every node at a seeded random position inside a box.
    #[wasm_bindgen(js_name = scatterPositions)]
    pub fn scatter_positions(
        &mut self,
        width: f64,
        height: f64,
        depth: f64,
        seed: u32,
    ) -> std::result::Result<(), JsError> {
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        self.loading_graph()?.scatter_positions(&mut rng, width, height, depth)?;
        Ok(())
    }

    /// Get the number of nodes in the graph.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.graph().node_count() as u32
    }

    /// Get the number of edges in the graph.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.graph().edge_count() as u32
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Start the layout.
    ///
    /// `config` is an object `{ width, height, stepScale?, openingThreshold?,
    /// coolingConstant?, minTemperature? }`. `barnesHut` selects the octree
    /// approximation instead of exact all-pairs repulsion.
    pub fn initialize(&mut self, config: JsValue, barnes_hut: bool) -> std::result::Result<(), JsError> {
        let config: LayoutConfig =
            serde_wasm_bindgen::from_value(config).map_err(|e| JsError::new(&e.to_string()))?;
        self.start(config, barnes_hut)?;
        Ok(())
    }

    /// Perform one layout iteration.
    ///
    /// Returns the number of completed iterations.
    pub fn step(&mut self) -> std::result::Result<u32, JsError> {
        let report = self.advance()?;
        Ok(u32::try_from(report.iteration).unwrap_or(u32::MAX))
    }

    /// Stop the layout and unfreeze the topology, keeping positions.
    pub fn reset(&mut self) {
        self.stop();
    }

    /// Current temperature, or undefined before initialization.
    pub fn temperature(&self) -> Option<f64> {
        match &self.stage {
            Stage::Running(layout) => Some(layout.temperature()),
            Stage::Loading(_) => None,
        }
    }

    /// Number of completed iterations.
    #[wasm_bindgen(js_name = iterationCount)]
    pub fn iteration_count(&self) -> u32 {
        match &self.stage {
            Stage::Running(layout) => u32::try_from(layout.iterations()).unwrap_or(u32::MAX),
            Stage::Loading(_) => 0,
        }
    }

    /// Diagnostics of the latest step as a plain object, or null.
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> std::result::Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.last_report).map_err(|e| JsError::new(&e.to_string()))
    }

    // =========================================================================
    // Position Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph().positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph().positions_y()) }
    }

    /// Get a zero-copy view of Z positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph().positions_z()) }
    }
}

impl Default for SpringEmbedderWasm {
    fn default() -> Self {
        Self::new()
    }
}
