//! SpringLayout - the force-directed simulation loop.
//!
//! One engine drives both the exact and the Barnes-Hut variants; they differ
//! only in the [`RepulsionStrategy`] plugged in. A step reads every position
//! from a snapshot taken before any node moves, so the order in which nodes
//! are updated does not matter.

use nalgebra::{Point3, Vector3};
use serde::Serialize;
use tracing::{debug, info};

use super::config::LayoutConfig;
use super::cooling::CoolingSchedule;
use super::forces::ForceLaw;
use super::per_node;
use super::repulsion::{BarnesHutRepulsion, ExactRepulsion, RepulsionStrategy};
use crate::error::Result;
use crate::graph::{Graph, NodeId};

/// Diagnostics for one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Number of steps completed, including this one.
    pub iteration: u64,
    /// Temperature that bounded this step's displacements.
    pub temperature: f64,
    /// Temperature the next step will use.
    pub next_temperature: f64,
    /// Largest displacement applied to any node.
    pub max_displacement: f64,
    /// Nodes left in place because their net force had no usable direction.
    pub stalled_nodes: usize,
    /// Repulsive force-law evaluations performed.
    pub repulsion_evaluations: usize,
}

/// Fruchterman-Reingold spring embedder over an owned graph.
pub struct SpringLayout<S: RepulsionStrategy = Box<dyn RepulsionStrategy>> {
    graph: Graph,
    config: LayoutConfig,
    law: ForceLaw,
    strategy: S,
    cooling: CoolingSchedule,
    iterations: u64,
}

/// All-pairs repulsion, starting at `width / 2`.
pub type ExactLayout = SpringLayout<ExactRepulsion>;

/// Octree repulsion, starting at `width / 5`.
pub type BarnesHutLayout = SpringLayout<BarnesHutRepulsion>;

impl<S: RepulsionStrategy> SpringLayout<S> {
    /// Prepare a layout of `graph` inside the configured drawing area.
    ///
    /// Fails if the graph is empty or the configuration is out of range.
    pub fn new(graph: Graph, config: LayoutConfig, strategy: S) -> Result<Self> {
        let law = ForceLaw::new(&config, graph.node_count())?;
        let cooling = CoolingSchedule::new(
            strategy.initial_temperature(config.width),
            config.cooling_constant,
            config.min_temperature,
        );

        info!(
            strategy = strategy.name(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            k = law.natural_length(),
            initial_temperature = cooling.temperature(),
            %config,
            "initialized spring layout"
        );

        Ok(Self {
            graph,
            config,
            law,
            strategy,
            cooling,
            iterations: 0,
        })
    }

    /// Perform one iteration: move every node by at most the current
    /// temperature along its net force, then cool.
    pub fn step(&mut self) -> StepReport {
        let positions = self.graph.positions();
        let repulsion = self.strategy.repulsion(&positions, &self.law);
        let attraction = self.attraction(&positions);
        let temperature = self.cooling.temperature();

        let mut stalled_nodes = 0;
        let mut max_displacement = 0.0_f64;
        for (u, (push, pull)) in repulsion.forces.iter().zip(&attraction).enumerate() {
            let total = push + pull;
            let magnitude = total.norm();
            if magnitude > 0.0 && magnitude.is_finite() {
                let displacement = total / magnitude * temperature;
                max_displacement = max_displacement.max(displacement.norm());
                self.graph.translate(u, &displacement);
            } else {
                stalled_nodes += 1;
            }
        }

        let next_temperature = self.cooling.cool();
        self.iterations += 1;

        if stalled_nodes > 0 {
            debug!(
                iteration = self.iterations,
                stalled_nodes, "nodes without a usable force direction left in place"
            );
        }
        debug!(
            strategy = self.strategy.name(),
            iteration = self.iterations,
            temperature,
            next_temperature,
            max_displacement,
            repulsion_evaluations = repulsion.evaluations,
            "layout step"
        );

        StepReport {
            iteration: self.iterations,
            temperature,
            next_temperature,
            max_displacement,
            stalled_nodes,
            repulsion_evaluations: repulsion.evaluations,
        }
    }

    /// Attraction along every edge, pulling each node toward its neighbors.
    fn attraction(&self, positions: &[Point3<f64>]) -> Vec<Vector3<f64>> {
        let (graph, law) = (&self.graph, &self.law);
        per_node(positions.len(), |u| {
            let p = &positions[u];
            graph
                .neighbors(NodeId(u as u32))
                .filter_map(|v| law.attraction(p, &positions[v.index()]))
                .fold(Vector3::zeros(), |sum, force| sum + force)
        })
    }

    /// Current temperature (maximum displacement of the next step).
    pub fn temperature(&self) -> f64 {
        self.cooling.temperature()
    }

    /// Number of completed steps.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn cooling(&self) -> &CoolingSchedule {
        &self.cooling
    }

    pub fn force_law(&self) -> &ForceLaw {
        &self.law
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Give the graph back, with its current positions.
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

impl ExactLayout {
    pub fn exact(graph: Graph, config: LayoutConfig) -> Result<Self> {
        Self::new(graph, config, ExactRepulsion)
    }
}

impl BarnesHutLayout {
    /// Uses the configured opening threshold.
    pub fn barnes_hut(graph: Graph, config: LayoutConfig) -> Result<Self> {
        let strategy = BarnesHutRepulsion::new(config.opening_threshold);
        Self::new(graph, config, strategy)
    }
}
