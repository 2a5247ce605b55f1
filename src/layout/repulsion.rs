//! Repulsion strategies.
//!
//! The layout engine delegates the all-pairs repulsive term to a
//! [`RepulsionStrategy`]. Two are provided:
//!
//! - [`ExactRepulsion`]: every ordered pair, O(N^2).
//! - [`BarnesHutRepulsion`]: an [`Octree`] rebuilt from the step's positions,
//!   where distant cells are collapsed into a single pseudo-node at their
//!   barycenter, weighted by how many nodes they hold.
//!
//! The strategy also picks the starting temperature, since the approximate
//! method is tuned to start cooler than the exact one.

use nalgebra::{Point3, Vector3};

use super::forces::ForceLaw;
use super::per_node;
use crate::spatial::{CellId, Octree};

/// Per-node repulsive forces for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepulsionField {
    /// Repulsive force on each node, indexed by node.
    pub forces: Vec<Vector3<f64>>,
    /// Number of force-law evaluations performed (pseudo-nodes count once).
    pub evaluations: usize,
}

impl RepulsionField {
    fn from_tallies(tallies: Vec<Tally>) -> Self {
        let evaluations = tallies.iter().map(|t| t.evaluations).sum();
        Self {
            forces: tallies.into_iter().map(|t| t.force).collect(),
            evaluations,
        }
    }
}

/// Running sum of the forces acting on one node.
#[derive(Debug, Clone, Copy)]
struct Tally {
    force: Vector3<f64>,
    evaluations: usize,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            force: Vector3::zeros(),
            evaluations: 0,
        }
    }
}

impl Tally {
    #[inline]
    fn add(&mut self, force: Option<Vector3<f64>>) {
        if let Some(force) = force {
            self.force += force;
            self.evaluations += 1;
        }
    }
}

/// How the repulsive term of a step is evaluated.
pub trait RepulsionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Starting temperature for a drawing area of the given width.
    fn initial_temperature(&self, width: f64) -> f64;

    /// Repulsive force on every node, reading only `positions`.
    fn repulsion(&self, positions: &[Point3<f64>], law: &ForceLaw) -> RepulsionField;
}

impl<S: RepulsionStrategy + ?Sized> RepulsionStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn initial_temperature(&self, width: f64) -> f64 {
        (**self).initial_temperature(width)
    }

    fn repulsion(&self, positions: &[Point3<f64>], law: &ForceLaw) -> RepulsionField {
        (**self).repulsion(positions, law)
    }
}

/// Direct all-pairs repulsion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactRepulsion;

impl RepulsionStrategy for ExactRepulsion {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn initial_temperature(&self, width: f64) -> f64 {
        width / 2.0
    }

    fn repulsion(&self, positions: &[Point3<f64>], law: &ForceLaw) -> RepulsionField {
        RepulsionField::from_tallies(per_node(positions.len(), |u| {
            let p = &positions[u];
            let mut tally = Tally::default();
            for (v, q) in positions.iter().enumerate() {
                if v != u {
                    tally.add(law.repulsion(p, q, 1.0));
                }
            }
            tally
        }))
    }
}

/// Octree-accelerated repulsion.
#[derive(Debug, Clone, Copy)]
pub struct BarnesHutRepulsion {
    opening_threshold: f64,
}

impl BarnesHutRepulsion {
    /// Cells whose `dimension / distance` falls below `opening_threshold`
    /// are treated as a single pseudo-node.
    pub fn new(opening_threshold: f64) -> Self {
        Self { opening_threshold }
    }

    pub fn opening_threshold(&self) -> f64 {
        self.opening_threshold
    }

    /// Repulsion on node `u`, walking from its leaf up to the root.
    ///
    /// At every level only the siblings off `u`'s path are visited, so each
    /// other node is reached through exactly one subtree.
    fn walk(&self, tree: &Octree, law: &ForceLaw, u: usize, p: &Point3<f64>) -> Tally {
        let mut tally = Tally::default();
        let Some(leaf) = tree.smallest_container(p) else {
            return tally;
        };

        // Leaf-mates only exist at the depth cap.
        for &(v, q) in tree.cell(leaf).members() {
            if v != u {
                tally.add(law.repulsion(p, &q, 1.0));
            }
        }

        let mut current = leaf;
        while let Some(parent) = tree.cell(current).parent() {
            if let Some(children) = tree.cell(parent).children() {
                for &sibling in children.iter().filter(|&&c| c != current) {
                    self.visit(tree, law, sibling, u, p, &mut tally);
                }
            }
            current = parent;
        }
        tally
    }

    fn visit(&self, tree: &Octree, law: &ForceLaw, id: CellId, u: usize, p: &Point3<f64>, tally: &mut Tally) {
        let cell = tree.cell(id);
        if cell.count() == 0 {
            return;
        }

        let barycenter = cell.barycenter();
        let distance = (p - barycenter).norm();
        if distance > 0.0 && cell.dimension() / distance < self.opening_threshold {
            tally.add(law.repulsion(p, &barycenter, cell.count() as f64));
            return;
        }

        match cell.children() {
            Some(children) => {
                for &child in children {
                    self.visit(tree, law, child, u, p, tally);
                }
            }
            None => {
                for &(v, q) in cell.members() {
                    if v != u {
                        tally.add(law.repulsion(p, &q, 1.0));
                    }
                }
            }
        }
    }
}

impl RepulsionStrategy for BarnesHutRepulsion {
    fn name(&self) -> &'static str {
        "barnes-hut"
    }

    fn initial_temperature(&self, width: f64) -> f64 {
        width / 5.0
    }

    fn repulsion(&self, positions: &[Point3<f64>], law: &ForceLaw) -> RepulsionField {
        let tree = Octree::build(positions);
        RepulsionField::from_tallies(per_node(positions.len(), |u| {
            self.walk(&tree, law, u, &positions[u])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn law_for(n: usize) -> ForceLaw {
        ForceLaw::new(&LayoutConfig::new(100.0, 100.0), n).unwrap()
    }

    fn cloud(seed: u64, n: usize, spread: f64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(0.0..spread),
                    rng.gen_range(0.0..spread),
                    rng.gen_range(0.0..spread),
                )
            })
            .collect()
    }

    /// Sum of per-node error magnitudes over sum of exact magnitudes.
    fn aggregate_error(approx: &RepulsionField, exact: &RepulsionField) -> f64 {
        let (err, total) = approx
            .forces
            .iter()
            .zip(&exact.forces)
            .fold((0.0, 0.0), |(err, total), (a, e)| (err + (a - e).norm(), total + e.norm()));
        err / total
    }

    /// Largest per-node `|approx - exact| / |exact|`.
    fn worst_node_error(approx: &RepulsionField, exact: &RepulsionField) -> f64 {
        approx
            .forces
            .iter()
            .zip(&exact.forces)
            .map(|(a, e)| (a - e).norm() / e.norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_exact_two_nodes() {
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let law = law_for(2);
        let field = ExactRepulsion.repulsion(&positions, &law);

        let magnitude = law.repulsive(2.0);
        assert_eq!(field.forces[0], Vector3::new(-magnitude, 0.0, 0.0));
        assert_eq!(field.forces[1], Vector3::new(magnitude, 0.0, 0.0));
        assert_eq!(field.evaluations, 2);
    }

    #[test]
    fn test_exact_counts_every_ordered_pair() {
        let positions = cloud(3, 25, 50.0);
        let field = ExactRepulsion.repulsion(&positions, &law_for(25));
        assert_eq!(field.forces.len(), 25);
        assert_eq!(field.evaluations, 25 * 24);
    }

    #[test]
    fn test_zero_threshold_matches_exact() {
        let positions = cloud(9, 40, 100.0);
        let law = law_for(40);

        let exact = ExactRepulsion.repulsion(&positions, &law);
        let approx = BarnesHutRepulsion::new(0.0).repulsion(&positions, &law);

        assert_eq!(approx.evaluations, exact.evaluations);
        for (a, e) in approx.forces.iter().zip(&exact.forces) {
            assert!((a - e).norm() <= 1e-9 * e.norm().max(1.0), "{a} vs {e}");
        }
    }

    #[test]
    fn test_tight_threshold_stays_within_five_percent() {
        for seed in 1..=5 {
            let n = 50;
            let positions = cloud(seed, n, 100.0);
            let law = law_for(n);

            let exact = ExactRepulsion.repulsion(&positions, &law);
            let approx = BarnesHutRepulsion::new(0.1).repulsion(&positions, &law);

            let error = aggregate_error(&approx, &exact);
            assert!(error <= 0.05, "seed {seed}: aggregate error {error}");
            let worst = worst_node_error(&approx, &exact);
            assert!(worst <= 0.05, "seed {seed}: worst node error {worst}");
            assert!(approx.evaluations <= exact.evaluations);
        }
    }

    #[test]
    fn test_default_threshold_error_is_bounded() {
        // Measured on these clouds: aggregate 0.075..0.122, worst node 0.36..0.87.
        let default_threshold = LayoutConfig::new(100.0, 100.0).opening_threshold;
        assert_eq!(default_threshold, 10.0);

        for seed in 1..=5 {
            let n = 50;
            let positions = cloud(seed, n, 100.0);
            let law = law_for(n);

            let exact = ExactRepulsion.repulsion(&positions, &law);
            let approx = BarnesHutRepulsion::new(default_threshold).repulsion(&positions, &law);

            let error = aggregate_error(&approx, &exact);
            assert!(error <= 0.15, "seed {seed}: aggregate error {error}");
            let worst = worst_node_error(&approx, &exact);
            assert!(worst <= 1.0, "seed {seed}: worst node error {worst}");
            assert!(approx.evaluations < exact.evaluations);
        }
    }

    #[test]
    fn test_distant_cluster_is_aggregated() {
        let mut positions = vec![Point3::origin()];
        let mut rng = StdRng::seed_from_u64(21);
        positions.extend((0..20).map(|_| {
            Point3::new(
                1000.0 + rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
        }));
        let law = law_for(positions.len());

        let exact = ExactRepulsion.repulsion(&positions, &law);
        let approx = BarnesHutRepulsion::new(10.0).repulsion(&positions, &law);

        let (a, e) = (approx.forces[0], exact.forces[0]);
        assert!((a - e).norm() <= 1e-3 * e.norm(), "{a} vs {e}");
        assert!(a.x < 0.0);
        assert!(approx.evaluations < exact.evaluations);
    }

    #[test]
    fn test_single_node_feels_nothing() {
        let positions = [Point3::new(4.0, 4.0, 4.0)];
        let law = law_for(1);

        for field in [
            ExactRepulsion.repulsion(&positions, &law),
            BarnesHutRepulsion::new(10.0).repulsion(&positions, &law),
        ] {
            assert_eq!(field.forces, vec![Vector3::zeros()]);
            assert_eq!(field.evaluations, 0);
        }
    }

    #[test]
    fn test_coincident_nodes_are_skipped() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
        ];
        let law = law_for(3);

        let exact = ExactRepulsion.repulsion(&positions, &law);
        let approx = BarnesHutRepulsion::new(10.0).repulsion(&positions, &law);

        assert_eq!(exact.evaluations, 4);
        // The far node sees the coincident pair as one pseudo-node.
        assert_eq!(approx.evaluations, 3);
        for (a, e) in approx.forces.iter().zip(&exact.forces) {
            assert!(a.iter().all(|c| c.is_finite()));
            assert!((a - e).norm() <= 1e-12 * e.norm());
        }
    }

    #[test]
    fn test_boxed_strategy_delegates() {
        let boxed: Box<dyn RepulsionStrategy> = Box::new(BarnesHutRepulsion::new(10.0));
        assert_eq!(boxed.name(), "barnes-hut");
        assert_eq!(boxed.initial_temperature(10.0), 2.0);
        assert_eq!(ExactRepulsion.initial_temperature(10.0), 5.0);

        let positions = cloud(4, 10, 20.0);
        let law = law_for(10);
        assert_eq!(
            boxed.repulsion(&positions, &law),
            BarnesHutRepulsion::new(10.0).repulsion(&positions, &law)
        );
    }
}
