//! Fruchterman-Reingold force law.
//!
//! Both forces are scaled by the natural spring length
//! `k = C * sqrt(area / N)`: two nodes connected by an edge are in balance
//! when they sit exactly `k` apart.

use nalgebra::{Point3, Vector3};

use super::config::LayoutConfig;
use crate::error::{LayoutError, Result};

/// Attractive and repulsive force magnitudes for a fixed natural length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceLaw {
    k: f64,
}

impl ForceLaw {
    /// Derive the natural spring length for `node_count` vertices.
    pub fn new(config: &LayoutConfig, node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(LayoutError::EmptyGraph);
        }
        config.validate()?;
        let k = config.step_scale * (config.area() / node_count as f64).sqrt();
        Ok(Self { k })
    }

    /// Natural spring length `k`.
    pub fn natural_length(&self) -> f64 {
        self.k
    }

    /// `d^2 / k`
    #[inline]
    pub fn attractive(&self, distance: f64) -> f64 {
        distance * distance / self.k
    }

    /// `k^2 / d`, undefined at `d = 0`.
    #[inline]
    pub fn repulsive(&self, distance: f64) -> f64 {
        self.k * self.k / distance
    }

    /// Repulsion exerted on `u` by `weight` nodes sitting at `source`.
    ///
    /// Points away from `source`. Returns None for coincident points, which
    /// have no direction to push along.
    #[inline]
    pub(crate) fn repulsion(&self, u: &Point3<f64>, source: &Point3<f64>, weight: f64) -> Option<Vector3<f64>> {
        let delta = u - source;
        let distance = delta.norm();
        (distance > 0.0).then(|| delta / distance * (weight * self.repulsive(distance)))
    }

    /// Attraction exerted on `u` by a neighbor at `v`, pointing toward `v`.
    ///
    /// The direction is `u -> v`, not `v -> u`: springs shorten, they never
    /// push connected nodes apart.
    #[inline]
    pub(crate) fn attraction(&self, u: &Point3<f64>, v: &Point3<f64>) -> Option<Vector3<f64>> {
        let delta = v - u;
        let distance = delta.norm();
        (distance > 0.0).then(|| delta / distance * self.attractive(distance))
    }
}
