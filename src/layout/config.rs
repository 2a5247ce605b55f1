//! Layout configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Parameters of a spring-embedder run.
///
/// Only the drawing area is required; everything else falls back to the
/// classic Fruchterman-Reingold defaults. The initial temperature is not a
/// field: it is derived from `width` by the repulsion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Width of the drawing area.
    pub width: f64,
    /// Height of the drawing area.
    pub height: f64,
    /// Scale `C` of the natural spring length (default: 1.0).
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    /// Barnes-Hut opening-angle threshold (default: 10.0).
    /// Cells with `dimension / distance` below it are aggregated.
    #[serde(default = "default_opening_threshold")]
    pub opening_threshold: f64,
    /// Geometric temperature decay per step (default: 0.99).
    #[serde(default = "default_cooling_constant")]
    pub cooling_constant: f64,
    /// Temperature floor (default: 0.05).
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,
}

fn default_step_scale() -> f64 {
    1.0
}

fn default_opening_threshold() -> f64 {
    10.0
}

fn default_cooling_constant() -> f64 {
    0.99
}

fn default_min_temperature() -> f64 {
    0.05
}

impl LayoutConfig {
    /// Default configuration for a `width x height` drawing area.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            step_scale: default_step_scale(),
            opening_threshold: default_opening_threshold(),
            cooling_constant: default_cooling_constant(),
            min_temperature: default_min_temperature(),
        }
    }

    pub fn with_step_scale(mut self, step_scale: f64) -> Self {
        self.step_scale = step_scale;
        self
    }

    pub fn with_opening_threshold(mut self, opening_threshold: f64) -> Self {
        self.opening_threshold = opening_threshold;
        self
    }

    pub fn with_cooling_constant(mut self, cooling_constant: f64) -> Self {
        self.cooling_constant = cooling_constant;
        self
    }

    pub fn with_min_temperature(mut self, min_temperature: f64) -> Self {
        self.min_temperature = min_temperature;
        self
    }

    /// Area of the drawing region.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check every parameter against its admissible range.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v > 0.0 && v.is_finite();

        if !positive(self.width) || !positive(self.height) {
            return Err(LayoutError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.step_scale) {
            return Err(LayoutError::InvalidParameter {
                name: "step_scale",
                value: self.step_scale,
                reason: "must be positive and finite",
            });
        }
        if self.opening_threshold.is_nan() || self.opening_threshold < 0.0 {
            return Err(LayoutError::InvalidParameter {
                name: "opening_threshold",
                value: self.opening_threshold,
                reason: "must not be negative",
            });
        }
        if !(0.0..=1.0).contains(&self.cooling_constant) || self.cooling_constant == 0.0 {
            return Err(LayoutError::InvalidParameter {
                name: "cooling_constant",
                value: self.cooling_constant,
                reason: "must lie in (0, 1]",
            });
        }
        if !positive(self.min_temperature) {
            return Err(LayoutError::InvalidParameter {
                name: "min_temperature",
                value: self.min_temperature,
                reason: "must be positive and finite",
            });
        }
        Ok(())
    }
}

impl fmt::Display for LayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "area={}x{} C={} theta={} cooling={} min_temperature={}",
            self.width,
            self.height,
            self.step_scale,
            self.opening_threshold,
            self.cooling_constant,
            self.min_temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayoutConfig::new(400.0, 300.0);
        assert_eq!(config.step_scale, 1.0);
        assert_eq!(config.opening_threshold, 10.0);
        assert_eq!(config.cooling_constant, 0.99);
        assert_eq!(config.min_temperature, 0.05);
        assert_eq!(config.area(), 120_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "width": 10, "height": 20, "openingThreshold": 0.5 }"#)
                .unwrap();
        assert_eq!(
            config,
            LayoutConfig::new(10.0, 20.0).with_opening_threshold(0.5)
        );
    }

    #[test]
    fn test_deserialize_requires_area() {
        let result: std::result::Result<LayoutConfig, _> =
            serde_json::from_str(r#"{ "width": 10 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_area() {
        for (w, h) in [(0.0, 10.0), (10.0, -1.0), (f64::NAN, 10.0), (f64::INFINITY, 1.0)] {
            assert!(matches!(
                LayoutConfig::new(w, h).validate(),
                Err(LayoutError::InvalidDimension { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let base = LayoutConfig::new(10.0, 10.0);
        let cases = [
            (base.clone().with_step_scale(0.0), "step_scale"),
            (base.clone().with_opening_threshold(-1.0), "opening_threshold"),
            (base.clone().with_opening_threshold(f64::NAN), "opening_threshold"),
            (base.clone().with_cooling_constant(1.5), "cooling_constant"),
            (base.clone().with_cooling_constant(0.0), "cooling_constant"),
            (base.clone().with_min_temperature(0.0), "min_temperature"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(LayoutError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_threshold_is_allowed() {
        assert!(LayoutConfig::new(10.0, 10.0).with_opening_threshold(0.0).validate().is_ok());
    }
}
