//! Cooling schedule.
//!
//! The temperature caps how far any node may move in one step. It decays
//! geometrically and is clamped to a strictly positive floor, so the layout
//! never fully freezes; deciding when to stop stepping is up to the caller.

/// Geometric cooling toward a floor: `t_{i+1} = max(t_i * c, t_min)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingSchedule {
    temperature: f64,
    min_temperature: f64,
    cooling_constant: f64,
}

impl CoolingSchedule {
    /// Start at `initial`, clamped up to the floor.
    pub fn new(initial: f64, cooling_constant: f64, min_temperature: f64) -> Self {
        Self {
            temperature: initial.max(min_temperature),
            min_temperature,
            cooling_constant,
        }
    }

    /// Maximum displacement allowed in the next step.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn min_temperature(&self) -> f64 {
        self.min_temperature
    }

    pub fn cooling_constant(&self) -> f64 {
        self.cooling_constant
    }

    /// Whether the floor has been reached.
    pub fn is_cold(&self) -> bool {
        self.temperature <= self.min_temperature
    }

    /// Advance one step and return the new temperature.
    pub fn cool(&mut self) -> f64 {
        self.temperature = (self.temperature * self.cooling_constant).max(self.min_temperature);
        self.temperature
    }
}
