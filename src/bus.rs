use crate::consts::{DEFAULT_MAX_STEP, MAX_STEP_LIMIT};
use crate::data::{BusTable, PositionStore};
use crate::location::{CampusBounds, Coordinates};
use anyhow::{ensure, Result};
use rand::Rng;
use tracing::debug;

/// Random-walk movement for every bus in the store. There is no heading or
/// route: each step is independent uniform noise, clamped to the campus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementSimulator {
    bounds: CampusBounds,
    // Largest offset in degrees applied to either axis per step
    max_step: f64,
}

impl Default for MovementSimulator {
    fn default() -> Self {
        MovementSimulator {
            bounds: CampusBounds::default(),
            max_step: DEFAULT_MAX_STEP,
        }
    }
}

/// Accepts step sizes in `[0, MAX_STEP_LIMIT]` degrees.
pub fn validate_max_step(max_step: f64) -> Result<()> {
    ensure!(
        max_step.is_finite() && (0.0..=MAX_STEP_LIMIT).contains(&max_step),
        "Step size must be between 0 and {MAX_STEP_LIMIT} degrees, got {max_step}"
    );
    Ok(())
}

impl MovementSimulator {
    pub fn try_new(bounds: CampusBounds, max_step: f64) -> Result<MovementSimulator> {
        validate_max_step(max_step)?;
        Ok(MovementSimulator { bounds, max_step })
    }

    pub fn bounds(&self) -> &CampusBounds {
        &self.bounds
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    pub fn perturb<R: Rng>(&self, coords: Coordinates, rng: &mut R) -> Coordinates {
        let moved = Coordinates {
            lat: coords.lat + rng.gen_range(-self.max_step..=self.max_step),
            lng: coords.lng + rng.gen_range(-self.max_step..=self.max_step),
        };
        self.bounds.clamp(moved)
    }

    /// Moves every bus in place. The set of bus identifiers is untouched.
    pub fn move_buses<R: Rng>(&self, buses: &mut BusTable, rng: &mut R) {
        for coords in buses.values_mut() {
            *coords = self.perturb(*coords, rng);
        }
    }

    /// One simulation step: move every bus, then persist the whole store.
    pub fn step<R: Rng>(&self, store: &mut PositionStore, rng: &mut R) -> Result<()> {
        self.move_buses(store.buses_mut(), rng);
        debug!(buses = store.len(), "Simulation step");
        store.save()
    }
}
