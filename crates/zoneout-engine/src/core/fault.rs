//! Fault accumulation.
//!
//! Integrates time spent outside the band into a budget that charges faster
//! than it recovers, so short lapses are forgiven and long ones are not.
//! Crossing the tolerance is judged by the session, not here.

use serde::{Deserialize, Serialize};
use super::gaze::GazeState;

/// Units added per out-of-band frame.
pub const FAULT_CHARGE: f32 = 30.0;
/// Units removed per in-band frame.
pub const FAULT_RECOVERY: f32 = 16.0;
/// Budget above which the session is lost (about 2 s of continuous lapse at 60-67 fps).
pub const FAULT_TOLERANCE: f32 = 2000.0;

/// How a frame's delta is sized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaultModel {
    /// Fixed delta per evaluated frame. Depends on the display frame rate.
    #[default]
    PerFrame,
    /// Delta scaled by `dt / nominal_frame_secs`, so the tolerance means the
    /// same wall-clock time at any frame rate.
    Elapsed { nominal_frame_secs: f32 },
}

/// Accumulated out-of-band debt. Never negative, unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FaultBudget(f32);

impl FaultBudget {
    pub const ZERO: Self = Self(0.0);

    pub fn value(self) -> f32 {
        self.0
    }

    /// One-way trigger checked by the session after every update.
    pub fn exceeds(self, tolerance: f32) -> bool {
        self.0 > tolerance
    }
}

/// Charge/recovery rates plus the delta model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultAccumulator {
    pub charge: f32,
    pub recovery: f32,
    pub model: FaultModel,
}

impl Default for FaultAccumulator {
    fn default() -> Self {
        Self {
            charge: FAULT_CHARGE,
            recovery: FAULT_RECOVERY,
            model: FaultModel::PerFrame,
        }
    }
}

impl FaultAccumulator {
    pub fn new(charge: f32, recovery: f32, model: FaultModel) -> Self {
        Self { charge, recovery, model }
    }

    fn scale(&self, dt: f32) -> f32 {
        match self.model {
            FaultModel::PerFrame => 1.0,
            FaultModel::Elapsed { nominal_frame_secs } => dt.max(0.0) / nominal_frame_secs,
        }
    }

    /// Apply one evaluated frame. In band recovers (floored at zero), otherwise charges.
    pub fn update(&self, budget: FaultBudget, state: GazeState, dt: f32) -> FaultBudget {
        let scale = self.scale(dt);
        if state == GazeState::InBand {
            FaultBudget((budget.0 - self.recovery * scale).max(0.0))
        } else {
            FaultBudget(budget.0 + self.charge * scale)
        }
    }
}
