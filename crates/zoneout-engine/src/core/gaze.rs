//! Tri-state gaze classification.

/// Below this averaged EAR the eyes count as too closed.
pub const T_CLOSED: f32 = 0.18;
/// Above this averaged EAR the eyes count as too wide open.
pub const T_OPEN: f32 = 0.35;
/// EAR shown as a full (100 %) display gauge.
pub const DISPLAY_FULL_SCALE: f32 = 0.5;

/// Where the eyes are relative to the target band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GazeState {
    TooClosed,
    InBand,
    TooOpen,
}

impl GazeState {
    /// Status line shown to the player.
    pub fn label(self) -> &'static str {
        match self {
            GazeState::TooClosed => "WAKE UP!",
            GazeState::InBand => "In the Zone...",
            GazeState::TooOpen => "TOO ALERT!",
        }
    }

    /// Calm presentation (slow breathing overlay) only while in band.
    pub fn is_calm(self) -> bool {
        self == GazeState::InBand
    }

    /// Numeric code used on the status wire.
    pub fn code(self) -> f32 {
        match self {
            GazeState::TooClosed => 1.0,
            GazeState::InBand => 2.0,
            GazeState::TooOpen => 3.0,
        }
    }
}

/// Band edges on the averaged openness ratio. `closed < open` is enforced by
/// `GameConfig::validate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeThresholds {
    pub closed: f32,
    pub open: f32,
}

impl Default for GazeThresholds {
    fn default() -> Self {
        Self {
            closed: T_CLOSED,
            open: T_OPEN,
        }
    }
}

impl GazeThresholds {
    /// Strict comparisons: both edges belong to the band.
    pub fn classify(&self, avg_ratio: f32) -> GazeState {
        if avg_ratio < self.closed {
            GazeState::TooClosed
        } else if avg_ratio > self.open {
            GazeState::TooOpen
        } else {
            GazeState::InBand
        }
    }
}

/// Classify with the reference thresholds.
pub fn classify(avg_ratio: f32) -> GazeState {
    GazeThresholds::default().classify(avg_ratio)
}

/// Gauge position in percent: `min(max(ratio / full_scale, 0), 1) * 100`.
pub fn display_percent(avg_ratio: f32, full_scale: f32) -> f32 {
    (avg_ratio / full_scale).clamp(0.0, 1.0) * 100.0
}
