//! Error types for the engine.
//!
//! Per-frame problems (`GeometryError`) are recovered inside the frame loop and
//! never escape it. `ConfigError` and `SessionError` are returned to the caller.

use crate::core::session::Phase;

/// A frame whose landmarks cannot produce an openness ratio.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The eye corners coincide, so the horizontal reference distance is zero.
    #[error("degenerate eye geometry: horizontal corner distance is zero")]
    DegenerateGeometry,

    /// The landmark result does not contain the requested point.
    #[error("landmark {index} missing (result has {available} points)")]
    MissingLandmark { index: usize, available: usize },
}

/// Invalid calibration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("closed threshold {closed} must be below open threshold {open}")]
    InvalidThresholds { closed: f32, open: f32 },

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("session must last at least one second")]
    SessionTooShort,

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A player request the session cannot honour in its current state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("a session is already in progress ({0:?})")]
    NotIdle(Phase),

    #[error("session has not finished yet ({0:?})")]
    NotFinished(Phase),

    #[error("landmark provider unavailable: {0}")]
    ProviderUnavailable(String),
}
