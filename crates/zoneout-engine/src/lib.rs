pub mod api;
pub mod core;
pub mod face;
pub mod systems;
pub mod bridge;
pub mod input;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::game::{GameConfig, ZoneOutGame};
pub use api::collaborators::{
    Availability, Collaborators, LandmarkProvider, PresentationSink, VideoSource,
};
pub use api::types::{GameEvent, GazeReading, SessionEvent};
pub use crate::core::geometry::{distance, eye_openness_ratio, EyeLandmarkSet, LandmarkPoint};
pub use crate::core::gaze::{classify, display_percent, GazeState, GazeThresholds};
pub use crate::core::fault::{FaultAccumulator, FaultBudget, FaultModel};
pub use crate::core::scheduler::{Firing, Scheduler, TaskId, TaskKind};
pub use crate::core::session::{GameSession, LossReason, Phase, SessionSummary};
pub use crate::core::time::IntervalTimer;
pub use face::landmarks::FaceLandmarks;
pub use systems::frame_loop::{FrameLoopDriver, FrameOutcome};
pub use bridge::protocol::{ProtocolLayout, StatusBuffer};
pub use input::queue::{InputEvent, InputQueue};
pub use error::{ConfigError, GeometryError, SessionError};
