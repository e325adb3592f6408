//! Contracts for the components the game loop relies on but does not own:
//! the face landmark model, the camera stream, and the presentation layer.
//!
//! The browser bridge implements these over JavaScript; tests implement them
//! with scripted fakes.

use crate::api::types::SessionEvent;
use crate::face::landmarks::FaceLandmarks;

/// Runs the face landmark model on the current video frame.
pub trait LandmarkProvider {
    /// Detect on the current frame at `timestamp_ms`. `None` when no face is
    /// in view. Called at most once per advanced video frame.
    fn detect(&mut self, timestamp_ms: f64) -> Option<FaceLandmarks>;
}

/// The live camera stream.
pub trait VideoSource {
    /// Media time of the frame currently shown. Monotonically non-decreasing;
    /// an unchanged value means no new frame arrived.
    fn current_time(&self) -> f64;
}

/// Observes game state. Nothing flows back into the game loop.
pub trait PresentationSink {
    fn publish(&mut self, event: &SessionEvent);
}

/// Collects published events. Handy for headless hosts and tests.
impl PresentationSink for Vec<SessionEvent> {
    fn publish(&mut self, event: &SessionEvent) {
        self.push(*event);
    }
}

/// Everything a tick needs from the outside world, borrowed for one call.
pub struct Collaborators<'a> {
    pub provider: &'a mut dyn LandmarkProvider,
    pub video: &'a dyn VideoSource,
    pub sink: &'a mut dyn PresentationSink,
}

/// Whether the landmark model finished loading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Loading,
    Ready,
    /// Model load failed. Fatal; the game never retries.
    Failed(String),
}

impl Availability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Ready)
    }

    /// Static text for the start button / status area.
    pub fn message(&self) -> String {
        match self {
            Availability::Loading => "Loading AI...".to_string(),
            Availability::Ready => "Start Zone-Out".to_string(),
            Availability::Failed(msg) => format!("Error Loading AI: {}", msg),
        }
    }
}
