use crate::api::collaborators::Collaborators;
use crate::api::game::GameConfig;
use crate::api::types::{GazeReading, SessionEvent};
use crate::core::gaze::display_percent;
use crate::core::session::{GameSession, LossReason, Phase};
use crate::error::GeometryError;
use crate::face::landmarks::FaceLandmarks;

/// What one frame-loop invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Session not running; nothing was touched.
    Inactive,
    /// No face in the latest result. Not a fault.
    NoFace,
    /// Landmarks unusable this frame; budget untouched.
    Skipped(GeometryError),
    Evaluated(GazeReading),
    /// This frame exhausted the fault budget.
    Ended(LossReason),
}

/// Per-display-frame pipeline: landmarks -> openness -> gaze state -> fault
/// delta -> fault expiry.
///
/// Detection only runs when the video has advanced; on repeated frames the
/// last result is evaluated again.
#[derive(Debug, Clone)]
pub struct FrameLoopDriver {
    left_eye: [usize; 6],
    right_eye: [usize; 6],
    display_full_scale: f32,
    /// Media time of the last frame handed to the provider.
    last_video_time: Option<f64>,
    latest: Option<FaceLandmarks>,
    detections: u32,
}

impl FrameLoopDriver {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            left_eye: config.left_eye,
            right_eye: config.right_eye,
            display_full_scale: config.display_full_scale,
            last_video_time: None,
            latest: None,
            detections: 0,
        }
    }

    /// Forget the cached result and frame time. Called between sessions.
    pub fn reset(&mut self) {
        self.last_video_time = None;
        self.latest = None;
        self.detections = 0;
    }

    /// Number of provider calls since the last reset.
    pub fn detections(&self) -> u32 {
        self.detections
    }

    pub fn on_frame(
        &mut self,
        session: &mut GameSession,
        now_ms: f64,
        dt: f32,
        io: &mut Collaborators,
    ) -> FrameOutcome {
        // Phase check comes before any work, including detection.
        if session.phase() != Phase::Running {
            return FrameOutcome::Inactive;
        }

        let video_time = io.video.current_time();
        if self.last_video_time != Some(video_time) {
            self.last_video_time = Some(video_time);
            self.latest = io.provider.detect(now_ms);
            self.detections += 1;
        }

        let Some(face) = &self.latest else {
            session.record_no_face();
            return FrameOutcome::NoFace;
        };

        let ratio = match face.average_openness(&self.left_eye, &self.right_eye) {
            Ok(r) => r,
            Err(e) => {
                log::debug!("frame skipped: {}", e);
                session.record_skipped();
                return FrameOutcome::Skipped(e);
            }
        };

        let state = session.rules().thresholds.classify(ratio);
        let loss = session.apply_gaze(state, dt, now_ms);
        let reading = GazeReading {
            state,
            ratio,
            display_pct: display_percent(ratio, self.display_full_scale),
            fault: session.fault().value(),
        };
        io.sink.publish(&SessionEvent::Gaze(reading));

        match loss {
            Some(reason) => FrameOutcome::Ended(reason),
            None => FrameOutcome::Evaluated(reading),
        }
    }
}
