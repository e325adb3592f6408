use bytemuck::{Pod, Zeroable};
use crate::core::gaze::GazeState;
use crate::core::session::{LossReason, Phase};

// Game event kinds (Rust → TypeScript)
pub const EVENT_PHASE: f32 = 1.0;
pub const EVENT_COUNTDOWN: f32 = 2.0;
pub const EVENT_TIME_REMAINING: f32 = 3.0;
pub const EVENT_GAZE: f32 = 4.0;
pub const EVENT_LOST: f32 = 5.0;

/// One evaluated frame as the presentation layer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeReading {
    pub state: GazeState,
    /// Averaged openness ratio of both eyes.
    pub ratio: f32,
    /// Gauge position, 0 to 100.
    pub display_pct: f32,
    /// Fault budget after this frame.
    pub fault: f32,
}

/// Write-only notifications for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(Phase),
    /// Countdown step; 0 is the "go" step.
    Countdown(u32),
    TimeRemaining(u32),
    Gaze(GazeReading),
    /// Emitted right before `PhaseChanged(Phase::Lost)`.
    Lost(LossReason),
}

impl SessionEvent {
    /// Flatten into the 4-float wire record.
    pub fn to_wire(&self) -> GameEvent {
        match *self {
            SessionEvent::PhaseChanged(phase) => GameEvent::new(EVENT_PHASE, phase.code(), 0.0, 0.0),
            SessionEvent::Countdown(n) => GameEvent::new(EVENT_COUNTDOWN, n as f32, 0.0, 0.0),
            SessionEvent::TimeRemaining(s) => GameEvent::new(EVENT_TIME_REMAINING, s as f32, 0.0, 0.0),
            SessionEvent::Gaze(r) => GameEvent::new(EVENT_GAZE, r.state.code(), r.display_pct, r.fault),
            SessionEvent::Lost(reason) => GameEvent::new(EVENT_LOST, reason.code(), 0.0, 0.0),
        }
    }
}

/// A game event communicated from Rust to TypeScript via the status buffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaze_event_carries_state_and_gauge() {
        let e = SessionEvent::Gaze(GazeReading {
            state: GazeState::TooOpen,
            ratio: 0.4,
            display_pct: 80.0,
            fault: 30.0,
        });
        assert_eq!(e.to_wire(), GameEvent::new(EVENT_GAZE, 3.0, 80.0, 30.0));
    }

    #[test]
    fn lost_event_carries_reason_code() {
        let w = SessionEvent::Lost(LossReason::FellAsleep).to_wire();
        assert_eq!(w.kind, EVENT_LOST);
        assert_eq!(w.a, 1.0);
    }

    #[test]
    fn event_is_four_floats() {
        assert_eq!(std::mem::size_of::<GameEvent>(), GameEvent::FLOATS * 4);
    }
}
