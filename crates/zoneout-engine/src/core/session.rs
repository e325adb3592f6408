//! Game session state machine.
//!
//! `Idle -> Countdown -> Running -> {Won, Lost}`, with `{Won, Lost} -> Idle`
//! only on an explicit reset. The session owns every scheduled task and
//! cancels all of them on any terminal transition, so nothing from a finished
//! session can keep ticking into the next one.

use serde::Serialize;
use crate::api::game::GameConfig;
use crate::api::types::SessionEvent;
use crate::error::SessionError;
use super::fault::{FaultAccumulator, FaultBudget};
use super::gaze::{GazeState, GazeThresholds};
use super::scheduler::{Firing, Scheduler, TaskId, TaskKind};

/// Countdown length in whole periods before "go".
pub const COUNTDOWN_SECS: u32 = 3;
/// Session clock in seconds.
pub const SESSION_SECS: u32 = 30;
/// Label shown on the final countdown step.
pub const GO_LABEL: &str = "Do Nothing!";
/// Shown on the result card after a win.
pub const WIN_MESSAGE: &str = "You have mastered the art of doing nothing.";

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Countdown,
    Running,
    Won,
    Lost,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }

    /// Numeric code used on the status wire.
    pub fn code(self) -> f32 {
        match self {
            Phase::Idle => 0.0,
            Phase::Countdown => 1.0,
            Phase::Running => 2.0,
            Phase::Won => 3.0,
            Phase::Lost => 4.0,
        }
    }
}

/// Why a session was lost, taken from the gaze state at the moment the
/// budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossReason {
    /// Eyes stayed too closed.
    FellAsleep,
    /// Eyes stayed too wide open.
    TooAlert,
}

impl LossReason {
    pub fn from_gaze(state: GazeState) -> Self {
        match state {
            GazeState::TooClosed => LossReason::FellAsleep,
            _ => LossReason::TooAlert,
        }
    }

    /// Player-facing text, consumed verbatim by the result screen.
    pub fn message(self) -> &'static str {
        match self {
            LossReason::FellAsleep => "You fell asleep! Eyes closed too long.",
            LossReason::TooAlert => "You're too awake! Relax your eyes.",
        }
    }

    pub fn code(self) -> f32 {
        match self {
            LossReason::FellAsleep => 1.0,
            LossReason::TooAlert => 2.0,
        }
    }
}

/// Per-session counters, reset on entering `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SessionSummary {
    /// Frames that produced a gaze state.
    pub frames_evaluated: u32,
    pub in_band_frames: u32,
    /// Frames where the provider saw no face.
    pub no_face_frames: u32,
    /// Frames dropped for degenerate or incomplete landmarks.
    pub skipped_frames: u32,
    pub peak_fault: f32,
    /// Milliseconds from entering `Running` to the terminal transition.
    pub elapsed_ms: f64,
}

impl SessionSummary {
    /// Share of evaluated frames spent in band (0.0 to 1.0).
    pub fn in_band_share(&self) -> f32 {
        if self.frames_evaluated == 0 {
            0.0
        } else {
            self.in_band_frames as f32 / self.frames_evaluated as f32
        }
    }
}

/// Calibration the session runs under, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionRules {
    pub thresholds: GazeThresholds,
    pub accumulator: FaultAccumulator,
    pub fault_tolerance: f32,
    pub countdown_secs: u32,
    pub session_secs: u32,
    pub timer_period_secs: f32,
}

impl SessionRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            thresholds: config.thresholds(),
            accumulator: config.accumulator(),
            fault_tolerance: config.fault_tolerance,
            countdown_secs: config.countdown_secs,
            session_secs: config.session_secs,
            timer_period_secs: config.timer_period_secs,
        }
    }
}

/// The single active game session.
#[derive(Debug)]
pub struct GameSession {
    rules: SessionRules,
    phase: Phase,
    /// Remaining countdown steps; 0 is the "go" step.
    countdown: u32,
    remaining_secs: u32,
    fault: FaultBudget,
    started_at_ms: Option<f64>,
    loss: Option<LossReason>,
    last_gaze: Option<GazeState>,
    summary: SessionSummary,
    scheduler: Scheduler,
    countdown_task: Option<TaskId>,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        let rules = SessionRules::from_config(config);
        Self {
            rules,
            phase: Phase::Idle,
            countdown: rules.countdown_secs,
            remaining_secs: rules.session_secs,
            fault: FaultBudget::ZERO,
            started_at_ms: None,
            loss: None,
            last_gaze: None,
            summary: SessionSummary::default(),
            scheduler: Scheduler::new(),
            countdown_task: None,
            events: Vec::new(),
        }
    }

    // -- Accessors --

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Countdown text: the step number, or the "go" label on the last step.
    pub fn countdown_label(&self) -> String {
        match self.countdown {
            0 => GO_LABEL.to_string(),
            n => n.to_string(),
        }
    }

    /// Result card text once the session has finished.
    pub fn outcome_message(&self) -> Option<&'static str> {
        match self.phase {
            Phase::Won => Some(WIN_MESSAGE),
            Phase::Lost => self.loss.map(LossReason::message),
            _ => None,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn fault(&self) -> FaultBudget {
        self.fault
    }

    pub fn started_at_ms(&self) -> Option<f64> {
        self.started_at_ms
    }

    pub fn loss(&self) -> Option<LossReason> {
        self.loss
    }

    pub fn last_gaze(&self) -> Option<GazeState> {
        self.last_gaze
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // -- Scheduling --

    /// Queue whatever became due in `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.scheduler.advance(dt);
    }

    /// Next due firing. Returns `None` once drained or after cancellation.
    pub fn next_firing(&mut self) -> Option<Firing> {
        self.scheduler.pop()
    }

    // -- Transitions --

    /// Player start request. The camera stream is already live.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::NotIdle(self.phase));
        }
        self.phase = Phase::Countdown;
        self.countdown = self.rules.countdown_secs;
        self.countdown_task = Some(self.scheduler.every(self.rules.timer_period_secs, TaskKind::Countdown));
        self.events.push(SessionEvent::PhaseChanged(Phase::Countdown));
        self.events.push(SessionEvent::Countdown(self.countdown));
        log::info!("session: countdown from {}", self.countdown);
        Ok(())
    }

    /// One countdown period elapsed.
    pub fn on_countdown_tick(&mut self, now_ms: f64) {
        if self.phase != Phase::Countdown {
            return;
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            self.events.push(SessionEvent::Countdown(self.countdown));
        } else {
            if let Some(id) = self.countdown_task.take() {
                self.scheduler.cancel(id);
            }
            self.enter_running(now_ms);
        }
    }

    fn enter_running(&mut self, now_ms: f64) {
        self.phase = Phase::Running;
        self.remaining_secs = self.rules.session_secs;
        self.fault = FaultBudget::ZERO;
        self.started_at_ms = Some(now_ms);
        self.loss = None;
        self.last_gaze = None;
        self.summary = SessionSummary::default();
        self.scheduler.every(self.rules.timer_period_secs, TaskKind::Clock);
        self.scheduler.every_frame(TaskKind::FrameLoop);
        self.events.push(SessionEvent::PhaseChanged(Phase::Running));
        self.events.push(SessionEvent::TimeRemaining(self.remaining_secs));
        log::info!("session: running for {}s", self.remaining_secs);
    }

    /// One second off the session clock.
    pub fn on_clock_tick(&mut self, now_ms: f64) {
        if self.phase != Phase::Running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.events.push(SessionEvent::TimeRemaining(self.remaining_secs));
        if self.remaining_secs == 0 {
            self.finish(Phase::Won, now_ms);
        }
    }

    /// Feed one evaluated frame into the fault budget and check fault expiry.
    /// Returns the loss reason if this frame ended the session.
    pub fn apply_gaze(&mut self, state: GazeState, dt: f32, now_ms: f64) -> Option<LossReason> {
        if self.phase != Phase::Running {
            return None;
        }
        self.fault = self.rules.accumulator.update(self.fault, state, dt);
        self.last_gaze = Some(state);
        self.summary.frames_evaluated += 1;
        if state == GazeState::InBand {
            self.summary.in_band_frames += 1;
        }
        self.summary.peak_fault = self.summary.peak_fault.max(self.fault.value());

        if self.fault.exceeds(self.rules.fault_tolerance) {
            let reason = LossReason::from_gaze(state);
            self.loss = Some(reason);
            self.events.push(SessionEvent::Lost(reason));
            self.finish(Phase::Lost, now_ms);
            return Some(reason);
        }
        None
    }

    /// A running frame where the provider found no face.
    pub fn record_no_face(&mut self) {
        if self.phase == Phase::Running {
            self.summary.no_face_frames += 1;
        }
    }

    /// A running frame dropped for unusable landmark geometry.
    pub fn record_skipped(&mut self) {
        if self.phase == Phase::Running {
            self.summary.skipped_frames += 1;
        }
    }

    fn finish(&mut self, outcome: Phase, now_ms: f64) {
        self.phase = outcome;
        self.scheduler.cancel_all();
        self.countdown_task = None;
        if let Some(start) = self.started_at_ms {
            self.summary.elapsed_ms = (now_ms - start).max(0.0);
        }
        self.events.push(SessionEvent::PhaseChanged(outcome));
        match self.loss {
            Some(reason) if outcome == Phase::Lost => {
                log::info!("session: lost after {} frames ({:?})", self.summary.frames_evaluated, reason);
            }
            _ => log::info!("session: won, {:.0}% in band", self.summary.in_band_share() * 100.0),
        }
    }

    /// Explicit return to `Idle` from a finished session.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_terminal() {
            return Err(SessionError::NotFinished(self.phase));
        }
        self.scheduler.cancel_all();
        self.countdown_task = None;
        self.phase = Phase::Idle;
        self.countdown = self.rules.countdown_secs;
        self.remaining_secs = self.rules.session_secs;
        self.fault = FaultBudget::ZERO;
        self.started_at_ms = None;
        self.loss = None;
        self.last_gaze = None;
        self.events.push(SessionEvent::PhaseChanged(Phase::Idle));
        log::info!("session: reset");
        Ok(())
    }
}
