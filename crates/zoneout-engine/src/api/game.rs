use serde::{Deserialize, Serialize};
use crate::api::collaborators::{Availability, Collaborators};
use crate::core::fault::{FaultAccumulator, FaultModel, FAULT_CHARGE, FAULT_RECOVERY, FAULT_TOLERANCE};
use crate::core::gaze::{GazeThresholds, DISPLAY_FULL_SCALE, T_CLOSED, T_OPEN};
use crate::core::scheduler::TaskKind;
use crate::core::session::{GameSession, Phase, COUNTDOWN_SECS, SESSION_SECS};
use crate::error::{ConfigError, SessionError};
use crate::face::landmarks::{LEFT_EYE, RIGHT_EYE};
use crate::input::queue::{InputEvent, InputQueue};
use crate::systems::frame_loop::{FrameLoopDriver, FrameOutcome};

/// Largest status buffer event capacity a config may ask for.
pub const MAX_EVENTS_LIMIT: usize = 4096;

/// Calibration knobs, provided by the host. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Averaged EAR below which the eyes are too closed (default: 0.18).
    pub closed_threshold: f32,
    /// Averaged EAR above which the eyes are too open (default: 0.35).
    pub open_threshold: f32,
    /// Fault units added per out-of-band frame (default: 30).
    pub fault_charge: f32,
    /// Fault units removed per in-band frame (default: 16).
    pub fault_recovery: f32,
    /// Budget above which the session is lost (default: 2000).
    pub fault_tolerance: f32,
    /// Per-frame deltas or dt-scaled deltas (default: per frame).
    pub fault_model: FaultModel,
    /// Countdown steps before "go" (default: 3).
    pub countdown_secs: u32,
    /// Session clock in seconds (default: 30).
    pub session_secs: u32,
    /// Period of the countdown and clock intervals in seconds (default: 1).
    pub timer_period_secs: f32,
    /// EAR shown as a full gauge (default: 0.5).
    pub display_full_scale: f32,
    /// Face Mesh indices of the left eye in EAR order.
    pub left_eye: [usize; 6],
    /// Face Mesh indices of the right eye in EAR order.
    pub right_eye: [usize; 6],
    /// Maximum game events per tick in the status buffer (default: 32).
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            closed_threshold: T_CLOSED,
            open_threshold: T_OPEN,
            fault_charge: FAULT_CHARGE,
            fault_recovery: FAULT_RECOVERY,
            fault_tolerance: FAULT_TOLERANCE,
            fault_model: FaultModel::PerFrame,
            countdown_secs: COUNTDOWN_SECS,
            session_secs: SESSION_SECS,
            timer_period_secs: 1.0,
            display_full_scale: DISPLAY_FULL_SCALE,
            left_eye: LEFT_EYE,
            right_eye: RIGHT_EYE,
            max_events: 32,
        }
    }
}

impl GameConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.closed_threshold < self.open_threshold) {
            return Err(ConfigError::InvalidThresholds {
                closed: self.closed_threshold,
                open: self.open_threshold,
            });
        }
        let positive = [
            ("fault_charge", self.fault_charge),
            ("fault_recovery", self.fault_recovery),
            ("fault_tolerance", self.fault_tolerance),
            ("timer_period_secs", self.timer_period_secs),
            ("display_full_scale", self.display_full_scale),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        if let FaultModel::Elapsed { nominal_frame_secs } = self.fault_model {
            if !(nominal_frame_secs > 0.0) {
                return Err(ConfigError::NonPositive("nominal_frame_secs"));
            }
        }
        if self.max_events == 0 {
            return Err(ConfigError::NonPositive("max_events"));
        }
        if self.max_events > MAX_EVENTS_LIMIT {
            return Err(ConfigError::TooLarge { field: "max_events", max: MAX_EVENTS_LIMIT });
        }
        if self.session_secs == 0 {
            return Err(ConfigError::SessionTooShort);
        }
        Ok(())
    }

    pub fn thresholds(&self) -> GazeThresholds {
        GazeThresholds {
            closed: self.closed_threshold,
            open: self.open_threshold,
        }
    }

    pub fn accumulator(&self) -> FaultAccumulator {
        FaultAccumulator::new(self.fault_charge, self.fault_recovery, self.fault_model)
    }
}

/// The game: one session, its frame loop driver, and provider availability.
///
/// The host calls `tick` once per display frame; everything else (countdown,
/// clock, frame loop) runs as tasks the session schedules and cancels.
pub struct ZoneOutGame {
    config: GameConfig,
    session: GameSession,
    driver: FrameLoopDriver,
    availability: Availability,
}

impl ZoneOutGame {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            session: GameSession::new(&config),
            driver: FrameLoopDriver::new(&config),
            availability: Availability::Loading,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    /// The landmark model finished loading.
    pub fn provider_ready(&mut self) {
        self.availability = Availability::Ready;
        log::info!("landmark provider ready");
    }

    /// The landmark model failed to load. No retry.
    pub fn provider_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("landmark provider failed: {}", message);
        self.availability = Availability::Failed(message);
    }

    /// Begin the countdown. The camera stream must already be live.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match &self.availability {
            Availability::Ready => {}
            other => return Err(SessionError::ProviderUnavailable(other.message())),
        }
        self.session.start()?;
        self.driver.reset();
        Ok(())
    }

    /// Return a finished session to idle.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.session.reset()?;
        self.driver.reset();
        Ok(())
    }

    /// Apply queued player requests. Rejected requests are logged and dropped.
    pub fn handle_input(&mut self, input: &InputQueue) {
        for event in input.iter() {
            let result = match event {
                InputEvent::Start => self.start(),
                InputEvent::Reset => self.reset(),
            };
            if let Err(e) = result {
                log::warn!("{:?} ignored: {}", event, e);
            }
        }
    }

    /// Advance one display frame: run due timers, then the frame loop.
    pub fn tick(&mut self, dt: f32, now_ms: f64, io: &mut Collaborators) {
        self.flush(io);
        self.session.advance(dt);
        while let Some(firing) = self.session.next_firing() {
            match firing.kind {
                TaskKind::Countdown => {
                    log::debug!("countdown tick at {:.0}ms", now_ms);
                    self.session.on_countdown_tick(now_ms);
                }
                TaskKind::Clock => {
                    log::debug!("clock tick at {:.0}ms", now_ms);
                    self.session.on_clock_tick(now_ms);
                }
                TaskKind::FrameLoop => {
                    if let FrameOutcome::Ended(reason) =
                        self.driver.on_frame(&mut self.session, now_ms, firing.dt, io)
                    {
                        log::debug!("fault budget exhausted: {:?}", reason);
                    }
                }
            }
            self.flush(io);
        }
    }

    fn flush(&mut self, io: &mut Collaborators) {
        for event in self.session.drain_events() {
            io.sink.publish(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use crate::api::collaborators::{LandmarkProvider, VideoSource};
    use crate::api::types::SessionEvent;
    use crate::core::fault::FaultBudget;
    use crate::core::gaze::GazeState;
    use crate::core::session::{LossReason, WIN_MESSAGE};
    use crate::face::landmarks::FaceLandmarks;

    const FRAME: f32 = 1.0 / 60.0;

    /// Eye geometry giving a chosen averaged ratio.
    fn face_with_ratio(ratio: f32) -> FaceLandmarks {
        // horizontal 0.1, so each lid pair spans ratio * 0.1
        let gap = ratio * 0.1 / 2.0;
        let mut points = vec![Vec2::new(0.5, 0.5); 478];
        for (eye, cx) in [(LEFT_EYE, 0.35), (RIGHT_EYE, 0.65)] {
            points[eye[0]] = Vec2::new(cx - 0.05, 0.4);
            points[eye[1]] = Vec2::new(cx - 0.02, 0.4 - gap);
            points[eye[2]] = Vec2::new(cx + 0.02, 0.4 - gap);
            points[eye[3]] = Vec2::new(cx + 0.05, 0.4);
            points[eye[4]] = Vec2::new(cx + 0.02, 0.4 + gap);
            points[eye[5]] = Vec2::new(cx - 0.02, 0.4 + gap);
        }
        FaceLandmarks::new(points)
    }

    fn face_for(state: GazeState) -> FaceLandmarks {
        match state {
            GazeState::TooClosed => face_with_ratio(0.05),
            GazeState::InBand => face_with_ratio(0.26),
            GazeState::TooOpen => face_with_ratio(0.5),
        }
    }

    /// Plays back a gaze script, one entry per detection; repeats the last.
    struct ScriptedProvider {
        script: Vec<GazeState>,
        next: usize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<GazeState>) -> Self {
            Self { script, next: 0 }
        }
    }

    impl LandmarkProvider for ScriptedProvider {
        fn detect(&mut self, _timestamp_ms: f64) -> Option<FaceLandmarks> {
            let idx = self.next.min(self.script.len().saturating_sub(1));
            self.next += 1;
            self.script.get(idx).map(|s| face_for(*s))
        }
    }

    /// A camera that delivers a new frame on every display frame.
    struct FreshVideo(f64);

    impl VideoSource for FreshVideo {
        fn current_time(&self) -> f64 {
            self.0
        }
    }

    struct Harness {
        game: ZoneOutGame,
        provider: ScriptedProvider,
        events: Vec<SessionEvent>,
        frames: u64,
        /// Running-phase frames observed by the fault budget.
        budget_trace: Vec<f32>,
    }

    impl Harness {
        fn new(script: Vec<GazeState>) -> Self {
            let mut game = ZoneOutGame::new(GameConfig::default()).unwrap();
            game.provider_ready();
            Self {
                game,
                provider: ScriptedProvider::new(script),
                events: Vec::new(),
                frames: 0,
                budget_trace: Vec::new(),
            }
        }

        fn tick(&mut self, dt: f32) {
            self.frames += 1;
            let video = FreshVideo(self.frames as f64);
            let now_ms = self.frames as f64 * 1000.0 / 60.0;
            let mut io = Collaborators {
                provider: &mut self.provider,
                video: &video,
                sink: &mut self.events,
            };
            self.game.tick(dt, now_ms, &mut io);
            if self.game.phase() == Phase::Running {
                self.budget_trace.push(self.game.session().fault().value());
            }
        }

        /// Start and step through the countdown with whole-second ticks.
        fn start_running(&mut self) {
            self.game.start().unwrap();
            for _ in 0..4 {
                self.tick(1.0);
            }
            assert_eq!(self.game.phase(), Phase::Running);
            self.budget_trace.clear();
        }

        /// Run display frames until the session ends. Returns frames used.
        fn run_to_end(&mut self, max_frames: u32) -> u32 {
            for n in 1..=max_frames {
                self.tick(FRAME);
                if self.game.phase().is_terminal() {
                    return n;
                }
            }
            panic!("session still {:?} after {} frames", self.game.phase(), max_frames);
        }

        fn gaze_events(&self) -> usize {
            self.events.iter().filter(|e| matches!(e, SessionEvent::Gaze(_))).count()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn config_from_partial_json() {
        let c = GameConfig::from_json(r#"{ "closed_threshold": 0.2, "session_secs": 45 }"#).unwrap();
        assert_eq!(c.closed_threshold, 0.2);
        assert_eq!(c.session_secs, 45);
        assert_eq!(c.open_threshold, T_OPEN);
        assert_eq!(c.left_eye, LEFT_EYE);
    }

    #[test]
    fn config_rejects_inverted_thresholds() {
        let err = GameConfig::from_json(r#"{ "closed_threshold": 0.4, "open_threshold": 0.3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn config_rejects_bad_values() {
        assert!(matches!(
            GameConfig::from_json(r#"{ "fault_charge": 0 }"#),
            Err(ConfigError::NonPositive("fault_charge"))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "session_secs": 0 }"#),
            Err(ConfigError::SessionTooShort)
        ));
        assert!(matches!(GameConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn start_requires_ready_provider() {
        let mut game = ZoneOutGame::new(GameConfig::default()).unwrap();
        assert!(matches!(game.start(), Err(SessionError::ProviderUnavailable(_))));
        game.provider_failed("no GPU");
        assert_eq!(
            game.start(),
            Err(SessionError::ProviderUnavailable("Error Loading AI: no GPU".into()))
        );
        assert_eq!(game.phase(), Phase::Idle);
    }

    #[test]
    fn scenario_all_in_band_wins() {
        let mut h = Harness::new(vec![GazeState::InBand]);
        h.start_running();
        let frames = h.run_to_end(31 * 60);
        assert_eq!(h.game.phase(), Phase::Won);
        assert_eq!(frames, 30 * 60);
        assert!(h.budget_trace.iter().all(|&b| b == 0.0));
        assert_eq!(h.game.session().loss(), None);
        assert!(h.game.session().scheduler().is_empty());
        assert!(h.events.contains(&SessionEvent::PhaseChanged(Phase::Won)));
        assert!(h.events.contains(&SessionEvent::TimeRemaining(0)));
    }

    #[test]
    fn scenario_sustained_closure_loses_early() {
        let mut h = Harness::new(vec![GazeState::TooClosed; 70]);
        h.start_running();
        let frames = h.run_to_end(70);
        assert_eq!(frames, 67);
        assert_eq!(h.game.phase(), Phase::Lost);
        assert_eq!(h.game.session().loss(), Some(LossReason::FellAsleep));
        assert!(h.game.session().remaining_secs() > 0);
        // Lost is announced right before the phase change.
        let n = h.events.len();
        assert_eq!(h.events[n - 2], SessionEvent::Lost(LossReason::FellAsleep));
        assert_eq!(h.events[n - 1], SessionEvent::PhaseChanged(Phase::Lost));
    }

    #[test]
    fn scenario_alternating_lapses_trip_at_exact_frame() {
        // +30, -16 per pair: after k pairs' open frame the budget is 14k + 16.
        // First value above 2000 is at k = 142, i.e. frame 283.
        let script: Vec<GazeState> = (0..400)
            .map(|i| if i % 2 == 0 { GazeState::TooOpen } else { GazeState::InBand })
            .collect();
        let mut h = Harness::new(script);
        h.start_running();
        let frames = h.run_to_end(30 * 60);
        assert_eq!(frames, 283);
        assert_eq!(h.game.session().loss(), Some(LossReason::TooAlert));
        assert_eq!(h.game.session().fault().value(), 2004.0);
        // Oscillates: every in-band frame lowers the budget.
        for pair in h.budget_trace.windows(2).step_by(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn long_host_gap_still_counts_wall_clock() {
        let mut h = Harness::new(vec![GazeState::InBand]);
        h.start_running();
        h.tick(40.0);
        assert_eq!(h.game.phase(), Phase::Won);
        assert_eq!(h.game.session().remaining_secs(), 0);
        assert_eq!(h.game.session().outcome_message(), Some(WIN_MESSAGE));
        // The frame firing queued behind the clock never ran.
        assert_eq!(h.gaze_events(), 0);
    }

    #[test]
    fn config_rejects_oversized_event_buffer() {
        let json = format!(r#"{{ "max_events": {} }}"#, MAX_EVENTS_LIMIT + 1);
        assert!(matches!(
            GameConfig::from_json(&json),
            Err(ConfigError::TooLarge { field: "max_events", .. })
        ));
        assert!(GameConfig::from_json(r#"{ "max_events": 18446744073709551615 }"#).is_err());
    }

    #[test]
    fn frame_loop_idle_outside_running() {
        let mut h = Harness::new(vec![GazeState::TooOpen]);
        for _ in 0..10 {
            h.tick(FRAME);
        }
        assert_eq!(h.game.phase(), Phase::Idle);
        assert_eq!(h.provider.next, 0);
        assert_eq!(h.gaze_events(), 0);
        assert!(h.game.session().scheduler().is_empty());

        // During the countdown the frame loop is not armed either.
        h.game.start().unwrap();
        h.tick(0.5);
        assert_eq!(h.provider.next, 0);
    }

    #[test]
    fn no_ticks_leak_after_loss() {
        let mut h = Harness::new(vec![GazeState::TooClosed]);
        h.start_running();
        h.run_to_end(100);
        let detections = h.provider.next;
        let events = h.events.len();
        let budget = h.game.session().fault();
        for _ in 0..120 {
            h.tick(FRAME);
        }
        assert_eq!(h.provider.next, detections);
        assert_eq!(h.events.len(), events);
        assert_eq!(h.game.session().fault(), budget);
        assert_eq!(h.game.phase(), Phase::Lost);
    }

    #[test]
    fn reset_then_restart_starts_fresh() {
        let mut h = Harness::new(vec![GazeState::TooOpen]);
        h.start_running();
        h.run_to_end(100);
        assert_eq!(h.game.phase(), Phase::Lost);

        h.game.reset().unwrap();
        assert_eq!(h.game.phase(), Phase::Idle);
        h.start_running();
        assert_eq!(h.game.session().fault(), FaultBudget::ZERO);
        assert_eq!(h.game.session().remaining_secs(), SESSION_SECS);
        assert_eq!(h.game.session().loss(), None);
    }

    #[test]
    fn input_queue_drives_start_and_reset() {
        let mut h = Harness::new(vec![GazeState::InBand]);
        let mut input = InputQueue::new();
        input.push(InputEvent::Reset); // rejected: nothing to reset
        input.push(InputEvent::Start);
        h.game.handle_input(&input);
        assert_eq!(h.game.phase(), Phase::Countdown);
    }

    #[test]
    fn elapsed_model_is_frame_rate_independent() {
        let config = GameConfig {
            fault_model: FaultModel::Elapsed { nominal_frame_secs: FRAME },
            ..GameConfig::default()
        };
        let mut game = ZoneOutGame::new(config).unwrap();
        game.provider_ready();
        game.start().unwrap();
        let mut provider = ScriptedProvider::new(vec![GazeState::TooClosed]);
        let mut sink: Vec<SessionEvent> = Vec::new();
        for i in 0..4 {
            let video = FreshVideo(i as f64);
            let mut io = Collaborators { provider: &mut provider, video: &video, sink: &mut sink };
            game.tick(1.0, 0.0, &mut io);
        }
        // 30 fps: half the frames, same wall-clock tolerance.
        let mut frames = 0;
        while game.phase() == Phase::Running && frames < 100 {
            frames += 1;
            let video = FreshVideo(100.0 + frames as f64);
            let mut io = Collaborators { provider: &mut provider, video: &video, sink: &mut sink };
            game.tick(1.0 / 30.0, 0.0, &mut io);
        }
        assert_eq!(game.phase(), Phase::Lost);
        assert!((33..=35).contains(&frames), "lost after {} frames", frames);
    }
}
