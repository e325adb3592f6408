use js_sys::{Float32Array, Function};
use wasm_bindgen::{JsCast, JsValue};
use zoneout_engine::{
    Collaborators, ConfigError, FaceLandmarks, GameConfig, InputEvent, InputQueue,
    LandmarkProvider, Phase, StatusBuffer, VideoSource, ZoneOutGame,
};

/// Floats per landmark in the array the detector callback returns (x, y, z).
pub const LANDMARK_STRIDE: usize = 3;

/// Landmark provider backed by a JavaScript callback.
///
/// The callback receives the frame timestamp in milliseconds and returns a
/// flat `Float32Array` of `[x, y, z]` triples for the first face, or
/// `null`/`undefined` when no face is in view.
#[derive(Default)]
pub struct JsLandmarkProvider {
    detect_fn: Option<Function>,
}

impl JsLandmarkProvider {
    pub fn set(&mut self, detect_fn: Function) {
        self.detect_fn = Some(detect_fn);
    }
}

impl LandmarkProvider for JsLandmarkProvider {
    fn detect(&mut self, timestamp_ms: f64) -> Option<FaceLandmarks> {
        let detect_fn = self.detect_fn.as_ref()?;
        let value = match detect_fn.call1(&JsValue::NULL, &JsValue::from_f64(timestamp_ms)) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("detector threw: {:?}", e);
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let Ok(array) = value.dyn_into::<Float32Array>() else {
            log::warn!("detector returned something other than a Float32Array");
            return None;
        };
        let face = FaceLandmarks::from_flat(&array.to_vec(), LANDMARK_STRIDE);
        (!face.is_empty()).then_some(face)
    }
}

/// Media time of the camera frame, pushed in by JavaScript every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoClock {
    current_time: f64,
}

impl VideoSource for VideoClock {
    fn current_time(&self) -> f64 {
        self.current_time
    }
}

/// Owns the game and everything it talks to on the browser side.
///
/// wasm-bindgen cannot hand out `&mut` to a struct across calls, so the
/// exports in `lib.rs` keep one of these in a `thread_local!`.
pub struct GameRunner {
    game: ZoneOutGame,
    input: InputQueue,
    provider: JsLandmarkProvider,
    video: VideoClock,
    status: StatusBuffer,
}

impl GameRunner {
    /// Validates the config before anything is sized from it.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let game = ZoneOutGame::new(config)?;
        let status = StatusBuffer::new(game.config());
        Ok(Self {
            game,
            input: InputQueue::new(),
            provider: JsLandmarkProvider::default(),
            video: VideoClock::default(),
            status,
        })
    }

    /// Install the detector callback and mark the model ready.
    pub fn set_detector(&mut self, detect_fn: Function) {
        self.provider.set(detect_fn);
        self.game.provider_ready();
    }

    pub fn detector_failed(&mut self, message: &str) {
        self.game.provider_failed(message);
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one display frame.
    pub fn tick(&mut self, dt: f32, now_ms: f64, video_time: f64) {
        self.status.begin_tick();

        // Requests are applied before timers so a start takes effect this frame.
        self.game.handle_input(&self.input);
        self.input.drain();

        self.video.current_time = video_time;
        let mut io = Collaborators {
            provider: &mut self.provider,
            video: &self.video,
            sink: &mut self.status,
        };
        self.game.tick(dt, now_ms, &mut io);
    }

    // ---- Pointer accessors for direct memory reads ----

    pub fn status_ptr(&self) -> *const f32 {
        self.status.as_ptr()
    }

    pub fn status_len(&self) -> u32 {
        self.status.len() as u32
    }

    pub fn max_events(&self) -> u32 {
        self.status.layout().max_events as u32
    }

    // ---- Text accessors ----

    /// Message for the result screen, empty while no session has been lost.
    pub fn loss_message(&self) -> String {
        self.game
            .session()
            .loss()
            .map(|reason| reason.message().to_string())
            .unwrap_or_default()
    }

    /// Win text for the result card, empty unless the last session was won.
    pub fn win_message(&self) -> String {
        match self.game.phase() {
            Phase::Won => self.game.session().outcome_message().unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }

    /// "3", "2", "1", then the go label.
    pub fn countdown_label(&self) -> String {
        self.game.session().countdown_label()
    }

    /// Counters of the current or last session as JSON.
    pub fn summary_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self.game.session().summary())
    }

    pub fn availability_message(&self) -> String {
        self.game.availability().message()
    }

    pub fn gaze_label(&self) -> String {
        self.game
            .session()
            .last_gaze()
            .map(|state| state.label().to_string())
            .unwrap_or_default()
    }
}
