//! Browser bridge for the Zone-Out game.
//!
//! JavaScript owns the camera, the landmark model and the DOM. Each
//! `requestAnimationFrame` it calls [`tick`] with the frame delta, the
//! timestamp and the video's `currentTime`, then reads the status buffer
//! through [`get_status_ptr`] / [`get_status_len`].

pub mod runner;

pub use runner::{GameRunner, JsLandmarkProvider, VideoClock};

use std::cell::RefCell;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use zoneout_engine::{GameConfig, InputEvent};

thread_local! {
    static RUNNER: RefCell<Option<GameRunner>> = const { RefCell::new(None) };
}

fn with_runner<R>(f: impl FnOnce(&mut GameRunner) -> R) -> R {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let runner = borrow.as_mut().expect("Game not initialized. Call zoneout_init() first.");
        f(runner)
    })
}

/// Build the game from an optional JSON config. Missing fields take defaults.
#[wasm_bindgen]
pub fn zoneout_init(config_json: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"zoneout: logger already installed".into());
    }

    let config = match config_json.as_deref() {
        Some(json) => GameConfig::from_json(json),
        None => Ok(GameConfig::default()),
    }
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let runner = GameRunner::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });

    log::info!("zoneout: initialized");
    Ok(())
}

/// The landmark model loaded. `detect_fn(timestampMs)` returns a
/// `Float32Array` of xyz triples or `null`.
#[wasm_bindgen]
pub fn set_detector(detect_fn: Function) {
    with_runner(|r| r.set_detector(detect_fn));
}

#[wasm_bindgen]
pub fn detector_failed(message: &str) {
    with_runner(|r| r.detector_failed(message));
}

#[wasm_bindgen]
pub fn start() {
    with_runner(|r| r.push_input(InputEvent::Start));
}

#[wasm_bindgen]
pub fn reset() {
    with_runner(|r| r.push_input(InputEvent::Reset));
}

#[wasm_bindgen]
pub fn tick(dt: f32, now_ms: f64, video_time: f64) {
    with_runner(|r| r.tick(dt, now_ms, video_time));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_status_ptr() -> *const f32 {
    with_runner(|r| r.status_ptr())
}

#[wasm_bindgen]
pub fn get_status_len() -> u32 {
    with_runner(|r| r.status_len())
}

#[wasm_bindgen]
pub fn get_max_events() -> u32 {
    with_runner(|r| r.max_events())
}

#[wasm_bindgen]
pub fn get_loss_message() -> String {
    with_runner(|r| r.loss_message())
}

#[wasm_bindgen]
pub fn get_win_message() -> String {
    with_runner(|r| r.win_message())
}

#[wasm_bindgen]
pub fn get_countdown_label() -> String {
    with_runner(|r| r.countdown_label())
}

/// Session counters: frames evaluated, in band, without a face, skipped,
/// peak fault and elapsed milliseconds.
#[wasm_bindgen]
pub fn get_summary() -> Result<String, JsValue> {
    with_runner(|r| r.summary_json()).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn get_availability_message() -> String {
    with_runner(|r| r.availability_message())
}

#[wasm_bindgen]
pub fn get_gaze_label() -> String {
    with_runner(|r| r.gaze_label())
}
