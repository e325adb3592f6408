//! Status buffer layout.
//! Must stay in sync with TypeScript `protocol.ts`.
//!
//! Layout (all values in f32 / 4 bytes):
//! ```text
//! [Header: 16 floats]
//! [Events: max_events × 4 floats]
//! ```
//!
//! The header is rewritten as state changes; events are cleared every tick.
//! TypeScript reads `HEADER_MAX_EVENTS` to size its view of the event section.

use crate::api::collaborators::PresentationSink;
use crate::api::game::GameConfig;
use crate::api::types::{GameEvent, SessionEvent};
use crate::core::session::Phase;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 16;

/// Header field indices.
pub const HEADER_PROTOCOL_VERSION: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_PHASE: usize = 2;
pub const HEADER_COUNTDOWN: usize = 3;
pub const HEADER_TIME_REMAINING: usize = 4;
pub const HEADER_GAZE_STATE: usize = 5;
pub const HEADER_DISPLAY_PCT: usize = 6;
pub const HEADER_RATIO: usize = 7;
pub const HEADER_FAULT: usize = 8;
pub const HEADER_FAULT_TOLERANCE: usize = 9;
pub const HEADER_LOSS_REASON: usize = 10;
pub const HEADER_EVENT_COUNT: usize = 11;
pub const HEADER_MAX_EVENTS: usize = 12;
pub const HEADER_DROPPED_EVENTS: usize = 13;
/// 1.0 while the latest gaze reading is in band (calm overlay), else 0.0.
pub const HEADER_CALM: usize = 14;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per game event: kind, a, b, c (fixed wire format).
pub const EVENT_FLOATS: usize = GameEvent::FLOATS;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    /// Maximum game events per tick.
    pub max_events: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,
    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    pub fn new(max_events: usize) -> Self {
        let event_data_floats = max_events * EVENT_FLOATS;
        let event_data_offset = HEADER_FLOATS;
        let buffer_total_floats = event_data_offset + event_data_floats;
        Self {
            max_events,
            event_data_floats,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_events)
    }
}

/// Flat status buffer JavaScript reads through a raw pointer.
/// Implements the presentation sink: every published event updates the
/// header and is appended to the event section.
#[derive(Debug, Clone)]
pub struct StatusBuffer {
    layout: ProtocolLayout,
    data: Vec<f32>,
    events: Vec<GameEvent>,
    dropped: u32,
}

impl StatusBuffer {
    pub fn new(config: &GameConfig) -> Self {
        let layout = ProtocolLayout::from_config(config);
        let mut data = vec![0.0; layout.buffer_total_floats];
        data[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        data[HEADER_PHASE] = Phase::Idle.code();
        data[HEADER_COUNTDOWN] = config.countdown_secs as f32;
        data[HEADER_TIME_REMAINING] = config.session_secs as f32;
        data[HEADER_FAULT_TOLERANCE] = config.fault_tolerance;
        data[HEADER_MAX_EVENTS] = layout.max_events as f32;
        Self {
            events: Vec::with_capacity(layout.max_events),
            layout,
            data,
            dropped: 0,
        }
    }

    pub fn layout(&self) -> &ProtocolLayout {
        &self.layout
    }

    /// Clear last tick's events and bump the frame counter.
    pub fn begin_tick(&mut self) {
        self.events.clear();
        self.dropped = 0;
        self.data[HEADER_FRAME_COUNTER] += 1.0;
        self.sync_events();
    }

    /// Header field by index.
    pub fn header(&self, field: usize) -> f32 {
        self.data[field]
    }

    /// Events published since `begin_tick`.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn sync_events(&mut self) {
        let start = self.layout.event_data_offset;
        let floats: &[f32] = bytemuck::cast_slice(self.events.as_slice());
        self.data[start..start + floats.len()].copy_from_slice(floats);
        self.data[HEADER_EVENT_COUNT] = self.events.len() as f32;
        self.data[HEADER_DROPPED_EVENTS] = self.dropped as f32;
    }
}

impl PresentationSink for StatusBuffer {
    fn publish(&mut self, event: &SessionEvent) {
        match *event {
            SessionEvent::PhaseChanged(phase) => {
                self.data[HEADER_PHASE] = phase.code();
                if phase == Phase::Idle {
                    self.data[HEADER_LOSS_REASON] = 0.0;
                    self.data[HEADER_FAULT] = 0.0;
                    self.data[HEADER_CALM] = 0.0;
                }
            }
            SessionEvent::Countdown(n) => self.data[HEADER_COUNTDOWN] = n as f32,
            SessionEvent::TimeRemaining(s) => self.data[HEADER_TIME_REMAINING] = s as f32,
            SessionEvent::Gaze(r) => {
                self.data[HEADER_GAZE_STATE] = r.state.code();
                self.data[HEADER_DISPLAY_PCT] = r.display_pct;
                self.data[HEADER_RATIO] = r.ratio;
                self.data[HEADER_FAULT] = r.fault;
                self.data[HEADER_CALM] = if r.state.is_calm() { 1.0 } else { 0.0 };
            }
            SessionEvent::Lost(reason) => self.data[HEADER_LOSS_REASON] = reason.code(),
        }

        if self.events.len() < self.layout.max_events {
            self.events.push(event.to_wire());
        } else {
            self.dropped += 1;
        }
        self.sync_events();
    }
}
