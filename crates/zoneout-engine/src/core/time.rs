/// Fixed-period interval timer.
/// Turns variable frame deltas into whole periods, like a `setInterval` driven
/// from the display loop. Tracks wall-clock time: a long gap between frames
/// fires every period it covered.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    /// Period length in seconds.
    period: f64,
    /// Time accumulated since the last fired period.
    accumulator: f64,
}

impl IntervalTimer {
    pub fn new(period: f32) -> Self {
        Self {
            period: period as f64,
            accumulator: 0.0,
        }
    }

    /// Add frame time. Returns the number of periods that elapsed.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0) as f64;
        // Absorb float drift so 60 x (1/60) still lands on a full period.
        let fired = ((self.accumulator + 1e-9) / self.period) as u32;
        self.accumulator = (self.accumulator - fired as f64 * self.period).max(0.0);
        fired
    }

    /// The period in seconds.
    pub fn period(&self) -> f32 {
        self.period as f32
    }
}
