/// Turns host timestamps into per-frame deltas in milliseconds.
/// The first frame after a (re)start has Δt = 0, so a long pause never
/// produces a jump in orbit or spin.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    /// Upper bound on a single delta, e.g. after a backgrounded tab.
    max_delta_ms: f64,
}

impl FrameClock {
    pub fn new(max_delta_ms: f64) -> Self {
        Self {
            last: None,
            max_delta_ms: max_delta_ms.max(0.0),
        }
    }

    /// Record a frame timestamp and return the elapsed ms since the previous one.
    pub fn delta(&mut self, now_ms: f64) -> f64 {
        if !now_ms.is_finite() {
            return 0.0;
        }
        let dt = match self.last {
            Some(last) => (now_ms - last).clamp(0.0, self.max_delta_ms),
            None => 0.0,
        };
        self.last = Some(now_ms);
        dt
    }

    /// Forget the previous timestamp; the next delta will be 0.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn max_delta_ms(&self) -> f64 {
        self.max_delta_ms
    }
}
