use instant::Instant;

/// Monotonic frame clock producing `(elapsed, delta)` in seconds.
#[derive(Clone, Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            // tab switches can stall the loop for seconds
            max_delta: 0.25,
        }
    }

    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32().min(self.max_delta);
        self.last = now;
        ((now - self.start).as_secs_f32(), dt)
    }
}
