/// Throttled timer - minimum interval between fires
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval: f32,
    time_since_last: f32,
}

impl Throttled {
    /// Create throttled timer with minimum interval
    pub fn new(min_interval: f32) -> Self {
        Self {
            min_interval,
            time_since_last: 0.0,
        }
    }

    /// Accumulate delta, returns elapsed window length when it fires
    pub fn try_tick(&mut self, delta: f32) -> Option<f32> {
        self.time_since_last += delta;

        if self.time_since_last >= self.min_interval {
            let window = self.time_since_last;
            self.time_since_last = 0.0;
            Some(window)
        } else {
            None
        }
    }
}

/// Frames-per-second estimate, refreshed once per interval
#[derive(Debug, Clone, Copy)]
pub struct FpsMeter {
    window: Throttled,
    frames: u32,
}

impl FpsMeter {
    pub fn new(interval: f32) -> Self {
        Self {
            window: Throttled::new(interval),
            frames: 0,
        }
    }

    /// Count one frame; returns the new estimate when the window closes
    pub fn tick(&mut self, delta: f32) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window.try_tick(delta)?;
        let fps = self.frames as f32 / elapsed;
        self.frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_enforces_minimum() {
        let mut timer = Throttled::new(0.1);

        assert_eq!(timer.try_tick(0.05), None); // Too soon
        assert!(timer.try_tick(0.06).is_some()); // Enough time
        assert_eq!(timer.try_tick(0.01), None); // Restarted
    }

    #[test]
    fn fps_meter_publishes_once_per_window() {
        let mut meter = FpsMeter::new(1.0);

        assert_eq!(meter.tick(0.4), None);
        assert_eq!(meter.tick(0.4), None);
        let fps = meter.tick(0.4).unwrap();

        // 3 frames over 1.2s
        assert!((fps - 2.5).abs() < 0.01);

        // Counter restarted
        assert_eq!(meter.tick(0.4), None);
    }
}
