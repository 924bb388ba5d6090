use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary origin
pub trait TimeSource {
    /// Current time relative to the source's origin
    fn now(&self) -> Duration;
}

/// Wall clock - origin is the moment the clock was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and hand
/// another to the backdrop.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn system_clock_measures_elapsed() {
        let clock = SystemClock::new();
        let before = clock.now();

        thread::sleep(Duration::from_millis(10));
        let after = clock.now();

        // Should be roughly 10ms
        assert!(after - before >= Duration::from_millis(9));
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(250));
        handle.advance(Duration::from_millis(750));

        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));
        clock.set(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_millis(500));
    }
}
