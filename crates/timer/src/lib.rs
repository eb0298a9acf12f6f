//! The temporal oscillator (spec.md §6 "From Timer"): a monotonic clock the
//! compositor calls into for `last-composite-time-ms`, plus an optional
//! pacing helper applications may use. Frame pacing itself stays entirely
//! the caller's concern (spec.md §4.B "Timing contract") — `System` never
//! calls `sleep_until_target_fps` on its own.

use std::thread;
use std::time::{Duration, Instant};

use graphics_backend_traits::timer_provider::TimerProvider;

/// Wraps `std::time::Instant` behind [`TimerProvider`] so `graphics-backend`
/// never depends on wall-clock time directly — only on the trait object it
/// is handed at `init`.
#[derive(Debug)]
pub struct Timer {
    epoch: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now_seconds(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Sleeps however long is left of a `target_fps` budget since
    /// `tick_started`. A no-op (returns immediately) if the tick already ran
    /// over budget — callers should not expect catch-up behavior.
    pub fn sleep_until_target_fps(&self, tick_started: Instant, target_fps: u32) {
        if target_fps == 0 {
            return;
        }
        let budget = Duration::from_secs_f64(1.0 / target_fps as f64);
        let elapsed = tick_started.elapsed();
        if let Some(remaining) = budget.checked_sub(elapsed) {
            thread::sleep(remaining);
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerProvider for Timer {
    fn now_seconds(&self) -> f64 {
        self.now_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_seconds_is_monotonically_non_decreasing() {
        let timer = Timer::new();
        let first = timer.now_seconds();
        thread::sleep(Duration::from_millis(5));
        let second = timer.now_seconds();
        assert!(second >= first);
    }

    #[test]
    fn sleep_until_target_fps_is_a_no_op_past_budget() {
        let timer = Timer::new();
        let started = Instant::now() - Duration::from_secs(1);
        let before = Instant::now();
        timer.sleep_until_target_fps(started, 60);
        assert!(before.elapsed() < Duration::from_millis(20));
    }
}
