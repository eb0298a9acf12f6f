use std::time::Instant;

/// Logs the wall time of named init steps when enabled, a no-op otherwise.
///
/// Used at `init` time to see where backend bring-up (device selection,
/// shader compiler warm-up, swapchain creation, ...) spends its time without
/// paying for an `Instant::now()` call on every frame.
pub struct Benchmark {
    enabled: bool,
    start: Instant,
}

impl Benchmark {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            start: Instant::now(),
        }
    }

    pub fn bench(&self, name: &str) {
        if self.enabled {
            log::info!("{name}: {:?}", self.start.elapsed());
        }
    }
}
