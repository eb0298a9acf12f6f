/// `now() -> seconds` (spec.md §6 "From Timer"), used only by the
/// compositor to stamp `last-composite-time-ms`. Frame pacing itself is
/// entirely the caller's concern; the URC never sleeps.
pub trait TimerProvider: std::fmt::Debug + Send + Sync {
    fn now_seconds(&self) -> f64;
}
