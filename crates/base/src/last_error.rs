use parking_lot::Mutex;

/// The process-global "last error string" spec.md §6/§7 requires: updated by
/// the owning thread on every fallible call, retrievable (and must be copied
/// by the caller, since the next fallible call overwrites it).
#[derive(Default)]
pub struct LastErrorSlot(Mutex<Option<String>>);

impl LastErrorSlot {
    pub const fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn set(&self, message: impl Into<String>) {
        *self.0.lock() = Some(message.into());
    }

    pub fn clear(&self) {
        *self.0.lock() = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().clone()
    }
}
