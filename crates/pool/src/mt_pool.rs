use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::Recyclable;

struct Inner<T: Recyclable> {
    free: Mutex<Vec<T>>,
}

/// Thread-safe twin of [`crate::pool::Pool`], used where a staging buffer
/// might be recycled from a different thread than the one that checked it
/// out (e.g. a readback callback).
#[derive(Clone)]
pub struct Pool<T: Recyclable>(Arc<Inner<T>>);

impl<T: Recyclable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recyclable> Pool<T> {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            free: Mutex::new(Vec::new()),
        }))
    }

    pub fn take(&self) -> T {
        self.0.free.lock().pop().unwrap_or_default()
    }

    pub(crate) fn recycle(&self, mut value: T) {
        value.reset();
        self.0.free.lock().push(value);
    }
}
