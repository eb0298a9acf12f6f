use std::{cell::RefCell, rc::Rc};

use super::traits::Recyclable;

struct Inner<T: Recyclable> {
    free: RefCell<Vec<T>>,
}

/// A single-threaded pool of recyclable values, e.g. the `Vec<u8>` staging
/// arenas a frame slot checks out while recording.
#[derive(Clone)]
pub struct Pool<T: Recyclable>(Rc<Inner<T>>);

impl<T: Recyclable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recyclable> Pool<T> {
    pub fn new() -> Self {
        Self(Rc::new(Inner {
            free: RefCell::new(Vec::new()),
        }))
    }

    pub fn with_capacity(cap: usize) -> Self {
        let pool = Self::new();
        pool.0.free.borrow_mut().reserve(cap);
        pool
    }

    pub fn take(&self) -> T {
        self.0.free.borrow_mut().pop().unwrap_or_default()
    }

    pub(crate) fn recycle(&self, mut value: T) {
        value.reset();
        self.0.free.borrow_mut().push(value);
    }

    pub fn len_free(&self) -> usize {
        self.0.free.borrow().len()
    }
}
