use std::ops::{Deref, DerefMut};

use super::{mt_pool::Pool, traits::Recyclable};

/// Thread-safe twin of [`crate::datatypes::PoolVec`].
pub struct PoolVec<T: Recyclable> {
    value: Option<T>,
    pool: Option<Pool<T>>,
}

impl<T: Recyclable> PoolVec<T> {
    pub fn new(pool: &Pool<T>) -> Self {
        Self {
            value: Some(pool.take()),
            pool: Some(pool.clone()),
        }
    }

    pub fn new_without_pool() -> Self {
        Self {
            value: Some(T::default()),
            pool: None,
        }
    }
}

impl<T: Recyclable> Drop for PoolVec<T> {
    fn drop(&mut self) {
        if let (Some(value), Some(pool)) = (self.value.take(), self.pool.take()) {
            pool.recycle(value);
        }
    }
}

impl<T: Recyclable> Deref for PoolVec<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("PoolVec value taken twice")
    }
}

impl<T: Recyclable> DerefMut for PoolVec<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("PoolVec value taken twice")
    }
}
