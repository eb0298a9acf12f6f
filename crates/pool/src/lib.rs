//! Small object-pool library backing the frame-slot arenas.
//!
//! Every inline byte payload recorded into a command stream (push-constants,
//! `update-buffer`, `update-texture-region`) is copied into a pooled `Vec<u8>`
//! owned by the frame slot (spec.md §4.C "copy policy"); when the slot's
//! fence completes the vecs are cleared and returned to the pool instead of
//! being freed, which keeps steady-state frame recording allocation-free.

pub mod datatypes;
pub mod mt_datatypes;
pub mod mt_pool;
pub mod pool;
pub mod traits;

pub use datatypes::PoolVec;
pub use pool::Pool;
