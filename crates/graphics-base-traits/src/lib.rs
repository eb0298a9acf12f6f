//! Streamed-data traits shared by the `graphics` facade and the
//! `graphics-backend` executors: the shape of a blocking readback request
//! and its result, independent of which backend services it.
//!
//! Modeled on the teacher's `BackendFrameFetcher`/`BackendPresentedImageDataRgba`
//! pair (`lib/graphics-backend-traits/src/frame_fetcher_plugin.rs`), narrowed
//! from "fetch a presented frame" to "read back a buffer's current bytes" —
//! the only readback operation spec.md §6 names (`get-buffer-data`).

pub mod readback;

pub use readback::{ReadbackError, ReadbackRequest, ReadbackResult};
