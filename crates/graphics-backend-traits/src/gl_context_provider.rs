use std::ffi::c_void;
use std::fmt::Debug;

/// What the immediate/GL executor needs from whatever owns the native window
/// (spec.md §6 "From Window/Surface"): a function-pointer loader, the
/// ability to make the context current on this thread, and to present.
/// Implemented by the `window` crate's windowing boundary, never by
/// `graphics-backend` itself — the executor only ever calls through this
/// trait.
pub trait GlContextProvider: Debug + Send + Sync {
    fn get_proc_address(&self, symbol: &str) -> *const c_void;
    fn make_current(&self);
    fn swap_buffers(&self);
}
