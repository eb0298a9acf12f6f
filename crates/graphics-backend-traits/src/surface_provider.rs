use std::fmt::Debug;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceExtent {
    pub width: u32,
    pub height: u32,
}

/// What `window` provides the URC at init and on every present failure
/// (spec.md §6 "From Window/Surface"). The deferred backend builds a
/// `VkSurfaceKHR` from the handles via `ash-window::create_surface`; the
/// immediate backend uses the same handles to build a `glutin` context.
pub trait SurfaceProvider: HasWindowHandle + HasDisplayHandle + Debug + Send + Sync {
    fn surface_extent(&self) -> SurfaceExtent;

    /// True once the windowing layer has observed the surface become
    /// unusable (minimized to zero size, device lost, etc). The scheduler
    /// checks this at the top of `acquire-frame`.
    fn surface_lost(&self) -> bool;
}
