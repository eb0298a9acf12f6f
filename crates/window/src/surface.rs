use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use graphics_backend_traits::surface_provider::{SurfaceExtent, SurfaceProvider};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use winit::window::Window;

/// `SurfaceProvider` backed by a live `winit::window::Window` (spec.md §6
/// "From Window/Surface"). `graphics-backend`'s deferred executor builds a
/// `VkSurfaceKHR` from the raw handles via `ash_window::create_surface`; the
/// immediate executor never touches this type, it only needs the `winit`
/// window to build a `glutin` context (see [`crate::gl_context`]).
#[derive(Debug)]
pub struct WinitSurfaceProvider {
    window: Arc<Window>,
    lost: AtomicBool,
}

impl WinitSurfaceProvider {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            lost: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Flagged by [`crate::event_loop::WindowRunner`] on a surface-affecting
    /// resize/minimize/device-lost event; cleared once the backend has
    /// recreated its swapchain against the new extent (spec.md §8 S5).
    pub fn mark_lost(&self) {
        self.lost.store(true, Ordering::SeqCst);
    }

    pub fn clear_lost(&self) {
        self.lost.store(false, Ordering::SeqCst);
    }
}

impl SurfaceProvider for WinitSurfaceProvider {
    fn surface_extent(&self) -> SurfaceExtent {
        let size = self.window.inner_size();
        SurfaceExtent {
            width: size.width,
            height: size.height,
        }
    }

    fn surface_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}

impl HasWindowHandle for WinitSurfaceProvider {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WinitSurfaceProvider {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}
