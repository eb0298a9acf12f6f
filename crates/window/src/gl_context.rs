use std::ffi::{c_void, CString};
use std::num::NonZeroU32;
use std::sync::Arc;

use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::{Display, GetGlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface as GlutinSurface, SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use graphics_backend_traits::gl_context_provider::GlContextProvider;
use raw_window_handle::HasWindowHandle;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// A GL 4.6 Core context built via `glutin`/`glutin-winit`, bound to a
/// `winit` window (spec.md §6 "From Window/Surface", immediate backend
/// half). `graphics-backend`'s immediate executor calls through
/// [`GlContextProvider`] only — it never imports `glutin` itself.
#[derive(Debug)]
pub struct GlutinGlContext {
    context: PossiblyCurrentContext,
    surface: GlutinSurface<WindowSurface>,
    display: Display,
}

impl GlutinGlContext {
    /// Builds the window alongside its GL context/surface in one shot, since
    /// `glutin-winit` needs the window attributes to pick a compatible pixel
    /// format before the window exists. Returns the created window so the
    /// caller can also wrap it in a [`crate::surface::WinitSurfaceProvider`].
    pub fn new(
        event_loop: &ActiveEventLoop,
        window_attributes: WindowAttributes,
        vsync: bool,
        msaa_samples: u32,
    ) -> anyhow::Result<(Window, Self)> {
        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_multisampling(msaa_samples.max(1).next_power_of_two().min(16) as u8);

        let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("glutin always offers at least one matching config")
            })
            .map_err(|err| anyhow::anyhow!("failed to build GL display/window: {err}"))?;
        let window = window.expect("window attributes were supplied, so a window is returned");

        let display = gl_config.display();
        let window_handle = window
            .window_handle()
            .map_err(|err| anyhow::anyhow!("window has no raw handle: {err}"))?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 6))))
            .build(Some(window_handle.into()));

        let not_current = unsafe {
            display
                .create_context(&gl_config, &context_attributes)
                .map_err(|err| anyhow::anyhow!("failed to create GL 4.6 core context: {err}"))?
        };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window_handle.into(),
            NonZeroU32::new(size.width.max(1)).unwrap(),
            NonZeroU32::new(size.height.max(1)).unwrap(),
        );
        let surface = unsafe {
            display
                .create_window_surface(&gl_config, &attrs)
                .map_err(|err| anyhow::anyhow!("failed to create GL window surface: {err}"))?
        };

        let context = not_current
            .make_current(&surface)
            .map_err(|err| anyhow::anyhow!("failed to make GL context current: {err}"))?;

        surface
            .set_swap_interval(
                &context,
                if vsync {
                    glutin::surface::SwapInterval::Wait(NonZeroU32::new(1).unwrap())
                } else {
                    glutin::surface::SwapInterval::DontWait
                },
            )
            .map_err(|err| anyhow::anyhow!("failed to set swap interval: {err}"))?;

        Ok((
            window,
            Self {
                context,
                surface,
                display,
            },
        ))
    }

    /// Recreates the surface for a new window extent (spec.md §8 S5
    /// "swapchain resize"); the immediate backend has no swapchain of its
    /// own, this is its equivalent.
    pub fn resize(&self, width: u32, height: u32) {
        self.surface.resize(
            &self.context,
            NonZeroU32::new(width.max(1)).unwrap(),
            NonZeroU32::new(height.max(1)).unwrap(),
        );
    }
}

impl GlContextProvider for GlutinGlContext {
    fn get_proc_address(&self, symbol: &str) -> *const c_void {
        let symbol = CString::new(symbol).expect("GL symbol names are never NUL-containing");
        self.display.get_proc_address(symbol.as_c_str())
    }

    fn make_current(&self) {
        self.context
            .make_current(&self.surface)
            .expect("GL context lost");
    }

    fn swap_buffers(&self) {
        let _ = self.surface.swap_buffers(&self.context);
    }
}

/// Shared ownership wrapper so `InitOptions::gl_context` (an `Arc<dyn
/// GlContextProvider>`) and the window-owning `WindowRunner` can both hold a
/// reference without the `graphics` crate knowing about `glutin`.
pub type SharedGlContext = Arc<GlutinGlContext>;
