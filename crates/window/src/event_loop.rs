use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gamepad::GamepadProvider;
use crate::input::InputState;
use crate::surface::WinitSurfaceProvider;

/// What an application implements to receive ticks and raw input, mirroring
/// the teacher's `AppHandler` split between one-time window setup and a
/// per-frame update callback. The URC itself never implements this; a demo
/// binary (§6 "CLI surface") does, driving `System::acquire_frame`/
/// `end_frame` from `on_tick`.
pub trait WindowApp {
    /// Creates the window itself. The default builds a plain `winit` window,
    /// which is all the deferred backend needs (it builds its `VkSurfaceKHR`
    /// from the resulting raw handles). The immediate backend instead needs
    /// its window and GL context created together — an app targeting it
    /// overrides this to call [`crate::gl_context::GlutinGlContext::new`]
    /// and stash the returned context for [`Self::init`] to pick up.
    fn create_window(&mut self, event_loop: &ActiveEventLoop, attributes: WindowAttributes) -> Window {
        event_loop
            .create_window(attributes)
            .expect("failed to create window")
    }

    /// Called once the window (and, for the immediate backend, its GL
    /// context) exist.
    fn init(&mut self, surface: &Arc<WinitSurfaceProvider>);

    /// Called once per redraw-requested tick with this tick's edge-triggered
    /// input state. Return `false` to stop the event loop.
    fn on_tick(&mut self, input: &InputState) -> bool;

    /// Called when the windowing layer observes the surface extent change;
    /// the application forwards this to whichever backend executor owns the
    /// swapchain/GL surface (spec.md §8 S5).
    fn on_resize(&mut self, width: u32, height: u32);
}

/// Drives a `winit` event loop, owning the window, its [`WinitSurfaceProvider`]
/// and the per-tick [`InputState`], and forwarding ticks to a [`WindowApp`].
/// This is the boundary component (spec.md §2 row I) that turns `winit`
/// events into the inputs the URC actually consumes (a surface extent, a
/// surface-lost flag); it never calls into `graphics-backend` directly.
pub struct WindowRunner<A: WindowApp> {
    attributes: WindowAttributes,
    app: A,
    surface: Option<Arc<WinitSurfaceProvider>>,
    input: InputState,
    /// No built-in implementation ships (see [`crate::gamepad`]); an
    /// application that needs gamepad input constructs its own and passes
    /// it to [`Self::with_gamepad_provider`].
    gamepad: Option<Box<dyn GamepadProvider>>,
}

impl<A: WindowApp> WindowRunner<A> {
    pub fn new(title: impl Into<String>, width: u32, height: u32, app: A) -> Self {
        let attributes = Window::default_attributes()
            .with_title(title.into())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        Self {
            attributes,
            app,
            surface: None,
            input: InputState::default(),
            gamepad: None,
        }
    }

    pub fn with_gamepad_provider(mut self, gamepad: Box<dyn GamepadProvider>) -> Self {
        self.gamepad = Some(gamepad);
        self
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        Ok(())
    }
}

impl<A: WindowApp> ApplicationHandler for WindowRunner<A> {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if matches!(cause, StartCause::ResumeTimeReached { .. } | StartCause::Poll) {
            self.input.begin_tick();
            // No built-in provider is ever installed by default (see
            // crate::gamepad); an app that supplied one via
            // `with_gamepad_provider` gets polled once per tick alongside
            // keyboard/mouse.
            if let Some(gamepad) = &mut self.gamepad {
                let _events = gamepad.poll();
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        let window = self.app.create_window(event_loop, self.attributes.clone());
        let surface = Arc::new(WinitSurfaceProvider::new(Arc::new(window)));
        self.app.init(&surface);
        self.surface = Some(surface);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(surface) = &self.surface {
                    surface.mark_lost();
                }
                self.app.on_resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(code) = event.physical_key {
                    self.input.on_key(code, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.on_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => (x, y),
                    winit::event::MouseScrollDelta::PixelDelta(p) => {
                        (p.x as f32 / 32.0, p.y as f32 / 32.0)
                    }
                };
                self.input.on_scroll(dx, dy);
            }
            WindowEvent::RedrawRequested => {
                if !self.app.on_tick(&self.input) {
                    event_loop.exit();
                }
                if let Some(surface) = &self.surface {
                    surface.window().request_redraw();
                }
            }
            _ => {}
        }
    }
}
