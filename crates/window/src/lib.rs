//! Host window and surface provision, plus keyboard/mouse state (spec.md §1
//! "Out of scope ... host window and surface provision, keyboard/mouse/
//! gamepad state" — the URC's external collaborator for both).
//!
//! Built on `winit` for the event loop/window and `glutin`/`glutin-winit`
//! for the immediate backend's GL context; the deferred backend instead
//! takes the raw window/display handles straight through
//! [`surface::WinitSurfaceProvider`]'s `raw-window-handle` impls.

pub mod event_loop;
pub mod gamepad;
pub mod gl_context;
pub mod input;
pub mod surface;

pub use event_loop::{WindowApp, WindowRunner};
pub use gamepad::{GamepadEvent, GamepadProvider};
pub use gl_context::{GlutinGlContext, SharedGlContext};
pub use input::InputState;
pub use surface::WinitSurfaceProvider;
