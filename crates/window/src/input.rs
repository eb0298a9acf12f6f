use std::collections::HashSet;

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Keyboard/mouse state sampled from `winit`'s events (spec.md §1 "host
/// window ... keyboard/mouse/gamepad state"). Cleared and rebuilt once per
/// tick by [`crate::event_loop::WindowRunner`]; the URC never reads this
/// directly, applications do between `end-frame` and the next
/// `acquire-frame` (spec.md §5 "Ordering").
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed_this_tick: HashSet<KeyCode>,
    keys_released_this_tick: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButtonCode>,
    mouse_position: (f64, f64),
    mouse_delta: (f64, f64),
    scroll_delta: (f32, f32),
}

/// `winit::event::MouseButton` isn't `Hash`/`Eq` for `Other`, so keep a
/// small closed mirror for the buttons the set actually tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButtonCode {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl From<MouseButton> for MouseButtonCode {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::Left,
            MouseButton::Right => Self::Right,
            MouseButton::Middle => Self::Middle,
            MouseButton::Other(id) => Self::Other(id),
            MouseButton::Back => Self::Other(u16::MAX - 1),
            MouseButton::Forward => Self::Other(u16::MAX),
        }
    }
}

impl InputState {
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed_this_tick.contains(&key)
    }

    pub fn was_key_released(&self, key: KeyCode) -> bool {
        self.keys_released_this_tick.contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: impl Into<MouseButtonCode>) -> bool {
        self.mouse_buttons_down.contains(&button.into())
    }

    pub fn mouse_position(&self) -> (f64, f64) {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    pub fn scroll_delta(&self) -> (f32, f32) {
        self.scroll_delta
    }

    pub(crate) fn on_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_down.insert(key) {
                    self.keys_pressed_this_tick.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
                self.keys_released_this_tick.insert(key);
            }
        }
    }

    pub(crate) fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let code = button.into();
        match state {
            ElementState::Pressed => {
                self.mouse_buttons_down.insert(code);
            }
            ElementState::Released => {
                self.mouse_buttons_down.remove(&code);
            }
        }
    }

    pub(crate) fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let (old_x, old_y) = self.mouse_position;
        self.mouse_delta = (x - old_x, y - old_y);
        self.mouse_position = (x, y);
    }

    pub(crate) fn on_scroll(&mut self, dx: f32, dy: f32) {
        self.scroll_delta = (dx, dy);
    }

    /// Called once per tick after the application has observed this frame's
    /// edge-triggered state (press/release/delta), so the next tick starts
    /// from a clean edge set without losing which keys/buttons are still held.
    pub(crate) fn begin_tick(&mut self) {
        self.keys_pressed_this_tick.clear();
        self.keys_released_this_tick.clear();
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = (0.0, 0.0);
    }
}
