/// A single gamepad axis or button transition, the shape a concrete
/// [`GamepadProvider`] would report to [`crate::event_loop::WindowApp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GamepadEvent {
    ButtonPressed(u32),
    ButtonReleased(u32),
    AxisMoved { axis: u32, value: f32 },
}

/// Gamepad polling seam (spec.md §1 scope note "keyboard/mouse/gamepad
/// state"). No crate in the retrieved example pack pulls in a gamepad
/// backend, and inventing one here would violate "never fabricate
/// dependencies" — so this trait is named and wired as an
/// `Option<Box<dyn GamepadProvider>>` slot on [`crate::event_loop::WindowRunner`]
/// with no default implementation. An application that needs gamepad input
/// supplies its own.
pub trait GamepadProvider {
    fn poll(&mut self) -> Vec<GamepadEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubGamepad {
        queued: Vec<GamepadEvent>,
    }

    impl GamepadProvider for StubGamepad {
        fn poll(&mut self) -> Vec<GamepadEvent> {
            std::mem::take(&mut self.queued)
        }
    }

    #[test]
    fn a_provider_drains_its_queue_once_per_poll() {
        let mut stub = StubGamepad {
            queued: vec![GamepadEvent::ButtonPressed(0)],
        };
        assert_eq!(stub.poll(), vec![GamepadEvent::ButtonPressed(0)]);
        assert_eq!(stub.poll(), vec![]);
    }
}
