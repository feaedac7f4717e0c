//! CommandDispatcher: executes decoded commands against the active backends.
//!
//! The dispatcher owns the keyboard and mouse backends, the selection
//! store, and the two pieces of bridge status the host can observe through
//! every pong: whether a reset is required for a new output selection to
//! take effect, and whether the host considers the USB side connected.
//!
//! It never sees raw frames and never answers `Repeat`; both are the
//! transport's business.

use crate::keymap;
use crate::output::{store_selection, Keyboard, Mouse, OutputStorage};
use crate::protocol::{Command, OutputSelection, PongFlags, ResponseCode};

/// Executes [`Command`]s and builds the pong status.
pub struct CommandDispatcher {
    keyboard: Box<dyn Keyboard>,
    mouse: Box<dyn Mouse>,
    storage: Box<dyn OutputStorage>,
    selection: OutputSelection,
    reset_required: bool,
    usb_connected: bool,
}

impl CommandDispatcher {
    /// Creates a dispatcher around already-built backends.
    ///
    /// `selection` is the selection the backends were built from; later
    /// `SetKeyboard`/`SetMouse` commands update and persist it.
    pub fn new(
        keyboard: Box<dyn Keyboard>,
        mouse: Box<dyn Mouse>,
        storage: Box<dyn OutputStorage>,
        selection: OutputSelection,
    ) -> Self {
        Self {
            keyboard,
            mouse,
            storage,
            selection,
            reset_required: false,
            usb_connected: true,
        }
    }

    /// Initialises both backends.  Call once before the first dispatch.
    pub fn begin(&mut self) {
        self.keyboard.begin();
        self.mouse.begin();
        tracing::info!(
            keyboard = ?self.keyboard.kind(),
            mouse = ?self.mouse.kind(),
            "outputs ready"
        );
    }

    /// Gives both backends their per-iteration slice of time.
    pub fn periodic(&mut self) {
        self.keyboard.periodic();
        self.mouse.periodic();
    }

    /// Executes one command and returns the code to answer with.
    pub fn dispatch(&mut self, command: Command) -> ResponseCode {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::Repeat | Command::Ping => {}
            Command::SetKeyboard(kind) => {
                let selection = OutputSelection {
                    keyboard: kind,
                    ..self.selection
                };
                self.update_selection(selection);
            }
            Command::SetMouse(kind) => {
                let selection = OutputSelection {
                    mouse: kind,
                    ..self.selection
                };
                self.update_selection(selection);
            }
            Command::SetConnected(connected) => {
                self.usb_connected = connected;
                self.keyboard.set_usb_connected(connected);
                self.mouse.set_usb_connected(connected);
            }
            Command::ClearHid => {
                self.keyboard.clear();
                self.mouse.clear();
            }
            Command::Key { key, pressed } => match keymap::lookup(key) {
                Some(entry) => self.keyboard.send_key(entry, pressed),
                None => tracing::debug!(key, "unknown key id ignored"),
            },
            Command::MouseMove { x, y } => self.mouse.send_move(x, y),
            Command::MouseButtons(changes) => self.mouse.send_buttons(changes),
            Command::MouseRelative { dx, dy } => self.mouse.send_relative(dx, dy),
            Command::MouseWheel { dy, .. } => {
                if dy != 0 {
                    self.mouse.send_wheel(dy);
                }
            }
        }
        self.pong()
    }

    /// The status code of a successful command, read at call time.
    pub fn pong(&self) -> ResponseCode {
        let mut flags = self.keyboard.leds().to_pong_flags();
        flags.set(PongFlags::KEYBOARD_OFFLINE, self.keyboard.is_offline());
        flags.set(PongFlags::MOUSE_OFFLINE, self.mouse.is_offline());
        flags.set(PongFlags::RESET_REQUIRED, self.reset_required);
        ResponseCode::Pong(flags)
    }

    /// The persisted selection, including changes not yet applied.
    pub fn selection(&self) -> OutputSelection {
        self.selection
    }

    pub fn is_reset_required(&self) -> bool {
        self.reset_required
    }

    pub fn is_usb_connected(&self) -> bool {
        self.usb_connected
    }

    pub fn keyboard(&self) -> &dyn Keyboard {
        self.keyboard.as_ref()
    }

    pub fn mouse(&self) -> &dyn Mouse {
        self.mouse.as_ref()
    }

    fn update_selection(&mut self, selection: OutputSelection) {
        match store_selection(self.storage.as_mut(), selection) {
            Ok(()) => {
                tracing::info!(outputs = selection.to_byte(), "output selection stored");
                self.selection = selection;
                self.reset_required = true;
            }
            Err(err) => tracing::error!(error = %err, "failed to store output selection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyId;
    use crate::output::mock::{KeyboardEvent, MockKeyboard, MockMouse, MouseEvent};
    use crate::output::{KeyboardLeds, MemoryStorage};
    use crate::protocol::{ButtonChanges, KeyboardKind, MouseButtons, MouseKind};
    use std::sync::atomic::Ordering;

    fn dispatcher() -> (CommandDispatcher, MockKeyboard, MockMouse) {
        let keyboard = MockKeyboard::new();
        let mouse = MockMouse::new();
        let dispatcher = CommandDispatcher::new(
            Box::new(keyboard.clone()),
            Box::new(mouse.clone()),
            Box::new(MemoryStorage::new()),
            OutputSelection::new(KeyboardKind::Usb, MouseKind::UsbAbs),
        );
        (dispatcher, keyboard, mouse)
    }

    #[test]
    fn test_ping_returns_plain_pong() {
        let (mut dispatcher, _, _) = dispatcher();
        assert_eq!(
            dispatcher.dispatch(Command::Ping),
            ResponseCode::Pong(PongFlags::empty())
        );
    }

    #[test]
    fn test_key_event_translates_and_forwards() {
        // Arrange
        let (mut dispatcher, keyboard, _) = dispatcher();

        // Act
        let code = dispatcher.dispatch(Command::Key {
            key: 1,
            pressed: true,
        });

        // Assert
        assert!(matches!(code, ResponseCode::Pong(_)));
        assert_eq!(
            *keyboard.events().lock().unwrap(),
            vec![KeyboardEvent::Key {
                key: KeyId::KeyA,
                usb_usage: 0x04,
                pressed: true
            }]
        );
    }

    #[test]
    fn test_unknown_key_is_ignored_but_answered() {
        let (mut dispatcher, keyboard, _) = dispatcher();
        let code = dispatcher.dispatch(Command::Key {
            key: 0xF0,
            pressed: true,
        });
        assert_eq!(code, ResponseCode::Pong(PongFlags::empty()));
        assert!(keyboard.events().lock().unwrap().is_empty());
    }

    #[test]
    fn test_pong_reflects_leds_and_offline_state() {
        // Arrange
        let (dispatcher, keyboard, mouse) = dispatcher();
        *keyboard.leds.lock().unwrap() = KeyboardLeds {
            caps: true,
            scroll: true,
            num: false,
        };
        mouse.offline.store(true, Ordering::Relaxed);

        // Act
        let code = dispatcher.pong();

        // Assert
        assert_eq!(
            code,
            ResponseCode::Pong(PongFlags::CAPS | PongFlags::SCROLL | PongFlags::MOUSE_OFFLINE)
        );
        assert_eq!(code.as_u8(), 0x80 | 0x01 | 0x02 | 0x10);
    }

    #[test]
    fn test_set_mouse_persists_and_requires_reset() {
        // Arrange
        let (mut dispatcher, _, _) = dispatcher();

        // Act
        let code = dispatcher.dispatch(Command::SetMouse(MouseKind::Ps2));

        // Assert
        assert_eq!(code, ResponseCode::Pong(PongFlags::RESET_REQUIRED));
        assert_eq!(
            dispatcher.selection(),
            OutputSelection::new(KeyboardKind::Usb, MouseKind::Ps2)
        );
        assert_eq!(
            dispatcher.dispatch(Command::Ping),
            ResponseCode::Pong(PongFlags::RESET_REQUIRED)
        );
    }

    #[test]
    fn test_set_keyboard_keeps_mouse_bits() {
        let (mut dispatcher, _, _) = dispatcher();
        dispatcher.dispatch(Command::SetKeyboard(KeyboardKind::Ps2));
        assert_eq!(dispatcher.selection().mouse, MouseKind::UsbAbs);
        assert_eq!(dispatcher.selection().keyboard, KeyboardKind::Ps2);
        assert!(dispatcher.is_reset_required());
    }

    #[test]
    fn test_set_connected_reaches_both_backends() {
        let (mut dispatcher, keyboard, mouse) = dispatcher();
        dispatcher.dispatch(Command::SetConnected(false));
        assert!(!dispatcher.is_usb_connected());
        assert_eq!(
            keyboard.events().lock().unwrap().last(),
            Some(&KeyboardEvent::Connected(false))
        );
        assert_eq!(
            mouse.events().lock().unwrap().last(),
            Some(&MouseEvent::Connected(false))
        );
    }

    #[test]
    fn test_mouse_commands_are_forwarded() {
        // Arrange
        let (mut dispatcher, _, mouse) = dispatcher();
        let changes = ButtonChanges {
            selected: MouseButtons::LEFT,
            pressed: MouseButtons::LEFT,
        };

        // Act
        dispatcher.dispatch(Command::MouseMove { x: -5, y: 7 });
        dispatcher.dispatch(Command::MouseButtons(changes));
        dispatcher.dispatch(Command::MouseRelative { dx: 1, dy: -1 });
        dispatcher.dispatch(Command::MouseWheel { dx: 3, dy: -2 });
        dispatcher.dispatch(Command::MouseWheel { dx: 3, dy: 0 });

        // Assert
        assert_eq!(
            *mouse.events().lock().unwrap(),
            vec![
                MouseEvent::Move { x: -5, y: 7 },
                MouseEvent::Buttons(changes),
                MouseEvent::Relative { dx: 1, dy: -1 },
                MouseEvent::Wheel(-2),
            ]
        );
    }

    #[test]
    fn test_clear_hid_releases_everything() {
        // Arrange
        let (mut dispatcher, keyboard, mouse) = dispatcher();
        dispatcher.dispatch(Command::Key {
            key: KeyId::ShiftLeft.as_u8(),
            pressed: true,
        });
        dispatcher.dispatch(Command::MouseButtons(ButtonChanges {
            selected: MouseButtons::RIGHT,
            pressed: MouseButtons::RIGHT,
        }));

        // Act
        dispatcher.dispatch(Command::ClearHid);

        // Assert
        assert!(keyboard.held().lock().unwrap().is_empty());
        assert!(mouse.buttons().lock().unwrap().is_empty());
    }
}
