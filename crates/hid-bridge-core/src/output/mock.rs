//! Recording keyboard and mouse backends for tests.
//!
//! Every call is pushed into a shared `Arc<Mutex<Vec<...>>>` so a test can
//! hand the backend to a dispatcher by value and still inspect what it
//! received afterwards:
//!
//! ```ignore
//! let keyboard = MockKeyboard::new();
//! let events = keyboard.events();
//! let mut dispatcher = CommandDispatcher::new(Box::new(keyboard), ...);
//!
//! dispatcher.dispatch(Command::Key { key: 1, pressed: true });
//!
//! assert_eq!(events.lock().unwrap().len(), 1);
//! ```
//!
//! The `leds` and `offline` fields are shared the same way, so a test can
//! flip them while the dispatcher owns the backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{Keyboard, KeyboardLeds, Mouse};
use crate::keymap::{KeyId, KeyMapEntry};
use crate::protocol::{ButtonChanges, KeyboardKind, MouseButtons, MouseKind};

/// One call received by [`MockKeyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    Begin,
    Clear,
    Key { key: KeyId, usb_usage: u8, pressed: bool },
    Connected(bool),
}

/// One call received by [`MockMouse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    Begin,
    Clear,
    Buttons(ButtonChanges),
    Move { x: i16, y: i16 },
    Relative { dx: i8, dy: i8 },
    Wheel(i8),
    Connected(bool),
}

/// A keyboard backend that records calls and tracks held keys.
#[derive(Debug, Clone, Default)]
pub struct MockKeyboard {
    events: Arc<Mutex<Vec<KeyboardEvent>>>,
    held: Arc<Mutex<Vec<KeyId>>>,
    pub leds: Arc<Mutex<KeyboardLeds>>,
    pub offline: Arc<AtomicBool>,
}

impl MockKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the recorded calls.
    pub fn events(&self) -> Arc<Mutex<Vec<KeyboardEvent>>> {
        Arc::clone(&self.events)
    }

    /// Handle to the keys currently held.
    pub fn held(&self) -> Arc<Mutex<Vec<KeyId>>> {
        Arc::clone(&self.held)
    }
}

impl Keyboard for MockKeyboard {
    fn kind(&self) -> KeyboardKind {
        KeyboardKind::Usb
    }

    fn begin(&mut self) {
        self.events.lock().unwrap().push(KeyboardEvent::Begin);
    }

    fn clear(&mut self) {
        self.held.lock().unwrap().clear();
        self.events.lock().unwrap().push(KeyboardEvent::Clear);
    }

    fn send_key(&mut self, entry: KeyMapEntry, pressed: bool) {
        {
            let mut held = self.held.lock().unwrap();
            held.retain(|&key| key != entry.key);
            if pressed {
                held.push(entry.key);
            }
        }
        self.events.lock().unwrap().push(KeyboardEvent::Key {
            key: entry.key,
            usb_usage: entry.usb_usage,
            pressed,
        });
    }

    fn leds(&self) -> KeyboardLeds {
        *self.leds.lock().unwrap()
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    fn set_usb_connected(&mut self, connected: bool) {
        self.events.lock().unwrap().push(KeyboardEvent::Connected(connected));
    }
}

/// A mouse backend that records calls and tracks held buttons.
#[derive(Debug, Clone, Default)]
pub struct MockMouse {
    events: Arc<Mutex<Vec<MouseEvent>>>,
    buttons: Arc<Mutex<MouseButtons>>,
    pub offline: Arc<AtomicBool>,
}

impl MockMouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Arc<Mutex<Vec<MouseEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn buttons(&self) -> Arc<Mutex<MouseButtons>> {
        Arc::clone(&self.buttons)
    }
}

impl Mouse for MockMouse {
    fn kind(&self) -> MouseKind {
        MouseKind::UsbAbs
    }

    fn begin(&mut self) {
        self.events.lock().unwrap().push(MouseEvent::Begin);
    }

    fn clear(&mut self) {
        *self.buttons.lock().unwrap() = MouseButtons::empty();
        self.events.lock().unwrap().push(MouseEvent::Clear);
    }

    fn send_buttons(&mut self, changes: ButtonChanges) {
        {
            let mut buttons = self.buttons.lock().unwrap();
            *buttons = changes.apply(*buttons);
        }
        self.events.lock().unwrap().push(MouseEvent::Buttons(changes));
    }

    fn send_move(&mut self, x: i16, y: i16) {
        self.events.lock().unwrap().push(MouseEvent::Move { x, y });
    }

    fn send_relative(&mut self, dx: i8, dy: i8) {
        self.events.lock().unwrap().push(MouseEvent::Relative { dx, dy });
    }

    fn send_wheel(&mut self, delta: i8) {
        self.events.lock().unwrap().push(MouseEvent::Wheel(delta));
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    fn set_usb_connected(&mut self, connected: bool) {
        self.events.lock().unwrap().push(MouseEvent::Connected(connected));
    }
}
