//! PS/2 backends: the emulated devices attached to their wires.
//!
//! PS/2 has no notion of "offline": the firmware drives the line itself,
//! so these backends always report online and queue bytes until the
//! controller lets them out.

use super::{Keyboard, KeyboardLeds, Mouse};
use crate::keymap::KeyMapEntry;
use crate::protocol::{ButtonChanges, KeyboardKind, MouseKind};
use crate::ps2::{Ps2Keyboard, Ps2Mouse, Ps2Port, Ps2Wire};

/// PS/2 keyboard backend.
pub struct Ps2KeyboardOutput {
    port: Ps2Port<Ps2Keyboard>,
}

impl Ps2KeyboardOutput {
    pub fn new(wire: Box<dyn Ps2Wire>) -> Self {
        Self {
            port: Ps2Port::new(Ps2Keyboard::new(), wire),
        }
    }

    pub fn device(&self) -> &Ps2Keyboard {
        &self.port.device
    }
}

impl Keyboard for Ps2KeyboardOutput {
    fn kind(&self) -> KeyboardKind {
        KeyboardKind::Ps2
    }

    fn begin(&mut self) {
        self.port.device.power_on();
        self.port.poll();
    }

    fn clear(&mut self) {
        self.port.device.clear();
        self.port.poll();
    }

    fn send_key(&mut self, entry: KeyMapEntry, pressed: bool) {
        self.port.device.send_key(entry, pressed);
        self.port.poll();
    }

    fn leds(&self) -> KeyboardLeds {
        KeyboardLeds::from(self.port.device.leds())
    }

    fn periodic(&mut self) {
        self.port.poll();
    }
}

/// PS/2 mouse backend.
///
/// Absolute moves have no PS/2 equivalent and are dropped.
pub struct Ps2MouseOutput {
    port: Ps2Port<Ps2Mouse>,
}

impl Ps2MouseOutput {
    pub fn new(wire: Box<dyn Ps2Wire>) -> Self {
        Self {
            port: Ps2Port::new(Ps2Mouse::new(), wire),
        }
    }

    pub fn device(&self) -> &Ps2Mouse {
        &self.port.device
    }
}

impl Mouse for Ps2MouseOutput {
    fn kind(&self) -> MouseKind {
        MouseKind::Ps2
    }

    fn begin(&mut self) {
        self.port.device.reset();
    }

    fn clear(&mut self) {
        self.port.device.clear();
        self.port.poll();
    }

    fn send_buttons(&mut self, changes: ButtonChanges) {
        self.port.device.send_buttons(changes);
        self.port.poll();
    }

    fn send_move(&mut self, x: i16, y: i16) {
        tracing::debug!(x, y, "absolute move ignored by ps/2 mouse");
    }

    fn send_relative(&mut self, dx: i8, dy: i8) {
        self.port.device.send_relative(dx, dy);
        self.port.poll();
    }

    fn send_wheel(&mut self, delta: i8) {
        self.port.device.send_wheel(delta);
        self.port.poll();
    }

    fn periodic(&mut self) {
        self.port.poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{entry_for, KeyId};
    use crate::protocol::MouseButtons;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedWire {
        from_host: Arc<Mutex<VecDeque<u8>>>,
        to_host: Arc<Mutex<Vec<u8>>>,
    }

    impl Ps2Wire for SharedWire {
        fn receive(&mut self) -> Option<u8> {
            self.from_host.lock().unwrap().pop_front()
        }

        fn transmit(&mut self, byte: u8) -> bool {
            self.to_host.lock().unwrap().push(byte);
            true
        }
    }

    impl SharedWire {
        fn host_sends(&self, bytes: &[u8]) {
            self.from_host.lock().unwrap().extend(bytes);
        }

        fn take_sent(&self) -> Vec<u8> {
            std::mem::take(&mut *self.to_host.lock().unwrap())
        }
    }

    #[test]
    fn test_keyboard_leds_follow_host_command() {
        // Arrange
        let wire = SharedWire::default();
        let mut keyboard = Ps2KeyboardOutput::new(Box::new(wire.clone()));
        wire.host_sends(&[0xED, 0b100]);

        // Act
        keyboard.periodic();

        // Assert
        assert_eq!(wire.take_sent(), vec![0xFA, 0xFA]);
        assert!(keyboard.leds().caps);
        assert!(!keyboard.is_offline());
    }

    #[test]
    fn test_keyboard_begin_announces_self_test() {
        let wire = SharedWire::default();
        let mut keyboard = Ps2KeyboardOutput::new(Box::new(wire.clone()));
        keyboard.begin();
        assert_eq!(wire.take_sent(), vec![0xAA]);
    }

    #[test]
    fn test_keyboard_key_goes_straight_to_wire() {
        let wire = SharedWire::default();
        let mut keyboard = Ps2KeyboardOutput::new(Box::new(wire.clone()));
        keyboard.send_key(entry_for(KeyId::ArrowUp), true);
        keyboard.clear();
        assert_eq!(wire.take_sent(), vec![0xE0, 0x75, 0xE0, 0xF0, 0x75]);
    }

    #[test]
    fn test_mouse_streams_after_enable() {
        // Arrange
        let wire = SharedWire::default();
        let mut mouse = Ps2MouseOutput::new(Box::new(wire.clone()));
        mouse.send_relative(1, 1);
        wire.host_sends(&[0xF4]);
        mouse.periodic();
        wire.take_sent();

        // Act
        mouse.send_buttons(ButtonChanges {
            selected: MouseButtons::MIDDLE,
            pressed: MouseButtons::MIDDLE,
        });
        mouse.send_move(100, 100);

        // Assert
        assert_eq!(wire.take_sent(), vec![0x08 | 0x04, 0x00, 0x00]);
    }
}
