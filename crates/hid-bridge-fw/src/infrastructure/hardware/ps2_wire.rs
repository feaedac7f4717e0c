//! Simulated PS/2 line with a scripted host controller.
//!
//! The target's keyboard controller is replaced by a short script of
//! command bytes, played one at a time: the next byte is only clocked in
//! after the device has answered the previous one, the same pacing a real
//! controller uses.  Everything the device sends is logged and recorded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hid_bridge_core::output::Ps2PortKind;
use hid_bridge_core::ps2::Ps2Wire;

/// Reset, set Num Lock LED, enable scanning.
pub const KEYBOARD_INIT: &[u8] = &[0xFF, 0xED, 0x02, 0xF4];

/// Reset, IntelliMouse probe, Explorer probe, enable reporting.
pub const MOUSE_INIT: &[u8] = &[
    0xFF, 0xF3, 200, 0xF3, 100, 0xF3, 80, 0xF2, 0xF3, 200, 0xF3, 200, 0xF3, 80, 0xF2, 0xF4,
];

/// [`Ps2Wire`] that plays a command script and logs device output.
#[derive(Debug)]
pub struct LoggingPs2Wire {
    port: Ps2PortKind,
    script: VecDeque<u8>,
    awaiting_reply: bool,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl LoggingPs2Wire {
    /// A wire whose controller never sends anything.
    pub fn new(port: Ps2PortKind) -> Self {
        Self::with_script(port, &[])
    }

    pub fn with_script(port: Ps2PortKind, script: &[u8]) -> Self {
        Self {
            port,
            script: script.iter().copied().collect(),
            awaiting_reply: false,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The controller's usual start-up script for this port.
    pub fn with_default_init(port: Ps2PortKind) -> Self {
        let script = match port {
            Ps2PortKind::Keyboard => KEYBOARD_INIT,
            Ps2PortKind::Mouse => MOUSE_INIT,
        };
        Self::with_script(port, script)
    }

    /// Bytes the device has sent so far.
    pub fn sent(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.sent)
    }
}

impl Ps2Wire for LoggingPs2Wire {
    fn receive(&mut self) -> Option<u8> {
        if self.awaiting_reply {
            return None;
        }
        let byte = self.script.pop_front()?;
        self.awaiting_reply = true;
        tracing::debug!(port = ?self.port, byte, "ps2 controller ->");
        Some(byte)
    }

    fn transmit(&mut self, byte: u8) -> bool {
        self.awaiting_reply = false;
        tracing::trace!(port = ?self.port, byte, "ps2 device ->");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(byte);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hid_bridge_core::ps2::{DeviceType, Ps2Mouse, Ps2Port};

    #[test]
    fn test_script_waits_for_each_reply() {
        let mut wire = LoggingPs2Wire::with_script(Ps2PortKind::Mouse, &[0xF2, 0xF4]);

        assert_eq!(wire.receive(), Some(0xF2));
        assert_eq!(wire.receive(), None);
        assert!(wire.transmit(0xFA));
        assert_eq!(wire.receive(), Some(0xF4));
    }

    #[test]
    fn test_default_mouse_init_negotiates_five_buttons() {
        // Arrange
        let wire = LoggingPs2Wire::with_default_init(Ps2PortKind::Mouse);
        let sent = wire.sent();
        let mut port = Ps2Port::new(Ps2Mouse::new(), Box::new(wire));

        // Act
        for _ in 0..MOUSE_INIT.len() {
            port.poll();
        }

        // Assert
        assert_eq!(port.device.device_type(), DeviceType::Wheel5);
        assert!(port.device.is_streaming());
        let sent = sent.lock().unwrap();
        assert_eq!(&sent[..3], &[0xFA, 0xAA, 0x00]);
        // Two identify replies: 3 after the first probe, 4 after the second.
        let ids: Vec<u8> = sent
            .windows(2)
            .filter(|pair| pair[0] == 0xFA && (pair[1] == 3 || pair[1] == 4))
            .map(|pair| pair[1])
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
