//! PS/2 device emulation: the keyboard and mouse state machines.
//!
//! Both devices are byte-oriented: `input` takes one byte from the target's
//! controller, `output` yields the next byte to clock out.  The bit-level
//! line driver lives outside this crate and is modelled by [`Ps2Wire`];
//! [`Ps2Port`] moves bytes between the two.

pub mod keyboard;
pub mod mouse;

pub use keyboard::{Ps2Keyboard, Ps2Leds};
pub use mouse::{DeviceType, InputMode, Mode, Ps2Mouse, Ps2Packet};

/// The physical PS/2 line of one device.
///
/// `receive` returns a byte the controller has clocked in, if one is
/// waiting.  `transmit` clocks one byte out and returns `false` when the
/// line is busy (controller inhibiting or sending); the byte is then
/// retried on the next poll.
pub trait Ps2Wire: Send {
    fn receive(&mut self) -> Option<u8>;
    fn transmit(&mut self, byte: u8) -> bool;
}

/// Byte-level view of an emulated PS/2 device.
pub trait Ps2Device {
    fn input(&mut self, data: u8);
    fn output(&mut self) -> Option<u8>;
}

impl Ps2Device for Ps2Keyboard {
    fn input(&mut self, data: u8) {
        Ps2Keyboard::input(self, data)
    }

    fn output(&mut self) -> Option<u8> {
        Ps2Keyboard::output(self)
    }
}

impl Ps2Device for Ps2Mouse {
    fn input(&mut self, data: u8) {
        Ps2Mouse::input(self, data)
    }

    fn output(&mut self) -> Option<u8> {
        Ps2Mouse::output(self)
    }
}

/// A device attached to its wire.
pub struct Ps2Port<D> {
    pub device: D,
    wire: Box<dyn Ps2Wire>,
    stalled: Option<u8>,
}

impl<D: Ps2Device> Ps2Port<D> {
    pub fn new(device: D, wire: Box<dyn Ps2Wire>) -> Self {
        Self {
            device,
            wire,
            stalled: None,
        }
    }

    /// Feeds every received byte to the device, then transmits queued
    /// output until the queue is empty or the line is busy.
    ///
    /// Host commands are handled first so their replies go out before any
    /// further queued traffic is attempted.
    pub fn poll(&mut self) {
        while let Some(byte) = self.wire.receive() {
            self.device.input(byte);
        }
        while let Some(byte) = self.stalled.take().or_else(|| self.device.output()) {
            if !self.wire.transmit(byte) {
                self.stalled = Some(byte);
                break;
            }
        }
    }

    /// `true` while a byte is waiting for the line to free up.
    pub fn is_stalled(&self) -> bool {
        self.stalled.is_some()
    }
}
