//! USB HID backends: boot keyboard, absolute mouse, relative mouse.
//!
//! Each backend keeps the state of its report (held keys, held buttons,
//! pointer position) and writes the whole report to its [`HidEndpoint`]
//! whenever that state changes.  When the endpoint cannot take data, or
//! the host has reported the bridge's USB side as disconnected, the write
//! is skipped and the state is simply carried into the next report.
//!
//! Report layouts:
//!
//! ```text
//! keyboard:        [modifiers, 0, k1, k2, k3, k4, k5, k6]
//! relative mouse:  [buttons, dx, dy, wheel]
//! absolute mouse:  [buttons, x_lo, x_hi, y_lo, y_hi, wheel]
//! ```

use thiserror::Error;

use super::{Keyboard, KeyboardLeds, Mouse};
use crate::keymap::{usb::modifier_bit, KeyMapEntry};
use crate::protocol::{ButtonChanges, KeyboardKind, MouseButtons, MouseKind};

/// Size of the boot keyboard input report.
pub const KEYBOARD_REPORT_LEN: usize = 8;

/// Number of non-modifier keys a boot report can hold.
const KEY_SLOTS: usize = 6;

/// Errors returned by an endpoint write.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("endpoint is not ready")]
    NotReady,

    #[error("endpoint write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One emulated USB HID interface as seen by the firmware.
#[cfg_attr(test, mockall::automock)]
pub trait HidEndpoint: Send {
    /// `true` when the host side can currently accept an input report.
    fn is_ready(&self) -> bool;

    /// Writes one input report.
    fn send_report(&mut self, report: &[u8]) -> Result<(), EndpointError>;

    /// Last output report received from the host (keyboard LEDs); `0` for
    /// interfaces without one.
    fn led_report(&self) -> u8;
}

fn write_report(
    endpoint: &mut dyn HidEndpoint,
    connected: bool,
    report: &[u8],
    what: &'static str,
) {
    if !connected || !endpoint.is_ready() {
        tracing::debug!(what, "usb endpoint offline, report skipped");
        return;
    }
    if let Err(err) = endpoint.send_report(report) {
        tracing::warn!(what, error = %err, "usb report dropped");
    }
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Boot-protocol USB keyboard.
pub struct UsbKeyboard {
    endpoint: Box<dyn HidEndpoint>,
    connected: bool,
    modifiers: u8,
    keys: [u8; KEY_SLOTS],
}

impl UsbKeyboard {
    pub fn new(endpoint: Box<dyn HidEndpoint>) -> Self {
        Self {
            endpoint,
            connected: true,
            modifiers: 0,
            keys: [0; KEY_SLOTS],
        }
    }

    /// The report describing the current key state.
    pub fn report(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        let mut report = [0u8; KEYBOARD_REPORT_LEN];
        report[0] = self.modifiers;
        report[2..].copy_from_slice(&self.keys);
        report
    }

    fn press(&mut self, usage: u8) -> bool {
        if self.keys.contains(&usage) {
            return false;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = usage;
                true
            }
            None => {
                tracing::debug!(usage, "all key slots in use, press ignored");
                false
            }
        }
    }

    fn release(&mut self, usage: u8) -> bool {
        let Some(pos) = self.keys.iter().position(|&slot| slot == usage) else {
            return false;
        };
        self.keys.copy_within(pos + 1.., pos);
        self.keys[KEY_SLOTS - 1] = 0;
        true
    }

    fn send(&mut self) {
        let report = self.report();
        write_report(self.endpoint.as_mut(), self.connected, &report, "keyboard");
    }
}

impl Keyboard for UsbKeyboard {
    fn kind(&self) -> KeyboardKind {
        KeyboardKind::Usb
    }

    fn clear(&mut self) {
        self.modifiers = 0;
        self.keys = [0; KEY_SLOTS];
        self.send();
    }

    fn send_key(&mut self, entry: KeyMapEntry, pressed: bool) {
        let usage = entry.usb_usage;
        let changed = match modifier_bit(usage) {
            Some(bit) => {
                let before = self.modifiers;
                if pressed {
                    self.modifiers |= bit;
                } else {
                    self.modifiers &= !bit;
                }
                before != self.modifiers
            }
            None if pressed => self.press(usage),
            None => self.release(usage),
        };
        if changed {
            self.send();
        }
    }

    fn leds(&self) -> KeyboardLeds {
        KeyboardLeds::from_usb_report(self.endpoint.led_report())
    }

    fn is_offline(&self) -> bool {
        !self.connected || !self.endpoint.is_ready()
    }

    fn set_usb_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

// ── Absolute mouse ────────────────────────────────────────────────────────────

/// Maps a host coordinate (`i16`, centred on 0) onto `0..=32767`.
pub fn to_unsigned_axis(value: i16) -> u16 {
    ((i32::from(value) + 32768) / 2) as u16
}

/// USB mouse reporting absolute positions.
///
/// The descriptor declares both axes as `0..=32767`, so the host's centred
/// coordinates go through [`to_unsigned_axis`].  Windows 98 scales the
/// logical range wrongly; with `win98` set the result is doubled.
pub struct UsbAbsoluteMouse {
    endpoint: Box<dyn HidEndpoint>,
    connected: bool,
    win98: bool,
    buttons: MouseButtons,
    x: i16,
    y: i16,
}

impl UsbAbsoluteMouse {
    pub fn new(endpoint: Box<dyn HidEndpoint>, win98: bool) -> Self {
        Self {
            endpoint,
            connected: true,
            win98,
            buttons: MouseButtons::empty(),
            x: 0,
            y: 0,
        }
    }

    fn axis(&self, value: i16) -> u16 {
        let native = to_unsigned_axis(value);
        if self.win98 {
            native << 1
        } else {
            native
        }
    }

    fn send(&mut self, wheel: i8) {
        let [x_lo, x_hi] = self.axis(self.x).to_le_bytes();
        let [y_lo, y_hi] = self.axis(self.y).to_le_bytes();
        let report = [self.buttons.bits(), x_lo, x_hi, y_lo, y_hi, wheel as u8];
        write_report(self.endpoint.as_mut(), self.connected, &report, "absolute mouse");
    }
}

impl Mouse for UsbAbsoluteMouse {
    fn kind(&self) -> MouseKind {
        if self.win98 {
            MouseKind::UsbWin98
        } else {
            MouseKind::UsbAbs
        }
    }

    fn clear(&mut self) {
        self.buttons = MouseButtons::empty();
        self.x = 0;
        self.y = 0;
        self.send(0);
    }

    fn send_buttons(&mut self, changes: ButtonChanges) {
        self.buttons = changes.apply(self.buttons);
        self.send(0);
    }

    fn send_move(&mut self, x: i16, y: i16) {
        self.x = x;
        self.y = y;
        self.send(0);
    }

    fn send_relative(&mut self, dx: i8, dy: i8) {
        tracing::debug!(dx, dy, "relative motion ignored by absolute mouse");
    }

    fn send_wheel(&mut self, delta: i8) {
        self.send(delta);
    }

    fn is_offline(&self) -> bool {
        !self.connected || !self.endpoint.is_ready()
    }

    fn set_usb_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

// ── Relative mouse ────────────────────────────────────────────────────────────

/// Boot-protocol USB mouse reporting relative motion.
pub struct UsbRelativeMouse {
    endpoint: Box<dyn HidEndpoint>,
    connected: bool,
    buttons: MouseButtons,
}

impl UsbRelativeMouse {
    pub fn new(endpoint: Box<dyn HidEndpoint>) -> Self {
        Self {
            endpoint,
            connected: true,
            buttons: MouseButtons::empty(),
        }
    }

    fn send(&mut self, dx: i8, dy: i8, wheel: i8) {
        let report = [self.buttons.bits(), dx as u8, dy as u8, wheel as u8];
        write_report(self.endpoint.as_mut(), self.connected, &report, "relative mouse");
    }
}

impl Mouse for UsbRelativeMouse {
    fn kind(&self) -> MouseKind {
        MouseKind::UsbRel
    }

    fn clear(&mut self) {
        self.buttons = MouseButtons::empty();
        self.send(0, 0, 0);
    }

    fn send_buttons(&mut self, changes: ButtonChanges) {
        self.buttons = changes.apply(self.buttons);
        self.send(0, 0, 0);
    }

    fn send_move(&mut self, x: i16, y: i16) {
        tracing::debug!(x, y, "absolute move ignored by relative mouse");
    }

    fn send_relative(&mut self, dx: i8, dy: i8) {
        self.send(dx, dy, 0);
    }

    fn send_wheel(&mut self, delta: i8) {
        self.send(0, 0, delta);
    }

    fn is_offline(&self) -> bool {
        !self.connected || !self.endpoint.is_ready()
    }

    fn set_usb_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}
