//! Output backends: where decoded key and mouse events end up.
//!
//! The dispatcher talks to exactly one [`Keyboard`] and one [`Mouse`]
//! through trait objects and never learns which concrete backend is
//! active.  Backends are built once at start-up from the persisted
//! [`OutputSelection`] by [`make_keyboard`] / [`make_mouse`]; switching
//! outputs takes effect only after a reset.
//!
//! | Backend                | Keyboard            | Mouse                         |
//! |------------------------|---------------------|-------------------------------|
//! | USB (boot protocol)    | [`UsbKeyboard`]     | [`UsbAbsoluteMouse`], [`UsbRelativeMouse`] |
//! | PS/2                   | [`Ps2KeyboardOutput`] | [`Ps2MouseOutput`]          |
//! | none                   | [`NoneKeyboard`]    | [`NoneMouse`]                 |

pub mod mock;
pub mod ps2;
pub mod storage;
pub mod usb;

pub use ps2::{Ps2KeyboardOutput, Ps2MouseOutput};
pub use storage::{load_selection, store_selection, MemoryStorage, OutputStorage, StorageError};
pub use usb::{EndpointError, HidEndpoint, UsbAbsoluteMouse, UsbKeyboard, UsbRelativeMouse};

use crate::keymap::KeyMapEntry;
use crate::protocol::{ButtonChanges, KeyboardKind, MouseKind, OutputSelection, PongFlags};
use crate::ps2::Ps2Wire;

// ── Indicator LEDs ────────────────────────────────────────────────────────────

/// Lock-key indicators as last set by the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardLeds {
    pub caps: bool,
    pub scroll: bool,
    pub num: bool,
}

impl KeyboardLeds {
    /// Decodes a USB keyboard output report (num 0x01, caps 0x02, scroll 0x04).
    pub fn from_usb_report(report: u8) -> Self {
        Self {
            num: report & 0x01 != 0,
            caps: report & 0x02 != 0,
            scroll: report & 0x04 != 0,
        }
    }

    /// Indicator bits of the pong response.
    pub fn to_pong_flags(self) -> PongFlags {
        let mut flags = PongFlags::empty();
        flags.set(PongFlags::CAPS, self.caps);
        flags.set(PongFlags::SCROLL, self.scroll);
        flags.set(PongFlags::NUM, self.num);
        flags
    }
}

impl From<crate::ps2::Ps2Leds> for KeyboardLeds {
    fn from(leds: crate::ps2::Ps2Leds) -> Self {
        use crate::ps2::Ps2Leds;
        Self {
            caps: leds.contains(Ps2Leds::CAPS_LOCK),
            scroll: leds.contains(Ps2Leds::SCROLL_LOCK),
            num: leds.contains(Ps2Leds::NUM_LOCK),
        }
    }
}

// ── Backend traits ────────────────────────────────────────────────────────────

/// A keyboard backend.
pub trait Keyboard: Send {
    fn kind(&self) -> KeyboardKind;

    /// One-time initialisation after construction.
    fn begin(&mut self) {}

    /// Releases every held key.
    fn clear(&mut self);

    /// Presses or releases one translated key.
    fn send_key(&mut self, entry: KeyMapEntry, pressed: bool);

    fn leds(&self) -> KeyboardLeds;

    /// `true` when events cannot currently be delivered.
    fn is_offline(&self) -> bool {
        false
    }

    /// Called once per main-loop iteration.
    fn periodic(&mut self) {}

    /// The host reported the bridge's USB side as (dis)connected.
    fn set_usb_connected(&mut self, _connected: bool) {}
}

/// A mouse backend.
pub trait Mouse: Send {
    fn kind(&self) -> MouseKind;

    fn begin(&mut self) {}

    /// Releases every held button.
    fn clear(&mut self);

    fn send_buttons(&mut self, changes: ButtonChanges);

    /// Absolute move in host coordinates (`i16`, centred on zero).
    fn send_move(&mut self, x: i16, y: i16);

    fn send_relative(&mut self, dx: i8, dy: i8);

    /// Vertical scroll; positive is up.
    fn send_wheel(&mut self, delta: i8);

    fn is_offline(&self) -> bool {
        false
    }

    fn periodic(&mut self) {}

    fn set_usb_connected(&mut self, _connected: bool) {}
}

// ── "None" backends ───────────────────────────────────────────────────────────

/// Keyboard backend that discards everything.
#[derive(Debug, Default)]
pub struct NoneKeyboard;

impl Keyboard for NoneKeyboard {
    fn kind(&self) -> KeyboardKind {
        KeyboardKind::None
    }

    fn clear(&mut self) {}

    fn send_key(&mut self, _entry: KeyMapEntry, _pressed: bool) {}

    fn leds(&self) -> KeyboardLeds {
        KeyboardLeds::default()
    }
}

/// Mouse backend that discards everything.
#[derive(Debug, Default)]
pub struct NoneMouse;

impl Mouse for NoneMouse {
    fn kind(&self) -> MouseKind {
        MouseKind::None
    }

    fn clear(&mut self) {}

    fn send_buttons(&mut self, _changes: ButtonChanges) {}

    fn send_move(&mut self, _x: i16, _y: i16) {}

    fn send_relative(&mut self, _dx: i8, _dy: i8) {}

    fn send_wheel(&mut self, _delta: i8) {}
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Which USB interface an endpoint is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbInterface {
    Keyboard,
    AbsoluteMouse,
    RelativeMouse,
}

/// Which PS/2 port a wire is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ps2PortKind {
    Keyboard,
    Mouse,
}

/// Supplies the hardware behind the backends.
///
/// Returning `None` means the hardware is not present on this board; the
/// requested backend then falls back to "none".
pub trait HardwareProvider {
    fn usb_endpoint(&mut self, interface: UsbInterface) -> Option<Box<dyn HidEndpoint>>;
    fn ps2_wire(&mut self, port: Ps2PortKind) -> Option<Box<dyn Ps2Wire>>;
}

/// Builds the keyboard backend for `kind`.
pub fn make_keyboard(kind: KeyboardKind, hw: &mut dyn HardwareProvider) -> Box<dyn Keyboard> {
    let backend: Option<Box<dyn Keyboard>> = match kind {
        KeyboardKind::None => None,
        KeyboardKind::Usb => hw
            .usb_endpoint(UsbInterface::Keyboard)
            .map(|ep| Box::new(UsbKeyboard::new(ep)) as Box<dyn Keyboard>),
        KeyboardKind::Ps2 => hw
            .ps2_wire(Ps2PortKind::Keyboard)
            .map(|wire| Box::new(Ps2KeyboardOutput::new(wire)) as Box<dyn Keyboard>),
    };
    backend.unwrap_or_else(|| {
        if kind != KeyboardKind::None {
            tracing::warn!(?kind, "keyboard hardware not available, using none");
        }
        Box::new(NoneKeyboard)
    })
}

/// Builds the mouse backend for `kind`.
pub fn make_mouse(kind: MouseKind, hw: &mut dyn HardwareProvider) -> Box<dyn Mouse> {
    let backend: Option<Box<dyn Mouse>> = match kind {
        MouseKind::None => None,
        MouseKind::UsbAbs | MouseKind::UsbWin98 => hw
            .usb_endpoint(UsbInterface::AbsoluteMouse)
            .map(|ep| {
                Box::new(UsbAbsoluteMouse::new(ep, kind == MouseKind::UsbWin98)) as Box<dyn Mouse>
            }),
        MouseKind::UsbRel => hw
            .usb_endpoint(UsbInterface::RelativeMouse)
            .map(|ep| Box::new(UsbRelativeMouse::new(ep)) as Box<dyn Mouse>),
        MouseKind::Ps2 => hw
            .ps2_wire(Ps2PortKind::Mouse)
            .map(|wire| Box::new(Ps2MouseOutput::new(wire)) as Box<dyn Mouse>),
    };
    backend.unwrap_or_else(|| {
        if kind != MouseKind::None {
            tracing::warn!(?kind, "mouse hardware not available, using none");
        }
        Box::new(NoneMouse)
    })
}

/// Builds both backends for a selection.
pub fn make_outputs(
    selection: OutputSelection,
    hw: &mut dyn HardwareProvider,
) -> (Box<dyn Keyboard>, Box<dyn Mouse>) {
    (
        make_keyboard(selection.keyboard, hw),
        make_mouse(selection.mouse, hw),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ps2::Ps2Leds;
    use crate::protocol::{KeyboardKind, MouseKind};

    struct NoHardware;

    impl HardwareProvider for NoHardware {
        fn usb_endpoint(&mut self, _interface: UsbInterface) -> Option<Box<dyn HidEndpoint>> {
            None
        }

        fn ps2_wire(&mut self, _port: Ps2PortKind) -> Option<Box<dyn Ps2Wire>> {
            None
        }
    }

    struct SilentWire;

    impl Ps2Wire for SilentWire {
        fn receive(&mut self) -> Option<u8> {
            None
        }

        fn transmit(&mut self, _byte: u8) -> bool {
            true
        }
    }

    struct Ps2Only;

    impl HardwareProvider for Ps2Only {
        fn usb_endpoint(&mut self, _interface: UsbInterface) -> Option<Box<dyn HidEndpoint>> {
            None
        }

        fn ps2_wire(&mut self, _port: Ps2PortKind) -> Option<Box<dyn Ps2Wire>> {
            Some(Box::new(SilentWire))
        }
    }

    #[test]
    fn test_usb_and_ps2_led_layouts_agree() {
        let usb = KeyboardLeds::from_usb_report(0x02);
        let ps2 = KeyboardLeds::from(Ps2Leds::CAPS_LOCK);
        assert_eq!(usb, ps2);
        assert!(usb.caps);
    }

    #[test]
    fn test_leds_to_pong_flags() {
        let leds = KeyboardLeds {
            caps: true,
            scroll: false,
            num: true,
        };
        assert_eq!(leds.to_pong_flags(), PongFlags::CAPS | PongFlags::NUM);
    }

    #[test]
    fn test_missing_hardware_falls_back_to_none() {
        // Arrange
        let selection = OutputSelection::new(KeyboardKind::Usb, MouseKind::UsbAbs);

        // Act
        let (keyboard, mouse) = make_outputs(selection, &mut NoHardware);

        // Assert
        assert_eq!(keyboard.kind(), KeyboardKind::None);
        assert_eq!(mouse.kind(), MouseKind::None);
    }

    #[test]
    fn test_ps2_selection_builds_ps2_backends() {
        let selection = OutputSelection::new(KeyboardKind::Ps2, MouseKind::Ps2);
        let (keyboard, mouse) = make_outputs(selection, &mut Ps2Only);
        assert_eq!(keyboard.kind(), KeyboardKind::Ps2);
        assert_eq!(mouse.kind(), MouseKind::Ps2);
        assert!(!keyboard.is_offline());
        assert!(!mouse.is_offline());
    }
}
