//! Opcodes and the decoded command set.
//!
//! A [`CommandFrame`] that passed the CRC check is turned into exactly one
//! [`Command`] here, at the frame boundary.  Everything downstream matches
//! on the enum, so adding an opcode is a compile-time-checked change.

use bitflags::bitflags;

use super::frame::{CommandFrame, ProtocolError};
use super::outputs::{KeyboardKind, MouseKind};

// ── Opcodes ───────────────────────────────────────────────────────────────────

/// All opcode values understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Repeat = 0x00,
    Ping = 0x01,
    SetKeyboard = 0x03,
    SetMouse = 0x04,
    SetConnected = 0x05,
    ClearHid = 0x10,
    Key = 0x11,
    MouseMove = 0x12,
    MouseButton = 0x13,
    MouseWheel = 0x14,
    MouseRelative = 0x15,
}

/// Older hosts send this value for "repeat".
pub const LEGACY_REPEAT: u8 = 0x02;

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 | LEGACY_REPEAT => Ok(Opcode::Repeat),
            0x01 => Ok(Opcode::Ping),
            0x03 => Ok(Opcode::SetKeyboard),
            0x04 => Ok(Opcode::SetMouse),
            0x05 => Ok(Opcode::SetConnected),
            0x10 => Ok(Opcode::ClearHid),
            0x11 => Ok(Opcode::Key),
            0x12 => Ok(Opcode::MouseMove),
            0x13 => Ok(Opcode::MouseButton),
            0x14 => Ok(Opcode::MouseWheel),
            0x15 => Ok(Opcode::MouseRelative),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// ── Mouse buttons ─────────────────────────────────────────────────────────────

bitflags! {
    /// Mouse button set.  Bit order matches both the USB boot mouse report
    /// and the PS/2 packet (left, right, middle, 4th, 5th).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 0b0000_0001;
        const RIGHT = 0b0000_0010;
        const MIDDLE = 0b0000_0100;
        /// "Extra up" on the wire; the back button.
        const BACK = 0b0000_1000;
        /// "Extra down" on the wire; the forward button.
        const FORWARD = 0b0001_0000;
    }
}

// (button, select bit, state bit) for payload byte 0 and byte 1.
const BYTE0_BUTTONS: [(MouseButtons, u8, u8); 3] = [
    (MouseButtons::LEFT, 0b1000_0000, 0b0000_1000),
    (MouseButtons::RIGHT, 0b0100_0000, 0b0000_0100),
    (MouseButtons::MIDDLE, 0b0010_0000, 0b0000_0010),
];
const BYTE1_BUTTONS: [(MouseButtons, u8, u8); 2] = [
    (MouseButtons::BACK, 0b1000_0000, 0b0000_1000),
    (MouseButtons::FORWARD, 0b0100_0000, 0b0000_0100),
];

/// Which buttons a `MouseButton` command touches, and their new state.
///
/// Only buttons in `selected` change; `pressed` is meaningful only within
/// `selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonChanges {
    pub selected: MouseButtons,
    pub pressed: MouseButtons,
}

impl ButtonChanges {
    /// Decodes the two select/state payload bytes.
    pub fn from_payload(byte0: u8, byte1: u8) -> Self {
        let mut changes = Self::default();
        let pairs = BYTE0_BUTTONS
            .iter()
            .map(|entry| (byte0, entry))
            .chain(BYTE1_BUTTONS.iter().map(|entry| (byte1, entry)));
        for (byte, &(button, select, state)) in pairs {
            if byte & select != 0 {
                changes.selected |= button;
                if byte & state != 0 {
                    changes.pressed |= button;
                }
            }
        }
        changes
    }

    /// Encodes back into the two payload bytes (host side).
    pub fn to_payload(self) -> [u8; 2] {
        let mut bytes = [0u8; 2];
        let pairs = BYTE0_BUTTONS
            .iter()
            .map(|entry| (0usize, entry))
            .chain(BYTE1_BUTTONS.iter().map(|entry| (1usize, entry)));
        for (index, &(button, select, state)) in pairs {
            if self.selected.contains(button) {
                bytes[index] |= select;
                if self.pressed.contains(button) {
                    bytes[index] |= state;
                }
            }
        }
        bytes
    }

    /// Applies the changes to a held-button set.
    pub fn apply(self, held: MouseButtons) -> MouseButtons {
        (held - self.selected) | (self.pressed & self.selected)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A decoded, validated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Resend the previous response; never dispatched.
    Repeat,
    /// Report status only.
    Ping,
    /// Switch the keyboard backend (takes effect after a reset).
    SetKeyboard(KeyboardKind),
    /// Switch the mouse backend (takes effect after a reset).
    SetMouse(MouseKind),
    /// The host tells the bridge whether its USB side is plugged in.
    SetConnected(bool),
    /// Release every key and button on both backends.
    ClearHid,
    /// Press or release one key, by canonical key id.
    Key { key: u8, pressed: bool },
    /// Absolute pointer position, host coordinates centred on zero.
    MouseMove { x: i16, y: i16 },
    /// Press or release mouse buttons.
    MouseButtons(ButtonChanges),
    /// Relative pointer motion.
    MouseRelative { dx: i8, dy: i8 },
    /// Scroll.  Only the vertical component is honoured by the backends.
    MouseWheel { dx: i8, dy: i8 },
}

impl Command {
    /// Decodes the opcode and payload of a validated frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnknownOpcode`] for opcodes outside the command set.
    /// - [`ProtocolError::InvalidPayload`] for `SetKeyboard`/`SetMouse` with a
    ///   bit pattern that names no backend.
    pub fn decode(frame: &CommandFrame) -> Result<Self, ProtocolError> {
        let p = frame.payload();
        let opcode = Opcode::try_from(frame.opcode())?;
        let command = match opcode {
            Opcode::Repeat => Command::Repeat,
            Opcode::Ping => Command::Ping,
            Opcode::SetKeyboard => Command::SetKeyboard(
                KeyboardKind::from_bits(p[0]).ok_or(ProtocolError::InvalidPayload {
                    opcode: frame.opcode(),
                    byte: p[0],
                })?,
            ),
            Opcode::SetMouse => Command::SetMouse(MouseKind::from_bits(p[0]).ok_or(
                ProtocolError::InvalidPayload {
                    opcode: frame.opcode(),
                    byte: p[0],
                },
            )?),
            Opcode::SetConnected => Command::SetConnected(p[0] != 0),
            Opcode::ClearHid => Command::ClearHid,
            Opcode::Key => Command::Key {
                key: p[0],
                pressed: p[1] != 0,
            },
            Opcode::MouseMove => Command::MouseMove {
                x: i16::from_be_bytes([p[0], p[1]]),
                y: i16::from_be_bytes([p[2], p[3]]),
            },
            Opcode::MouseButton => Command::MouseButtons(ButtonChanges::from_payload(p[0], p[1])),
            Opcode::MouseRelative => Command::MouseRelative {
                dx: p[0] as i8,
                dy: p[1] as i8,
            },
            Opcode::MouseWheel => Command::MouseWheel {
                dx: p[0] as i8,
                dy: p[1] as i8,
            },
        };
        Ok(command)
    }

    /// Encodes the command into a frame (host side, tests and tooling).
    pub fn to_frame(self) -> CommandFrame {
        let (opcode, payload) = match self {
            Command::Repeat => (Opcode::Repeat, [0; 4]),
            Command::Ping => (Opcode::Ping, [0; 4]),
            Command::SetKeyboard(kind) => (Opcode::SetKeyboard, [kind.bits(), 0, 0, 0]),
            Command::SetMouse(kind) => (Opcode::SetMouse, [kind.bits(), 0, 0, 0]),
            Command::SetConnected(on) => (Opcode::SetConnected, [u8::from(on), 0, 0, 0]),
            Command::ClearHid => (Opcode::ClearHid, [0; 4]),
            Command::Key { key, pressed } => (Opcode::Key, [key, u8::from(pressed), 0, 0]),
            Command::MouseMove { x, y } => {
                let [xh, xl] = x.to_be_bytes();
                let [yh, yl] = y.to_be_bytes();
                (Opcode::MouseMove, [xh, xl, yh, yl])
            }
            Command::MouseButtons(changes) => {
                let [b0, b1] = changes.to_payload();
                (Opcode::MouseButton, [b0, b1, 0, 0])
            }
            Command::MouseRelative { dx, dy } => {
                (Opcode::MouseRelative, [dx as u8, dy as u8, 0, 0])
            }
            Command::MouseWheel { dx, dy } => (Opcode::MouseWheel, [dx as u8, dy as u8, 0, 0]),
        };
        CommandFrame::new(opcode as u8, payload)
    }
}
