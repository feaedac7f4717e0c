//! Output selection bits (`outputs1`) and their persisted form.
//!
//! The host can ask the bridge to switch between USB and PS/2 emulation
//! at run time.  The choice is a single byte: bits 0–2 select the keyboard
//! backend, bits 3–5 the mouse backend.  It is persisted as an 8-byte block
//! guarded by the same magic/CRC scheme as command frames so that a blank
//! or corrupted store reads back as "unset".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crc::{crc16, merge16, split16};
use super::frame::MAGIC;

/// Mask of the keyboard bits in `outputs1`.
pub const KEYBOARD_MASK: u8 = 0b0000_0111;

/// Mask of the mouse bits in `outputs1`.
pub const MOUSE_MASK: u8 = 0b0011_1000;

/// Marks a bridge whose outputs can be switched at run time.
pub const DYNAMIC: u8 = 0b1000_0000;

/// Size of the persisted selection block.
pub const STORED_BLOCK_LEN: usize = 8;

/// Which keyboard backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardKind {
    #[default]
    None,
    Usb,
    Ps2,
}

impl KeyboardKind {
    /// Decodes the keyboard bits of `outputs1`.
    ///
    /// Returns `None` for bit patterns that name no backend.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & KEYBOARD_MASK {
            0b000 => Some(KeyboardKind::None),
            0b001 => Some(KeyboardKind::Usb),
            0b011 => Some(KeyboardKind::Ps2),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            KeyboardKind::None => 0b000,
            KeyboardKind::Usb => 0b001,
            KeyboardKind::Ps2 => 0b011,
        }
    }
}

/// Which mouse backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MouseKind {
    #[default]
    None,
    UsbAbs,
    UsbRel,
    Ps2,
    /// Absolute USB mouse with the coordinate quirk older Windows needs.
    UsbWin98,
}

impl MouseKind {
    /// Decodes the mouse bits of `outputs1`.
    ///
    /// Returns `None` for bit patterns that name no backend.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & MOUSE_MASK {
            0b00_0000 => Some(MouseKind::None),
            0b00_1000 => Some(MouseKind::UsbAbs),
            0b01_0000 => Some(MouseKind::UsbRel),
            0b01_1000 => Some(MouseKind::Ps2),
            0b10_0000 => Some(MouseKind::UsbWin98),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            MouseKind::None => 0b00_0000,
            MouseKind::UsbAbs => 0b00_1000,
            MouseKind::UsbRel => 0b01_0000,
            MouseKind::Ps2 => 0b01_1000,
            MouseKind::UsbWin98 => 0b10_0000,
        }
    }

    /// Returns `true` for the USB mouse variants.
    pub fn is_usb(self) -> bool {
        matches!(self, MouseKind::UsbAbs | MouseKind::UsbRel | MouseKind::UsbWin98)
    }
}

/// Errors returned when reading the persisted selection block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("stored selection block is {0} bytes, expected {STORED_BLOCK_LEN}")]
    BadLength(usize),

    #[error("stored selection block is not initialised")]
    Unset,
}

/// The `outputs1` byte: one keyboard and one mouse backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputSelection {
    pub keyboard: KeyboardKind,
    pub mouse: MouseKind,
}

impl OutputSelection {
    pub fn new(keyboard: KeyboardKind, mouse: MouseKind) -> Self {
        Self { keyboard, mouse }
    }

    /// Decodes an `outputs1` byte, falling back to `None` for unknown patterns.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            keyboard: KeyboardKind::from_bits(byte).unwrap_or_default(),
            mouse: MouseKind::from_bits(byte).unwrap_or_default(),
        }
    }

    pub fn to_byte(self) -> u8 {
        self.keyboard.bits() | self.mouse.bits()
    }

    /// Encodes the persisted block `[magic, outputs1, 0, 0, 0, 0, crc_hi, crc_lo]`.
    pub fn encode_block(self) -> [u8; STORED_BLOCK_LEN] {
        let mut block = [0u8; STORED_BLOCK_LEN];
        block[0] = MAGIC;
        block[1] = self.to_byte();
        let (high, low) = split16(crc16(&block[..6]));
        block[6] = high;
        block[7] = low;
        block
    }

    /// Decodes a persisted block.
    ///
    /// # Errors
    ///
    /// [`SelectionError::Unset`] when the magic or CRC does not match, which
    /// is the normal state of a fresh store.
    pub fn decode_block(block: &[u8]) -> Result<Self, SelectionError> {
        if block.len() != STORED_BLOCK_LEN {
            return Err(SelectionError::BadLength(block.len()));
        }
        if block[0] != MAGIC || crc16(&block[..6]) != merge16(block[6], block[7]) {
            return Err(SelectionError::Unset);
        }
        Ok(Self::from_byte(block[1]))
    }
}
