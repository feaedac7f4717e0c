//! Command and response frames exchanged with the host controller.
//!
//! Wire format:
//! ```text
//! command:  [magic:1][opcode:1][payload:4][crc16:2]   (8 bytes, CRC over bytes 0..6)
//! response: [magic_resp:1][code:1][crc16:2]           (4 bytes, CRC over bytes 0..2)
//! ```
//! The CRC is big-endian.  A command frame is accepted only when both the
//! magic byte and the CRC check out; anything else is reported back to the
//! host as a CRC error and never reaches the dispatcher.

use bitflags::bitflags;
use thiserror::Error;

use super::crc::{crc16, merge16, split16};

// ── Protocol constants ────────────────────────────────────────────────────────

/// First byte of every command frame.
pub const MAGIC: u8 = 0x33;

/// First byte of every response frame.
pub const MAGIC_RESP: u8 = 0x34;

/// Size of a command frame in bytes.
pub const FRAME_LEN: usize = 8;

/// Size of a response frame in bytes.
pub const RESPONSE_LEN: usize = 4;

/// Size of the opcode-specific payload of a command frame.
pub const PAYLOAD_LEN: usize = 4;

const RESP_NONE: u8 = 0x24;
const RESP_CRC_ERROR: u8 = 0x40;
const RESP_INVALID_ERROR: u8 = 0x45;
const RESP_TIMEOUT_ERROR: u8 = 0x48;

/// Errors that can occur while decoding frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than a complete frame.
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first byte is not the expected magic value.
    #[error("bad magic byte: 0x{0:02X}")]
    BadMagic(u8),

    /// The transmitted checksum does not match the locally computed one.
    #[error("crc mismatch: frame carries 0x{received:04X}, computed 0x{computed:04X}")]
    CrcMismatch { received: u16, computed: u16 },

    /// The opcode byte is not part of the command set.
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// The opcode is known but its payload names nothing valid.
    #[error("invalid payload 0x{byte:02X} for opcode 0x{opcode:02X}")]
    InvalidPayload { opcode: u8, byte: u8 },

    /// The response code byte is not a known code.
    #[error("unknown response code: 0x{0:02X}")]
    UnknownResponseCode(u8),
}

// ── Command frame ─────────────────────────────────────────────────────────────

/// A CRC-validated command frame: opcode plus 4 payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    opcode: u8,
    payload: [u8; PAYLOAD_LEN],
}

impl CommandFrame {
    /// Builds a frame from its meaningful parts.
    pub fn new(opcode: u8, payload: [u8; PAYLOAD_LEN]) -> Self {
        Self { opcode, payload }
    }

    /// Validates and parses the first [`FRAME_LEN`] bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InsufficientData`] if fewer than 8 bytes are given.
    /// - [`ProtocolError::BadMagic`] if byte 0 is not [`MAGIC`].
    /// - [`ProtocolError::CrcMismatch`] if the trailing CRC does not match.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < FRAME_LEN {
            return Err(ProtocolError::InsufficientData {
                needed: FRAME_LEN,
                available: bytes.len(),
            });
        }
        if bytes[0] != MAGIC {
            return Err(ProtocolError::BadMagic(bytes[0]));
        }
        let received = merge16(bytes[6], bytes[7]);
        let computed = crc16(&bytes[..6]);
        if received != computed {
            return Err(ProtocolError::CrcMismatch { received, computed });
        }
        Ok(Self {
            opcode: bytes[1],
            payload: [bytes[2], bytes[3], bytes[4], bytes[5]],
        })
    }

    /// Encodes the frame including magic and CRC.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = MAGIC;
        buf[1] = self.opcode;
        buf[2..6].copy_from_slice(&self.payload);
        let (high, low) = split16(crc16(&buf[..6]));
        buf[6] = high;
        buf[7] = low;
        buf
    }

    /// Returns the raw opcode byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Returns the payload bytes.
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        self.payload
    }
}

// ── Response codes ────────────────────────────────────────────────────────────

bitflags! {
    /// Bits of the "pong" response code returned by every successful command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PongFlags: u8 {
        const CAPS = 0b0000_0001;
        const SCROLL = 0b0000_0010;
        const NUM = 0b0000_0100;
        const KEYBOARD_OFFLINE = 0b0000_1000;
        const MOUSE_OFFLINE = 0b0001_0000;
        const RESET_REQUIRED = 0b0100_0000;
        const OK = 0b1000_0000;
    }
}

/// Status code carried in byte 1 of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// Nothing has been answered yet; the initial value repeated by `Repeat`.
    None,
    /// The command frame failed the magic/CRC check.
    CrcError,
    /// The frame was intact but its opcode is unknown.
    InvalidCommand,
    /// A partially received frame was abandoned.
    TimeoutError,
    /// The command was executed; carries indicator and status bits.
    Pong(PongFlags),
}

impl ResponseCode {
    /// Returns the wire byte for this code.
    pub fn as_u8(self) -> u8 {
        match self {
            ResponseCode::None => RESP_NONE,
            ResponseCode::CrcError => RESP_CRC_ERROR,
            ResponseCode::InvalidCommand => RESP_INVALID_ERROR,
            ResponseCode::TimeoutError => RESP_TIMEOUT_ERROR,
            ResponseCode::Pong(flags) => (flags | PongFlags::OK).bits(),
        }
    }

    /// Decodes a wire byte. Any byte with the high bit set is a pong; the
    /// returned flags never include [`PongFlags::OK`] itself.
    pub fn from_u8(value: u8) -> Option<Self> {
        if value & PongFlags::OK.bits() != 0 {
            let flags = PongFlags::from_bits_truncate(value) - PongFlags::OK;
            return Some(ResponseCode::Pong(flags));
        }
        match value {
            RESP_NONE => Some(ResponseCode::None),
            RESP_CRC_ERROR => Some(ResponseCode::CrcError),
            RESP_INVALID_ERROR => Some(ResponseCode::InvalidCommand),
            RESP_TIMEOUT_ERROR => Some(ResponseCode::TimeoutError),
            _ => None,
        }
    }
}

// ── Response frame ────────────────────────────────────────────────────────────

/// A 4-byte response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub code: ResponseCode,
}

impl ResponseFrame {
    pub fn new(code: ResponseCode) -> Self {
        Self { code }
    }

    /// Encodes the frame including magic and CRC.
    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        let head = [MAGIC_RESP, self.code.as_u8()];
        let (high, low) = split16(crc16(&head));
        [head[0], head[1], high, low]
    }

    /// Validates and parses a response frame (host side).
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`CommandFrame::parse`], plus
    /// [`ProtocolError::UnknownResponseCode`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < RESPONSE_LEN {
            return Err(ProtocolError::InsufficientData {
                needed: RESPONSE_LEN,
                available: bytes.len(),
            });
        }
        if bytes[0] != MAGIC_RESP {
            return Err(ProtocolError::BadMagic(bytes[0]));
        }
        let received = merge16(bytes[2], bytes[3]);
        let computed = crc16(&bytes[..2]);
        if received != computed {
            return Err(ProtocolError::CrcMismatch { received, computed });
        }
        let code =
            ResponseCode::from_u8(bytes[1]).ok_or(ProtocolError::UnknownResponseCode(bytes[1]))?;
        Ok(Self { code })
    }
}
