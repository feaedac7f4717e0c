//! Host link protocol: CRC16, command/response frames, the command set,
//! output-selection bits, and the legacy heartbeat protocol.

pub mod command;
pub mod crc;
pub mod frame;
pub mod legacy;
pub mod outputs;

pub use command::{ButtonChanges, Command, MouseButtons, Opcode, LEGACY_REPEAT};
pub use crc::crc16;
pub use frame::{
    CommandFrame, PongFlags, ProtocolError, ResponseCode, ResponseFrame, FRAME_LEN, MAGIC,
    MAGIC_RESP, RESPONSE_LEN,
};
pub use outputs::{KeyboardKind, MouseKind, OutputSelection};
