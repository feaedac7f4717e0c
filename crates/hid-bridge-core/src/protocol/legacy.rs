//! The unframed 5-byte heartbeat protocol of early bridge hardware.
//!
//! ```text
//! [opcode:1][payload:4]     no magic, no CRC, no response codes
//! ```
//! The bridge answers with a single `0x00` heartbeat byte after every
//! command and periodically while idle.  Only a subset of the command set
//! exists here; it is mapped onto [`Command`] so the same dispatcher
//! serves both protocols.

use super::command::{ButtonChanges, Command};

/// Size of one legacy command.
pub const LEGACY_FRAME_LEN: usize = 5;

/// The byte written as a heartbeat.
pub const HEARTBEAT: u8 = 0x00;

const LEFT_SELECT: u8 = 0b1000_0000;
const LEFT_STATE: u8 = 0b0000_1000;
const RIGHT_SELECT: u8 = 0b0100_0000;
const RIGHT_STATE: u8 = 0b0000_0100;

/// Decodes one 5-byte legacy command.
///
/// Returns `None` for opcodes the legacy protocol never defined; the
/// caller consumes and drops those bytes.
pub fn decode_legacy(frame: &[u8; LEGACY_FRAME_LEN]) -> Option<Command> {
    let p = &frame[1..];
    let command = match frame[0] {
        0 => Command::ClearHid,
        1 => Command::Key {
            key: p[0],
            pressed: p[1] != 0,
        },
        2 => Command::MouseMove {
            x: i16::from_be_bytes([p[0], p[1]]),
            y: i16::from_be_bytes([p[2], p[3]]),
        },
        // Only left/right exist here; masking keeps middle bits out.
        3 => Command::MouseButtons(ButtonChanges::from_payload(
            p[0] & (LEFT_SELECT | LEFT_STATE | RIGHT_SELECT | RIGHT_STATE),
            0,
        )),
        4 => Command::MouseWheel {
            dx: 0,
            dy: p[1] as i8,
        },
        _ => return None,
    };
    Some(command)
}
