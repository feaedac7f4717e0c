//! Degraded transport for hosts speaking the 5-byte heartbeat protocol.
//!
//! There is no framing, CRC or status here.  Every complete command is
//! executed and acknowledged with a heartbeat byte; while the line is idle
//! a heartbeat goes out every [`HEARTBEAT_INTERVAL_US`] so the host can
//! tell the bridge is alive.

use super::{is_timed_out, SerialPort, TransportError};
use crate::dispatch::CommandDispatcher;
use crate::protocol::legacy::{decode_legacy, HEARTBEAT, LEGACY_FRAME_LEN};

/// Idle heartbeat period.
pub const HEARTBEAT_INTERVAL_US: u32 = 100_000;

/// Command assembler for the heartbeat protocol.
pub struct LegacyTransport {
    dispatcher: CommandDispatcher,
    buffer: [u8; LEGACY_FRAME_LEN],
    index: usize,
    last_heartbeat_at: u32,
}

impl LegacyTransport {
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self {
            dispatcher,
            buffer: [0; LEGACY_FRAME_LEN],
            index: 0,
            last_heartbeat_at: 0,
        }
    }

    /// Consumes waiting bytes and sends heartbeats as due.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if a heartbeat cannot be written.
    pub fn poll(&mut self, port: &mut dyn SerialPort, now: u32) -> Result<(), TransportError> {
        while let Some(byte) = port.read_byte() {
            self.buffer[self.index] = byte;
            self.index += 1;
            if self.index == LEGACY_FRAME_LEN {
                self.index = 0;
                match decode_legacy(&self.buffer) {
                    Some(command) => {
                        self.dispatcher.dispatch(command);
                    }
                    None => tracing::warn!(opcode = self.buffer[0], "unknown legacy command"),
                }
                self.heartbeat(port, now)?;
            }
        }

        if is_timed_out(now, self.last_heartbeat_at, HEARTBEAT_INTERVAL_US) {
            self.heartbeat(port, now)?;
        }
        Ok(())
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        &mut self.dispatcher
    }

    fn heartbeat(&mut self, port: &mut dyn SerialPort, now: u32) -> Result<(), TransportError> {
        port.write_all(&[HEARTBEAT])?;
        self.last_heartbeat_at = now;
        Ok(())
    }
}
