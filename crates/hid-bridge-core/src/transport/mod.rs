//! Byte transports between the host controller and the dispatcher.
//!
//! Three link variants share one [`Responder`]:
//!
//! - [`uart::UartTransport`]: a serial byte stream, polled from the main loop.
//! - [`spi::SpiTransport`]: bytes arrive in an interrupt handler and are
//!   handed over through a bounded queue ([`spi::SpiLink`]).
//! - [`legacy::LegacyTransport`]: the unframed 5-byte heartbeat protocol.
//!
//! # Timing (for beginners)
//!
//! Time is a free-running 32-bit microsecond counter that wraps roughly
//! every 71 minutes.  Comparing two readings with `now - then` in wrapping
//! arithmetic gives the right elapsed time across the wrap, as long as the
//! real interval is shorter than one full period.  [`is_timed_out`] is the
//! only place that does this comparison.

pub mod legacy;
pub mod spi;
pub mod uart;

use thiserror::Error;

use crate::dispatch::CommandDispatcher;
use crate::protocol::{
    Command, CommandFrame, ResponseCode, ResponseFrame, FRAME_LEN, RESPONSE_LEN,
};

/// Partial-frame timeout of the UART link.
pub const UART_TIMEOUT_US: u32 = 100_000;

/// Partial-frame timeout of the SPI link.
pub const SPI_TIMEOUT_US: u32 = 10_000;

/// Errors surfaced by a transport's I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Monotonic microsecond clock that wraps at `u32::MAX`.
pub trait Clock {
    fn now_micros(&self) -> u32;
}

/// `true` once more than `timeout` microseconds have passed since `since`.
pub fn is_timed_out(now: u32, since: u32, timeout: u32) -> bool {
    now.wrapping_sub(since) > timeout
}

/// A serial byte stream.
pub trait SerialPort {
    /// Next received byte, if one is waiting.
    fn read_byte(&mut self) -> Option<u8>;

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

/// Turns complete frames into response frames.
///
/// Owns the dispatcher and the last response sent, which `Repeat`
/// replays byte-for-byte.  Every other outcome, errors included, replaces
/// the remembered response.
pub struct Responder {
    dispatcher: CommandDispatcher,
    last_response: [u8; RESPONSE_LEN],
}

impl Responder {
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self {
            dispatcher,
            last_response: ResponseFrame::new(ResponseCode::None).encode(),
        }
    }

    /// Validates, decodes and executes one frame.
    pub fn handle_frame(&mut self, bytes: &[u8; FRAME_LEN]) -> [u8; RESPONSE_LEN] {
        let code = match CommandFrame::parse(bytes) {
            Err(err) => {
                tracing::warn!(error = %err, "rejected frame");
                ResponseCode::CrcError
            }
            Ok(frame) => match Command::decode(&frame) {
                Ok(Command::Repeat) => {
                    tracing::debug!("repeating last response");
                    return self.last_response;
                }
                Ok(command) => self.dispatcher.dispatch(command),
                Err(err) => {
                    tracing::warn!(error = %err, "invalid command");
                    ResponseCode::InvalidCommand
                }
            },
        };
        self.respond(code)
    }

    /// Answers an abandoned partial frame.
    pub fn handle_timeout(&mut self) -> [u8; RESPONSE_LEN] {
        tracing::warn!("partial frame timed out");
        self.respond(ResponseCode::TimeoutError)
    }

    /// The response `Repeat` would return.
    pub fn last_response(&self) -> [u8; RESPONSE_LEN] {
        self.last_response
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        &mut self.dispatcher
    }

    fn respond(&mut self, code: ResponseCode) -> [u8; RESPONSE_LEN] {
        self.last_response = ResponseFrame::new(code).encode();
        self.last_response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::mock::{MockKeyboard, MockMouse};
    use crate::output::MemoryStorage;
    use crate::protocol::{OutputSelection, PongFlags};

    pub(crate) fn test_responder() -> (Responder, MockKeyboard) {
        let keyboard = MockKeyboard::new();
        let dispatcher = CommandDispatcher::new(
            Box::new(keyboard.clone()),
            Box::new(MockMouse::new()),
            Box::new(MemoryStorage::new()),
            OutputSelection::default(),
        );
        (Responder::new(dispatcher), keyboard)
    }

    fn code_of(response: [u8; RESPONSE_LEN]) -> ResponseCode {
        ResponseFrame::parse(&response).unwrap().code
    }

    #[test]
    fn test_timeout_comparison_survives_wraparound() {
        assert!(!is_timed_out(100, 0, 100));
        assert!(is_timed_out(101, 0, 100));
        assert!(!is_timed_out(50, u32::MAX - 49, 100));
        assert!(is_timed_out(51, u32::MAX - 49, 100));
    }

    #[test]
    fn test_repeat_before_anything_returns_none() {
        let (mut responder, _) = test_responder();
        let response = responder.handle_frame(&Command::Repeat.to_frame().encode());
        assert_eq!(code_of(response), ResponseCode::None);
    }

    #[test]
    fn test_repeat_replays_previous_response() {
        // Arrange
        let (mut responder, _) = test_responder();
        let ping = responder.handle_frame(&Command::Ping.to_frame().encode());

        // Act
        let repeated = responder.handle_frame(&CommandFrame::new(0x02, [9; 4]).encode());

        // Assert
        assert_eq!(repeated, ping);
    }

    #[test]
    fn test_repeat_after_error_replays_the_error() {
        // Arrange
        let (mut responder, _) = test_responder();
        responder.handle_frame(&Command::Ping.to_frame().encode());
        let crc_error = responder.handle_frame(&[0x33, 0x01, 0, 0, 0, 0, 0, 0]);

        // Act
        let repeated = responder.handle_frame(&Command::Repeat.to_frame().encode());

        // Assert
        assert_eq!(code_of(crc_error), ResponseCode::CrcError);
        assert_eq!(repeated, crc_error);
    }

    #[test]
    fn test_crc_error_does_not_dispatch() {
        // Arrange
        let (mut responder, keyboard) = test_responder();
        let mut bytes = Command::Key {
            key: 1,
            pressed: true,
        }
        .to_frame()
        .encode();
        bytes[3] ^= 0x01;

        // Act
        let response = responder.handle_frame(&bytes);

        // Assert
        assert_eq!(code_of(response), ResponseCode::CrcError);
        assert!(keyboard.events().lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_opcode_is_invalid_command() {
        let (mut responder, _) = test_responder();
        let bytes = CommandFrame::new(0x7E, [0; 4]).encode();
        assert_eq!(
            code_of(responder.handle_frame(&bytes)),
            ResponseCode::InvalidCommand
        );
    }

    #[test]
    fn test_timeout_response_is_remembered() {
        let (mut responder, _) = test_responder();
        let timeout = responder.handle_timeout();
        assert_eq!(code_of(timeout), ResponseCode::TimeoutError);
        assert_eq!(responder.last_response(), timeout);
    }

    #[test]
    fn test_ping_answers_pong() {
        let (mut responder, _) = test_responder();
        let response = responder.handle_frame(&Command::Ping.to_frame().encode());
        assert_eq!(code_of(response), ResponseCode::Pong(PongFlags::empty()));
    }
}
