//! UART link: frames assembled from a polled serial stream.
//!
//! Bytes are collected into an 8-byte buffer with no resynchronisation on
//! the magic byte.  A frame that stops arriving half-way is abandoned after
//! the timeout and answered with `TimeoutError`; the host then resends.

use super::{is_timed_out, Responder, SerialPort, TransportError, UART_TIMEOUT_US};
use crate::protocol::FRAME_LEN;

/// Frame assembler for a serial byte stream.
pub struct UartTransport {
    responder: Responder,
    buffer: [u8; FRAME_LEN],
    index: usize,
    last_byte_at: u32,
    timeout_us: u32,
}

impl UartTransport {
    pub fn new(responder: Responder) -> Self {
        Self::with_timeout(responder, UART_TIMEOUT_US)
    }

    pub fn with_timeout(responder: Responder, timeout_us: u32) -> Self {
        Self {
            responder,
            buffer: [0; FRAME_LEN],
            index: 0,
            last_byte_at: 0,
            timeout_us,
        }
    }

    /// Consumes every waiting byte, answering each completed frame, then
    /// checks the partial-frame timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if writing a response fails; the
    /// partially received frame, if any, is kept.
    pub fn poll(&mut self, port: &mut dyn SerialPort, now: u32) -> Result<(), TransportError> {
        while let Some(byte) = port.read_byte() {
            self.buffer[self.index] = byte;
            self.last_byte_at = now;
            if self.index == FRAME_LEN - 1 {
                self.index = 0;
                let response = self.responder.handle_frame(&self.buffer);
                port.write_all(&response)?;
            } else {
                self.index += 1;
            }
        }

        if self.index > 0 && is_timed_out(now, self.last_byte_at, self.timeout_us) {
            self.index = 0;
            let response = self.responder.handle_timeout();
            port.write_all(&response)?;
        }
        Ok(())
    }

    /// Bytes of the frame currently being assembled.
    pub fn pending(&self) -> usize {
        self.index
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut Responder {
        &mut self.responder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, ResponseCode, ResponseFrame, RESPONSE_LEN};
    use crate::transport::tests::test_responder;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakePort {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl SerialPort for FakePort {
        fn read_byte(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }

        fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.tx.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn codes(tx: &[u8]) -> Vec<ResponseCode> {
        tx.chunks(RESPONSE_LEN)
            .map(|chunk| ResponseFrame::parse(chunk).unwrap().code)
            .collect()
    }

    #[test]
    fn test_complete_frame_gets_one_response() {
        // Arrange
        let (responder, _) = test_responder();
        let mut uart = UartTransport::new(responder);
        let mut port = FakePort::default();
        port.rx.extend(Command::Ping.to_frame().encode());

        // Act
        uart.poll(&mut port, 1_000).unwrap();

        // Assert
        assert_eq!(port.tx.len(), RESPONSE_LEN);
        assert!(matches!(codes(&port.tx)[0], ResponseCode::Pong(_)));
        assert_eq!(uart.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_polls() {
        let (responder, _) = test_responder();
        let mut uart = UartTransport::new(responder);
        let mut port = FakePort::default();
        let frame = Command::Ping.to_frame().encode();

        port.rx.extend(&frame[..3]);
        uart.poll(&mut port, 0).unwrap();
        assert_eq!(uart.pending(), 3);

        port.rx.extend(&frame[3..]);
        uart.poll(&mut port, 50_000).unwrap();
        assert_eq!(codes(&port.tx).len(), 1);
    }

    #[test]
    fn test_stalled_partial_frame_times_out() {
        // Arrange
        let (responder, _) = test_responder();
        let mut uart = UartTransport::new(responder);
        let mut port = FakePort::default();
        port.rx.extend([0x33, 0x01]);
        uart.poll(&mut port, 0).unwrap();

        // Act
        uart.poll(&mut port, UART_TIMEOUT_US).unwrap();
        let before_timeout = port.tx.len();
        uart.poll(&mut port, UART_TIMEOUT_US + 1).unwrap();

        // Assert
        assert_eq!(before_timeout, 0);
        assert_eq!(codes(&port.tx), vec![ResponseCode::TimeoutError]);
        assert_eq!(uart.pending(), 0);
    }

    #[test]
    fn test_back_to_back_frames_in_one_poll() {
        let (responder, _) = test_responder();
        let mut uart = UartTransport::new(responder);
        let mut port = FakePort::default();
        port.rx.extend(Command::Ping.to_frame().encode());
        port.rx.extend(Command::Repeat.to_frame().encode());

        uart.poll(&mut port, 0).unwrap();

        assert_eq!(port.tx.len(), 2 * RESPONSE_LEN);
        assert_eq!(port.tx[..RESPONSE_LEN], port.tx[RESPONSE_LEN..]);
    }

    #[test]
    fn test_idle_line_never_times_out() {
        let (responder, _) = test_responder();
        let mut uart = UartTransport::new(responder);
        let mut port = FakePort::default();
        uart.poll(&mut port, u32::MAX).unwrap();
        assert!(port.tx.is_empty());
    }
}
