//! Adapters between tokio I/O and the core's synchronous transport traits.
//!
//! The core transports read one byte at a time from a [`SerialPort`] and
//! must never block.  The runner reads whatever the async stream has, puts
//! it into a [`BufferedPort`], lets the transport consume it, and writes
//! the collected output back in one go.

use std::collections::VecDeque;

use hid_bridge_core::transport::{Clock, SerialPort};
use tokio::time::Instant;

/// In-memory [`SerialPort`]: a receive queue and a transmit buffer.
#[derive(Debug, Default)]
pub struct BufferedPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl BufferedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes received from the host.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Next received byte not yet consumed.
    pub fn pop_received(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    /// Queues bytes for the host without going through [`SerialPort`].
    pub fn push_transmit(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    /// Takes everything written since the last call.
    pub fn take_transmitted(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl SerialPort for BufferedPort {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }
}

/// Microsecond clock since start-up, wrapping like the firmware's timer.
///
/// Built on [`tokio::time::Instant`] so paused-time tests control it.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_micros(&self) -> u32 {
        // Truncation is the wrap.
        self.start.elapsed().as_micros() as u32
    }
}
