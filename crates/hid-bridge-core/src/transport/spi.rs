//! SPI-slave link.
//!
//! The SPI peripheral raises an interrupt for every byte exchanged with
//! the host.  The interrupt handler ([`SpiLink::on_byte`]) and the main
//! loop ([`SpiTransport::poll`]) share:
//!
//! - an 8-byte queue of received bytes, filled only by the handler and
//!   drained only by the main loop;
//! - a 4-byte response buffer, written only by the main loop while the
//!   ready flag is clear;
//! - the ready flag, set by the main loop after the response is written
//!   (release) and cleared by the handler after the last response byte is
//!   shifted out;
//! - a discard flag the main loop holds while it drops a timed-out partial
//!   frame.  The handler throws away every byte it sees while the flag is
//!   up, so nothing stale survives the drain.
//!
//! The handler preempts the main loop, never the other way round.
//!
//! While no response is pending the handler answers every exchange with
//! `0`.  Zero bytes between frames are line idle: a frame starts at the
//! first non-zero byte and is eight bytes long.  Bytes exchanged while a
//! response is being clocked out are ignored.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use super::{is_timed_out, Responder, SPI_TIMEOUT_US};
use crate::protocol::{FRAME_LEN, RESPONSE_LEN};

// ── Shared link state ─────────────────────────────────────────────────────────

/// State shared between the interrupt handler and the main loop.
#[derive(Debug)]
pub struct SpiLink {
    rx: ArrayQueue<u8>,
    // Bytes of the current frame seen by the handler.
    rx_count: AtomicUsize,
    // Up while the main loop drops a partial frame.
    discarding: AtomicBool,
    tx: [AtomicU8; RESPONSE_LEN],
    tx_index: AtomicUsize,
    ready: AtomicBool,
}

impl Default for SpiLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiLink {
    pub fn new() -> Self {
        Self {
            rx: ArrayQueue::new(FRAME_LEN),
            rx_count: AtomicUsize::new(0),
            discarding: AtomicBool::new(false),
            tx: std::array::from_fn(|_| AtomicU8::new(0)),
            tx_index: AtomicUsize::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Interrupt side: handles one exchanged byte and returns the byte to
    /// load into the data register for the next exchange.
    pub fn on_byte(&self, received: u8) -> u8 {
        if self.discarding.load(Ordering::Acquire) {
            self.rx_count.store(0, Ordering::Relaxed);
            tracing::trace!(received, "spi byte dropped during discard");
            return 0;
        }
        if self.ready.load(Ordering::Acquire) {
            let index = self.tx_index.load(Ordering::Relaxed);
            let out = self.tx[index].load(Ordering::Relaxed);
            if index + 1 == RESPONSE_LEN {
                self.tx_index.store(0, Ordering::Relaxed);
                self.ready.store(false, Ordering::Release);
            } else {
                self.tx_index.store(index + 1, Ordering::Relaxed);
            }
            return out;
        }
        let count = self.rx_count.load(Ordering::Relaxed);
        if count == 0 && received == 0 {
            return 0;
        }
        if self.rx.push(received).is_err() {
            tracing::trace!(received, "spi queue full, byte dropped");
        }
        self.rx_count.store((count + 1) % FRAME_LEN, Ordering::Relaxed);
        0
    }

    /// `true` while a response is waiting to be clocked out.
    pub fn is_response_pending(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Bytes of the frame received so far.
    pub fn received(&self) -> usize {
        self.rx.len()
    }

    fn take_frame(&self) -> Option<[u8; FRAME_LEN]> {
        if self.rx.len() < FRAME_LEN {
            return None;
        }
        let mut frame = [0u8; FRAME_LEN];
        for (slot, byte) in frame.iter_mut().zip(std::iter::from_fn(|| self.rx.pop())) {
            *slot = byte;
        }
        Some(frame)
    }

    fn discard_partial(&self) {
        self.begin_discard();
        self.finish_discard();
    }

    fn begin_discard(&self) {
        self.discarding.store(true, Ordering::SeqCst);
    }

    fn finish_discard(&self) {
        while self.rx.pop().is_some() {}
        self.rx_count.store(0, Ordering::Relaxed);
        self.discarding.store(false, Ordering::SeqCst);
    }

    fn publish(&self, response: &[u8; RESPONSE_LEN]) {
        for (slot, &byte) in self.tx.iter().zip(response) {
            slot.store(byte, Ordering::Relaxed);
        }
        self.ready.store(true, Ordering::Release);
    }
}

// ── Main-loop side ────────────────────────────────────────────────────────────

/// Main-loop half of the SPI link.
pub struct SpiTransport {
    link: Arc<SpiLink>,
    responder: Responder,
    seen: usize,
    last_change_at: u32,
    timeout_us: u32,
}

impl SpiTransport {
    pub fn new(link: Arc<SpiLink>, responder: Responder) -> Self {
        Self::with_timeout(link, responder, SPI_TIMEOUT_US)
    }

    pub fn with_timeout(link: Arc<SpiLink>, responder: Responder, timeout_us: u32) -> Self {
        Self {
            link,
            responder,
            seen: 0,
            last_change_at: 0,
            timeout_us,
        }
    }

    /// Handles a completed frame or an expired partial one.
    ///
    /// Does nothing while the previous response is still being clocked out.
    pub fn poll(&mut self, now: u32) {
        if self.link.is_response_pending() {
            return;
        }
        if let Some(frame) = self.link.take_frame() {
            self.seen = 0;
            let response = self.responder.handle_frame(&frame);
            self.link.publish(&response);
            return;
        }

        let received = self.link.received();
        if received != self.seen {
            self.seen = received;
            self.last_change_at = now;
        } else if received > 0 && is_timed_out(now, self.last_change_at, self.timeout_us) {
            self.link.discard_partial();
            self.seen = 0;
            let response = self.responder.handle_timeout();
            self.link.publish(&response);
        }
    }

    pub fn link(&self) -> &Arc<SpiLink> {
        &self.link
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut Responder {
        &mut self.responder
    }
}
