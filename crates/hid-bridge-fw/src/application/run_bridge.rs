//! The bridge main loop.
//!
//! # How the loop works (for beginners)
//!
//! Firmware runs a tight `loop { poll transport; poll outputs; }`.  Here the
//! same loop is driven by tokio:
//!
//! - When the host link has bytes, they are read into a [`BufferedPort`]
//!   and the transport consumes them immediately.
//! - When it has none, a ticker wakes the loop every `poll_interval` so
//!   partial-frame timeouts, legacy heartbeats and PS/2 traffic still make
//!   progress.
//!
//! After every pass, whatever the transport wrote is flushed to the host.
//! The loop ends cleanly when the host closes the link, or once a changed
//! output selection has been acknowledged: the new backends only exist
//! after a restart, so the caller rebuilds the bridge and runs it again.

use std::sync::Arc;
use std::time::Duration;

use hid_bridge_core::transport::legacy::LegacyTransport;
use hid_bridge_core::transport::spi::{SpiLink, SpiTransport};
use hid_bridge_core::transport::uart::UartTransport;
use hid_bridge_core::transport::{Clock, TransportError};
use hid_bridge_core::{CommandDispatcher, Responder};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::infrastructure::link::BufferedPort;
use crate::infrastructure::storage::TransportKind;

/// Errors that stop the main loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("host link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// How long a pending response may wait to be clocked out before a
/// restart goes ahead anyway.
pub const RESTART_GRACE_US: u32 = 100_000;

/// Why [`run_bridge`] returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// The host closed the link.
    #[default]
    LinkClosed,
    /// The output selection changed; rebuild the bridge to apply it.
    RestartRequired,
}

/// Traffic counters returned when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub stop: StopReason,
}

// ── Transport selection ───────────────────────────────────────────────────────

/// The active host link protocol, owning the dispatcher.
pub enum Bridge {
    Uart(UartTransport),
    Spi(SpiTransport),
    Legacy(LegacyTransport),
}

impl Bridge {
    /// Builds the transport for `kind`.  `timeout_us` is ignored by the
    /// legacy protocol, which has no partial-frame timeout.
    pub fn new(kind: TransportKind, timeout_us: u32, dispatcher: CommandDispatcher) -> Self {
        match kind {
            TransportKind::Uart => {
                Bridge::Uart(UartTransport::with_timeout(Responder::new(dispatcher), timeout_us))
            }
            TransportKind::Spi => Bridge::Spi(SpiTransport::with_timeout(
                Arc::new(SpiLink::new()),
                Responder::new(dispatcher),
                timeout_us,
            )),
            TransportKind::Legacy => Bridge::Legacy(LegacyTransport::new(dispatcher)),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Bridge::Uart(_) => TransportKind::Uart,
            Bridge::Spi(_) => TransportKind::Spi,
            Bridge::Legacy(_) => TransportKind::Legacy,
        }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        match self {
            Bridge::Uart(t) => t.responder().dispatcher(),
            Bridge::Spi(t) => t.responder().dispatcher(),
            Bridge::Legacy(t) => t.dispatcher(),
        }
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        match self {
            Bridge::Uart(t) => t.responder_mut().dispatcher_mut(),
            Bridge::Spi(t) => t.responder_mut().dispatcher_mut(),
            Bridge::Legacy(t) => t.dispatcher_mut(),
        }
    }

    /// `true` while a response still has to be clocked out by the host.
    pub fn is_response_pending(&self) -> bool {
        match self {
            Bridge::Spi(t) => t.link().is_response_pending(),
            Bridge::Uart(_) | Bridge::Legacy(_) => false,
        }
    }

    /// One main-loop pass: consume received bytes, run timeouts, then give
    /// the outputs their periodic slice.
    ///
    /// In SPI mode every received byte is one exchange: the byte the slave
    /// shifts out in return is queued for the host, and the main-loop half
    /// runs between exchanges as it would between interrupts.
    ///
    /// Once a restart is required no further frames are handled; SPI keeps
    /// clocking so the last response can still go out.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the port rejects a write.
    pub fn service(&mut self, port: &mut BufferedPort, now: u32) -> Result<(), TransportError> {
        let accepting = !self.dispatcher().is_reset_required();
        match self {
            Bridge::Uart(t) if accepting => t.poll(port, now)?,
            Bridge::Legacy(t) if accepting => t.poll(port, now)?,
            Bridge::Uart(_) | Bridge::Legacy(_) => {
                while port.pop_received().is_some() {}
            }
            Bridge::Spi(t) => {
                while let Some(byte) = port.pop_received() {
                    let reply = t.link().on_byte(byte);
                    port.push_transmit(reply);
                    if accepting {
                        t.poll(now);
                    }
                }
                if accepting {
                    t.poll(now);
                }
            }
        }
        self.dispatcher_mut().periodic();
        Ok(())
    }
}

// ── Main loop ─────────────────────────────────────────────────────────────────

/// Runs `bridge` on the host link until the reader reaches end of stream
/// or a changed output selection calls for a restart.
///
/// The restart waits until the acknowledging response has left (at most
/// [`RESTART_GRACE_US`]).  Bytes received after it are dropped, as a
/// rebooting board would drop them.
///
/// # Errors
///
/// Returns [`RunError::Io`] if the link fails and [`RunError::Transport`]
/// if the transport cannot write a response.
pub async fn run_bridge<R, W>(
    mut reader: R,
    mut writer: W,
    bridge: &mut Bridge,
    clock: &dyn Clock,
    poll_interval: Duration,
) -> Result<RunStats, RunError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut port = BufferedPort::new();
    let mut buf = [0u8; 256];
    let mut stats = RunStats::default();
    let mut restart_since: Option<u32> = None;

    info!(transport = ?bridge.kind(), "bridge running");

    loop {
        tokio::select! {
            biased;
            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    info!(?stats, "host link closed");
                    break;
                }
                debug!(bytes = n, "host link read");
                stats.bytes_in += n;
                port.feed(&buf[..n]);
            }
            _ = ticker.tick() => {}
        }

        let now = clock.now_micros();
        bridge.service(&mut port, now)?;

        let out = port.take_transmitted();
        if !out.is_empty() {
            stats.bytes_out += out.len();
            writer.write_all(&out).await?;
            writer.flush().await?;
        }

        if bridge.dispatcher().is_reset_required() {
            let since = *restart_since.get_or_insert(now);
            if !bridge.is_response_pending() || now.wrapping_sub(since) > RESTART_GRACE_US {
                info!(?stats, "output selection changed, restart required");
                stats.stop = StopReason::RestartRequired;
                break;
            }
        }
    }

    Ok(stats)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
