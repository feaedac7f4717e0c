//! Simulated USB HID endpoint.
//!
//! Stands in for the device controller's interrupt IN endpoint.  Every
//! report is logged (keyboard reports with key names) and counted; the
//! "host" side is a pair of shared flags that tests and the runner can flip
//! to simulate a suspended bus or LED output reports.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use hid_bridge_core::keymap::KeyMapper;
use hid_bridge_core::output::{EndpointError, HidEndpoint, UsbInterface};

/// Host-side controls shared with a [`LoggingHidEndpoint`].
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    pub ready: Arc<AtomicBool>,
    pub leds: Arc<AtomicU8>,
    pub reports: Arc<AtomicUsize>,
}

impl Default for EndpointHandle {
    fn default() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
            leds: Arc::new(AtomicU8::new(0)),
            reports: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// [`HidEndpoint`] that logs reports instead of sending them.
#[derive(Debug)]
pub struct LoggingHidEndpoint {
    interface: UsbInterface,
    handle: EndpointHandle,
}

impl LoggingHidEndpoint {
    pub fn new(interface: UsbInterface) -> Self {
        Self::with_handle(interface, EndpointHandle::default())
    }

    pub fn with_handle(interface: UsbInterface, handle: EndpointHandle) -> Self {
        Self { interface, handle }
    }

    pub fn handle(&self) -> EndpointHandle {
        self.handle.clone()
    }
}

impl HidEndpoint for LoggingHidEndpoint {
    fn is_ready(&self) -> bool {
        self.handle.ready.load(Ordering::Relaxed)
    }

    fn send_report(&mut self, report: &[u8]) -> Result<(), EndpointError> {
        if !self.is_ready() {
            return Err(EndpointError::NotReady);
        }
        self.handle.reports.fetch_add(1, Ordering::Relaxed);
        match self.interface {
            UsbInterface::Keyboard => {
                let modifiers = report.first().copied().unwrap_or(0);
                let keys: Vec<String> = report
                    .iter()
                    .skip(2)
                    .filter(|&&usage| usage != 0)
                    .map(|&usage| match KeyMapper::key_for_usb_usage(usage) {
                        Some(key) => format!("{key:?}"),
                        None => format!("0x{usage:02X}"),
                    })
                    .collect();
                tracing::info!(modifiers, ?keys, "usb keyboard report");
            }
            UsbInterface::AbsoluteMouse | UsbInterface::RelativeMouse => {
                tracing::info!(interface = ?self.interface, ?report, "usb mouse report");
            }
        }
        Ok(())
    }

    fn led_report(&self) -> u8 {
        self.handle.leds.load(Ordering::Relaxed)
    }
}
