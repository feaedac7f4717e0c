//! Simulated board hardware.
//!
//! [`SimulatedHardware`] hands out logging USB endpoints and scripted PS/2
//! wires, but only for the peripherals the configuration says are fitted.
//! Asking for anything else returns `None`, and the core then falls back to
//! the "none" backend exactly as it would on a board without that port.

pub mod ps2_wire;
pub mod usb_endpoint;

use std::collections::HashMap;

use hid_bridge_core::output::{HardwareProvider, HidEndpoint, Ps2PortKind, UsbInterface};
use hid_bridge_core::ps2::Ps2Wire;

pub use ps2_wire::LoggingPs2Wire;
pub use usb_endpoint::{EndpointHandle, LoggingHidEndpoint};

use crate::infrastructure::storage::config::OutputsConfig;

/// Board description built from `[outputs]`.
#[derive(Debug, Default)]
pub struct SimulatedHardware {
    has_usb: bool,
    has_ps2: bool,
    ps2_autoinit: bool,
    handles: HashMap<&'static str, EndpointHandle>,
}

impl SimulatedHardware {
    pub fn new(has_usb: bool, has_ps2: bool) -> Self {
        Self {
            has_usb,
            has_ps2,
            ..Default::default()
        }
    }

    pub fn from_config(outputs: &OutputsConfig) -> Self {
        Self {
            ps2_autoinit: outputs.ps2_autoinit,
            ..Self::new(outputs.has_usb, outputs.has_ps2)
        }
    }

    /// Host-side controls of an endpoint handed out earlier.
    pub fn endpoint_handle(&self, interface: UsbInterface) -> Option<EndpointHandle> {
        self.handles.get(interface_name(interface)).cloned()
    }
}

fn interface_name(interface: UsbInterface) -> &'static str {
    match interface {
        UsbInterface::Keyboard => "keyboard",
        UsbInterface::AbsoluteMouse => "absolute-mouse",
        UsbInterface::RelativeMouse => "relative-mouse",
    }
}

impl HardwareProvider for SimulatedHardware {
    fn usb_endpoint(&mut self, interface: UsbInterface) -> Option<Box<dyn HidEndpoint>> {
        if !self.has_usb {
            return None;
        }
        let endpoint = LoggingHidEndpoint::new(interface);
        self.handles
            .insert(interface_name(interface), endpoint.handle());
        Some(Box::new(endpoint))
    }

    fn ps2_wire(&mut self, port: Ps2PortKind) -> Option<Box<dyn Ps2Wire>> {
        if !self.has_ps2 {
            return None;
        }
        let wire = if self.ps2_autoinit {
            LoggingPs2Wire::with_default_init(port)
        } else {
            LoggingPs2Wire::new(port)
        };
        Some(Box::new(wire))
    }
}
