//! Infrastructure layer for the bridge runner.
//!
//! Contains the adapters the core crate leaves as traits.
//!
//! **Dependency rule**: this layer may depend on `hid_bridge_core`, but MUST
//! NOT depend on `application`.
//!
//! # Sub-modules
//!
//! - **`hardware`** – simulated USB endpoints and PS/2 wires, handed out by
//!   `SimulatedHardware` according to which ports the config says are fitted.
//! - **`link`** – the buffered serial port and the wrapping microsecond clock
//!   the transports are polled with.
//! - **`storage`** – the TOML configuration file and the persisted output
//!   selection.

pub mod hardware;
pub mod link;
pub mod storage;
