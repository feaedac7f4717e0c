//! hid-bridge-fw library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does hid-bridge-fw do? (for beginners)
//!
//! `hid-bridge-core` is pure logic: it never touches a serial port, a USB
//! controller or a PS/2 line.  This crate supplies those pieces for a
//! bridge running as an ordinary process on a development machine:
//!
//! 1. Loads the TOML configuration (transport, default outputs, which
//!    hardware is "fitted").
//! 2. Restores the persisted output selection from a small file.
//! 3. Builds the keyboard and mouse backends on simulated USB endpoints and
//!    PS/2 wires that log every report and scan code.
//! 4. Runs the main loop: bytes from the host link (a serial device or
//!    stdin/stdout) go into the chosen transport, responses go back out.

/// Application layer: the bridge main loop.
pub mod application;

/// Infrastructure layer: configuration, storage, simulated hardware, clock.
pub mod infrastructure;
