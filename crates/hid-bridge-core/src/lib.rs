//! # hid-bridge-core
//!
//! Firmware core of a KVM HID bridge: the device that sits between a KVM
//! host controller and the target machine and pretends to be the target's
//! keyboard and mouse.
//!
//! # Architecture overview (for beginners)
//!
//! The host controller sends small fixed-size command frames ("press key
//! 37", "move the pointer to x,y") over a UART or SPI link.  The bridge
//! checks each frame, executes it against whichever keyboard and mouse it
//! is currently emulating, and answers every frame with a 4-byte response
//! that also carries the keyboard LEDs and the bridge status.
//!
//! ```text
//!  host ──frames──▶ transport ──Command──▶ dispatch ──▶ output backend ──▶ target
//!       ◀─response─            ◀──code───           ◀── LEDs, offline ◀──
//! ```
//!
//! - **`protocol`** – CRC16, command/response frames, the closed
//!   [`Command`] enum, output-selection bits, and the legacy 5-byte protocol.
//! - **`keymap`** – canonical key ids to USB usages and PS/2 Set 2 codes.
//! - **`ps2`** – the PS/2 keyboard and mouse device state machines,
//!   including the IntelliMouse wheel negotiation.
//! - **`output`** – the [`Keyboard`]/[`Mouse`] backend traits and their USB,
//!   PS/2 and "none" implementations.
//! - **`dispatch`** – [`CommandDispatcher`], which executes commands and
//!   builds the status byte.
//! - **`transport`** – UART, SPI and legacy framing plus timeouts and
//!   `Repeat` handling.
//!
//! Nothing in this crate touches real hardware: USB endpoints, PS/2 lines,
//! serial ports and storage are traits supplied by the firmware binary.

pub mod dispatch;
pub mod keymap;
pub mod output;
pub mod protocol;
pub mod ps2;
pub mod transport;

pub use dispatch::CommandDispatcher;
pub use keymap::{KeyId, KeyMapEntry, KeyMapper};
pub use output::{Keyboard, KeyboardLeds, Mouse};
pub use protocol::{Command, CommandFrame, ProtocolError, ResponseCode, ResponseFrame};
pub use transport::Responder;
