//! Application layer for the bridge runner.
//!
//! - **`bootstrap`** – turns an `AppConfig` into a ready [`Bridge`]: restores
//!   the output selection, builds the backends, initialises them.
//! - **`run_bridge`** – the main loop: host link bytes in, responses out,
//!   with a ticker so timeouts and heartbeats fire while the link is idle.
//!   It returns early when a new output selection needs a restart.

pub mod bootstrap;
pub mod run_bridge;

pub use bootstrap::build_bridge;
pub use run_bridge::{run_bridge, Bridge, RunError, RunStats, StopReason, RESTART_GRACE_US};
