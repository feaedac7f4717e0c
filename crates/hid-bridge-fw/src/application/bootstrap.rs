//! Start-up wiring: configuration to a ready-to-run [`Bridge`].
//!
//! Order matters and mirrors the firmware's `setup()`:
//!
//! 1. Read the persisted output selection (writing the configured
//!    defaults if the store is blank).
//! 2. Build the keyboard and mouse backends for that selection on the
//!    hardware that is actually fitted.
//! 3. Initialise the backends, then wrap the dispatcher in the transport.

use hid_bridge_core::output::{load_selection, make_outputs, StorageError};
use hid_bridge_core::CommandDispatcher;

use crate::application::run_bridge::Bridge;
use crate::infrastructure::hardware::SimulatedHardware;
use crate::infrastructure::storage::{AppConfig, FileStorage};

/// Builds the bridge described by `config`.
///
/// Returns the hardware too, so callers can reach the simulated host side
/// of the USB endpoints.
///
/// # Errors
///
/// Returns [`StorageError`] if the selection store can be neither read nor
/// initialised.
pub fn build_bridge(config: &AppConfig) -> Result<(Bridge, SimulatedHardware), StorageError> {
    let mut storage = FileStorage::new(&config.outputs.store_path);
    let selection = load_selection(&mut storage, config.outputs.default_selection())?;

    let mut hardware = SimulatedHardware::from_config(&config.outputs);
    let (keyboard, mouse) = make_outputs(selection, &mut hardware);

    let mut dispatcher = CommandDispatcher::new(keyboard, mouse, Box::new(storage), selection);
    dispatcher.begin();

    let bridge = Bridge::new(
        config.transport.kind,
        config.transport.effective_timeout_us(),
        dispatcher,
    );
    Ok((bridge, hardware))
}
