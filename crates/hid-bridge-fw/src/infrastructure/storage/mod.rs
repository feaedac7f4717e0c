//! Storage infrastructure: configuration file and persisted output selection.
//!
//! - **`config`** reads and writes the TOML [`AppConfig`](config::AppConfig).
//! - **`selection_file`** keeps the output selection block that the host
//!   changes with `SetKeyboard`/`SetMouse`.

pub mod config;
pub mod selection_file;

pub use config::{load_config, save_config, AppConfig, ConfigError, TransportKind};
pub use selection_file::FileStorage;
