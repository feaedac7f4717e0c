//! TOML-based configuration for the bridge runner.
//!
//! # Example (for beginners)
//!
//! ```toml
//! poll_interval_ms = 1
//! log_level = "debug"
//!
//! [transport]
//! kind = "uart"
//! device = "/dev/ttyUSB0"
//!
//! [outputs]
//! keyboard = "ps2"
//! mouse = "usb-abs"
//! has_ps2 = true
//! ```
//!
//! Every field has a default (`#[serde(default = "...")]`), so an empty
//! file, or no file at all, gives a working UART bridge on stdin/stdout with
//! a USB keyboard and absolute mouse.
//!
//! The `outputs.keyboard`/`outputs.mouse` values are only the *initial*
//! selection: once the selection file exists, the host's `SetKeyboard` and
//! `SetMouse` commands decide what is active after the next restart.

use std::path::{Path, PathBuf};

use hid_bridge_core::protocol::{KeyboardKind, MouseKind, OutputSelection};
use hid_bridge_core::transport::{SPI_TIMEOUT_US, UART_TIMEOUT_US};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Main loop tick; bounds how late timeouts and heartbeats fire.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
}

/// Which host link protocol runs on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// 8-byte CRC frames, 4-byte responses.
    Uart,
    /// The same frames clocked through a simulated SPI slave.
    Spi,
    /// 5-byte commands with heartbeat bytes.
    Legacy,
}

/// Host link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,
    /// Partial-frame timeout; the transport's own default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_us: Option<u32>,
    /// Path of the byte stream; `-` means stdin/stdout.
    #[serde(default = "default_device")]
    pub device: String,
}

/// Default output selection and the simulated hardware.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputsConfig {
    #[serde(default = "default_keyboard")]
    pub keyboard: KeyboardKind,
    #[serde(default = "default_mouse")]
    pub mouse: MouseKind,
    /// Whether the board has a USB device controller.
    #[serde(default = "default_true")]
    pub has_usb: bool,
    /// Whether the board has PS/2 lines fitted.
    #[serde(default)]
    pub has_ps2: bool,
    /// Play a host controller's initialisation sequence into each PS/2 wire
    /// (reset, wheel probe, enable), as a BIOS would.
    #[serde(default = "default_true")]
    pub ps2_autoinit: bool,
    /// Where the persisted output selection lives.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl OutputsConfig {
    /// The selection used when none has been persisted yet.
    pub fn default_selection(&self) -> OutputSelection {
        OutputSelection::new(self.keyboard, self.mouse)
    }
}

impl TransportConfig {
    /// Configured timeout, or the default for the transport kind.
    pub fn effective_timeout_us(&self) -> u32 {
        self.timeout_us.unwrap_or(match self.kind {
            TransportKind::Spi => SPI_TIMEOUT_US,
            TransportKind::Uart | TransportKind::Legacy => UART_TIMEOUT_US,
        })
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_poll_interval_ms() -> u64 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_transport_kind() -> TransportKind {
    TransportKind::Uart
}
fn default_device() -> String {
    "-".to_string()
}
fn default_keyboard() -> KeyboardKind {
    KeyboardKind::Usb
}
fn default_mouse() -> MouseKind {
    MouseKind::UsbAbs
}
fn default_true() -> bool {
    true
}
fn default_store_path() -> PathBuf {
    PathBuf::from("hid-bridge-outputs.bin")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
            transport: TransportConfig::default(),
            outputs: OutputsConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_transport_kind(),
            timeout_us: None,
            device: default_device(),
        }
    }
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            keyboard: default_keyboard(),
            mouse: default_mouse(),
            has_usb: default_true(),
            has_ps2: false,
            ps2_autoinit: default_true(),
            store_path: default_store_path(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
