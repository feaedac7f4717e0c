//! File-backed store for the persisted output selection.
//!
//! The file holds exactly the 8-byte block the firmware keeps in EEPROM.
//! A missing file behaves like erased EEPROM (all `0xFF`).

use std::path::{Path, PathBuf};

use hid_bridge_core::output::{OutputStorage, StorageError};
use hid_bridge_core::protocol::outputs::{SelectionError, STORED_BLOCK_LEN};

/// [`OutputStorage`] on a small binary file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputStorage for FileStorage {
    fn read_block(&mut self) -> Result<[u8; STORED_BLOCK_LEN], StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok([0xFF; STORED_BLOCK_LEN]);
            }
            Err(e) => return Err(e.into()),
        };
        <[u8; STORED_BLOCK_LEN]>::try_from(bytes.as_slice())
            .map_err(|_| SelectionError::BadLength(bytes.len()).into())
    }

    fn write_block(&mut self, block: &[u8; STORED_BLOCK_LEN]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, block)?;
        tracing::debug!(path = %self.path.display(), "output selection written");
        Ok(())
    }
}
