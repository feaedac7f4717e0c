//! Persistence of the output selection.
//!
//! The selection lives in one 8-byte block (see
//! [`OutputSelection::encode_block`]).  A store that has never been
//! written, or whose block fails the magic/CRC check, reads as unset and
//! is overwritten with the configured defaults.

use thiserror::Error;

use crate::protocol::outputs::{SelectionError, STORED_BLOCK_LEN};
use crate::protocol::OutputSelection;

/// Errors from the selection store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Non-volatile storage for the selection block.
pub trait OutputStorage: Send {
    /// Reads the stored block.  A blank store returns all `0xFF` or zeros.
    fn read_block(&mut self) -> Result<[u8; STORED_BLOCK_LEN], StorageError>;

    fn write_block(&mut self, block: &[u8; STORED_BLOCK_LEN]) -> Result<(), StorageError>;
}

/// Reads the persisted selection, writing `defaults` back when the store
/// is unset or unreadable.
pub fn load_selection(
    storage: &mut dyn OutputStorage,
    defaults: OutputSelection,
) -> Result<OutputSelection, StorageError> {
    let decoded = storage
        .read_block()
        .and_then(|block| Ok(OutputSelection::decode_block(&block)?));
    match decoded {
        Ok(selection) => {
            tracing::debug!(outputs = selection.to_byte(), "loaded output selection");
            Ok(selection)
        }
        Err(err) => {
            tracing::info!(reason = %err, "output selection unset, storing defaults");
            storage.write_block(&defaults.encode_block())?;
            Ok(defaults)
        }
    }
}

/// Writes `selection` to the store.
pub fn store_selection(
    storage: &mut dyn OutputStorage,
    selection: OutputSelection,
) -> Result<(), StorageError> {
    storage.write_block(&selection.encode_block())
}

/// RAM-backed store, blank (`0xFF`) until first written.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    block: [u8; STORED_BLOCK_LEN],
    writes: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            block: [0xFF; STORED_BLOCK_LEN],
            writes: 0,
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl OutputStorage for MemoryStorage {
    fn read_block(&mut self) -> Result<[u8; STORED_BLOCK_LEN], StorageError> {
        Ok(self.block)
    }

    fn write_block(&mut self, block: &[u8; STORED_BLOCK_LEN]) -> Result<(), StorageError> {
        self.block = *block;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{KeyboardKind, MouseKind};

    #[test]
    fn test_blank_store_gets_defaults_written() {
        // Arrange
        let mut storage = MemoryStorage::new();
        let defaults = OutputSelection::new(KeyboardKind::Usb, MouseKind::UsbAbs);

        // Act
        let selection = load_selection(&mut storage, defaults).unwrap();

        // Assert
        assert_eq!(selection, defaults);
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.read_block().unwrap(), defaults.encode_block());
    }

    #[test]
    fn test_valid_store_is_not_rewritten() {
        // Arrange
        let stored = OutputSelection::new(KeyboardKind::Ps2, MouseKind::Ps2);
        let mut storage = MemoryStorage::new();
        store_selection(&mut storage, stored).unwrap();

        // Act
        let selection = load_selection(&mut storage, OutputSelection::default()).unwrap();

        // Assert
        assert_eq!(selection, stored);
        assert_eq!(storage.writes(), 1);
    }
}
