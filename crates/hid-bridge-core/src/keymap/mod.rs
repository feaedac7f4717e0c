//! Key translation tables.
//!
//! The host sends canonical key ids ([`KeyId`]).  Each keyboard backend
//! needs a different code space: USB usage ids for the emulated USB
//! keyboard, Scan Code Set 2 for the emulated PS/2 keyboard.  Lookup is a
//! pure function; ids with no entry are ignored by the caller, not treated
//! as errors.

pub mod key;
pub mod ps2;
pub mod usb;

pub use key::KeyId;
pub use ps2::{encode_break, encode_make, Ps2KeyType, ScanSequence};

/// One row of the translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyMapEntry {
    pub key: KeyId,
    pub usb_usage: u8,
    pub ps2_type: Ps2KeyType,
    pub ps2_code: u8,
}

impl KeyMapEntry {
    /// Set 2 bytes for a press or release of this key.
    pub fn ps2_sequence(&self, pressed: bool) -> ScanSequence {
        if pressed {
            encode_make(self.ps2_type, self.ps2_code)
        } else {
            encode_break(self.ps2_type, self.ps2_code)
        }
    }
}

/// Looks up the table row for a raw canonical id.
///
/// Total over `u8`: unassigned ids return `None`.
///
/// # Examples
///
/// ```rust
/// use hid_bridge_core::keymap::{lookup, Ps2KeyType};
///
/// let entry = lookup(1).expect("KeyA is mapped");
/// assert_eq!(entry.usb_usage, 0x04);
/// assert_eq!(entry.ps2_type, Ps2KeyType::Regular);
/// assert!(lookup(0).is_none());
/// ```
pub fn lookup(id: u8) -> Option<KeyMapEntry> {
    KeyId::from_u8(id).map(entry_for)
}

/// Table row for a known key.
pub fn entry_for(key: KeyId) -> KeyMapEntry {
    let (ps2_type, ps2_code) = ps2::key_to_ps2(key);
    KeyMapEntry {
        key,
        usb_usage: usb::key_to_usb(key),
        ps2_type,
        ps2_code,
    }
}

/// Unified key mapper providing every translation direction.
pub struct KeyMapper;

impl KeyMapper {
    /// Canonical id to USB usage id.
    pub fn usb_usage(id: u8) -> Option<u8> {
        KeyId::from_u8(id).map(usb::key_to_usb)
    }

    /// Canonical id to Set 2 type and code.
    pub fn ps2_code(id: u8) -> Option<(Ps2KeyType, u8)> {
        KeyId::from_u8(id).map(ps2::key_to_ps2)
    }

    /// USB usage id back to the canonical key, used when reporting what
    /// the USB keyboard currently holds.
    pub fn key_for_usb_usage(usage: u8) -> Option<KeyId> {
        KeyId::all().find(|&key| usb::key_to_usb(key) == usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_total_over_u8() {
        for id in 0..=u8::MAX {
            let expected = (KeyId::FIRST..=KeyId::LAST).contains(&id);
            assert_eq!(lookup(id).is_some(), expected, "id {id}");
        }
    }

    #[test]
    fn test_lookup_letter_a() {
        // Arrange / Act
        let entry = lookup(1);

        // Assert
        assert_eq!(
            entry,
            Some(KeyMapEntry {
                key: KeyId::KeyA,
                usb_usage: 0x04,
                ps2_type: Ps2KeyType::Regular,
                ps2_code: 0x1C,
            })
        );
    }

    #[test]
    fn test_ps2_sequence_follows_type_tag() {
        let home = entry_for(KeyId::Home);
        assert_eq!(home.ps2_sequence(true).as_slice(), &[0xE0, 0x6C]);
        assert_eq!(home.ps2_sequence(false).as_slice(), &[0xE0, 0xF0, 0x6C]);
    }

    #[test]
    fn test_mapper_directions_agree() {
        for key in KeyId::all() {
            let usage = KeyMapper::usb_usage(key.as_u8()).expect("mapped");
            assert_eq!(KeyMapper::key_for_usb_usage(usage), Some(key));
        }
        assert_eq!(KeyMapper::ps2_code(0), None);
    }
}
