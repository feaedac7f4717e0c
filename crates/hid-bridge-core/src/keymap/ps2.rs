//! Canonical key id to PS/2 Scan Code Set 2, and the make/break encoders.
//!
//! Set 2 is not a flat code space.  Most keys send one byte on make and
//! `F0 <code>` on break; keys added with the 101-key layout carry an `E0`
//! escape; Print Screen and Pause send fixed sequences of their own.
//! The [`Ps2KeyType`] tag picks the encoding at the output stage.

use super::key::KeyId;

const ESCAPE: u8 = 0xE0;
const BREAK: u8 = 0xF0;

const PRINT_SCREEN_MAKE: &[u8] = &[0xE0, 0x12, 0xE0, 0x7C];
const PRINT_SCREEN_BREAK: &[u8] = &[0xE0, 0xF0, 0x7C, 0xE0, 0xF0, 0x12];
const PAUSE_MAKE: &[u8] = &[0xE1, 0x14, 0x77, 0xE1, 0xF0, 0x14, 0xF0, 0x77];

/// How a key is encoded in Scan Code Set 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ps2KeyType {
    /// `code` / `F0 code`.
    Regular,
    /// `E0 code` / `E0 F0 code`.
    Special,
    /// Fixed 4-byte make and 6-byte break sequences.
    PrintScreen,
    /// Fixed 8-byte make, no break.
    Pause,
}

/// Translates a [`KeyId`] to its Set 2 type and code.
///
/// For `PrintScreen` and `Pause` the code is the final byte of the make
/// sequence and is not used by the encoder.
pub fn key_to_ps2(key: KeyId) -> (Ps2KeyType, u8) {
    use Ps2KeyType::{Pause, PrintScreen, Regular, Special};
    match key {
        // Letters
        KeyId::KeyA => (Regular, 0x1C),
        KeyId::KeyB => (Regular, 0x32),
        KeyId::KeyC => (Regular, 0x21),
        KeyId::KeyD => (Regular, 0x23),
        KeyId::KeyE => (Regular, 0x24),
        KeyId::KeyF => (Regular, 0x2B),
        KeyId::KeyG => (Regular, 0x34),
        KeyId::KeyH => (Regular, 0x33),
        KeyId::KeyI => (Regular, 0x43),
        KeyId::KeyJ => (Regular, 0x3B),
        KeyId::KeyK => (Regular, 0x42),
        KeyId::KeyL => (Regular, 0x4B),
        KeyId::KeyM => (Regular, 0x3A),
        KeyId::KeyN => (Regular, 0x31),
        KeyId::KeyO => (Regular, 0x44),
        KeyId::KeyP => (Regular, 0x4D),
        KeyId::KeyQ => (Regular, 0x15),
        KeyId::KeyR => (Regular, 0x2D),
        KeyId::KeyS => (Regular, 0x1B),
        KeyId::KeyT => (Regular, 0x2C),
        KeyId::KeyU => (Regular, 0x3C),
        KeyId::KeyV => (Regular, 0x2A),
        KeyId::KeyW => (Regular, 0x1D),
        KeyId::KeyX => (Regular, 0x22),
        KeyId::KeyY => (Regular, 0x35),
        KeyId::KeyZ => (Regular, 0x1A),

        // Digits (top row)
        KeyId::Digit1 => (Regular, 0x16),
        KeyId::Digit2 => (Regular, 0x1E),
        KeyId::Digit3 => (Regular, 0x26),
        KeyId::Digit4 => (Regular, 0x25),
        KeyId::Digit5 => (Regular, 0x2E),
        KeyId::Digit6 => (Regular, 0x36),
        KeyId::Digit7 => (Regular, 0x3D),
        KeyId::Digit8 => (Regular, 0x3E),
        KeyId::Digit9 => (Regular, 0x46),
        KeyId::Digit0 => (Regular, 0x45),

        // Editing and whitespace
        KeyId::Enter => (Regular, 0x5A),
        KeyId::Escape => (Regular, 0x76),
        KeyId::Backspace => (Regular, 0x66),
        KeyId::Tab => (Regular, 0x0D),
        KeyId::Space => (Regular, 0x29),
        KeyId::Minus => (Regular, 0x4E),
        KeyId::Equal => (Regular, 0x55),
        KeyId::BracketLeft => (Regular, 0x54),
        KeyId::BracketRight => (Regular, 0x5B),
        KeyId::Backslash => (Regular, 0x5D),
        KeyId::Semicolon => (Regular, 0x4C),
        KeyId::Quote => (Regular, 0x52),
        KeyId::Backquote => (Regular, 0x0E),
        KeyId::Comma => (Regular, 0x41),
        KeyId::Period => (Regular, 0x49),
        KeyId::Slash => (Regular, 0x4A),

        // Locks and function keys
        KeyId::CapsLock => (Regular, 0x58),
        KeyId::F1 => (Regular, 0x05),
        KeyId::F2 => (Regular, 0x06),
        KeyId::F3 => (Regular, 0x04),
        KeyId::F4 => (Regular, 0x0C),
        KeyId::F5 => (Regular, 0x03),
        KeyId::F6 => (Regular, 0x0B),
        KeyId::F7 => (Regular, 0x83),
        KeyId::F8 => (Regular, 0x0A),
        KeyId::F9 => (Regular, 0x01),
        KeyId::F10 => (Regular, 0x09),
        KeyId::F11 => (Regular, 0x78),
        KeyId::F12 => (Regular, 0x07),

        // Navigation cluster
        KeyId::PrintScreen => (PrintScreen, 0x7C),
        KeyId::Insert => (Special, 0x70),
        KeyId::Home => (Special, 0x6C),
        KeyId::PageUp => (Special, 0x7D),
        KeyId::Delete => (Special, 0x71),
        KeyId::End => (Special, 0x69),
        KeyId::PageDown => (Special, 0x7A),
        KeyId::ArrowRight => (Special, 0x74),
        KeyId::ArrowLeft => (Special, 0x6B),
        KeyId::ArrowDown => (Special, 0x72),
        KeyId::ArrowUp => (Special, 0x75),

        // Modifiers
        KeyId::ControlLeft => (Regular, 0x14),
        KeyId::ShiftLeft => (Regular, 0x12),
        KeyId::AltLeft => (Regular, 0x11),
        KeyId::MetaLeft => (Special, 0x1F),
        KeyId::ControlRight => (Special, 0x14),
        KeyId::ShiftRight => (Regular, 0x59),
        KeyId::AltRight => (Special, 0x11),
        KeyId::MetaRight => (Special, 0x27),

        // System keys
        KeyId::Pause => (Pause, 0x77),
        KeyId::ScrollLock => (Regular, 0x7E),
        KeyId::NumLock => (Regular, 0x77),
        KeyId::ContextMenu => (Special, 0x2F),

        // Numeric keypad
        KeyId::NumpadDivide => (Special, 0x4A),
        KeyId::NumpadMultiply => (Regular, 0x7C),
        KeyId::NumpadSubtract => (Regular, 0x7B),
        KeyId::NumpadAdd => (Regular, 0x79),
        KeyId::NumpadEnter => (Special, 0x5A),
        KeyId::Numpad1 => (Regular, 0x69),
        KeyId::Numpad2 => (Regular, 0x72),
        KeyId::Numpad3 => (Regular, 0x7A),
        KeyId::Numpad4 => (Regular, 0x6B),
        KeyId::Numpad5 => (Regular, 0x73),
        KeyId::Numpad6 => (Regular, 0x74),
        KeyId::Numpad7 => (Regular, 0x6C),
        KeyId::Numpad8 => (Regular, 0x75),
        KeyId::Numpad9 => (Regular, 0x7D),
        KeyId::Numpad0 => (Regular, 0x70),
        KeyId::NumpadDecimal => (Regular, 0x71),

        // Power and international keys
        KeyId::Power => (Special, 0x5E),
        KeyId::IntlBackslash => (Regular, 0x61),
        KeyId::IntlYen => (Regular, 0x6A),
        KeyId::IntlRo => (Regular, 0x51),
        KeyId::KanaMode => (Regular, 0x13),
        KeyId::Convert => (Regular, 0x64),
        KeyId::NonConvert => (Regular, 0x67),
    }
}

/// A short byte sequence produced by one key transition (at most 8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScanSequence {
    bytes: [u8; 8],
    len: usize,
}

impl ScanSequence {
    fn from_slice(src: &[u8]) -> Self {
        let mut seq = Self::default();
        seq.bytes[..src.len()].copy_from_slice(src);
        seq.len = src.len();
        seq
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encodes the make (press) sequence.
pub fn encode_make(key_type: Ps2KeyType, code: u8) -> ScanSequence {
    match key_type {
        Ps2KeyType::Regular => ScanSequence::from_slice(&[code]),
        Ps2KeyType::Special => ScanSequence::from_slice(&[ESCAPE, code]),
        Ps2KeyType::PrintScreen => ScanSequence::from_slice(PRINT_SCREEN_MAKE),
        Ps2KeyType::Pause => ScanSequence::from_slice(PAUSE_MAKE),
    }
}

/// Encodes the break (release) sequence.  Pause has none.
pub fn encode_break(key_type: Ps2KeyType, code: u8) -> ScanSequence {
    match key_type {
        Ps2KeyType::Regular => ScanSequence::from_slice(&[BREAK, code]),
        Ps2KeyType::Special => ScanSequence::from_slice(&[ESCAPE, BREAK, code]),
        Ps2KeyType::PrintScreen => ScanSequence::from_slice(PRINT_SCREEN_BREAK),
        Ps2KeyType::Pause => ScanSequence::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_key_make_and_break() {
        let (key_type, code) = key_to_ps2(KeyId::KeyA);
        assert_eq!(key_type, Ps2KeyType::Regular);
        assert_eq!(encode_make(key_type, code).as_slice(), &[0x1C]);
        assert_eq!(encode_break(key_type, code).as_slice(), &[0xF0, 0x1C]);
    }

    #[test]
    fn test_special_key_carries_escape_prefix() {
        let (key_type, code) = key_to_ps2(KeyId::ArrowUp);
        assert_eq!(key_type, Ps2KeyType::Special);
        assert_eq!(encode_make(key_type, code).as_slice(), &[0xE0, 0x75]);
        assert_eq!(encode_break(key_type, code).as_slice(), &[0xE0, 0xF0, 0x75]);
    }

    #[test]
    fn test_print_screen_uses_fixed_sequences() {
        let (key_type, code) = key_to_ps2(KeyId::PrintScreen);
        assert_eq!(key_type, Ps2KeyType::PrintScreen);
        assert_eq!(encode_make(key_type, code).as_slice(), PRINT_SCREEN_MAKE);
        assert_eq!(encode_break(key_type, code).as_slice(), PRINT_SCREEN_BREAK);
    }

    #[test]
    fn test_pause_has_make_only() {
        let (key_type, code) = key_to_ps2(KeyId::Pause);
        assert_eq!(key_type, Ps2KeyType::Pause);
        assert_eq!(encode_make(key_type, code).as_slice().len(), 8);
        assert!(encode_break(key_type, code).is_empty());
    }

    #[test]
    fn test_right_hand_modifiers_are_escaped() {
        assert_eq!(key_to_ps2(KeyId::ControlLeft), (Ps2KeyType::Regular, 0x14));
        assert_eq!(key_to_ps2(KeyId::ControlRight), (Ps2KeyType::Special, 0x14));
        assert_eq!(key_to_ps2(KeyId::AltRight), (Ps2KeyType::Special, 0x11));
        assert_eq!(key_to_ps2(KeyId::ShiftRight), (Ps2KeyType::Regular, 0x59));
    }

    #[test]
    fn test_only_print_screen_and_pause_use_fixed_sequences() {
        for key in KeyId::all() {
            let (key_type, _) = key_to_ps2(key);
            let fixed = matches!(key_type, Ps2KeyType::PrintScreen | Ps2KeyType::Pause);
            assert_eq!(
                fixed,
                matches!(key, KeyId::PrintScreen | KeyId::Pause),
                "{key:?}"
            );
        }
    }

    #[test]
    fn test_make_break_pairs_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for key in KeyId::all() {
            let (key_type, code) = key_to_ps2(key);
            let make = encode_make(key_type, code);
            assert!(seen.insert(make), "{key:?} shares its make sequence");
        }
    }
}
