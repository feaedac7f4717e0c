//! Canonical key id to USB HID usage id (page 0x07, Keyboard/Keypad).
//!
//! Usage ids are what the boot-protocol keyboard report carries.  Letters
//! start at 0x04, the eight modifiers live at 0xE0..=0xE7 and travel in
//! the report's modifier byte rather than in a key slot.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10.

use super::key::KeyId;

/// First modifier usage (Left Control).
pub const MODIFIER_FIRST: u8 = 0xE0;

/// Last modifier usage (Right GUI).
pub const MODIFIER_LAST: u8 = 0xE7;

/// Translates a [`KeyId`] to its USB HID usage id.
///
/// Every canonical key has a USB usage, so this never fails.
pub fn key_to_usb(key: KeyId) -> u8 {
    match key {
        // Letters
        KeyId::KeyA => 0x04,
        KeyId::KeyB => 0x05,
        KeyId::KeyC => 0x06,
        KeyId::KeyD => 0x07,
        KeyId::KeyE => 0x08,
        KeyId::KeyF => 0x09,
        KeyId::KeyG => 0x0A,
        KeyId::KeyH => 0x0B,
        KeyId::KeyI => 0x0C,
        KeyId::KeyJ => 0x0D,
        KeyId::KeyK => 0x0E,
        KeyId::KeyL => 0x0F,
        KeyId::KeyM => 0x10,
        KeyId::KeyN => 0x11,
        KeyId::KeyO => 0x12,
        KeyId::KeyP => 0x13,
        KeyId::KeyQ => 0x14,
        KeyId::KeyR => 0x15,
        KeyId::KeyS => 0x16,
        KeyId::KeyT => 0x17,
        KeyId::KeyU => 0x18,
        KeyId::KeyV => 0x19,
        KeyId::KeyW => 0x1A,
        KeyId::KeyX => 0x1B,
        KeyId::KeyY => 0x1C,
        KeyId::KeyZ => 0x1D,

        // Digits (top row)
        KeyId::Digit1 => 0x1E,
        KeyId::Digit2 => 0x1F,
        KeyId::Digit3 => 0x20,
        KeyId::Digit4 => 0x21,
        KeyId::Digit5 => 0x22,
        KeyId::Digit6 => 0x23,
        KeyId::Digit7 => 0x24,
        KeyId::Digit8 => 0x25,
        KeyId::Digit9 => 0x26,
        KeyId::Digit0 => 0x27,

        // Editing and whitespace
        KeyId::Enter => 0x28,
        KeyId::Escape => 0x29,
        KeyId::Backspace => 0x2A,
        KeyId::Tab => 0x2B,
        KeyId::Space => 0x2C,
        KeyId::Minus => 0x2D,
        KeyId::Equal => 0x2E,
        KeyId::BracketLeft => 0x2F,
        KeyId::BracketRight => 0x30,
        KeyId::Backslash => 0x31,
        KeyId::Semicolon => 0x33,
        KeyId::Quote => 0x34,
        KeyId::Backquote => 0x35,
        KeyId::Comma => 0x36,
        KeyId::Period => 0x37,
        KeyId::Slash => 0x38,

        // Locks and function keys
        KeyId::CapsLock => 0x39,
        KeyId::F1 => 0x3A,
        KeyId::F2 => 0x3B,
        KeyId::F3 => 0x3C,
        KeyId::F4 => 0x3D,
        KeyId::F5 => 0x3E,
        KeyId::F6 => 0x3F,
        KeyId::F7 => 0x40,
        KeyId::F8 => 0x41,
        KeyId::F9 => 0x42,
        KeyId::F10 => 0x43,
        KeyId::F11 => 0x44,
        KeyId::F12 => 0x45,

        // Navigation cluster
        KeyId::PrintScreen => 0x46,
        KeyId::Insert => 0x49,
        KeyId::Home => 0x4A,
        KeyId::PageUp => 0x4B,
        KeyId::Delete => 0x4C,
        KeyId::End => 0x4D,
        KeyId::PageDown => 0x4E,
        KeyId::ArrowRight => 0x4F,
        KeyId::ArrowLeft => 0x50,
        KeyId::ArrowDown => 0x51,
        KeyId::ArrowUp => 0x52,

        // Modifiers
        KeyId::ControlLeft => 0xE0,
        KeyId::ShiftLeft => 0xE1,
        KeyId::AltLeft => 0xE2,
        KeyId::MetaLeft => 0xE3,
        KeyId::ControlRight => 0xE4,
        KeyId::ShiftRight => 0xE5,
        KeyId::AltRight => 0xE6,
        KeyId::MetaRight => 0xE7,

        // System keys
        KeyId::Pause => 0x48,
        KeyId::ScrollLock => 0x47,
        KeyId::NumLock => 0x53,
        KeyId::ContextMenu => 0x65,

        // Numeric keypad
        KeyId::NumpadDivide => 0x54,
        KeyId::NumpadMultiply => 0x55,
        KeyId::NumpadSubtract => 0x56,
        KeyId::NumpadAdd => 0x57,
        KeyId::NumpadEnter => 0x58,
        KeyId::Numpad1 => 0x59,
        KeyId::Numpad2 => 0x5A,
        KeyId::Numpad3 => 0x5B,
        KeyId::Numpad4 => 0x5C,
        KeyId::Numpad5 => 0x5D,
        KeyId::Numpad6 => 0x5E,
        KeyId::Numpad7 => 0x5F,
        KeyId::Numpad8 => 0x60,
        KeyId::Numpad9 => 0x61,
        KeyId::Numpad0 => 0x62,
        KeyId::NumpadDecimal => 0x63,

        // Power and international keys
        KeyId::Power => 0x66,
        KeyId::IntlBackslash => 0x64,
        KeyId::IntlYen => 0x89,
        KeyId::IntlRo => 0x87,
        KeyId::KanaMode => 0x88,
        KeyId::Convert => 0x8A,
        KeyId::NonConvert => 0x8B,
    }
}

/// Returns the bit of the report's modifier byte for a modifier usage, or
/// `None` for ordinary keys.
pub fn modifier_bit(usage: u8) -> Option<u8> {
    (MODIFIER_FIRST..=MODIFIER_LAST)
        .contains(&usage)
        .then(|| 1 << (usage - MODIFIER_FIRST))
}
