//! Canonical key identifiers used on the host link.
//!
//! The host never sends USB or PS/2 codes.  It sends a small, dense,
//! platform-neutral key id (1..=111) and the bridge translates it into the
//! code space of whichever keyboard backend is active.  Ids follow the
//! DOM `KeyboardEvent.code` names so that browser-captured input maps
//! one-to-one.
//!
//! | Key        | Id  |
//! |------------|-----|
//! | KeyA       | 1   |
//! | Digit1     | 27  |
//! | Enter      | 37  |
//! | ControlLeft| 77  |
//! | NonConvert | 111 |
//!
//! Id 0 and everything above 111 are unassigned.

use serde::{Deserialize, Serialize};

/// Canonical key id.
///
/// The numeric value of each variant is its wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyId {
    // Letters
    KeyA = 1,
    KeyB = 2,
    KeyC = 3,
    KeyD = 4,
    KeyE = 5,
    KeyF = 6,
    KeyG = 7,
    KeyH = 8,
    KeyI = 9,
    KeyJ = 10,
    KeyK = 11,
    KeyL = 12,
    KeyM = 13,
    KeyN = 14,
    KeyO = 15,
    KeyP = 16,
    KeyQ = 17,
    KeyR = 18,
    KeyS = 19,
    KeyT = 20,
    KeyU = 21,
    KeyV = 22,
    KeyW = 23,
    KeyX = 24,
    KeyY = 25,
    KeyZ = 26,

    // Digits (top row)
    Digit1 = 27,
    Digit2 = 28,
    Digit3 = 29,
    Digit4 = 30,
    Digit5 = 31,
    Digit6 = 32,
    Digit7 = 33,
    Digit8 = 34,
    Digit9 = 35,
    Digit0 = 36,

    // Editing and whitespace
    Enter = 37,
    Escape = 38,
    Backspace = 39,
    Tab = 40,
    Space = 41,
    Minus = 42,
    Equal = 43,
    BracketLeft = 44,
    BracketRight = 45,
    Backslash = 46,
    Semicolon = 47,
    Quote = 48,
    Backquote = 49,
    Comma = 50,
    Period = 51,
    Slash = 52,

    // Locks and function keys
    CapsLock = 53,
    F1 = 54,
    F2 = 55,
    F3 = 56,
    F4 = 57,
    F5 = 58,
    F6 = 59,
    F7 = 60,
    F8 = 61,
    F9 = 62,
    F10 = 63,
    F11 = 64,
    F12 = 65,

    // Navigation cluster
    PrintScreen = 66,
    Insert = 67,
    Home = 68,
    PageUp = 69,
    Delete = 70,
    End = 71,
    PageDown = 72,
    ArrowRight = 73,
    ArrowLeft = 74,
    ArrowDown = 75,
    ArrowUp = 76,

    // Modifiers
    ControlLeft = 77,
    ShiftLeft = 78,
    AltLeft = 79,
    MetaLeft = 80,
    ControlRight = 81,
    ShiftRight = 82,
    AltRight = 83,
    MetaRight = 84,

    // System keys
    Pause = 85,
    ScrollLock = 86,
    NumLock = 87,
    ContextMenu = 88,

    // Numeric keypad
    NumpadDivide = 89,
    NumpadMultiply = 90,
    NumpadSubtract = 91,
    NumpadAdd = 92,
    NumpadEnter = 93,
    Numpad1 = 94,
    Numpad2 = 95,
    Numpad3 = 96,
    Numpad4 = 97,
    Numpad5 = 98,
    Numpad6 = 99,
    Numpad7 = 100,
    Numpad8 = 101,
    Numpad9 = 102,
    Numpad0 = 103,
    NumpadDecimal = 104,

    // Power and international keys
    Power = 105,
    IntlBackslash = 106,
    IntlYen = 107,
    IntlRo = 108,
    KanaMode = 109,
    Convert = 110,
    NonConvert = 111,
}

impl KeyId {
    /// Smallest assigned id.
    pub const FIRST: u8 = 1;

    /// Largest assigned id.
    pub const LAST: u8 = 111;

    /// Decodes a wire value. Returns `None` for unassigned ids.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            // Letters
            1 => Some(KeyId::KeyA),
            2 => Some(KeyId::KeyB),
            3 => Some(KeyId::KeyC),
            4 => Some(KeyId::KeyD),
            5 => Some(KeyId::KeyE),
            6 => Some(KeyId::KeyF),
            7 => Some(KeyId::KeyG),
            8 => Some(KeyId::KeyH),
            9 => Some(KeyId::KeyI),
            10 => Some(KeyId::KeyJ),
            11 => Some(KeyId::KeyK),
            12 => Some(KeyId::KeyL),
            13 => Some(KeyId::KeyM),
            14 => Some(KeyId::KeyN),
            15 => Some(KeyId::KeyO),
            16 => Some(KeyId::KeyP),
            17 => Some(KeyId::KeyQ),
            18 => Some(KeyId::KeyR),
            19 => Some(KeyId::KeyS),
            20 => Some(KeyId::KeyT),
            21 => Some(KeyId::KeyU),
            22 => Some(KeyId::KeyV),
            23 => Some(KeyId::KeyW),
            24 => Some(KeyId::KeyX),
            25 => Some(KeyId::KeyY),
            26 => Some(KeyId::KeyZ),

            // Digits (top row)
            27 => Some(KeyId::Digit1),
            28 => Some(KeyId::Digit2),
            29 => Some(KeyId::Digit3),
            30 => Some(KeyId::Digit4),
            31 => Some(KeyId::Digit5),
            32 => Some(KeyId::Digit6),
            33 => Some(KeyId::Digit7),
            34 => Some(KeyId::Digit8),
            35 => Some(KeyId::Digit9),
            36 => Some(KeyId::Digit0),

            // Editing and whitespace
            37 => Some(KeyId::Enter),
            38 => Some(KeyId::Escape),
            39 => Some(KeyId::Backspace),
            40 => Some(KeyId::Tab),
            41 => Some(KeyId::Space),
            42 => Some(KeyId::Minus),
            43 => Some(KeyId::Equal),
            44 => Some(KeyId::BracketLeft),
            45 => Some(KeyId::BracketRight),
            46 => Some(KeyId::Backslash),
            47 => Some(KeyId::Semicolon),
            48 => Some(KeyId::Quote),
            49 => Some(KeyId::Backquote),
            50 => Some(KeyId::Comma),
            51 => Some(KeyId::Period),
            52 => Some(KeyId::Slash),

            // Locks and function keys
            53 => Some(KeyId::CapsLock),
            54 => Some(KeyId::F1),
            55 => Some(KeyId::F2),
            56 => Some(KeyId::F3),
            57 => Some(KeyId::F4),
            58 => Some(KeyId::F5),
            59 => Some(KeyId::F6),
            60 => Some(KeyId::F7),
            61 => Some(KeyId::F8),
            62 => Some(KeyId::F9),
            63 => Some(KeyId::F10),
            64 => Some(KeyId::F11),
            65 => Some(KeyId::F12),

            // Navigation cluster
            66 => Some(KeyId::PrintScreen),
            67 => Some(KeyId::Insert),
            68 => Some(KeyId::Home),
            69 => Some(KeyId::PageUp),
            70 => Some(KeyId::Delete),
            71 => Some(KeyId::End),
            72 => Some(KeyId::PageDown),
            73 => Some(KeyId::ArrowRight),
            74 => Some(KeyId::ArrowLeft),
            75 => Some(KeyId::ArrowDown),
            76 => Some(KeyId::ArrowUp),

            // Modifiers
            77 => Some(KeyId::ControlLeft),
            78 => Some(KeyId::ShiftLeft),
            79 => Some(KeyId::AltLeft),
            80 => Some(KeyId::MetaLeft),
            81 => Some(KeyId::ControlRight),
            82 => Some(KeyId::ShiftRight),
            83 => Some(KeyId::AltRight),
            84 => Some(KeyId::MetaRight),

            // System keys
            85 => Some(KeyId::Pause),
            86 => Some(KeyId::ScrollLock),
            87 => Some(KeyId::NumLock),
            88 => Some(KeyId::ContextMenu),

            // Numeric keypad
            89 => Some(KeyId::NumpadDivide),
            90 => Some(KeyId::NumpadMultiply),
            91 => Some(KeyId::NumpadSubtract),
            92 => Some(KeyId::NumpadAdd),
            93 => Some(KeyId::NumpadEnter),
            94 => Some(KeyId::Numpad1),
            95 => Some(KeyId::Numpad2),
            96 => Some(KeyId::Numpad3),
            97 => Some(KeyId::Numpad4),
            98 => Some(KeyId::Numpad5),
            99 => Some(KeyId::Numpad6),
            100 => Some(KeyId::Numpad7),
            101 => Some(KeyId::Numpad8),
            102 => Some(KeyId::Numpad9),
            103 => Some(KeyId::Numpad0),
            104 => Some(KeyId::NumpadDecimal),

            // Power and international keys
            105 => Some(KeyId::Power),
            106 => Some(KeyId::IntlBackslash),
            107 => Some(KeyId::IntlYen),
            108 => Some(KeyId::IntlRo),
            109 => Some(KeyId::KanaMode),
            110 => Some(KeyId::Convert),
            111 => Some(KeyId::NonConvert),
            _ => None,
        }
    }

    /// Returns the wire value of this key.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Iterates over every assigned key in id order.
    pub fn all() -> impl Iterator<Item = KeyId> {
        (Self::FIRST..=Self::LAST).filter_map(Self::from_u8)
    }

    /// Returns `true` for the eight modifier keys.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyId::ControlLeft
                | KeyId::ShiftLeft
                | KeyId::AltLeft
                | KeyId::MetaLeft
                | KeyId::ControlRight
                | KeyId::ShiftRight
                | KeyId::AltRight
                | KeyId::MetaRight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_id_in_range_is_assigned() {
        for raw in KeyId::FIRST..=KeyId::LAST {
            let key = KeyId::from_u8(raw);
            assert!(key.is_some(), "id {raw} should be assigned");
            assert_eq!(key.map(KeyId::as_u8), Some(raw));
        }
    }

    #[test]
    fn test_unassigned_ids_return_none() {
        for raw in [0u8, 112, 128, 200, 255] {
            assert_eq!(KeyId::from_u8(raw), None, "id {raw} should be unassigned");
        }
    }

    #[test]
    fn test_all_yields_every_key_once() {
        let keys: Vec<KeyId> = KeyId::all().collect();
        assert_eq!(keys.len(), 111);
        assert_eq!(keys.first(), Some(&KeyId::KeyA));
        assert_eq!(keys.last(), Some(&KeyId::NonConvert));
    }

    #[test]
    fn test_modifier_keys_are_identified() {
        let modifiers: Vec<KeyId> = KeyId::all().filter(|k| k.is_modifier()).collect();
        assert_eq!(modifiers.len(), 8);
        assert!(!KeyId::CapsLock.is_modifier());
    }
}
