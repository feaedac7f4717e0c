//! Emulated PS/2 keyboard (Scan Code Set 2).
//!
//! Handles the controller's command bytes (LEDs, typematic rate, identify,
//! enable/disable scanning, reset, resend) and queues make/break sequences
//! for key events.  Like the mouse, the physical layer pulls bytes through
//! [`Ps2Keyboard::output`].

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::keymap::{KeyId, KeyMapEntry, Ps2KeyType};

use super::mouse::{ACK, OUTPUT_CAPACITY, SELF_TEST_PASSED};

const CMD_SET_LEDS: u8 = 0xED;
const CMD_ECHO: u8 = 0xEE;
const CMD_SCAN_CODE_SET: u8 = 0xF0;
const CMD_IDENTIFY: u8 = 0xF2;
const CMD_SET_TYPEMATIC: u8 = 0xF3;
const CMD_ENABLE_SCANNING: u8 = 0xF4;
const CMD_DISABLE_SCANNING: u8 = 0xF5;
const CMD_SET_DEFAULTS: u8 = 0xF6;
const CMD_RESEND: u8 = 0xFE;
const CMD_RESET: u8 = 0xFF;

/// Lowest byte the controller uses as a command.  Such a byte arriving
/// where an argument is expected aborts the pending command.
const FIRST_COMMAND: u8 = CMD_SET_LEDS;

const ID_MF2: [u8; 2] = [0xAB, 0x83];
const SCAN_CODE_SET_2: u8 = 0x02;
const DEFAULT_TYPEMATIC: u8 = 0x2B;

bitflags! {
    /// LED byte as sent with the `0xED` command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Ps2Leds: u8 {
        const SCROLL_LOCK = 0b001;
        const NUM_LOCK = 0b010;
        const CAPS_LOCK = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Leds,
    Typematic,
    ScanCodeSet,
}

/// PS/2 keyboard device state.
#[derive(Debug, Clone)]
pub struct Ps2Keyboard {
    leds: Ps2Leds,
    scanning: bool,
    typematic: u8,
    pending: Pending,
    held: Vec<KeyMapEntry>,
    last_sent: u8,
    output_buffer: VecDeque<u8>,
}

impl Default for Ps2Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Ps2Keyboard {
    pub fn new() -> Self {
        Self {
            leds: Ps2Leds::empty(),
            scanning: true,
            typematic: DEFAULT_TYPEMATIC,
            pending: Pending::None,
            held: Vec::new(),
            last_sent: ACK,
            output_buffer: VecDeque::with_capacity(OUTPUT_CAPACITY),
        }
    }

    /// Indicator state last set by the controller.
    pub fn leds(&self) -> Ps2Leds {
        self.leds
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn typematic(&self) -> u8 {
        self.typematic
    }

    /// Keys currently reported as held.
    pub fn held_keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.held.iter().map(|entry| entry.key)
    }

    /// Next byte for the physical layer, if any.
    pub fn output(&mut self) -> Option<u8> {
        let byte = self.output_buffer.pop_front()?;
        self.last_sent = byte;
        Some(byte)
    }

    pub fn pending(&self) -> usize {
        self.output_buffer.len()
    }

    /// Handles one byte received from the controller.
    pub fn input(&mut self, data: u8) {
        tracing::trace!(data, "keyboard command");

        if self.pending != Pending::None && data < FIRST_COMMAND {
            self.handle_argument(data);
            return;
        }
        self.pending = Pending::None;

        match data {
            CMD_SET_LEDS => {
                self.pending = Pending::Leds;
                self.push(ACK);
            }
            CMD_ECHO => self.push(CMD_ECHO),
            CMD_SCAN_CODE_SET => {
                self.pending = Pending::ScanCodeSet;
                self.push(ACK);
            }
            CMD_IDENTIFY => {
                self.enqueue(&[ACK, ID_MF2[0], ID_MF2[1]]);
            }
            CMD_SET_TYPEMATIC => {
                self.pending = Pending::Typematic;
                self.push(ACK);
            }
            CMD_ENABLE_SCANNING => {
                self.scanning = true;
                self.push(ACK);
            }
            CMD_DISABLE_SCANNING => {
                self.set_defaults();
                self.scanning = false;
                self.push(ACK);
            }
            CMD_SET_DEFAULTS => {
                self.set_defaults();
                self.push(ACK);
            }
            CMD_RESEND => {
                let byte = self.last_sent;
                if self.output_buffer.len() < OUTPUT_CAPACITY {
                    self.output_buffer.push_front(byte);
                }
            }
            CMD_RESET => {
                self.reset();
                self.enqueue(&[ACK, SELF_TEST_PASSED]);
            }
            _ => {
                tracing::debug!(data, "unhandled keyboard command");
                self.push(ACK);
            }
        }
    }

    /// Power-up state: LEDs off, scanning on, queue empty.
    pub fn reset(&mut self) {
        self.leds = Ps2Leds::empty();
        self.scanning = true;
        self.pending = Pending::None;
        self.held.clear();
        self.output_buffer.clear();
        self.set_defaults();
    }

    /// Power-on announcement: reset, then the self-test result the
    /// controller expects from a freshly plugged keyboard.
    pub fn power_on(&mut self) {
        self.reset();
        self.push(SELF_TEST_PASSED);
    }

    /// Queues the make or break sequence for `entry`.
    ///
    /// Dropped while scanning is disabled or when the whole sequence does
    /// not fit in the output queue; held-key tracking only follows what was
    /// actually queued.  Pause has no break code and is never tracked as held.
    pub fn send_key(&mut self, entry: KeyMapEntry, pressed: bool) {
        if !self.scanning {
            tracing::debug!(key = ?entry.key, "scanning disabled, key dropped");
            return;
        }
        let sequence = entry.ps2_sequence(pressed);
        if !self.enqueue(sequence.as_slice()) {
            return;
        }
        if entry.ps2_type != Ps2KeyType::Pause {
            if pressed {
                if !self.held.contains(&entry) {
                    self.held.push(entry);
                }
            } else {
                self.held.retain(|held| held != &entry);
            }
        }
    }

    /// Sends a break code for every held key.  Keys whose break code does
    /// not fit stay held.
    pub fn clear(&mut self) {
        if !self.scanning {
            self.held.clear();
            return;
        }
        let mut still_held = Vec::new();
        for entry in std::mem::take(&mut self.held) {
            let sequence = entry.ps2_sequence(false);
            if !self.enqueue(sequence.as_slice()) {
                still_held.push(entry);
            }
        }
        self.held = still_held;
    }

    fn handle_argument(&mut self, data: u8) {
        let pending = std::mem::replace(&mut self.pending, Pending::None);
        match pending {
            Pending::Leds => {
                self.leds = Ps2Leds::from_bits_truncate(data);
                tracing::debug!(leds = ?self.leds, "keyboard leds set");
                self.push(ACK);
            }
            Pending::Typematic => {
                self.typematic = data & 0x7F;
                self.push(ACK);
            }
            Pending::ScanCodeSet => {
                self.push(ACK);
                if data == 0 {
                    self.push(SCAN_CODE_SET_2);
                }
            }
            Pending::None => {}
        }
    }

    fn set_defaults(&mut self) {
        self.typematic = DEFAULT_TYPEMATIC;
    }

    fn push(&mut self, byte: u8) {
        self.enqueue(&[byte]);
    }

    /// Queues `bytes` whole, or not at all.
    fn enqueue(&mut self, bytes: &[u8]) -> bool {
        if self.output_buffer.len() + bytes.len() > OUTPUT_CAPACITY {
            tracing::debug!(dropped = bytes.len(), "keyboard output queue full");
            return false;
        }
        self.output_buffer.extend(bytes);
        true
    }
}
