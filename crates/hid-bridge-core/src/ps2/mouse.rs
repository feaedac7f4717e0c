//! Emulated PS/2 mouse, as seen from the target machine's controller.
//!
//! The controller drives the device with single-byte commands (some take
//! one argument byte).  Replies and movement packets are queued and
//! pulled one byte at a time by the physical-layer driver through
//! [`Ps2Mouse::output`].
//!
//! # Wheel negotiation (for beginners)
//!
//! A plain PS/2 mouse sends 3-byte packets and has no wheel.  Drivers
//! detect an IntelliMouse by setting the sample rate to 200, 100, 80 in a
//! row and then asking for the device id: a wheel mouse answers 3 instead
//! of 0 and switches to 4-byte packets.  Repeating the trick with 200,
//! 200, 80 unlocks id 4, which adds buttons 4 and 5.  The three most recent
//! rates are kept in a 24-bit window; any other command clears it.

use std::collections::VecDeque;

use crate::protocol::{ButtonChanges, MouseButtons};

pub const ACK: u8 = 0xFA;
pub const SELF_TEST_PASSED: u8 = 0xAA;

const CMD_SET_SCALING_1_1: u8 = 0xE6;
const CMD_SET_SCALING_2_1: u8 = 0xE7;
const CMD_SET_RESOLUTION: u8 = 0xE8;
const CMD_STATUS_REQUEST: u8 = 0xE9;
const CMD_SET_STREAM_MODE: u8 = 0xEA;
const CMD_READ_DATA: u8 = 0xEB;
const CMD_GET_DEVICE_ID: u8 = 0xF2;
const CMD_SET_SAMPLE_RATE: u8 = 0xF3;
const CMD_ENABLE_REPORTING: u8 = 0xF4;
const CMD_DISABLE_REPORTING: u8 = 0xF5;
const CMD_SET_DEFAULTS: u8 = 0xF6;
const CMD_RESET: u8 = 0xFF;

/// Most bytes queued for the controller.  A packet or reply that does not
/// fit whole is dropped.
pub const OUTPUT_CAPACITY: usize = 32;

const DEFAULT_SAMPLE_RATE: u8 = 100;
const DEFAULT_RESOLUTION: u8 = 0x02;

const MAGIC_WHEEL3: u32 = 0x00C8_6450; // 200, 100, 80
const MAGIC_WHEEL5: u32 = 0x00C8_C850; // 200, 200, 80
const MAGIC_WINDOW_MASK: u32 = 0x00FF_FFFF;

/// Device id advertised to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceType {
    /// 3-byte packets, three buttons.
    Standard = 0,
    /// 4-byte packets with a wheel byte.
    Wheel3 = 3,
    /// 4-byte packets, 4-bit wheel plus buttons 4 and 5.
    Wheel5 = 4,
}

/// Whether movement packets are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Streaming,
}

/// What the next byte from the controller means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    AwaitingCommand,
    AwaitingSampleRate,
    AwaitingResolution,
}

/// One movement packet (3 or 4 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ps2Packet {
    bytes: [u8; 4],
    len: usize,
}

impl Ps2Packet {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// PS/2 mouse device state.
#[derive(Debug, Clone)]
pub struct Ps2Mouse {
    device_type: DeviceType,
    mode: Mode,
    input_mode: InputMode,
    sample_rate: u8,
    resolution: u8,
    scaling_2_1: bool,
    magic_window: u32,
    buttons: MouseButtons,
    output_buffer: VecDeque<u8>,
}

impl Default for Ps2Mouse {
    fn default() -> Self {
        Self::new()
    }
}

impl Ps2Mouse {
    /// A powered-up device: Standard, Idle, rate 100.
    pub fn new() -> Self {
        Self {
            device_type: DeviceType::Standard,
            mode: Mode::Idle,
            input_mode: InputMode::AwaitingCommand,
            sample_rate: DEFAULT_SAMPLE_RATE,
            resolution: DEFAULT_RESOLUTION,
            scaling_2_1: false,
            magic_window: 0,
            buttons: MouseButtons::empty(),
            output_buffer: VecDeque::with_capacity(OUTPUT_CAPACITY),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn sample_rate(&self) -> u8 {
        self.sample_rate
    }

    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    pub fn is_streaming(&self) -> bool {
        self.mode == Mode::Streaming
    }

    /// Next byte for the physical layer, if any.
    pub fn output(&mut self) -> Option<u8> {
        self.output_buffer.pop_front()
    }

    /// Number of queued bytes.
    pub fn pending(&self) -> usize {
        self.output_buffer.len()
    }

    /// Handles one byte received from the controller.
    pub fn input(&mut self, data: u8) {
        tracing::trace!(data, input_mode = ?self.input_mode, "mouse command");

        match self.input_mode {
            InputMode::AwaitingSampleRate => {
                self.input_mode = InputMode::AwaitingCommand;
                self.sample_rate = data;
                self.push_sample_rate(data);
                self.ack();
                return;
            }
            InputMode::AwaitingResolution => {
                self.input_mode = InputMode::AwaitingCommand;
                self.resolution = data & 0x03;
                self.ack();
                return;
            }
            InputMode::AwaitingCommand => {}
        }

        if data != CMD_SET_SAMPLE_RATE {
            self.magic_window = 0;
        }

        match data {
            CMD_RESET => {
                self.reset();
                self.enqueue(&[ACK, SELF_TEST_PASSED, self.device_type as u8]);
            }
            CMD_SET_DEFAULTS => {
                self.set_defaults();
                self.ack();
            }
            CMD_DISABLE_REPORTING | CMD_SET_STREAM_MODE => {
                self.mode = Mode::Idle;
                self.ack();
            }
            CMD_ENABLE_REPORTING => {
                self.mode = Mode::Streaming;
                self.ack();
            }
            CMD_SET_SAMPLE_RATE => {
                self.input_mode = InputMode::AwaitingSampleRate;
                self.ack();
            }
            CMD_SET_RESOLUTION => {
                self.input_mode = InputMode::AwaitingResolution;
                self.ack();
            }
            CMD_SET_SCALING_1_1 => {
                self.scaling_2_1 = false;
                self.ack();
            }
            CMD_SET_SCALING_2_1 => {
                self.scaling_2_1 = true;
                self.ack();
            }
            CMD_GET_DEVICE_ID => {
                self.enqueue(&[ACK, self.device_type as u8]);
            }
            CMD_STATUS_REQUEST => {
                let status = self.status_byte();
                self.enqueue(&[ACK, status, self.resolution, self.sample_rate]);
            }
            CMD_READ_DATA => {
                let packet = self.packet(0, 0, 0);
                let mut reply = [ACK; 5];
                reply[1..=packet.len].copy_from_slice(packet.as_slice());
                self.enqueue(&reply[..=packet.len]);
            }
            _ => {
                tracing::debug!(data, "unhandled mouse command");
                self.ack();
            }
        }
    }

    /// Back to the power-up state.  Held buttons are kept: they mirror
    /// what the host is holding, not device configuration.
    pub fn reset(&mut self) {
        self.set_defaults();
        self.device_type = DeviceType::Standard;
        self.input_mode = InputMode::AwaitingCommand;
        self.magic_window = 0;
        self.output_buffer.clear();
    }

    /// Applies button changes and reports them with a zero-motion packet.
    pub fn send_buttons(&mut self, changes: ButtonChanges) {
        self.buttons = changes.apply(self.buttons);
        self.report(0, 0, 0);
    }

    /// Reports relative motion. `dy` is in host orientation (down is positive);
    /// the flip to PS/2 orientation wraps, so -128 stays -128.
    pub fn send_relative(&mut self, dx: i8, dy: i8) {
        self.report(dx, dy, 0);
    }

    /// Reports a vertical wheel step. Positive `delta` scrolls up.
    pub fn send_wheel(&mut self, delta: i8) {
        self.report(0, 0, delta);
    }

    /// Releases every held button.
    pub fn clear(&mut self) {
        if !self.buttons.is_empty() {
            self.buttons = MouseButtons::empty();
            self.report(0, 0, 0);
        }
    }

    /// Builds a movement packet for the current device type and buttons.
    pub fn packet(&self, dx: i8, dy: i8, wheel: i8) -> Ps2Packet {
        let y = dy.wrapping_neg();
        let mut first = 0x08 | (self.buttons.bits() & 0x07);
        if dx < 0 {
            first |= 0x10;
        }
        if y < 0 {
            first |= 0x20;
        }
        let mut bytes = [first, dx as u8, y as u8, 0];
        let z = wheel.saturating_neg();
        let len = match self.device_type {
            DeviceType::Standard => 3,
            DeviceType::Wheel3 => {
                bytes[3] = z as u8;
                4
            }
            DeviceType::Wheel5 => {
                let nibble = (z.clamp(-8, 7) as u8) & 0x0F;
                bytes[3] = nibble | ((self.buttons.bits() << 1) & 0x30);
                4
            }
        };
        Ps2Packet { bytes, len }
    }

    fn report(&mut self, dx: i8, dy: i8, wheel: i8) {
        if !self.is_streaming() {
            return;
        }
        let packet = self.packet(dx, dy, wheel);
        tracing::trace!(packet = ?packet.as_slice(), "mouse packet");
        self.enqueue(packet.as_slice());
    }

    fn enqueue(&mut self, bytes: &[u8]) {
        if self.output_buffer.len() + bytes.len() > OUTPUT_CAPACITY {
            tracing::debug!(dropped = bytes.len(), "mouse output queue full");
            return;
        }
        self.output_buffer.extend(bytes);
    }

    fn push_sample_rate(&mut self, rate: u8) {
        self.magic_window = ((self.magic_window << 8) | u32::from(rate)) & MAGIC_WINDOW_MASK;
        let promoted = match (self.device_type, self.magic_window) {
            (DeviceType::Standard, MAGIC_WHEEL3) => Some(DeviceType::Wheel3),
            (DeviceType::Wheel3, MAGIC_WHEEL5) => Some(DeviceType::Wheel5),
            _ => None,
        };
        if let Some(device_type) = promoted {
            tracing::debug!(?device_type, "mouse capability negotiated");
            self.device_type = device_type;
        }
    }

    fn set_defaults(&mut self) {
        self.mode = Mode::Idle;
        self.sample_rate = DEFAULT_SAMPLE_RATE;
        self.resolution = DEFAULT_RESOLUTION;
        self.scaling_2_1 = false;
    }

    fn status_byte(&self) -> u8 {
        let mut status = 0;
        if self.is_streaming() {
            status |= 0x20;
        }
        if self.scaling_2_1 {
            status |= 0x10;
        }
        if self.buttons.contains(MouseButtons::LEFT) {
            status |= 0x04;
        }
        if self.buttons.contains(MouseButtons::MIDDLE) {
            status |= 0x02;
        }
        if self.buttons.contains(MouseButtons::RIGHT) {
            status |= 0x01;
        }
        status
    }

    fn ack(&mut self) {
        self.enqueue(&[ACK]);
    }
}
