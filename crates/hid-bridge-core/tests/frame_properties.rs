//! Integration tests for the frame path: bytes in, backend calls and
//! response bytes out, through the public API only.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hid_bridge_core::keymap::{lookup, KeyId, Ps2KeyType};
use hid_bridge_core::output::mock::{KeyboardEvent, MockKeyboard, MockMouse};
use hid_bridge_core::output::{EndpointError, HidEndpoint, MemoryStorage, UsbKeyboard};
use hid_bridge_core::protocol::{
    ButtonChanges, Command, CommandFrame, MouseButtons, MouseKind, OutputSelection, ResponseCode,
    ResponseFrame, FRAME_LEN, LEGACY_REPEAT, RESPONSE_LEN,
};
use hid_bridge_core::transport::uart::UartTransport;
use hid_bridge_core::transport::SerialPort;
use hid_bridge_core::{CommandDispatcher, Keyboard, Mouse, Responder};

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakePort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl SerialPort for FakePort {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }
}

impl FakePort {
    /// Sends one frame and returns the single response it produced.
    fn roundtrip(&mut self, uart: &mut UartTransport, frame: &[u8]) -> [u8; RESPONSE_LEN] {
        self.tx.clear();
        self.rx.extend(frame);
        uart.poll(self, 0).expect("fake port never fails");
        assert_eq!(self.tx.len(), RESPONSE_LEN, "exactly one response per frame");
        let mut response = [0u8; RESPONSE_LEN];
        response.copy_from_slice(&self.tx);
        response
    }
}

#[derive(Clone, Default)]
struct RecordingEndpoint {
    reports: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl HidEndpoint for RecordingEndpoint {
    fn is_ready(&self) -> bool {
        true
    }

    fn send_report(&mut self, report: &[u8]) -> Result<(), EndpointError> {
        self.reports.lock().unwrap().push(report.to_vec());
        Ok(())
    }

    fn led_report(&self) -> u8 {
        0
    }
}

fn uart_with(keyboard: Box<dyn Keyboard>, mouse: Box<dyn Mouse>) -> UartTransport {
    let dispatcher = CommandDispatcher::new(
        keyboard,
        mouse,
        Box::new(MemoryStorage::new()),
        OutputSelection::default(),
    );
    UartTransport::new(Responder::new(dispatcher))
}

fn code(response: &[u8]) -> ResponseCode {
    ResponseFrame::parse(response).expect("valid response").code
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn test_any_single_bit_flip_is_a_crc_error_and_never_dispatched() {
    // Arrange
    let keyboard = MockKeyboard::new();
    let mouse = MockMouse::new();
    let (key_events, mouse_events) = (keyboard.events(), mouse.events());
    let mut uart = uart_with(Box::new(keyboard), Box::new(mouse));
    let mut port = FakePort::default();
    let frames = [
        Command::Key {
            key: 1,
            pressed: true,
        }
        .to_frame()
        .encode(),
        Command::MouseMove { x: 100, y: -100 }.to_frame().encode(),
    ];

    for frame in frames {
        for byte in 0..FRAME_LEN {
            for bit in 0..8 {
                // Act
                let mut corrupted = frame;
                corrupted[byte] ^= 1 << bit;
                let response = port.roundtrip(&mut uart, &corrupted);

                // Assert
                assert_eq!(code(&response), ResponseCode::CrcError, "byte {byte} bit {bit}");
            }
        }
    }
    assert!(key_events.lock().unwrap().is_empty());
    assert!(mouse_events.lock().unwrap().is_empty());
}

#[test]
fn test_repeat_reproduces_previous_response_byte_for_byte() {
    let mut uart = uart_with(Box::new(MockKeyboard::new()), Box::new(MockMouse::new()));
    let mut port = FakePort::default();
    let commands = [
        Command::Ping,
        Command::SetConnected(false),
        Command::SetMouse(MouseKind::UsbRel),
        Command::Key {
            key: 200,
            pressed: true,
        },
    ];

    for command in commands {
        let first = port.roundtrip(&mut uart, &command.to_frame().encode());
        let repeated = port.roundtrip(&mut uart, &Command::Repeat.to_frame().encode());
        let legacy = port.roundtrip(&mut uart, &CommandFrame::new(LEGACY_REPEAT, [0; 4]).encode());
        assert_eq!(repeated, first, "{command:?}");
        assert_eq!(legacy, first, "{command:?}");
    }
}

#[test]
fn test_clear_press_clear_returns_to_startup_state() {
    // Arrange
    let keyboard = MockKeyboard::new();
    let mouse = MockMouse::new();
    let (held, buttons) = (keyboard.held(), mouse.buttons());
    let mut uart = uart_with(Box::new(keyboard), Box::new(mouse));
    let mut port = FakePort::default();
    let initial_held = held.lock().unwrap().clone();
    let initial_buttons = *buttons.lock().unwrap();

    // Act
    port.roundtrip(&mut uart, &Command::ClearHid.to_frame().encode());
    for key in [KeyId::ShiftLeft, KeyId::KeyQ, KeyId::Home] {
        let frame = Command::Key {
            key: key.as_u8(),
            pressed: true,
        }
        .to_frame()
        .encode();
        port.roundtrip(&mut uart, &frame);
    }
    let press = Command::MouseButtons(ButtonChanges {
        selected: MouseButtons::LEFT | MouseButtons::BACK,
        pressed: MouseButtons::LEFT | MouseButtons::BACK,
    });
    port.roundtrip(&mut uart, &press.to_frame().encode());
    let held_before_clear = held.lock().unwrap().len();
    port.roundtrip(&mut uart, &Command::ClearHid.to_frame().encode());

    // Assert
    assert_eq!(held_before_clear, 3);
    assert_eq!(*held.lock().unwrap(), initial_held);
    assert_eq!(*buttons.lock().unwrap(), initial_buttons);
}

#[test]
fn test_every_mapped_key_has_consistent_translations() {
    for id in 0..=u8::MAX {
        let Some(entry) = lookup(id) else {
            continue;
        };
        let usage = entry.usb_usage;
        assert!(
            (0x04..=0x8B).contains(&usage) || (0xE0..=0xE7).contains(&usage),
            "id {id}: usage 0x{usage:02X}"
        );
        let make = entry.ps2_sequence(true);
        let brk = entry.ps2_sequence(false);
        match entry.ps2_type {
            Ps2KeyType::Regular => {
                assert_eq!(make.as_slice(), &[entry.ps2_code]);
                assert_eq!(brk.as_slice(), &[0xF0, entry.ps2_code]);
            }
            Ps2KeyType::Special => {
                assert_eq!(make.as_slice(), &[0xE0, entry.ps2_code]);
                assert_eq!(brk.as_slice(), &[0xE0, 0xF0, entry.ps2_code]);
            }
            Ps2KeyType::PrintScreen => assert_eq!(make.as_slice().len(), 4),
            Ps2KeyType::Pause => assert!(brk.is_empty()),
        }
    }
}

#[test]
fn test_key_a_end_to_end_on_usb_keyboard() {
    // Arrange
    let endpoint = RecordingEndpoint::default();
    let reports = Arc::clone(&endpoint.reports);
    let keyboard = UsbKeyboard::new(Box::new(endpoint));
    let mut uart = uart_with(Box::new(keyboard), Box::new(MockMouse::new()));
    let mut port = FakePort::default();

    // Act
    let pressed = port.roundtrip(
        &mut uart,
        &Command::Key {
            key: 1,
            pressed: true,
        }
        .to_frame()
        .encode(),
    );
    let released = port.roundtrip(
        &mut uart,
        &Command::Key {
            key: 1,
            pressed: false,
        }
        .to_frame()
        .encode(),
    );

    // Assert
    assert!(matches!(code(&pressed), ResponseCode::Pong(_)));
    assert!(matches!(code(&released), ResponseCode::Pong(_)));
    assert_eq!(
        *reports.lock().unwrap(),
        vec![vec![0, 0, 0x04, 0, 0, 0, 0, 0], vec![0; 8]]
    );
}

#[test]
fn test_key_a_end_to_end_on_mock_keyboard() {
    let keyboard = MockKeyboard::new();
    let (events, held) = (keyboard.events(), keyboard.held());
    let mut uart = uart_with(Box::new(keyboard), Box::new(MockMouse::new()));
    let mut port = FakePort::default();

    port.roundtrip(
        &mut uart,
        &Command::Key {
            key: 1,
            pressed: true,
        }
        .to_frame()
        .encode(),
    );
    assert_eq!(*held.lock().unwrap(), vec![KeyId::KeyA]);
    port.roundtrip(
        &mut uart,
        &Command::Key {
            key: 1,
            pressed: false,
        }
        .to_frame()
        .encode(),
    );

    assert!(held.lock().unwrap().is_empty());
    assert_eq!(
        events.lock().unwrap()[0],
        KeyboardEvent::Key {
            key: KeyId::KeyA,
            usb_usage: 0x04,
            pressed: true
        }
    );
}
