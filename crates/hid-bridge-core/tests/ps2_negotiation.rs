//! Integration tests for the PS/2 mouse wheel negotiation as a BIOS or
//! OS driver performs it: command bytes in, reply bytes and packets out.

use hid_bridge_core::protocol::{ButtonChanges, MouseButtons};
use hid_bridge_core::ps2::{DeviceType, Ps2Mouse};

const SET_SAMPLE_RATE: u8 = 0xF3;
const GET_DEVICE_ID: u8 = 0xF2;
const ENABLE_REPORTING: u8 = 0xF4;
const RESET: u8 = 0xFF;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn send(mouse: &mut Ps2Mouse, bytes: &[u8]) -> Vec<u8> {
    for &byte in bytes {
        mouse.input(byte);
    }
    std::iter::from_fn(|| mouse.output()).collect()
}

fn set_rates(mouse: &mut Ps2Mouse, rates: &[u8]) {
    for &rate in rates {
        send(mouse, &[SET_SAMPLE_RATE, rate]);
    }
}

fn device_id(mouse: &mut Ps2Mouse) -> u8 {
    let reply = send(mouse, &[GET_DEVICE_ID]);
    assert_eq!(reply.len(), 2);
    reply[1]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_driver_probe_promotes_to_wheel_then_five_buttons() {
    // Arrange
    let mut mouse = Ps2Mouse::new();
    assert_eq!(send(&mut mouse, &[RESET]), vec![0xFA, 0xAA, 0x00]);

    // Act / Assert
    set_rates(&mut mouse, &[200, 100, 80]);
    assert_eq!(device_id(&mut mouse), 3);

    set_rates(&mut mouse, &[200, 200, 80]);
    assert_eq!(device_id(&mut mouse), 4);
    assert_eq!(mouse.device_type(), DeviceType::Wheel5);
}

#[test]
fn test_interrupted_sequence_keeps_standard_mouse() {
    let mut mouse = Ps2Mouse::new();

    set_rates(&mut mouse, &[200, 100]);
    send(&mut mouse, &[GET_DEVICE_ID]);
    set_rates(&mut mouse, &[80]);

    assert_eq!(device_id(&mut mouse), 0);
}

#[test]
fn test_five_button_sequence_needs_wheel_first() {
    let mut mouse = Ps2Mouse::new();

    set_rates(&mut mouse, &[200, 200, 80]);

    assert_eq!(mouse.device_type(), DeviceType::Standard);
}

#[test]
fn test_reset_after_negotiation_reports_standard_again() {
    let mut mouse = Ps2Mouse::new();
    set_rates(&mut mouse, &[200, 100, 80]);

    let reply = send(&mut mouse, &[RESET]);

    assert_eq!(reply, vec![0xFA, 0xAA, 0x00]);
    assert_eq!(mouse.device_type(), DeviceType::Standard);
}

#[test]
fn test_five_button_packet_for_button_only_change() {
    // Arrange
    let mut mouse = Ps2Mouse::new();
    set_rates(&mut mouse, &[200, 100, 80, 200, 200, 80]);
    send(&mut mouse, &[ENABLE_REPORTING]);

    // Act
    mouse.send_buttons(ButtonChanges {
        selected: MouseButtons::LEFT | MouseButtons::BACK,
        pressed: MouseButtons::LEFT | MouseButtons::BACK,
    });
    let packet: Vec<u8> = std::iter::from_fn(|| mouse.output()).collect();

    // Assert
    assert_eq!(packet.len(), 4);
    assert_eq!(packet[0], 0x09);
    assert_eq!(&packet[1..3], &[0, 0]);
    assert_eq!(packet[3] & 0x0F, 0, "wheel nibble is zero");
    assert_eq!(packet[3] & 0x30, 0x10, "4th button bit set");
}

#[test]
fn test_standard_mouse_packets_are_three_bytes() {
    let mut mouse = Ps2Mouse::new();
    send(&mut mouse, &[ENABLE_REPORTING]);

    mouse.send_relative(5, 3);
    let packet: Vec<u8> = std::iter::from_fn(|| mouse.output()).collect();

    // Host "down" becomes PS/2 negative y.
    assert_eq!(packet, vec![0x28, 5, (-3i8) as u8]);
}
