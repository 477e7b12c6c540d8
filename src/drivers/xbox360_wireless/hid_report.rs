//! Packet layouts of the Xbox 360 wireless adapter. Outbound framing was
//! observed from traffic of the vendor driver; the meaning of the constant
//! bytes is unknown and they must be sent exactly as-is.
use std::fmt::Display;

use packed_struct::prelude::*;

use crate::drivers::{xbox360::hid_report::GamepadReport, xinput::gamepad::GamepadState};

/// Size of a controller input report including its framing
pub const INPUT_REPORT_SIZE: usize = 18;
pub const LED_REPORT_SIZE: usize = 10;
pub const VIBRATION_REPORT_SIZE: usize = 12;
pub const PRESENCE_REPORT_SIZE: usize = 12;

/// First byte of every inbound packet
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameType {
    /// Event from the controller
    Controller = 0x00,
    /// Event from the adapter (link layer)
    Link = 0x08,
}

impl FrameType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Controller),
            0x08 => Some(Self::Link),
            _ => None,
        }
    }
}

/// Second byte of link layer packets
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Disconnect = 0x00,
    AttachmentConnected = 0x40,
    Connect = 0x80,
    ConnectWithAttachment = 0xC0,
}

impl LinkEvent {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Disconnect),
            0x40 => Some(Self::AttachmentConnected),
            0x80 => Some(Self::Connect),
            0xC0 => Some(Self::ConnectWithAttachment),
            _ => None,
        }
    }
}

/// Little-endian word at offset 1 of controller packets
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerPacket {
    Input = 0x0001,
    /// Caused by an attachment connecting; 14 bytes past it is the serial
    AttachmentSerial = 0x0009,
    /// Caused by an attachment connecting; description string delimited by 0xFF
    AttachmentDescription = 0x000A,
    /// Controller capabilities. The structure is not known.
    Announce = 0x000F,
    /// Seems to be a ping
    Ping = 0x01F8,
    /// Seems to complement [ControllerPacket::Ping]
    Pong = 0x02F8,
}

impl ControllerPacket {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Input),
            0x0009 => Some(Self::AttachmentSerial),
            0x000A => Some(Self::AttachmentDescription),
            0x000F => Some(Self::Announce),
            0x01F8 => Some(Self::Ping),
            0x02F8 => Some(Self::Pong),
            _ => None,
        }
    }
}

/// Controller input report
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "18")]
pub struct InputReport {
    // BYTE 0
    #[packed_field(bytes = "0")]
    pub frame_type: u8,
    // BYTES 1-2
    #[packed_field(bytes = "1..=2", endian = "lsb")]
    pub header: u16,
    // BYTES 3-5, purpose unknown
    #[packed_field(bytes = "3..=5")]
    pub unknown: [u8; 3],
    // BYTES 6-17
    #[packed_field(bytes = "6..=17")]
    pub gamepad: GamepadReport,
}

impl Default for InputReport {
    fn default() -> Self {
        Self {
            frame_type: FrameType::Controller as u8,
            header: ControllerPacket::Input as u16,
            unknown: [0; 3],
            gamepad: GamepadReport::default(),
        }
    }
}

impl Display for InputReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "header: {:#06x} | {}",
            self.header,
            GamepadState::from(self.gamepad)
        )
    }
}

/// LED command. The status is offset by 0x40.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "10")]
pub struct LedReport {
    #[packed_field(bytes = "0..=1")]
    pub prefix: [u8; 2],
    #[packed_field(bytes = "2")]
    pub command: u8,
    #[packed_field(bytes = "3")]
    pub status: u8,
    #[packed_field(bytes = "4..=9")]
    pub padding: [u8; 6],
}

impl Default for LedReport {
    fn default() -> Self {
        Self {
            prefix: [0x00, 0x00],
            command: 0x08,
            status: 0x40,
            padding: [0; 6],
        }
    }
}

/// Rumble command, one byte of magnitude per motor
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct VibrationReport {
    #[packed_field(bytes = "0..=4")]
    pub prefix: [u8; 5],
    #[packed_field(bytes = "5")]
    pub left_motor: u8,
    #[packed_field(bytes = "6")]
    pub right_motor: u8,
    #[packed_field(bytes = "7..=11")]
    pub padding: [u8; 5],
}

impl Default for VibrationReport {
    fn default() -> Self {
        Self {
            prefix: [0x00, 0x01, 0x0F, 0xC0, 0x00],
            left_motor: 0,
            right_motor: 0,
            padding: [0; 5],
        }
    }
}

/// Makes the adapter resend the connection state of its controllers
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct PresenceReport {
    #[packed_field(bytes = "0..=3")]
    pub prefix: [u8; 4],
    #[packed_field(bytes = "4..=11")]
    pub padding: [u8; 8],
}

impl Default for PresenceReport {
    fn default() -> Self {
        Self {
            prefix: [0x08, 0x00, 0x0F, 0xC0],
            padding: [0; 8],
        }
    }
}
