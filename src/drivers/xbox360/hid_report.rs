//! Packet layouts of the wired Xbox 360 controller. Outbound packet framing
//! was observed from traffic of the vendor driver and is not documented.
use std::fmt::Display;

use packed_struct::prelude::*;

use crate::drivers::xinput::gamepad::GamepadState;

/// Size of the gamepad state embedded in input reports
pub const GAMEPAD_REPORT_SIZE: usize = 12;
/// Size of an input report including its header
pub const INPUT_REPORT_SIZE: usize = 14;
/// Size of the LED command
pub const LED_REPORT_SIZE: usize = 3;

/// Different packet types, read from the first little-endian word of every
/// inbound packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketType {
    LedStatus = 0x0301,
    Unknown0302 = 0x0302,
    Unknown0303 = 0x0303,
    Attachment = 0x0308,
    Input = 0x1400,
}

impl PacketType {
    pub fn from_u16(header: u16) -> Option<Self> {
        match header {
            0x0301 => Some(Self::LedStatus),
            0x0302 => Some(Self::Unknown0302),
            0x0303 => Some(Self::Unknown0303),
            0x0308 => Some(Self::Attachment),
            0x1400 => Some(Self::Input),
            _ => None,
        }
    }

    pub fn to_u16(&self) -> u16 {
        *self as u16
    }
}

/// Gamepad state as it appears on the wire. The wireless adapter embeds the
/// same layout in its input reports.
// byte  0-1: buttons
// byte    2: left trigger
// byte    3: right trigger
// bytes 4-11: LX, LY, RX, RY
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct GamepadReport {
    #[packed_field(bytes = "0..=1", endian = "lsb")]
    pub buttons: u16,
    #[packed_field(bytes = "2")]
    pub trigger_l: u8,
    #[packed_field(bytes = "3")]
    pub trigger_r: u8,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub l_stick_x: i16,
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub l_stick_y: i16,
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub r_stick_x: i16,
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub r_stick_y: i16,
}

impl From<GamepadReport> for GamepadState {
    fn from(report: GamepadReport) -> Self {
        Self {
            buttons: report.buttons,
            trigger_l: report.trigger_l,
            trigger_r: report.trigger_r,
            l_stick_x: report.l_stick_x,
            l_stick_y: report.l_stick_y,
            r_stick_x: report.r_stick_x,
            r_stick_y: report.r_stick_y,
        }
    }
}

impl From<GamepadState> for GamepadReport {
    fn from(state: GamepadState) -> Self {
        Self {
            buttons: state.buttons,
            trigger_l: state.trigger_l,
            trigger_r: state.trigger_r,
            l_stick_x: state.l_stick_x,
            l_stick_y: state.l_stick_y,
            r_stick_x: state.r_stick_x,
            r_stick_y: state.r_stick_y,
        }
    }
}

/// Input report sent on the interrupt IN endpoint
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "14")]
pub struct InputReport {
    // BYTES 0-1
    #[packed_field(bytes = "0..=1", endian = "lsb")]
    pub header: u16,
    // BYTES 2-13
    #[packed_field(bytes = "2..=13")]
    pub gamepad: GamepadReport,
}

impl Default for InputReport {
    fn default() -> Self {
        Self {
            header: PacketType::Input.to_u16(),
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

/// LED command sent on the interrupt OUT endpoint
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct LedReport {
    #[packed_field(bytes = "0")]
    pub report_type: u8,
    #[packed_field(bytes = "1")]
    pub size: u8,
    #[packed_field(bytes = "2")]
    pub status: u8,
}

impl Default for LedReport {
    fn default() -> Self {
        Self {
            report_type: 0x01,
            size: LED_REPORT_SIZE as u8,
            status: 0,
        }
    }
}
