use super::{
    gamepad::{self, GamepadState},
    output::Vibration,
};

pub const DEVTYPE_GAMEPAD: u8 = 0x01;

pub const DEVSUBTYPE_GAMEPAD: u8 = 0x01;
pub const DEVSUBTYPE_WHEEL: u8 = 0x02;
pub const DEVSUBTYPE_ARCADE_STICK: u8 = 0x03;
pub const DEVSUBTYPE_FLIGHT_STICK: u8 = 0x04;
pub const DEVSUBTYPE_DANCE_PAD: u8 = 0x05;
pub const DEVSUBTYPE_GUITAR: u8 = 0x06;
pub const DEVSUBTYPE_DRUM_KIT: u8 = 0x08;

pub const CAPS_FFB_SUPPORTED: u16 = 0x0001;
pub const CAPS_VOICE_SUPPORTED: u16 = 0x0004;

/// Buttons present on every known Xbox 360 gamepad
pub const XBOX360_BUTTON_MASK: u16 = gamepad::DPAD_UP
    | gamepad::DPAD_DOWN
    | gamepad::DPAD_LEFT
    | gamepad::DPAD_RIGHT
    | gamepad::START
    | gamepad::BACK
    | gamepad::LEFT_THUMB
    | gamepad::RIGHT_THUMB
    | gamepad::LEFT_SHOULDER
    | gamepad::RIGHT_SHOULDER
    | gamepad::A
    | gamepad::B
    | gamepad::X
    | gamepad::Y;

const XBOX360_GAMEPAD_MAX: GamepadState = GamepadState {
    buttons: XBOX360_BUTTON_MASK,
    trigger_l: u8::MAX,
    trigger_r: u8::MAX,
    l_stick_x: i16::MAX,
    l_stick_y: i16::MAX,
    r_stick_x: i16::MAX,
    r_stick_y: i16::MAX,
};

const XBOX360_VIBRATION_MAX: Vibration = Vibration {
    left_motor: u16::MAX,
    right_motor: u16::MAX,
};

/// Static description of what a device model can do. The `gamepad` field holds
/// the supported button mask and the maximum magnitude of every trigger and
/// axis; a zero maximum means the input is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub device_type: u8,
    pub sub_type: u8,
    pub flags: u16,
    pub gamepad: GamepadState,
    pub vibration: Vibration,
    /// The device has numbered player indicators that can be driven with
    /// [super::output::LedStatus::player].
    pub player_leds: bool,
}

impl CapabilityDescriptor {
    /// Returns true if the device can rumble
    pub fn supports_force_feedback(&self) -> bool {
        self.flags & CAPS_FFB_SUPPORTED != 0
            && (self.vibration.left_motor > 0 || self.vibration.right_motor > 0)
    }
}

/// All known wired controllers have the same capabilities
pub static XBOX360_WIRED: CapabilityDescriptor = CapabilityDescriptor {
    name: "Xbox 360 Wired Controller",
    device_type: DEVTYPE_GAMEPAD,
    sub_type: DEVSUBTYPE_GAMEPAD,
    flags: CAPS_FFB_SUPPORTED,
    gamepad: XBOX360_GAMEPAD_MAX,
    vibration: XBOX360_VIBRATION_MAX,
    player_leds: true,
};

/// The announce packet of wireless controllers is not decoded, so they are
/// assumed to match the wired controller.
pub static XBOX360_WIRELESS: CapabilityDescriptor = CapabilityDescriptor {
    name: "Xbox 360 Wireless Controller",
    device_type: DEVTYPE_GAMEPAD,
    sub_type: DEVSUBTYPE_GAMEPAD,
    flags: CAPS_FFB_SUPPORTED,
    gamepad: XBOX360_GAMEPAD_MAX,
    vibration: XBOX360_VIBRATION_MAX,
    player_leds: true,
};
