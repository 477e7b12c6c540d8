use std::fmt::Display;

// Button flags as reported in the `buttons` bitmask of a [GamepadState]
pub const DPAD_UP: u16 = 0x0001;
pub const DPAD_DOWN: u16 = 0x0002;
pub const DPAD_LEFT: u16 = 0x0004;
pub const DPAD_RIGHT: u16 = 0x0008;
pub const START: u16 = 0x0010;
pub const BACK: u16 = 0x0020;
pub const LEFT_THUMB: u16 = 0x0040;
pub const RIGHT_THUMB: u16 = 0x0080;
pub const LEFT_SHOULDER: u16 = 0x0100;
pub const RIGHT_SHOULDER: u16 = 0x0200;
pub const GUIDE: u16 = 0x0400;
pub const RESERVED: u16 = 0x0800;
pub const A: u16 = 0x1000;
pub const B: u16 = 0x2000;
pub const X: u16 = 0x4000;
pub const Y: u16 = 0x8000;

/// All 16 button flags in bit order
pub const BUTTONS: [u16; 16] = [
    DPAD_UP,
    DPAD_DOWN,
    DPAD_LEFT,
    DPAD_RIGHT,
    START,
    BACK,
    LEFT_THUMB,
    RIGHT_THUMB,
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    GUIDE,
    RESERVED,
    A,
    B,
    X,
    Y,
];

/// Returns the name of the given button flag
pub fn button_name(button: u16) -> &'static str {
    match button {
        DPAD_UP => "DPAD_UP",
        DPAD_DOWN => "DPAD_DOWN",
        DPAD_LEFT => "DPAD_LEFT",
        DPAD_RIGHT => "DPAD_RIGHT",
        START => "START",
        BACK => "BACK",
        LEFT_THUMB => "LEFT_THUMB",
        RIGHT_THUMB => "RIGHT_THUMB",
        LEFT_SHOULDER => "LEFT_SHOULDER",
        RIGHT_SHOULDER => "RIGHT_SHOULDER",
        GUIDE => "GUIDE",
        RESERVED => "RESERVED",
        A => "A",
        B => "B",
        X => "X",
        Y => "Y",
        _ => "UNKNOWN",
    }
}

// Recommended deadzones and thresholds
pub const LEFT_THUMB_DEADZONE: i16 = 7849;
pub const RIGHT_THUMB_DEADZONE: i16 = 8689;
pub const TRIGGER_THRESHOLD: u8 = 30;

/// Snapshot of the full state of a gamepad. This is also used in a
/// [super::capability::CapabilityDescriptor] to describe the maximum
/// magnitudes a device can report.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct GamepadState {
    pub buttons: u16,
    pub trigger_l: u8,
    pub trigger_r: u8,
    pub l_stick_x: i16,
    pub l_stick_y: i16,
    pub r_stick_x: i16,
    pub r_stick_y: i16,
}

impl GamepadState {
    /// Returns true if the given button flag is set
    pub fn pressed(&self, button: u16) -> bool {
        self.buttons & button != 0
    }
}

impl Display for GamepadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "buttons: {:#06x} | LT: {:3} | RT: {:3} | LX: {:6} | LY: {:6} | RX: {:6} | RY: {:6}",
            self.buttons,
            self.trigger_l,
            self.trigger_r,
            self.l_stick_x,
            self.l_stick_y,
            self.r_stick_x,
            self.r_stick_y
        )
    }
}
