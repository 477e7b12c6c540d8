//! Derives the input capabilities of a virtual device from a
//! [CapabilityDescriptor] and translates gamepad state into events for it.
use evdev::{AbsoluteAxisCode, KeyCode};

use crate::drivers::xinput::{
    capability::CapabilityDescriptor,
    gamepad::{self, GamepadState, BUTTONS},
};

use super::VirtualEvent;

/// Range of the hat axes
const HAT_MIN: i32 = -1;
const HAT_MAX: i32 = 1;

/// Returns the key code a button flag is exposed as, if any
pub fn button_code(button: u16) -> Option<KeyCode> {
    match button {
        gamepad::DPAD_UP => Some(KeyCode::BTN_DPAD_UP),
        gamepad::DPAD_DOWN => Some(KeyCode::BTN_DPAD_DOWN),
        gamepad::DPAD_LEFT => Some(KeyCode::BTN_DPAD_LEFT),
        gamepad::DPAD_RIGHT => Some(KeyCode::BTN_DPAD_RIGHT),
        gamepad::START => Some(KeyCode::BTN_START),
        gamepad::BACK => Some(KeyCode::BTN_SELECT),
        gamepad::LEFT_THUMB => Some(KeyCode::BTN_THUMBL),
        gamepad::RIGHT_THUMB => Some(KeyCode::BTN_THUMBR),
        gamepad::LEFT_SHOULDER => Some(KeyCode::BTN_TL),
        gamepad::RIGHT_SHOULDER => Some(KeyCode::BTN_TR),
        gamepad::GUIDE => Some(KeyCode::BTN_MODE),
        gamepad::A => Some(KeyCode::BTN_SOUTH),
        gamepad::B => Some(KeyCode::BTN_EAST),
        gamepad::X => Some(KeyCode::BTN_WEST),
        gamepad::Y => Some(KeyCode::BTN_NORTH),
        _ => None,
    }
}

/// Returns the value of a hat axis built from an opposed pair of buttons:
/// -1 if only the negative button is pressed, 1 if only the positive one is,
/// and 0 otherwise.
pub fn hat_value(buttons: u16, negative: u16, positive: u16) -> i32 {
    let negative = (buttons & negative != 0) as i32;
    let positive = (buttons & positive != 0) as i32;
    positive - negative
}

/// Field of a [GamepadState] an axis reads from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AxisSource {
    TriggerL,
    TriggerR,
    LStickX,
    LStickY,
    RStickX,
    RStickY,
    HatX,
    HatY,
}

impl AxisSource {
    /// Read the axis value from the given state
    pub fn value(&self, state: &GamepadState) -> i32 {
        match self {
            AxisSource::TriggerL => state.trigger_l.into(),
            AxisSource::TriggerR => state.trigger_r.into(),
            AxisSource::LStickX => state.l_stick_x.into(),
            AxisSource::LStickY => state.l_stick_y.into(),
            AxisSource::RStickX => state.r_stick_x.into(),
            AxisSource::RStickY => state.r_stick_y.into(),
            AxisSource::HatX => hat_value(state.buttons, gamepad::DPAD_LEFT, gamepad::DPAD_RIGHT),
            AxisSource::HatY => hat_value(state.buttons, gamepad::DPAD_UP, gamepad::DPAD_DOWN),
        }
    }
}

/// A button exposed by the virtual device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ButtonMapping {
    pub button: u16,
    pub code: KeyCode,
}

/// A ranged axis exposed by the virtual device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AxisMapping {
    pub source: AxisSource,
    pub code: AbsoluteAxisCode,
    pub min: i32,
    pub max: i32,
}

/// Everything a backend needs to create a virtual device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLayout {
    pub name: String,
    pub buttons: Vec<ButtonMapping>,
    pub axes: Vec<AxisMapping>,
    /// The D-pad is exposed as a hat instead of four buttons
    pub hat: bool,
    pub force_feedback: bool,
}

impl DeviceLayout {
    /// Build the layout of a virtual device with the given name and
    /// capabilities
    pub fn new(name: &str, capabilities: &CapabilityDescriptor) -> Self {
        let max = &capabilities.gamepad;
        let supported = |button: u16| max.buttons & button != 0;

        let hat = supported(gamepad::DPAD_UP)
            && supported(gamepad::DPAD_DOWN)
            && supported(gamepad::DPAD_LEFT)
            && supported(gamepad::DPAD_RIGHT);
        let dpad = gamepad::DPAD_UP | gamepad::DPAD_DOWN | gamepad::DPAD_LEFT | gamepad::DPAD_RIGHT;

        let buttons = BUTTONS
            .iter()
            .filter(|&&button| supported(button))
            .filter(|&&button| !(hat && button & dpad != 0))
            .filter_map(|&button| button_code(button).map(|code| ButtonMapping { button, code }))
            .collect();

        let mut axes = Vec::new();
        let triggers = [
            (AxisSource::TriggerL, AbsoluteAxisCode::ABS_Z, max.trigger_l),
            (AxisSource::TriggerR, AbsoluteAxisCode::ABS_RZ, max.trigger_r),
        ];
        for (source, code, max) in triggers {
            if max == 0 {
                continue;
            }
            axes.push(AxisMapping {
                source,
                code,
                min: 0,
                max: max.into(),
            });
        }

        let sticks = [
            (AxisSource::LStickX, AbsoluteAxisCode::ABS_X, max.l_stick_x),
            (AxisSource::LStickY, AbsoluteAxisCode::ABS_Y, max.l_stick_y),
            (AxisSource::RStickX, AbsoluteAxisCode::ABS_RX, max.r_stick_x),
            (AxisSource::RStickY, AbsoluteAxisCode::ABS_RY, max.r_stick_y),
        ];
        for (source, code, max) in sticks {
            if max <= 0 {
                continue;
            }
            let max = i32::from(max);
            axes.push(AxisMapping {
                source,
                code,
                min: -max,
                max,
            });
        }

        if hat {
            axes.push(AxisMapping {
                source: AxisSource::HatX,
                code: AbsoluteAxisCode::ABS_HAT0X,
                min: HAT_MIN,
                max: HAT_MAX,
            });
            axes.push(AxisMapping {
                source: AxisSource::HatY,
                code: AbsoluteAxisCode::ABS_HAT0Y,
                min: HAT_MIN,
                max: HAT_MAX,
            });
        }

        Self {
            name: name.to_string(),
            buttons,
            axes,
            hat,
            force_feedback: capabilities.supports_force_feedback(),
        }
    }

    /// Translate the given state into a full batch of events for every
    /// declared button and axis
    pub fn translate(&self, state: &GamepadState) -> Vec<VirtualEvent> {
        let buttons = self
            .buttons
            .iter()
            .map(|mapping| VirtualEvent::Key(mapping.code, state.pressed(mapping.button)));
        let axes = self
            .axes
            .iter()
            .map(|mapping| VirtualEvent::Axis(mapping.code, mapping.source.value(state)));
        buttons.chain(axes).collect()
    }
}
