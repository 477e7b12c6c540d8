use std::error::Error;

use evdev::{AbsoluteAxisCode, KeyCode};

use crate::{
    drivers::xinput::{
        capability::{CapabilityDescriptor, XBOX360_WIRED},
        gamepad::{self, GamepadState},
    },
    input::target::{
        capability::{button_code, hat_value, DeviceLayout},
        VirtualEvent,
    },
};

#[tokio::test]
async fn test_hat_value() -> Result<(), Box<dyn Error>> {
    let (left, right) = (gamepad::DPAD_LEFT, gamepad::DPAD_RIGHT);
    assert_eq!(hat_value(0, left, right), 0);
    assert_eq!(hat_value(left, left, right), -1);
    assert_eq!(hat_value(right, left, right), 1);
    assert_eq!(hat_value(left | right, left, right), 0);
    // Unrelated buttons do not affect the hat
    assert_eq!(hat_value(gamepad::A | gamepad::DPAD_UP, left, right), 0);

    Ok(())
}

#[tokio::test]
async fn test_button_codes() -> Result<(), Box<dyn Error>> {
    assert_eq!(button_code(gamepad::A), Some(KeyCode::BTN_SOUTH));
    assert_eq!(button_code(gamepad::Y), Some(KeyCode::BTN_NORTH));
    assert_eq!(button_code(gamepad::BACK), Some(KeyCode::BTN_SELECT));
    assert_eq!(button_code(gamepad::GUIDE), Some(KeyCode::BTN_MODE));
    assert_eq!(button_code(gamepad::RESERVED), None);

    Ok(())
}

#[tokio::test]
async fn test_wired_layout() -> Result<(), Box<dyn Error>> {
    let layout = DeviceLayout::new("Test Pad", &XBOX360_WIRED);
    println!("Layout: {layout:?}");

    assert_eq!(layout.name, "Test Pad");
    assert!(layout.hat);
    assert!(layout.force_feedback);

    // D-pad is exposed as a hat, not as buttons
    let codes: Vec<KeyCode> = layout.buttons.iter().map(|m| m.code).collect();
    assert!(!codes.contains(&KeyCode::BTN_DPAD_UP));
    assert!(codes.contains(&KeyCode::BTN_SOUTH));
    assert!(codes.contains(&KeyCode::BTN_THUMBR));
    // Guide is absent from the wired button mask
    assert!(!codes.contains(&KeyCode::BTN_MODE));
    assert_eq!(codes.len(), 10);

    let axes: Vec<(AbsoluteAxisCode, i32, i32)> =
        layout.axes.iter().map(|a| (a.code, a.min, a.max)).collect();
    assert!(axes.contains(&(AbsoluteAxisCode::ABS_Z, 0, 255)));
    assert!(axes.contains(&(AbsoluteAxisCode::ABS_X, -32767, 32767)));
    assert!(axes.contains(&(AbsoluteAxisCode::ABS_HAT0X, -1, 1)));
    assert!(axes.contains(&(AbsoluteAxisCode::ABS_HAT0Y, -1, 1)));
    assert_eq!(axes.len(), 8);

    Ok(())
}

#[tokio::test]
async fn test_partial_dpad_layout() -> Result<(), Box<dyn Error>> {
    // Without both pairs of directions the D-pad stays as buttons
    let mut caps: CapabilityDescriptor = XBOX360_WIRED.clone();
    caps.gamepad.buttons &= !gamepad::DPAD_RIGHT;
    caps.gamepad.r_stick_x = 0;
    caps.gamepad.r_stick_y = 0;
    caps.vibration.left_motor = 0;
    caps.vibration.right_motor = 0;

    let layout = DeviceLayout::new("Partial", &caps);
    assert!(!layout.hat);
    assert!(!layout.force_feedback);

    let codes: Vec<KeyCode> = layout.buttons.iter().map(|m| m.code).collect();
    assert!(codes.contains(&KeyCode::BTN_DPAD_UP));
    assert!(codes.contains(&KeyCode::BTN_DPAD_LEFT));
    assert!(!codes.contains(&KeyCode::BTN_DPAD_RIGHT));

    let axes: Vec<AbsoluteAxisCode> = layout.axes.iter().map(|a| a.code).collect();
    assert!(!axes.contains(&AbsoluteAxisCode::ABS_RX));
    assert!(!axes.contains(&AbsoluteAxisCode::ABS_HAT0X));

    Ok(())
}

#[tokio::test]
async fn test_translate() -> Result<(), Box<dyn Error>> {
    let layout = DeviceLayout::new("Test Pad", &XBOX360_WIRED);
    let state = GamepadState {
        buttons: gamepad::A | gamepad::DPAD_LEFT | gamepad::DPAD_DOWN,
        trigger_l: 10,
        trigger_r: 0,
        l_stick_x: -100,
        l_stick_y: 200,
        r_stick_x: 0,
        r_stick_y: i16::MIN,
    };
    let events = layout.translate(&state);

    // Every declared input is part of the batch
    assert_eq!(events.len(), layout.buttons.len() + layout.axes.len());
    assert!(events.contains(&VirtualEvent::Key(KeyCode::BTN_SOUTH, true)));
    assert!(events.contains(&VirtualEvent::Key(KeyCode::BTN_EAST, false)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_Z, 10)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_X, -100)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_Y, 200)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_RY, -32768)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_HAT0X, -1)));
    assert!(events.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_HAT0Y, 1)));

    Ok(())
}
