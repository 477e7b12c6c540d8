use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::drivers::{
    xbox360, xbox360_wireless,
    xinput::gamepad::{self, GamepadState},
};

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Buttons")]
    buttons: String,
    #[tabled(rename = "LT")]
    trigger_l: u8,
    #[tabled(rename = "RT")]
    trigger_r: u8,
    #[tabled(rename = "LX")]
    l_stick_x: i16,
    #[tabled(rename = "LY")]
    l_stick_y: i16,
    #[tabled(rename = "RX")]
    r_stick_x: i16,
    #[tabled(rename = "RY")]
    r_stick_y: i16,
}

/// Parse bytes written as hex. Whitespace, commas and colons between bytes
/// are ignored, as is a `0x` prefix on each group.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|part| part.trim_start_matches("0x"))
        .collect();
    let bytes = hex::decode(digits.as_str()).map_err(|e| format!("invalid hex '{input}': {e}"))?;
    Ok(bytes)
}

/// Returns the names of the pressed buttons
pub fn button_names(buttons: u16) -> Vec<&'static str> {
    gamepad::BUTTONS
        .iter()
        .filter(|&&button| buttons & button != 0)
        .map(|&button| gamepad::button_name(button))
        .collect()
}

fn print_state(state: &GamepadState) {
    let row = StateRow {
        buttons: button_names(state.buttons).join(" "),
        trigger_l: state.trigger_l,
        trigger_r: state.trigger_r,
        l_stick_x: state.l_stick_x,
        l_stick_y: state.l_stick_y,
        r_stick_x: state.r_stick_x,
        r_stick_y: state.r_stick_y,
    };
    let mut table = Table::new(vec![row]);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Gamepad State"));
    println!("{table}");
}

/// Decode one packet and print the resulting event
pub fn handle_decode(wireless: bool, hex: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let payload = parse_hex(hex)?;
    if wireless {
        let event = xbox360_wireless::driver::decode(payload.as_slice());
        match event {
            xbox360_wireless::event::Event::Input(state) => print_state(&state),
            event => println!("{event:?}"),
        }
    } else {
        let event = xbox360::driver::decode(payload.as_slice());
        match event {
            xbox360::event::Event::Input(state) => print_state(&state),
            event => println!("{event:?}"),
        }
    }

    Ok(())
}
