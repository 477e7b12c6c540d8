use crate::drivers::xinput::gamepad::GamepadState;

/// Events that can be decoded from the wired controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Full state of the gamepad
    Input(GamepadState),
    /// Recognized packet that carries nothing actionable. Holds the header.
    Ignored(u16),
    /// Unrecognized header, or `None` if the payload was too short to hold
    /// one.
    Unknown(Option<u16>),
}
