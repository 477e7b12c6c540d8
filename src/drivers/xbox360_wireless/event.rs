use crate::drivers::xinput::gamepad::GamepadState;

/// Identifies the packet an ignored or unknown event came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Header {
    /// Unrecognized first byte
    Frame(u8),
    /// Link layer sub-event (byte 1)
    Link(u8),
    /// Controller packet header (word at offset 1)
    Controller(u16),
    /// Payload of the given length was too short to classify
    Truncated(usize),
}

/// Events that can be decoded from one wireless adapter interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A controller connected. Attachments (headsets) are not supported, so
    /// an attachment reported with the connection is only noted.
    Connect { attachment: bool },
    Disconnect,
    /// Capability announcement sent by a controller after it connected
    Announce,
    Input(GamepadState),
    Ignored(Header),
    Unknown(Header),
}
