use std::sync::Arc;

use tokio::sync::oneshot;

use crate::drivers::xinput::{
    gamepad::GamepadState,
    output::{LedStatus, Vibration},
};

use super::{SessionHandle, XusbDevice, XusbDriver};

/// A [XusbCommand] is a task executed in order by a
/// [super::queue::DispatchQueue].
#[derive(Debug)]
pub enum XusbCommand {
    /// Create the virtual device of a newly allocated session
    Register {
        handle: SessionHandle,
        device: XusbDevice,
        driver: Arc<dyn XusbDriver>,
    },
    /// Emit the state of an active session
    Input {
        handle: SessionHandle,
        state: GamepadState,
    },
    SetLed {
        handle: SessionHandle,
        status: LedStatus,
    },
    SetVibration {
        handle: SessionHandle,
        vibration: Vibration,
    },
    /// Destroy the virtual device of a released session
    Unregister { handle: SessionHandle },
    /// Reply once every previously enqueued task has run
    Flush(oneshot::Sender<()>),
    Stop,
}

impl XusbCommand {
    /// Returns the name of the command for logging
    pub fn name(&self) -> &'static str {
        match self {
            XusbCommand::Register { .. } => "Register",
            XusbCommand::Input { .. } => "Input",
            XusbCommand::SetLed { .. } => "SetLed",
            XusbCommand::SetVibration { .. } => "SetVibration",
            XusbCommand::Unregister { .. } => "Unregister",
            XusbCommand::Flush(_) => "Flush",
            XusbCommand::Stop => "Stop",
        }
    }
}
