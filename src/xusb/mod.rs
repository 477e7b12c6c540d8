//! Session manager shared by all controller drivers.
//!
//! Packets are decoded on the receive path, which must never block. Creating
//! and destroying virtual devices, emitting input and writing LED/rumble
//! commands can block, so the receive path only enqueues tasks onto one of
//! [MAX_CONTROLLERS] ordered queues, one per slot. Each queue runs its tasks
//! one at a time, in the order they were enqueued.
pub mod client;
pub mod command;
pub mod manager;
pub mod queue;
pub mod session;
pub mod slot;

#[cfg(test)]
mod manager_test;

use std::fmt::{Debug, Display};

use crate::{
    drivers::xinput::{
        capability::CapabilityDescriptor,
        output::{LedStatus, Vibration},
    },
    input::source::TransportError,
};

pub use manager::{Xusb, XusbError};

/// Number of controllers that can be connected at the same time
pub const MAX_CONTROLLERS: usize = 4;

/// Output callbacks implemented by each controller driver. These are invoked
/// from the dispatch queue of the session and may block.
pub trait XusbDriver: Debug + Send + Sync {
    /// Returns true if the USB device is still attached
    fn is_attached(&self) -> bool {
        true
    }
    /// Set the LED pattern of the controller
    fn set_led(&self, status: LedStatus) -> Result<(), TransportError>;
    /// Set the rumble motor magnitudes of the controller
    fn set_vibration(&self, vibration: Vibration) -> Result<(), TransportError>;
}

/// Describes the device being registered
#[derive(Debug, Clone)]
pub struct XusbDevice {
    pub name: String,
    pub capabilities: &'static CapabilityDescriptor,
}

impl XusbDevice {
    /// Create a device description using the name of the capability descriptor
    pub fn from_capabilities(capabilities: &'static CapabilityDescriptor) -> Self {
        Self {
            name: capabilities.name.to_string(),
            capabilities,
        }
    }
}

/// Identifies one registered session. The generation distinguishes successive
/// sessions that occupy the same slot, so a handle kept past its session's
/// lifetime never addresses the next occupant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub index: usize,
    pub generation: u64,
}

impl Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "xusb{}#{}", self.index, self.generation)
    }
}
