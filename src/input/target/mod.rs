//! Virtual devices that expose connected controllers to the input subsystem
pub mod capability;
pub mod debug;
pub mod feedback;
pub mod uinput;

#[cfg(test)]
mod capability_test;

use std::{fmt::Debug, io, sync::Arc};

use evdev::{AbsoluteAxisCode, KeyCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use capability::DeviceLayout;
use feedback::FeedbackSink;

/// Possible errors creating or writing to a virtual device
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("virtual device I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("virtual device backend error: {0}")]
    Other(String),
}

/// A single event in a batch written to a virtual device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VirtualEvent {
    Key(KeyCode, bool),
    Axis(AbsoluteAxisCode, i32),
}

/// Creates virtual devices
pub trait VirtualDeviceBackend: Debug + Send + Sync {
    /// Create and register a virtual device with the given layout. Rumble
    /// played on the device by applications is forwarded to the given sink.
    fn create(
        &self,
        layout: &DeviceLayout,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<Box<dyn VirtualDevice>, BackendError>;
}

/// A registered virtual device
pub trait VirtualDevice: Debug + Send {
    /// Write the given batch of events followed by a synchronization marker,
    /// so readers observe the whole batch as one consistent snapshot.
    fn emit(&mut self, events: &[VirtualEvent]) -> Result<(), BackendError>;

    /// Unregister the virtual device
    fn destroy(self: Box<Self>) {}
}

/// Available virtual device backends
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Kernel uinput devices
    #[default]
    Uinput,
    /// Log events instead of creating devices
    Debug,
}

/// Create the backend of the given kind
pub fn new_backend(
    kind: BackendKind,
    name_prefix: Option<String>,
) -> Arc<dyn VirtualDeviceBackend> {
    match kind {
        BackendKind::Uinput => Arc::new(uinput::UinputBackend::new(name_prefix)),
        BackendKind::Debug => Arc::new(debug::DebugBackend::new()),
    }
}
