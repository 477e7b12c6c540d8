use std::sync::Arc;

use thiserror::Error;

use crate::{
    drivers::xinput::{
        gamepad::GamepadState,
        output::{LedStatus, Vibration},
    },
    input::{
        source::TransportError,
        target::{
            capability::DeviceLayout, feedback::FeedbackSink, BackendError, VirtualDevice,
            VirtualDeviceBackend,
        },
    },
};

use super::{SessionHandle, XusbDevice, XusbDriver};

/// Possible errors while driving a [Session]
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    #[error("session is not active")]
    NotActive,
    #[error("virtual device error: {0}")]
    Backend(#[from] BackendError),
    #[error("controller output error: {0}")]
    Output(#[from] TransportError),
}

/// Lifecycle of a [Session]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Slot allocated, virtual device not created yet
    Connecting,
    /// Virtual device created and accepting input
    Active,
    /// Slot released, virtual device still being torn down
    Disconnecting,
    /// Virtual device destroyed
    Released,
}

impl SessionState {
    /// Returns true if a session may move from this state to the given one.
    /// A session that never became active may be released directly.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Connecting, SessionState::Active)
                | (SessionState::Connecting, SessionState::Disconnecting)
                | (SessionState::Connecting, SessionState::Released)
                | (SessionState::Active, SessionState::Disconnecting)
                | (SessionState::Disconnecting, SessionState::Released)
        )
    }
}

/// The live binding between a slot, the controller driver and the virtual
/// device exposing it. Once handed to its dispatch queue a session is only
/// ever touched by that queue's executor.
#[derive(Debug)]
pub struct Session {
    handle: SessionHandle,
    device: XusbDevice,
    driver: Arc<dyn XusbDriver>,
    layout: DeviceLayout,
    target: Option<Box<dyn VirtualDevice>>,
    state: SessionState,
}

impl Session {
    pub fn new(handle: SessionHandle, device: XusbDevice, driver: Arc<dyn XusbDriver>) -> Self {
        let layout = DeviceLayout::new(device.name.as_str(), device.capabilities);
        Self {
            handle,
            device,
            driver,
            layout,
            target: None,
            state: SessionState::Connecting,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn device(&self) -> &XusbDevice {
        &self.device
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        log::trace!("Session {}: {:?} -> {:?}", self.handle, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Create the virtual device and make the session active. Rumble played
    /// on the virtual device is delivered to the given sink.
    pub fn register(
        &mut self,
        backend: &dyn VirtualDeviceBackend,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Active,
            });
        }
        let target = backend.create(&self.layout, feedback)?;
        self.target = Some(target);
        self.transition(SessionState::Active)
    }

    /// Emit the given state as one synchronized batch
    pub fn report(&mut self, state: &GamepadState) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive);
        }
        let Some(target) = self.target.as_mut() else {
            return Err(SessionError::NotActive);
        };
        let events = self.layout.translate(state);
        target.emit(events.as_slice())?;
        Ok(())
    }

    pub fn set_led(&self, status: LedStatus) -> Result<(), SessionError> {
        self.driver.set_led(status)?;
        Ok(())
    }

    pub fn set_vibration(&self, vibration: Vibration) -> Result<(), SessionError> {
        self.driver.set_vibration(vibration)?;
        Ok(())
    }

    /// Mark the session as being torn down
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Disconnecting)
    }

    /// Destroy the virtual device, if one was created
    pub fn release(mut self) -> SessionState {
        if self.state == SessionState::Active {
            self.state = SessionState::Disconnecting;
        }
        if let Some(target) = self.target.take() {
            target.destroy();
        }
        if let Err(e) = self.transition(SessionState::Released) {
            log::warn!("Releasing session {}: {e}", self.handle);
        }
        self.state = SessionState::Released;
        self.state
    }
}
