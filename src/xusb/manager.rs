use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    drivers::xinput::{
        gamepad::GamepadState,
        output::{LedStatus, Vibration},
    },
    input::target::VirtualDeviceBackend,
};

use super::{
    client::{ClientError, QueueClient},
    command::XusbCommand,
    queue::DispatchQueue,
    slot::{SlotError, SlotTable},
    SessionHandle, XusbDevice, XusbDriver, MAX_CONTROLLERS,
};

/// Possible errors returned to controller drivers
#[derive(Error, Debug)]
pub enum XusbError {
    #[error("controller limit of {MAX_CONTROLLERS} reached")]
    LimitReached,
    #[error("session `{0}` is no longer registered")]
    StaleHandle(SessionHandle),
    #[error("dispatch queue `{0}` is closed")]
    QueueClosed(usize),
    #[error("input for session `{0}` dropped, too many pending inputs")]
    InputDropped(SessionHandle),
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),
}

/// Registry of connected controllers. Drivers register a session when a
/// controller connects, report its input while it is connected and
/// unregister it when it goes away. None of these calls block; the work is
/// done later by the dispatch queue of the session's slot.
#[derive(Debug)]
pub struct Xusb {
    slots: Arc<SlotTable>,
    queues: Vec<QueueClient>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Xusb {
    /// Create the slot table and start one dispatch queue per slot. Must be
    /// called from within a tokio runtime.
    pub fn new(backend: Arc<dyn VirtualDeviceBackend>, config: &Config) -> Self {
        let slots = Arc::new(SlotTable::new());
        let mut queues = Vec::with_capacity(MAX_CONTROLLERS);
        let mut tasks = Vec::with_capacity(MAX_CONTROLLERS);
        for index in 0..MAX_CONTROLLERS {
            let (queue, client) = DispatchQueue::new(
                index,
                backend.clone(),
                slots.clone(),
                config.max_pending_inputs,
            );
            tasks.push(queue.spawn());
            queues.push(client);
        }

        Self {
            slots,
            queues,
            tasks: Mutex::new(tasks),
        }
    }

    /// Returns the slot table
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    fn queue(&self, index: usize) -> Result<&QueueClient, XusbError> {
        self.queues
            .get(index)
            .ok_or(XusbError::Slot(SlotError::InvalidIndex(index)))
    }

    fn enqueue(&self, index: usize, command: XusbCommand) -> Result<(), XusbError> {
        self.queue(index)?
            .enqueue(command)
            .map_err(|_| XusbError::QueueClosed(index))
    }

    /// Allocate a slot for a newly connected controller and enqueue the
    /// creation of its virtual device.
    pub fn register_device(
        &self,
        driver: Arc<dyn XusbDriver>,
        device: XusbDevice,
    ) -> Result<SessionHandle, XusbError> {
        let handle = match self.slots.allocate(&device.name, device.capabilities) {
            Ok(handle) => handle,
            Err(SlotError::Full) => {
                log::warn!(
                    "Unable to register {}: controller limit reached",
                    device.name
                );
                return Err(XusbError::LimitReached);
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("Allocated slot {} for {}", handle.index, device.name);

        let command = XusbCommand::Register {
            handle,
            device,
            driver,
        };
        if let Err(e) = self.enqueue(handle.index, command) {
            if let Err(release) = self.slots.release_handle(handle) {
                log::debug!("Slot of unqueued session {handle} already released: {release}");
            }
            return Err(e);
        }

        Ok(handle)
    }

    /// Release the slot of the given session and enqueue the destruction of
    /// its virtual device. The slot can be reused immediately.
    pub fn unregister_device(&self, handle: SessionHandle) -> Result<(), XusbError> {
        if let Err(e) = self.slots.release_handle(handle) {
            log::debug!("Unable to release slot of {handle}: {e}");
            return Err(XusbError::StaleHandle(handle));
        }
        log::debug!("Released slot {}", handle.index);
        self.enqueue(handle.index, XusbCommand::Unregister { handle })
    }

    /// Enqueue the given state for emission by the session's virtual device
    pub fn report_input(&self, handle: SessionHandle, state: &GamepadState) -> Result<(), XusbError> {
        if !self.slots.is_current(handle) {
            return Err(XusbError::StaleHandle(handle));
        }
        match self.queue(handle.index)?.enqueue_input(handle, *state) {
            Ok(()) => Ok(()),
            Err(ClientError::QueueFull) => {
                log::debug!("Dropping input for {handle}: too many pending inputs");
                Err(XusbError::InputDropped(handle))
            }
            Err(_) => Err(XusbError::QueueClosed(handle.index)),
        }
    }

    /// Enqueue a request to change the LED pattern of the given session
    pub fn set_led(&self, handle: SessionHandle, status: LedStatus) -> Result<(), XusbError> {
        if !self.slots.is_current(handle) {
            return Err(XusbError::StaleHandle(handle));
        }
        self.enqueue(handle.index, XusbCommand::SetLed { handle, status })
    }

    /// Enqueue a request to rumble the given session
    pub fn set_vibration(
        &self,
        handle: SessionHandle,
        vibration: Vibration,
    ) -> Result<(), XusbError> {
        if !self.slots.is_current(handle) {
            return Err(XusbError::StaleHandle(handle));
        }
        self.enqueue(handle.index, XusbCommand::SetVibration { handle, vibration })
    }

    /// Wait until every task enqueued so far on every queue has run
    pub async fn flush(&self) -> Result<(), XusbError> {
        let results = join_all(self.queues.iter().map(|queue| queue.flush())).await;
        for (index, result) in results.into_iter().enumerate() {
            if result.is_err() {
                return Err(XusbError::QueueClosed(index));
            }
        }
        Ok(())
    }

    /// Stop every queue once its pending tasks have run, then wait for them
    pub async fn stop(&self) -> Result<(), XusbError> {
        for (index, queue) in self.queues.iter().enumerate() {
            if queue.stop().is_err() {
                log::debug!("Dispatch queue {index} already stopped");
            }
        }
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for (index, result) in join_all(tasks).await.into_iter().enumerate() {
            if let Err(e) = result {
                log::error!("Dispatch queue {index} failed: {e}");
                return Err(XusbError::QueueClosed(index));
            }
        }
        Ok(())
    }
}
