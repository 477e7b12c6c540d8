use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::mpsc::{self, UnboundedReceiver, WeakUnboundedSender};

use crate::{
    drivers::xinput::output::{LedStatus, Vibration},
    input::target::{feedback::FeedbackSink, VirtualDeviceBackend},
};

use super::{
    client::QueueClient,
    command::XusbCommand,
    session::{Session, SessionState},
    slot::SlotTable,
    SessionHandle, XusbDevice, XusbDriver,
};

/// Ordered task runner for one slot. Tasks run one at a time on a blocking
/// thread, in the order they were enqueued. The queue exclusively owns the
/// [Session] occupying its slot.
#[derive(Debug)]
pub struct DispatchQueue {
    index: usize,
    rx: UnboundedReceiver<XusbCommand>,
    feedback_tx: WeakUnboundedSender<XusbCommand>,
    pending_inputs: Arc<AtomicUsize>,
    backend: Arc<dyn VirtualDeviceBackend>,
    slots: Arc<SlotTable>,
    session: Option<Session>,
}

impl DispatchQueue {
    /// Create a new queue for the given slot and a client to feed it
    pub fn new(
        index: usize,
        backend: Arc<dyn VirtualDeviceBackend>,
        slots: Arc<SlotTable>,
        max_pending_inputs: usize,
    ) -> (Self, QueueClient) {
        let (tx, rx) = mpsc::unbounded_channel();
        let feedback_tx = tx.downgrade();
        let pending_inputs = Arc::new(AtomicUsize::new(0));
        let client = QueueClient::new(tx, pending_inputs.clone(), max_pending_inputs);
        let queue = Self {
            index,
            rx,
            feedback_tx,
            pending_inputs,
            backend,
            slots,
            session: None,
        };
        (queue, client)
    }

    /// Run the queue on a blocking thread until it is stopped or every
    /// client is dropped
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run())
    }

    /// Execute tasks until the queue is stopped or every client is dropped
    pub fn run(mut self) {
        log::debug!("Started dispatch queue {}", self.index);
        while let Some(command) = self.rx.blocking_recv() {
            log::trace!("Queue {}: {}", self.index, command.name());
            match command {
                XusbCommand::Register {
                    handle,
                    device,
                    driver,
                } => self.register(handle, device, driver),
                XusbCommand::Input { handle, state } => {
                    self.pending_inputs.fetch_sub(1, Ordering::AcqRel);
                    let Some(session) = self.session_for(handle) else {
                        log::debug!("Dropping input for unknown session {handle}");
                        continue;
                    };
                    if !session.is_active() {
                        log::debug!("Dropping input for inactive session {handle}");
                        continue;
                    }
                    if let Err(e) = session.report(&state) {
                        log::warn!("Failed to report input for {handle}: {e}");
                    }
                }
                XusbCommand::SetLed { handle, status } => {
                    let Some(session) = self.session_for(handle) else {
                        log::debug!("Dropping LED request for unknown session {handle}");
                        continue;
                    };
                    if let Err(e) = session.set_led(status) {
                        log::warn!("Failed to set LED of {handle}: {e}");
                    }
                }
                XusbCommand::SetVibration { handle, vibration } => {
                    let Some(session) = self.session_for(handle) else {
                        log::debug!("Dropping vibration request for unknown session {handle}");
                        continue;
                    };
                    if let Err(e) = session.set_vibration(vibration) {
                        log::warn!("Failed to set vibration of {handle}: {e}");
                    }
                }
                XusbCommand::Unregister { handle } => self.unregister(handle),
                XusbCommand::Flush(reply) => {
                    if reply.send(()).is_err() {
                        log::debug!("Queue {}: flush requester went away", self.index);
                    }
                }
                XusbCommand::Stop => break,
            }
        }

        if let Some(session) = self.session.take() {
            log::debug!("Queue {} stopping with live session {}", self.index, session.handle());
            session.release();
        }
        log::debug!("Dispatch queue {} stopped", self.index);
    }

    /// Returns the session if it is the one addressed by the given handle
    fn session_for(&mut self, handle: SessionHandle) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|session| session.handle() == handle)
    }

    fn register(&mut self, handle: SessionHandle, device: XusbDevice, driver: Arc<dyn XusbDriver>) {
        if let Some(previous) = self.session.take() {
            log::warn!(
                "Queue {}: replacing session {} that was never unregistered",
                self.index,
                previous.handle()
            );
            previous.release();
        }

        let feedback = Arc::new(QueueFeedback {
            handle,
            tx: self.feedback_tx.clone(),
        });
        let mut session = Session::new(handle, device, driver);
        if let Err(e) = session.register(self.backend.as_ref(), feedback) {
            log::error!(
                "Failed to create virtual device for {}: {e}",
                session.device().name
            );
            if let Err(e) = self.slots.release_handle(handle) {
                log::debug!("Slot of failed session {handle} already released: {e}");
            }
            session.release();
            return;
        }
        log::info!("Registered {} as {handle}", session.device().name);

        if session.device().capabilities.player_leds {
            if let Err(e) = session.set_led(LedStatus::player(handle.index)) {
                log::warn!("Failed to set player LED of {handle}: {e}");
            }
        }
        self.session = Some(session);
    }

    fn unregister(&mut self, handle: SessionHandle) {
        let Some(mut session) = self.session.take() else {
            log::debug!("No session to unregister for {handle}");
            return;
        };
        if session.handle() != handle {
            log::debug!("Session {handle} was already replaced by {}", session.handle());
            self.session = Some(session);
            return;
        }
        if let Err(e) = session.disconnect() {
            log::debug!("Unregistering {handle}: {e}");
        }
        let state = session.release();
        debug_assert_eq!(state, SessionState::Released);
        log::info!("Unregistered {handle}");
    }
}

/// Enqueues rumble played on a session's virtual device as a vibration
/// request for that session
#[derive(Debug)]
struct QueueFeedback {
    handle: SessionHandle,
    tx: WeakUnboundedSender<XusbCommand>,
}

impl FeedbackSink for QueueFeedback {
    fn rumble(&self, vibration: Vibration) {
        let Some(tx) = self.tx.upgrade() else {
            log::debug!("Dropping rumble for {}: queue stopped", self.handle);
            return;
        };
        let command = XusbCommand::SetVibration {
            handle: self.handle,
            vibration,
        };
        if tx.send(command).is_err() {
            log::debug!("Dropping rumble for {}: queue stopped", self.handle);
        }
    }
}
