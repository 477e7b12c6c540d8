use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use thiserror::Error;
use tokio::sync::{
    mpsc::{error::SendError, UnboundedSender},
    oneshot,
};

use crate::drivers::xinput::gamepad::GamepadState;

use super::{command::XusbCommand, SessionHandle};

/// Possible errors for a dispatch queue client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to send command to queue")]
    SendError(SendError<XusbCommand>),
    #[error("too many pending inputs")]
    QueueFull,
    #[error("queue no longer exists")]
    ChannelClosed,
}

impl From<SendError<XusbCommand>> for ClientError {
    fn from(err: SendError<XusbCommand>) -> Self {
        Self::SendError(err)
    }
}

/// A client for enqueueing tasks onto a [super::queue::DispatchQueue]. Every
/// method except [QueueClient::flush] returns without waiting.
#[derive(Debug, Clone)]
pub struct QueueClient {
    tx: UnboundedSender<XusbCommand>,
    pending_inputs: Arc<AtomicUsize>,
    max_pending_inputs: usize,
}

impl QueueClient {
    pub fn new(
        tx: UnboundedSender<XusbCommand>,
        pending_inputs: Arc<AtomicUsize>,
        max_pending_inputs: usize,
    ) -> Self {
        Self {
            tx,
            pending_inputs,
            max_pending_inputs,
        }
    }

    /// Enqueue a lifecycle or output task. These are never dropped.
    pub fn enqueue(&self, command: XusbCommand) -> Result<(), ClientError> {
        self.tx.send(command)?;
        Ok(())
    }

    /// Enqueue an input task, unless too many inputs are already waiting
    pub fn enqueue_input(
        &self,
        handle: SessionHandle,
        state: GamepadState,
    ) -> Result<(), ClientError> {
        let pending = self.pending_inputs.fetch_add(1, Ordering::AcqRel);
        if pending >= self.max_pending_inputs {
            self.pending_inputs.fetch_sub(1, Ordering::AcqRel);
            return Err(ClientError::QueueFull);
        }
        if let Err(e) = self.tx.send(XusbCommand::Input { handle, state }) {
            self.pending_inputs.fetch_sub(1, Ordering::AcqRel);
            return Err(e.into());
        }
        Ok(())
    }

    /// Wait until every task enqueued before this call has run
    pub async fn flush(&self) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(XusbCommand::Flush(tx))?;
        rx.await.map_err(|_| ClientError::ChannelClosed)
    }

    /// Stop the queue once the tasks enqueued so far have run
    pub fn stop(&self) -> Result<(), ClientError> {
        self.tx.send(XusbCommand::Stop)?;
        Ok(())
    }
}
