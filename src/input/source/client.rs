use thiserror::Error;
use tokio::sync::mpsc::{error::SendError, Sender};

use super::command::InterfaceCommand;

/// Possible errors for an interface client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to send command to interface")]
    SendError(SendError<InterfaceCommand>),
}

impl From<SendError<InterfaceCommand>> for ClientError {
    fn from(err: SendError<InterfaceCommand>) -> Self {
        Self::SendError(err)
    }
}

/// A client for communicating with an interface device
#[derive(Debug, Clone)]
pub struct InterfaceClient {
    tx: Sender<InterfaceCommand>,
}

impl InterfaceClient {
    pub fn new(tx: Sender<InterfaceCommand>) -> Self {
        Self { tx }
    }

    /// Stop the interface and tear it down
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.tx.send(InterfaceCommand::Stop).await?;
        Ok(())
    }

    /// Returns true if the interface has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
