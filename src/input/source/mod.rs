//! Physical USB interfaces and the handlers decoding their packets
pub mod client;
pub mod command;
pub mod memory;
pub mod usb;
pub mod xbox360;
pub mod xbox360_wireless;


use std::{error::Error, fmt::Debug, future::Future, io, sync::Arc};

use packed_struct::PackingError;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::xusb::Xusb;

use self::{client::InterfaceClient, command::InterfaceCommand};

/// Size of the interface command channel
const BUFFER_SIZE: usize = 16;

/// Possible errors on a USB interface
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transfer was cancelled")]
    Reset,
    #[error("endpoint is gone")]
    EndpointGone,
    #[error("device is shutting down")]
    Shutdown,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("no matching interface found")]
    NotFound,
    #[error("failed to pack report: {0}")]
    Packing(#[from] PackingError),
}

impl TransportError {
    /// Returns true if the error ends the receive loop. Any other error is
    /// logged and the receive is submitted again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Reset | TransportError::EndpointGone | TransportError::Shutdown
        )
    }
}

/// Inbound interrupt pipe of an interface
pub trait InterruptIn: Send {
    /// Wait for the next completed transfer
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
    /// Cancel every in-flight transfer
    fn cancel(&mut self);
}

/// Outbound interrupt pipe of an interface
pub trait InterruptOut: Debug + Send + Sync {
    /// Write the given packet, blocking until the transfer completes
    fn send(&self, data: &[u8]) -> Result<usize, TransportError>;
    /// Returns true if the USB device is still attached
    fn is_attached(&self) -> bool;
}

/// Decodes the packets of one interface and drives the sessions bound to it
pub trait PacketHandler: Send {
    /// Called once before the first packet is received. An error here fails
    /// the attachment of the interface.
    fn attach(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
    /// Handle one received payload. Must never block.
    fn handle_packet(&mut self, payload: &[u8]);
    /// Release any session bound to the interface
    fn detach(&mut self);
    /// Called once the queued work of the interface has been flushed
    fn teardown(&mut self);
}

/// A USB interface being read from
pub struct InterfaceDevice<I: InterruptIn, H: PacketHandler> {
    name: String,
    input: I,
    handler: H,
    xusb: Arc<Xusb>,
    rx: mpsc::Receiver<InterfaceCommand>,
}

impl<I: InterruptIn, H: PacketHandler> InterfaceDevice<I, H> {
    /// Create a new interface device and a client to control it
    pub fn new(name: &str, input: I, handler: H, xusb: Arc<Xusb>) -> (Self, InterfaceClient) {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        let device = Self {
            name: name.to_string(),
            input,
            handler,
            xusb,
            rx,
        };
        (device, InterfaceClient::new(tx))
    }

    /// Receive and handle packets until the interface goes away or is told to
    /// stop, then tear it down. Attaching and tearing down may write to the
    /// device, so both run on a blocking thread.
    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        H: 'static,
    {
        let Self {
            name,
            mut input,
            handler,
            xusb,
            mut rx,
        } = self;
        log::debug!("Starting interface: {name}");
        let (mut handler, attached) = tokio::task::spawn_blocking(move || {
            let mut handler = handler;
            let attached = handler.attach();
            (handler, attached)
        })
        .await?;
        attached?;

        loop {
            tokio::select! {
                command = rx.recv() => {
                    match command {
                        Some(InterfaceCommand::Stop) | None => {
                            log::debug!("Stopping interface: {name}");
                            break;
                        }
                    }
                }
                result = input.receive() => {
                    match result {
                        Ok(payload) => handler.handle_packet(payload.as_slice()),
                        Err(e) if e.is_fatal() => {
                            log::debug!("Interface {name} stopped receiving: {e}");
                            break;
                        }
                        Err(e) => {
                            log::warn!("Receive failed on {name}: {e}");
                        }
                    }
                }
            }
        }

        // Tear down: no more packets, release sessions, wait for their tasks
        input.cancel();
        handler.detach();
        if let Err(e) = xusb.flush().await {
            log::warn!("Failed to flush queues for {name}: {e}");
        }
        tokio::task::spawn_blocking(move || handler.teardown()).await?;
        log::debug!("Interface stopped: {name}");

        Ok(())
    }
}
