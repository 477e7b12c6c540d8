//! In-memory interrupt pipes for driving interfaces without hardware
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc as std_mpsc, Mutex, PoisonError,
    },
    time::Duration,
};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{InterruptIn, InterruptOut, TransportError};

/// Sender half used to script the transfers received by a [MemoryIn]
pub type MemoryFeeder = UnboundedSender<Result<Vec<u8>, TransportError>>;

/// Create an inbound pipe and the sender that feeds it. Once every sender is
/// dropped and the scripted transfers are consumed, the pipe reports
/// [TransportError::Shutdown].
pub fn channel() -> (MemoryIn, MemoryFeeder) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryIn { rx }, tx)
}

/// Inbound pipe receiving scripted transfers
#[derive(Debug)]
pub struct MemoryIn {
    rx: UnboundedReceiver<Result<Vec<u8>, TransportError>>,
}

impl InterruptIn for MemoryIn {
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        async move {
            match self.rx.recv().await {
                Some(result) => result,
                None => Err(TransportError::Shutdown),
            }
        }
    }

    fn cancel(&mut self) {
        self.rx.close();
    }
}

/// How long a gated write waits for its permit
const GATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outbound pipe recording every packet written to it
#[derive(Debug)]
pub struct MemoryOut {
    sent: Mutex<Vec<Vec<u8>>>,
    attached: AtomicBool,
    gate: Option<Mutex<std_mpsc::Receiver<()>>>,
}

impl Default for MemoryOut {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attached: AtomicBool::new(true),
            gate: None,
        }
    }
}

impl MemoryOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipe whose writes block like a real transfer until a permit
    /// is sent on the returned sender. A write with no permit after one
    /// second fails.
    pub fn gated() -> (Self, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        let out = Self {
            gate: Some(Mutex::new(rx)),
            ..Default::default()
        };
        (out, tx)
    }

    /// Returns every packet written so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate the device being plugged or unplugged
    pub fn set_attached(&self, attached: bool) {
        self.attached.store(attached, Ordering::Release);
    }
}

impl InterruptOut for MemoryOut {
    fn send(&self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.is_attached() {
            return Err(TransportError::EndpointGone);
        }
        if let Some(gate) = self.gate.as_ref() {
            let permit = gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv_timeout(GATE_TIMEOUT);
            if let Err(e) = permit {
                return Err(TransportError::Transfer(format!("write not completed: {e}")));
            }
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(data.to_vec());
        Ok(data.len())
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
