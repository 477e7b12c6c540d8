use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use crate::drivers::xinput::output::Vibration;

use super::{
    capability::DeviceLayout, feedback::FeedbackSink, BackendError, VirtualDevice,
    VirtualDeviceBackend, VirtualEvent,
};

/// Operation recorded by the [DebugBackend]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugRecord {
    Created(String),
    Emitted(String, Vec<VirtualEvent>),
    Destroyed(String),
}

/// A [DebugBackend] logs every operation instead of creating real devices and
/// keeps a history that can be inspected. Creation can be made to fail to
/// exercise error handling, and rumble can be played on created devices as an
/// application would.
#[derive(Debug, Default, Clone)]
pub struct DebugBackend {
    records: Arc<Mutex<Vec<DebugRecord>>>,
    feedback: Arc<Mutex<Vec<Arc<dyn FeedbackSink>>>>,
    fail_create: Arc<AtomicBool>,
}

impl DebugBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls to create fail
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::Release);
    }

    /// Play rumble on the nth device created by this backend. Returns false
    /// if no such device was created.
    pub fn play_rumble(&self, device: usize, vibration: Vibration) -> bool {
        let sink = self
            .feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device)
            .cloned();
        let Some(sink) = sink else {
            return false;
        };
        log::debug!("Playing rumble on debug device {device}: {vibration:?}");
        sink.rumble(vibration);
        true
    }

    /// Returns every operation performed so far
    pub fn records(&self) -> Vec<DebugRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(records: &Mutex<Vec<DebugRecord>>, record: DebugRecord) {
        records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl VirtualDeviceBackend for DebugBackend {
    fn create(
        &self,
        layout: &DeviceLayout,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<Box<dyn VirtualDevice>, BackendError> {
        if self.fail_create.load(Ordering::Acquire) {
            return Err(BackendError::Other(format!(
                "refusing to create '{}'",
                layout.name
            )));
        }
        log::info!("Created debug device: {}", layout.name);
        DebugBackend::record(&self.records, DebugRecord::Created(layout.name.clone()));
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feedback);
        Ok(Box::new(DebugDevice {
            name: layout.name.clone(),
            records: self.records.clone(),
        }))
    }
}

/// Device created by the [DebugBackend]
#[derive(Debug)]
pub struct DebugDevice {
    name: String,
    records: Arc<Mutex<Vec<DebugRecord>>>,
}

impl VirtualDevice for DebugDevice {
    fn emit(&mut self, events: &[VirtualEvent]) -> Result<(), BackendError> {
        log::debug!("{}: {events:?}", self.name);
        DebugBackend::record(
            &self.records,
            DebugRecord::Emitted(self.name.clone(), events.to_vec()),
        );
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        log::info!("Destroyed debug device: {}", self.name);
        DebugBackend::record(&self.records, DebugRecord::Destroyed(self.name.clone()));
    }
}
