use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::drivers::xinput::capability::CapabilityDescriptor;

use super::{SessionHandle, MAX_CONTROLLERS};

/// Possible errors when mutating the [SlotTable]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("all {MAX_CONTROLLERS} slots are occupied")]
    Full,
    #[error("slot index `{0}` is out of range")]
    InvalidIndex(usize),
    #[error("slot `{0}` is not occupied")]
    NotOccupied(usize),
    #[error("no session found in slot `{0}`")]
    NotFound(usize),
    #[error("session `{0}` no longer occupies its slot")]
    Stale(SessionHandle),
}

/// Metadata of the session occupying a slot
#[derive(Debug, Clone)]
pub struct Occupant {
    pub handle: SessionHandle,
    pub name: String,
    pub capabilities: &'static CapabilityDescriptor,
}

#[derive(Debug, Default)]
struct Slots {
    entries: [Option<Occupant>; MAX_CONTROLLERS],
    next_generation: u64,
}

/// Fixed-capacity registry of logical controller slots. Every access takes
/// the lock only for the duration of the table access itself.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: Mutex<Slots>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots hold plain data, so a panic while locked cannot leave them
        // half-written.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Occupy the lowest free slot
    pub fn allocate(
        &self,
        name: &str,
        capabilities: &'static CapabilityDescriptor,
    ) -> Result<SessionHandle, SlotError> {
        let mut slots = self.lock();
        let Some(index) = slots.entries.iter().position(|entry| entry.is_none()) else {
            return Err(SlotError::Full);
        };

        let handle = SessionHandle {
            index,
            generation: slots.next_generation,
        };
        slots.next_generation += 1;
        slots.entries[index] = Some(Occupant {
            handle,
            name: name.to_string(),
            capabilities,
        });

        Ok(handle)
    }

    /// Free the slot at the given index regardless of its occupant
    pub fn release(&self, index: usize) -> Result<Occupant, SlotError> {
        let mut slots = self.lock();
        let entry = slots
            .entries
            .get_mut(index)
            .ok_or(SlotError::InvalidIndex(index))?;
        entry.take().ok_or(SlotError::NotOccupied(index))
    }

    /// Free the slot held by the given session. Fails without touching the
    /// table if the slot has since been given to another session.
    pub fn release_handle(&self, handle: SessionHandle) -> Result<Occupant, SlotError> {
        let mut slots = self.lock();
        let entry = slots
            .entries
            .get_mut(handle.index)
            .ok_or(SlotError::InvalidIndex(handle.index))?;
        let current = match entry.as_ref() {
            None => return Err(SlotError::NotOccupied(handle.index)),
            Some(occupant) => occupant.handle == handle,
        };
        if !current {
            return Err(SlotError::Stale(handle));
        }
        entry.take().ok_or(SlotError::NotOccupied(handle.index))
    }

    /// Returns the occupant of the slot at the given index
    pub fn lookup(&self, index: usize) -> Result<Occupant, SlotError> {
        let slots = self.lock();
        let entry = slots
            .entries
            .get(index)
            .ok_or(SlotError::InvalidIndex(index))?;
        entry.clone().ok_or(SlotError::NotFound(index))
    }

    /// Returns true if the given session still occupies its slot
    pub fn is_current(&self, handle: SessionHandle) -> bool {
        let slots = self.lock();
        matches!(
            slots.entries.get(handle.index),
            Some(Some(occupant)) if occupant.handle == handle
        )
    }

    /// Returns the number of occupied slots
    pub fn occupied(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.is_some())
            .count()
    }
}
