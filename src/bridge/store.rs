//! Last-known state per NXT instance.
//!
//! The wire format has no per-channel addressing: every outbound frame
//! carries all ten channels of an instance. A single-channel command is
//! therefore a read-modify-write of the instance's full state. Each instance
//! has its own async lock, held by the command for the whole merge, encode
//! and transmit sequence, so two commands for the same instance never
//! interleave while commands for different instances proceed independently.

use tokio::sync::{Mutex, MutexGuard};

use crate::constants::{INSTANCE_COUNT, MAX_INSTANCE};
use crate::error::EmpirBusError;
use crate::nxt::frame::ModuleState;

pub struct StateStore {
    slots: Vec<Mutex<Option<ModuleState>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            slots: (0..INSTANCE_COUNT).map(|_| Mutex::new(None)).collect(),
        }
    }

    fn slot(&self, instance: u8) -> Result<&Mutex<Option<ModuleState>>, EmpirBusError> {
        self.slots
            .get(usize::from(instance))
            .ok_or(EmpirBusError::OutOfRangeInstance(instance))
    }

    /// Last-known state of `instance`, if any frame or command set it
    pub async fn get(&self, instance: u8) -> Result<Option<ModuleState>, EmpirBusError> {
        Ok(*self.slot(instance)?.lock().await)
    }

    /// Stores a state observed on the bus
    pub async fn record(&self, state: ModuleState) -> Result<(), EmpirBusError> {
        *self.slot(state.instance)?.lock().await = Some(state);
        Ok(())
    }

    /// Exclusive access to one instance until the returned slot is dropped
    pub async fn lock(&self, instance: u8) -> Result<InstanceSlot<'_>, EmpirBusError> {
        let guard = self.slot(instance)?.lock().await;
        Ok(InstanceSlot { instance, guard })
    }

    /// Instances with a known state, ascending
    pub async fn known_instances(&self) -> Vec<u8> {
        let mut known = Vec::new();
        for instance in 0..=MAX_INSTANCE {
            if let Ok(Some(_)) = self.get(instance).await {
                known.push(instance);
            }
        }
        known
    }

    pub async fn clear(&self) {
        for slot in &self.slots {
            *slot.lock().await = None;
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Locked view of one instance's state
pub struct InstanceSlot<'a> {
    instance: u8,
    guard: MutexGuard<'a, Option<ModuleState>>,
}

impl InstanceSlot<'_> {
    pub fn instance(&self) -> u8 {
        self.instance
    }

    pub fn current(&self) -> Option<ModuleState> {
        *self.guard
    }

    pub fn commit(&mut self, state: ModuleState) {
        *self.guard = Some(state);
    }
}
