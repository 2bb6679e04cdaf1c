//! Process-wide handle table for host services.
//!
//! Contexts carry a [`ServiceHandle`] integer instead of a pointer. Host
//! functions resolve it here. Handles are never reused within a process, so
//! a stale handle resolves to nothing rather than to another service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use vmbridge_primitives::ServiceHandle;

use crate::error::HostError;
use crate::traits::HostService;

type Table = Mutex<HashMap<u64, Arc<dyn HostService>>>;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn table() -> &'static Table {
    static TABLE: OnceLock<Table> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register `service` and return its handle.
pub fn register(service: Arc<dyn HostService>) -> ServiceHandle {
    let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    let mut guard = table().lock().unwrap_or_else(|e| e.into_inner());
    guard.insert(id, service);
    log::debug!("registered host service handle {}", id);
    ServiceHandle(id)
}

/// Look up the service behind `handle`.
pub fn resolve(handle: ServiceHandle) -> Result<Arc<dyn HostService>, HostError> {
    if handle.is_none() {
        return Err(HostError::invalid_handle());
    }
    let guard = table().lock().unwrap_or_else(|e| e.into_inner());
    guard
        .get(&handle.as_u64())
        .cloned()
        .ok_or_else(HostError::invalid_handle)
}

/// Remove `handle` from the table. Returns the service if it was present.
pub fn unregister(handle: ServiceHandle) -> Option<Arc<dyn HostService>> {
    let mut guard = table().lock().unwrap_or_else(|e| e.into_inner());
    let removed = guard.remove(&handle.as_u64());
    if removed.is_some() {
        log::debug!("unregistered host service handle {}", handle.as_u64());
    }
    removed
}

/// Registration that unregisters itself on drop.
pub struct ServiceGuard {
    handle: ServiceHandle,
}

impl ServiceGuard {
    pub fn new(service: Arc<dyn HostService>) -> Self {
        Self {
            handle: register(service),
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle
    }
}

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        unregister(self.handle);
    }
}
