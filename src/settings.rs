use crate::model::{OperationMode, DEFAULT_RUNTIME};
use std::sync::{Arc, Mutex, MutexGuard};

/// Heater command parameters chosen ahead of time: which mode to start and for
/// how long. The switch-on path reads a consistent snapshot via `command()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaterSettings {
    mode: OperationMode,
    runtime: u32,
}

/// Shared, clonable handle to the heater settings. Mode and runtime are chosen
/// independently (select/number style inputs) but consumed together when the
/// heater is switched on, so reads and writes go through one guarded object.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<Mutex<HeaterSettings>>,
}

impl SharedSettings {
    pub fn new(mode: OperationMode, runtime: u32) -> Self {
        SharedSettings {
            inner: Arc::new(Mutex::new(HeaterSettings { mode, runtime })),
        }
    }

    fn locked(&self) -> MutexGuard<'_, HeaterSettings> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> OperationMode {
        self.locked().mode
    }

    pub fn set_mode(&self, mode: OperationMode) {
        self.locked().mode = mode;
    }

    pub fn runtime(&self) -> u32 {
        self.locked().runtime
    }

    pub fn set_runtime(&self, runtime: u32) {
        self.locked().runtime = runtime;
    }

    /// Snapshot of (mode, runtime) taken under a single lock.
    pub fn command(&self) -> (OperationMode, u32) {
        let settings = self.locked();
        (settings.mode, settings.runtime)
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        SharedSettings::new(OperationMode::Heating, DEFAULT_RUNTIME)
    }
}
