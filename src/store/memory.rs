use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::models::Reading;
use crate::store::{ReadingStore, StoreError};

/// In-process store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: RwLock<HashMap<String, Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadingStore for MemoryStore {
    fn get(&self, device: &str) -> Result<Option<Reading>, StoreError> {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(readings.get(device).cloned())
    }

    fn put(&self, device: &str, reading: Reading) -> Result<(), StoreError> {
        let mut readings = self.readings.write().unwrap_or_else(PoisonError::into_inner);
        readings.insert(device.to_string(), reading);
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, Reading>, StoreError> {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(readings.clone())
    }
}
