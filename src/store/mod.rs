//! Per-device cache of the latest merged reading

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use crate::models::Reading;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable mapping from device name to its last accepted reading.
///
/// Implementations only need to make single `get`/`put` calls atomic;
/// read-modify-write sequences are serialised per device by the
/// reconciler.
pub trait ReadingStore: Send + Sync {
    fn get(&self, device: &str) -> Result<Option<Reading>, StoreError>;

    fn put(&self, device: &str, reading: Reading) -> Result<(), StoreError>;

    fn snapshot(&self) -> Result<HashMap<String, Reading>, StoreError>;
}

impl<S: ReadingStore + ?Sized> ReadingStore for std::sync::Arc<S> {
    fn get(&self, device: &str) -> Result<Option<Reading>, StoreError> {
        (**self).get(device)
    }

    fn put(&self, device: &str, reading: Reading) -> Result<(), StoreError> {
        (**self).put(device, reading)
    }

    fn snapshot(&self) -> Result<HashMap<String, Reading>, StoreError> {
        (**self).snapshot()
    }
}
