//! Accept/merge decisions for readings arriving from scans and push messages.
//!
//! Every device name has its own timestamp domain. An update is accepted
//! only when its timestamp is strictly newer than the cached one, unless the
//! caller forces it (used for the scanner's own fresh observations). An
//! accepted update is merged field by field over the cached reading, so a
//! zero placeholder never wipes out a real value.
//!
//! The read-merge-write sequence for one device runs under that device's
//! lock; different devices never contend.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::models::Reading;
use crate::store::{ReadingStore, StoreError};

/// Result of offering a reading to the reconciler
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Written to the store
    Accepted(Reading),
    /// Not newer than what is cached; nothing changed
    Stale { cached: i64, received: i64 },
}

pub struct Reconciler<S> {
    store: S,
    device_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    refresh: watch::Sender<u64>,
}

impl<S: ReadingStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        let (refresh, _) = watch::channel(0);
        Self {
            store,
            device_locks: Mutex::new(HashMap::new()),
            refresh,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receiver that changes after every accepted update
    ///
    /// The value is a running count of refreshes. Consumers read the
    /// current state from the store; intermediate values may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }

    fn device_lock(&self, device: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .device_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(device.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Offer `reading` for `device`
    ///
    /// # Arguments
    /// * `device` - Resolved device name, the cache key
    /// * `reading` - Freshly decoded reading
    /// * `force_accept` - Skip the timestamp ordering check
    ///
    /// # Returns
    /// What happened to the reading, or the store error if the merged
    /// reading could not be written (the cache is then unchanged)
    pub fn reconcile(
        &self,
        device: &str,
        reading: Reading,
        force_accept: bool,
    ) -> Result<Reconciliation, StoreError> {
        let lock = self.device_lock(device);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let cached = self.store.get(device)?;
        let saved_timestamp = cached.as_ref().map_or(0, |r| r.timestamp);

        if reading.timestamp <= saved_timestamp && !force_accept {
            debug!(
                "Ignoring old data for {}: timestamp {} <= {}",
                device, reading.timestamp, saved_timestamp
            );
            return Ok(Reconciliation::Stale {
                cached: saved_timestamp,
                received: reading.timestamp,
            });
        }

        let merged = match cached {
            Some(cached) => cached.merged_with(&reading),
            None => reading,
        };

        self.store.put(device, merged.clone())?;
        drop(_guard);

        info!(
            "Updated {} from {:?} at timestamp {}",
            device, merged.origin, merged.timestamp
        );
        self.refresh.send_modify(|generation| *generation += 1);

        Ok(Reconciliation::Accepted(merged))
    }
}
