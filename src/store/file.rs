use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::models::Reading;
use crate::store::{ReadingStore, StoreError};

/// On-disk document layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CacheDocument {
    cached_data: BTreeMap<String, Reading>,
    /// Owned by the push subscription side, carried through untouched
    subscribed_topics: BTreeSet<String>,
}

/// Store backed by a single JSON file
///
/// The whole document is rewritten on every `put`, first into a sibling
/// temporary file which is then renamed over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<CacheDocument>,
}

impl JsonFileStore {
    /// Open the cache at `path`
    ///
    /// A missing file is an empty cache. An unreadable document is logged
    /// and replaced by an empty cache on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let document = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<CacheDocument>(&bytes) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                    CacheDocument::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", path.display());
                CacheDocument::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, document: &CacheDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl ReadingStore for JsonFileStore {
    fn get(&self, device: &str) -> Result<Option<Reading>, StoreError> {
        let document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(document.cached_data.get(device).cloned())
    }

    fn put(&self, device: &str, reading: Reading) -> Result<(), StoreError> {
        let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);

        let mut updated = document.clone();
        updated.cached_data.insert(device.to_string(), reading);

        // Memory only changes once the file is safely replaced
        self.write_document(&updated)?;
        *document = updated;
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, Reading>, StoreError> {
        let document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(document
            .cached_data
            .iter()
            .map(|(name, reading)| (name.clone(), reading.clone()))
            .collect())
    }
}
