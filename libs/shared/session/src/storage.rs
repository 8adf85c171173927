use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key/value slots that outlive a single run of the client.
///
/// Writes never fail from the caller's point of view; backends log and
/// carry on.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.slots.write().remove(key);
    }
}

/// JSON file holding every slot, rewritten on each mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub const FILE_NAME: &'static str = "session.json";

    /// Opens `<dir>/session.json`, creating the directory when needed.
    pub fn open_in(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Self::open(dir.join(Self::FILE_NAME))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let slots = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened session storage at {} ({} slots)", path.display(), slots.len());

        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, slots: &BTreeMap<String, String>) {
        let result = serde_json::to_vec_pretty(slots)
            .map_err(StorageError::from)
            .and_then(|bytes| fs::write(&self.path, bytes).map_err(StorageError::from));

        if let Err(e) = result {
            warn!("Failed to persist session storage to {}: {}", self.path.display(), e);
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut slots = self.slots.lock();
        slots.insert(key.to_string(), value.to_string());
        self.flush(&slots);
    }

    fn remove(&self, key: &str) {
        let mut slots = self.slots.lock();
        if slots.remove(key).is_some() {
            self.flush(&slots);
        }
    }
}
