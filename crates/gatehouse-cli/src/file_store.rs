//! File-backed store.
//!
//! Holds every key in one JSON object file:
//!
//! ```text
//! {"gated-downloads-unlock": "{\"timestamp\":1735689600000}"}
//! ```
//!
//! Values are stored as opaque strings, exactly as a browser's local storage
//! holds them.
//!
//! # Invariants
//!
//! - Atomic replace: every write goes to a uniquely named temp file in the
//!   same directory which is then renamed over the original, so readers see
//!   the old or the new map, never a torn one, even with several stores open
//!   on one file
//! - Last writer wins between stores sharing a file
//! - Missing file is an empty store
//! - An unparseable file fails reads with [`StoreError::Corrupt`]; the next
//!   write replaces it. Any other read failure aborts the write so no keys are
//!   dropped

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use gatehouse_core::{Store, StoreError};
use tempfile::NamedTempFile;

/// Key/value store persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) the store at `path`. Nothing is read or created until the
    /// first operation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(io_error(&e)),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            reason: format!("{}: {e}", self.path.display()),
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| io_error(&e))?;
                parent
            },
            None => Path::new("."),
        };

        let encoded = serde_json::to_vec_pretty(map)
            .map_err(|e| StoreError::Io { reason: e.to_string() })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(&e))?;
        tmp.write_all(&encoded).map_err(|e| io_error(&e))?;
        tmp.as_file().sync_all().map_err(|e| io_error(&e))?;
        tmp.persist(&self.path).map_err(|e| io_error(&e.error))?;
        Ok(())
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut map = Self::base_for_update(self.read_map())?;
        apply(&mut map);
        self.write_map(&map)
    }

    /// Map a write starts from: a corrupt file is replaced, any other read
    /// failure aborts the write.
    fn base_for_update(
        read: Result<BTreeMap<String, String>, StoreError>,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        match read {
            Ok(map) => Ok(map),
            Err(StoreError::Corrupt { reason }) => {
                tracing::warn!("replacing corrupt store: {}", reason);
                Ok(BTreeMap::new())
            },
            Err(e) => {
                tracing::warn!(
                    transient = e.is_transient(),
                    "store unreadable, write aborted: {}",
                    e
                );
                Err(e)
            },
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|map| {
            map.remove(key);
        })
    }
}

fn io_error(e: &io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            StoreError::Unavailable { reason: e.to_string() }
        },
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => StoreError::QuotaExceeded,
        _ => StoreError::Io { reason: e.to_string() },
    }
}
