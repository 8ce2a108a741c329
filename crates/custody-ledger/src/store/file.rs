//! File-backed key-value store
//!
//! Keeps the whole map in memory and rewrites a JSON snapshot on every
//! mutation (values hex-encoded). The snapshot is written to a sibling temp
//! file and renamed into place, so a crash mid-write leaves the previous
//! snapshot intact.
//!
//! A store owns its state file exclusively: `open` takes an advisory lock on
//! `<file>.lock` and holds it until the store is dropped. A second handle on
//! the same path fails to open rather than working from a stale snapshot.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use custody_common::{CustodyError, Result};
use fs4::FileExt;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use super::KeyValueStore;

/// JSON-snapshot storage implementation
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    // Released on drop
    _lock: File,
}

/// `path` with `suffix` appended to its full file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn acquire_lock(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let lock_path = sibling(path, ".lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    lock.try_lock_exclusive().map_err(|e| {
        CustodyError::Storage(format!(
            "State file {} is in use by another handle: {}",
            path.display(),
            e
        ))
    })?;
    Ok(lock)
}

impl FileStore {
    /// Open a store at `path`, loading an existing snapshot if present
    ///
    /// Fails with a storage error while another `FileStore` holds `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = acquire_lock(&path)?;

        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let encoded: BTreeMap<String, String> = serde_json::from_str(&text)?;
            let mut entries = BTreeMap::new();
            for (key, value) in encoded {
                let bytes = hex::decode(&value).map_err(|e| {
                    CustodyError::Storage(format!("Corrupt value for key {}: {}", key, e))
                })?;
                entries.insert(key, bytes);
            }
            info!(entries = entries.len(), "Loaded ledger state");
            entries
        } else {
            debug!("No existing state file, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        let encoded: BTreeMap<&str, String> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), hex::encode(v)))
            .collect();
        let text = serde_json::to_string_pretty(&encoded)?;

        let tmp = sibling(&self.path, ".tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write();
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.flush(&entries) {
            // Keep memory consistent with what is on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(old) = entries.remove(key) {
            if let Err(e) = self.flush(&entries) {
                entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }
}
