//! Key-value persistence for the entitlement ledger.
//!
//! The game persists exactly one record: the seed balance as a signed
//! 64-bit integer under a fixed key. [`KeyValueStore`] is the seam to the
//! host's preference storage; two implementations ship here:
//!
//! - [`MemoryStore`]: process-local, for tests and hosts without storage
//! - [`FileStore`]: JSON file, replaced atomically on every write

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::RwLock,
};

use funflowers_types::{FlowersError, Result};

/// Durable key-value storage for integer records.
///
/// Calls are synchronous and are made from async tasks, outside the
/// controller's state lock. Implementations should finish in about the time
/// of a small local file write.
pub trait KeyValueStore: Send + Sync {
    /// Read a record. `Ok(None)` if the key has never been written.
    ///
    /// # Errors
    /// Returns `Persistence` or `Serialization` if the store cannot be read.
    fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Write a record. After a crash the store holds either the previous or
    /// the new value, never a partial one.
    ///
    /// # Errors
    /// Returns `Persistence` if the store is unavailable.
    fn put_i64(&self, key: &str, value: i64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Survives controller restarts within one process, which
/// is enough to simulate a process restart in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, i64>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        let records = self
            .records
            .read()
            .map_err(|_| FlowersError::Persistence("memory store lock poisoned".into()))?;
        Ok(records.get(key).copied())
    }

    fn put_i64(&self, key: &str, value: i64) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| FlowersError::Persistence("memory store lock poisoned".into()))?;
        records.insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// JSON-file store: `{"key_player_seeds": 20}`.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the
/// original, so readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Option<BTreeMap<String, i64>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .read_records()?
            .and_then(|records| records.get(key).copied()))
    }

    fn put_i64(&self, key: &str, value: i64) -> Result<()> {
        let mut records = match self.read_records() {
            Ok(records) => records.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Discarding unreadable store file"
                );
                BTreeMap::new()
            }
        };
        records.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec(&records)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
