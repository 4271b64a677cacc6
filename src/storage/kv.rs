//! Key/value backends for the session store.
//! Values are plain strings addressed by fixed keys, the same shape as browser
//! local storage.

use std::collections::HashMap as StdHashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreError;

pub trait KvBackend: Send + Sync {
    /// Missing keys and unreadable entries both read as `None`.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process backend. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryKv {
    map: Arc<RwLock<StdHashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map.write().remove(key);
        Ok(())
    }
}

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Directory-backed backend: one file per key.
///
/// Each `set` writes `<key>.tmp` and renames it over `<key>`, so a single key
/// is never observed half-written. A process-local lock keeps writes and
/// reads ordered for callers in the same process.
#[derive(Clone)]
pub struct FileKv {
    dir: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl FileKv {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        debug!(target: "hrms::store", "file kv opened dir='{}'", dir.display());
        Ok(Self { dir, lock: Arc::new(RwLock::new(())) })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn key_path(&self, key: &str) -> PathBuf { self.dir.join(sanitize_filename(key)) }

    fn tmp_path(&self, key: &str) -> PathBuf { self.dir.join(format!("{}.tmp", sanitize_filename(key))) }
}

impl KvBackend for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        let _g = self.lock.read();
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _g = self.lock.write();
        let tmp = self.tmp_path(key);
        {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp, self.key_path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _g = self.lock.write();
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
