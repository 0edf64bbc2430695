//! Configuration store persisted as a JSON document.
//!
//! [`FileRegistry`] serves hosts without a native registry. The whole key
//! tree is held in an [`InMemoryRegistry`] and rewritten to disk after every
//! successful mutation, through a temporary file in the same directory that
//! is renamed over the document. Volatile keys are never written. A mutation
//! whose rewrite fails is undone in memory before the error is returned.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::backend::{KeyAccess, KeyHandle, RegistryBackend, ValueInfo, Volatility};
use crate::hive::Hive;
use crate::memory::{InMemoryRegistry, RegistryDocument};
use crate::value::ValueType;

/// A [`RegistryBackend`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    inner: InMemoryRegistry,
    /// Serializes mutations together with their document rewrite.
    write_lock: Mutex<()>,
}

impl FileRegistry {
    /// Load the document at `path`, or start empty if it does not exist.
    ///
    /// The file is not created until the first mutation.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<RegistryDocument>(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RegistryDocument::default(),
            Err(e) => return Err(e),
        };
        info!(path = %path.display(), "opened file registry");
        Ok(Self {
            path,
            inner: InMemoryRegistry::from_document(document),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory tree this store persists.
    pub fn memory(&self) -> &InMemoryRegistry {
        &self.inner
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutate` and rewrite the document. If the rewrite fails the key
    /// tree is restored to its state before `mutate` ran, and `on_rollback`
    /// receives the mutation's result so it can release what it acquired.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&InMemoryRegistry) -> io::Result<T>,
        on_rollback: impl FnOnce(&InMemoryRegistry, T),
    ) -> io::Result<T> {
        let _guard = self.lock_writes();
        let before = self.inner.snapshot()?;
        let out = mutate(&self.inner)?;
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "flush failed, rolling back");
            let restored = self.inner.restore(before);
            on_rollback(&self.inner, out);
            restored?;
            return Err(e);
        }
        Ok(out)
    }

    /// Caller holds the write lock.
    fn flush(&self) -> io::Result<()> {
        let document = self.inner.to_document()?;
        let json = serde_json::to_vec_pretty(&document).map_err(io::Error::other)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), bytes = json.len(), "flushed file registry");
        Ok(())
    }
}

impl RegistryBackend for FileRegistry {
    fn open_key(&self, hive: Hive, subkey: &str, access: KeyAccess) -> io::Result<KeyHandle> {
        self.inner.open_key(hive, subkey, access)
    }

    fn query_value(&self, key: KeyHandle, name: &str) -> io::Result<ValueInfo> {
        self.inner.query_value(key, name)
    }

    fn read_value(&self, key: KeyHandle, name: &str, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read_value(key, name, buf)
    }

    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        kind: ValueType,
        data: &[u8],
    ) -> io::Result<()> {
        self.commit(|inner| inner.set_value(key, name, kind, data), |_, ()| {})
    }

    fn create_key(
        &self,
        parent: KeyHandle,
        name: &str,
        volatility: Volatility,
    ) -> io::Result<KeyHandle> {
        self.commit(
            |inner| inner.create_key(parent, name, volatility),
            |inner, key| inner.close_key(key),
        )
    }

    fn close_key(&self, key: KeyHandle) {
        self.inner.close_key(key);
    }
}
