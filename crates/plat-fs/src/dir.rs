//! Recursive directory creation.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use plat_types::{limits, MAX_PATH};

use crate::error::{FsError, FsResult};

/// Separators accepted between path segments.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Single-level directory primitives.
pub trait DirOps: Send + Sync {
    /// Whether `path` exists and is readable.
    fn is_readable(&self, path: &str) -> bool;

    /// Create exactly one directory level at `path`.
    fn create_dir(&self, path: &str) -> io::Result<()>;
}

impl<T: DirOps + ?Sized> DirOps for Arc<T> {
    fn is_readable(&self, path: &str) -> bool {
        (**self).is_readable(path)
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        (**self).create_dir(path)
    }
}

/// Create every missing directory along `path`, root to leaf.
///
/// Segments are separated by `/` or `\`; empty and `.` segments are skipped.
/// A leading `/` is preserved. Existing directories are left alone, so the
/// call is idempotent. The first level that cannot be created aborts the
/// walk with [`FsError::CantCreate`]; levels created before it stay.
///
/// # Examples
///
/// ```
/// use plat_fs::{make_dir_path, MemoryFs};
///
/// let fs = MemoryFs::new();
/// make_dir_path(&fs, "a/./b").unwrap();
/// assert_eq!(fs.created(), vec!["a", "a/b"]);
/// ```
pub fn make_dir_path<F: DirOps + ?Sized>(fs: &F, path: &str) -> FsResult<()> {
    if path.is_empty() {
        return Err(FsError::BadArgs("path must not be empty".into()));
    }
    if !limits::fits(path, MAX_PATH) {
        return Err(FsError::BadArgs(format!(
            "path of {} bytes exceeds the {MAX_PATH}-byte limit",
            path.len()
        )));
    }

    let mut dir = String::with_capacity(path.len() + 1);
    if path.starts_with('/') {
        dir.push('/');
    }

    let segments = path
        .split(SEPARATORS)
        .filter(|segment| !segment.is_empty() && *segment != ".");
    for segment in segments {
        dir.push_str(segment);
        if !fs.is_readable(&dir) {
            fs.create_dir(&dir).map_err(|source| {
                warn!(path = %dir, error = %source, "directory creation failed");
                FsError::CantCreate {
                    path: dir.clone(),
                    source,
                }
            })?;
            debug!(path = %dir, "created directory");
        }
        dir.push('/');
    }
    Ok(())
}

/// [`DirOps`] over the host filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl DirOps for LocalFs {
    fn is_readable(&self, path: &str) -> bool {
        fs::metadata(path).is_ok()
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        match fs::create_dir(path) {
            // Lost a race with another creator; the level exists either way.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && fs::metadata(path)?.is_dir() => {
                Ok(())
            }
            other => other,
        }
    }
}

/// In-memory [`DirOps`] that records every level it creates.
///
/// A level can only be created under an existing parent, like a real
/// filesystem. Paths registered with [`MemoryFs::fail_on`] refuse creation.
#[derive(Debug, Default)]
pub struct MemoryFs {
    dirs: RwLock<BTreeSet<String>>,
    created: Mutex<Vec<String>>,
    failing: RwLock<BTreeSet<String>>,
}

impl MemoryFs {
    /// An empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filesystem where `dirs` already exist.
    pub fn with_dirs<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fs = Self::new();
        fs.dirs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(dirs.into_iter().map(Into::into));
        fs
    }

    /// Make creation of `path` fail with `PermissionDenied`.
    pub fn fail_on(&self, path: impl Into<String>) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Levels created so far, in creation order.
    pub fn created(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `path` exists.
    pub fn exists(&self, path: &str) -> bool {
        self.dirs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }
}

impl DirOps for MemoryFs {
    fn is_readable(&self, path: &str) -> bool {
        self.exists(path)
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        if self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("creation of {path} refused"),
            ));
        }

        let mut dirs = self.dirs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((parent, _)) = path.rsplit_once('/') {
            if !parent.is_empty() && !dirs.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent of {path} does not exist"),
                ));
            }
        }
        if !dirs.insert(path.to_string()) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
        Ok(())
    }
}
