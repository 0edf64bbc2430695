//! Reading and writing named string values by logical key path.

use tracing::{debug, warn};

use crate::backend::{KeyAccess, OpenKey, RegistryBackend, Volatility};
use crate::error::{RegistryError, RegistryResult};
use crate::hive::{resolve_hive, KEY_SEPARATOR};
use crate::value::ValueType;

fn cant_access(key_path: &str, source: Option<std::io::Error>) -> RegistryError {
    match &source {
        Some(e) => warn!(key = key_path, error = %e, "cannot access key"),
        None => debug!(key = key_path, "cannot resolve hive"),
    }
    RegistryError::CantAccess {
        key: key_path.to_string(),
        source,
    }
}

fn cant_read(key_path: &str, name: &str, source: std::io::Error) -> RegistryError {
    warn!(key = key_path, name, error = %source, "value operation failed");
    RegistryError::CantRead {
        key: key_path.to_string(),
        name: name.to_string(),
        source,
    }
}

/// Read the string value `name` stored under `key_path`.
///
/// The stored size (terminator included) must not exceed `max`. The size is
/// checked before any buffer is allocated, and a failed retrieval drops the
/// buffer before returning, so the caller only ever receives a complete
/// value. Trailing NUL terminators are stripped from the result. Data that
/// is not valid UTF-8 (ANSI code-page text, for instance) is converted
/// lossily, with each invalid sequence replaced by `U+FFFD`.
///
/// # Errors
///
/// - [`RegistryError::CantAccess`] if the hive cannot be resolved or the key
///   cannot be opened for reading
/// - [`RegistryError::CantRead`] if the value cannot be queried or retrieved
/// - [`RegistryError::BadType`] if the value is not a plain or expandable
///   string; its data is never retrieved
/// - [`RegistryError::WontFit`] if the stored size exceeds `max`
pub fn read_config_value<B: RegistryBackend + ?Sized>(
    backend: &B,
    max: usize,
    key_path: &str,
    name: &str,
) -> RegistryResult<String> {
    let (hive, subkey) = resolve_hive(key_path).ok_or_else(|| cant_access(key_path, None))?;
    let key = OpenKey::open(backend, hive, subkey, KeyAccess::Read)
        .map_err(|e| cant_access(key_path, Some(e)))?;

    let info = key.query(name).map_err(|e| cant_read(key_path, name, e))?;
    if !info.kind.is_string() {
        return Err(RegistryError::BadType {
            key: key_path.to_string(),
            name: name.to_string(),
            found: info.kind,
        });
    }
    if info.size > max {
        return Err(RegistryError::WontFit {
            key: key_path.to_string(),
            name: name.to_string(),
            size: info.size,
            max,
        });
    }

    let mut buf = vec![0u8; info.size];
    let len = key
        .read(name, &mut buf)
        .map_err(|e| cant_read(key_path, name, e))?;
    buf.truncate(len);
    while buf.last() == Some(&0) {
        buf.pop();
    }

    debug!(key = key_path, name, size = info.size, "read config value");
    Ok(String::from_utf8(buf).unwrap_or_else(|e| {
        warn!(key = key_path, name, error = %e, "value is not UTF-8, replacing invalid bytes");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    }))
}

/// Write the string value `name` under `key_path`, or create a key.
///
/// With a non-empty `name`, the key must already exist; `value` is stored as
/// [`ValueType::String`] with its NUL terminator counted in the stored size.
///
/// Without a name, `value` is ignored and the key named by the last segment
/// of `key_path` is created under its parent (the hive root when the path
/// has a single subkey segment) as a non-volatile key. Creating a key that
/// already exists succeeds.
///
/// # Errors
///
/// - [`RegistryError::CantAccess`] if the hive cannot be resolved, the key or
///   parent cannot be opened, or the key cannot be created
/// - [`RegistryError::CantRead`] if storing the value fails
/// - [`RegistryError::BadArgs`] if a key to create has an empty name
pub fn write_config_value<B: RegistryBackend + ?Sized>(
    backend: &B,
    key_path: &str,
    name: Option<&str>,
    value: &str,
) -> RegistryResult<()> {
    let (hive, subkey) = resolve_hive(key_path).ok_or_else(|| cant_access(key_path, None))?;

    match name.filter(|name| !name.is_empty()) {
        Some(name) => {
            let key = OpenKey::open(backend, hive, subkey, KeyAccess::AllAccess)
                .map_err(|e| cant_access(key_path, Some(e)))?;

            let mut data = Vec::with_capacity(value.len() + 1);
            data.extend_from_slice(value.as_bytes());
            data.push(0);
            key.set(name, ValueType::String, &data)
                .map_err(|e| cant_read(key_path, name, e))?;
            debug!(key = key_path, name, size = data.len(), "wrote config value");
        }
        None => {
            let (parent, leaf) = subkey.rsplit_once(KEY_SEPARATOR).unwrap_or(("", subkey));
            if leaf.is_empty() {
                return Err(RegistryError::BadArgs(format!(
                    "key path {key_path:?} ends with a separator"
                )));
            }

            let parent_key = OpenKey::open(backend, hive, parent, KeyAccess::CreateSubKey)
                .map_err(|e| cant_access(key_path, Some(e)))?;
            let created = parent_key
                .create(leaf, Volatility::NonVolatile)
                .map_err(|e| cant_access(key_path, Some(e)))?;
            drop(created);
            drop(parent_key);
            debug!(key = key_path, "created key");
        }
    }
    Ok(())
}
