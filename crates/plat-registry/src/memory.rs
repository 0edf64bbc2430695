//! In-memory configuration store for testing and embedding.
//!
//! [`InMemoryRegistry`] keeps one key tree per hive behind a `RwLock`. It
//! implements the full [`RegistryBackend`] contract, including access-right
//! checks, and tracks open handles so that tests can assert none leak.
//! [`FailPoint`]s make the next call of a primitive fail once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::{KeyAccess, KeyHandle, RegistryBackend, ValueInfo, Volatility};
use crate::hive::{resolve_hive, Hive, KEY_SEPARATOR};
use crate::value::ValueType;

/// A primitive that can be made to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Open,
    Query,
    Read,
    Set,
    Create,
}

/// A stored value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredValue {
    pub(crate) kind: ValueType,
    pub(crate) data: Vec<u8>,
}

/// A key: named child keys and named values, both keyed by their
/// original-case name and matched case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KeyNode {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    subkeys: BTreeMap<String, KeyNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, StoredValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    volatile: bool,
}

impl KeyNode {
    fn child(&self, name: &str) -> Option<(&String, &KeyNode)> {
        self.subkeys
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut KeyNode> {
        self.subkeys
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    /// Return the actual name of child `name`, creating it if absent.
    fn ensure_child(&mut self, name: &str, volatility: Volatility) -> String {
        if let Some((actual, _)) = self.child(name) {
            return actual.clone();
        }
        let node = KeyNode {
            volatile: volatility == Volatility::Volatile,
            ..KeyNode::default()
        };
        self.subkeys.insert(name.to_string(), node);
        name.to_string()
    }

    fn value(&self, name: &str) -> Option<&StoredValue> {
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn set_value(&mut self, name: &str, value: StoredValue) {
        let existing = self
            .values
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned();
        self.values.insert(existing.unwrap_or_else(|| name.to_string()), value);
    }

    /// A copy without volatile keys.
    fn persistent(&self) -> KeyNode {
        KeyNode {
            subkeys: self
                .subkeys
                .iter()
                .filter(|(_, node)| !node.volatile)
                .map(|(name, node)| (name.clone(), node.persistent()))
                .collect(),
            values: self.values.clone(),
            volatile: false,
        }
    }
}

/// Serialized form of a whole store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RegistryDocument {
    #[serde(default)]
    pub(crate) hives: BTreeMap<Hive, KeyNode>,
}

#[derive(Clone, Debug)]
struct OpenHandle {
    hive: Hive,
    /// Actual-case names from the hive root down.
    path: Vec<String>,
    access: KeyAccess,
}

/// An in-memory implementation of [`RegistryBackend`].
///
/// Data is lost when the store is dropped; see
/// [`FileRegistry`](crate::FileRegistry) for a persistent variant.
#[derive(Debug)]
pub struct InMemoryRegistry {
    hives: RwLock<BTreeMap<Hive, KeyNode>>,
    handles: Mutex<HashMap<KeyHandle, OpenHandle>>,
    next_handle: AtomicU64,
    fail_points: Mutex<HashSet<FailPoint>>,
    data_reads: AtomicUsize,
}

impl InMemoryRegistry {
    /// Create a store with four empty hives.
    pub fn new() -> Self {
        Self::from_document(RegistryDocument::default())
    }

    pub(crate) fn from_document(document: RegistryDocument) -> Self {
        let mut hives = document.hives;
        for hive in Hive::ALL {
            hives.entry(hive).or_default();
        }
        Self {
            hives: RwLock::new(hives),
            handles: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            fail_points: Mutex::new(HashSet::new()),
            data_reads: AtomicUsize::new(0),
        }
    }

    /// Snapshot of every non-volatile key.
    pub(crate) fn to_document(&self) -> io::Result<RegistryDocument> {
        let hives = self.tree()?;
        Ok(RegistryDocument {
            hives: hives
                .iter()
                .map(|(hive, root)| (*hive, root.persistent()))
                .collect(),
        })
    }

    /// Full copy of the key tree, volatile keys included.
    pub(crate) fn snapshot(&self) -> io::Result<BTreeMap<Hive, KeyNode>> {
        Ok(self.tree()?.clone())
    }

    /// Replace the key tree with an earlier [`snapshot`](Self::snapshot).
    /// Open handles are left alone.
    pub(crate) fn restore(&self, hives: BTreeMap<Hive, KeyNode>) -> io::Result<()> {
        *self.tree_mut()? = hives;
        Ok(())
    }

    /// Store a value at a logical key path, creating missing keys on the way.
    pub fn seed(&self, key_path: &str, name: &str, kind: ValueType, data: &[u8]) -> io::Result<()> {
        let (hive, subkey) = resolve_hive(key_path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("bad key path: {key_path}"))
        })?;
        let segments = split_subkey(subkey)?;

        let mut hives = self.tree_mut()?;
        let mut node = hives.entry(hive).or_default();
        for segment in segments {
            let actual = node.ensure_child(segment, Volatility::NonVolatile);
            node = node
                .subkeys
                .get_mut(&actual)
                .ok_or_else(|| io::Error::other("key vanished during seed"))?;
        }
        node.set_value(
            name,
            StoredValue {
                kind,
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    /// Whether the key at a logical key path exists.
    pub fn key_exists(&self, key_path: &str) -> bool {
        let Some((hive, subkey)) = resolve_hive(key_path) else {
            return false;
        };
        let Ok(segments) = split_subkey(subkey) else {
            return false;
        };
        let Ok(hives) = self.tree() else {
            return false;
        };
        let Some(mut node) = hives.get(&hive) else {
            return false;
        };
        for segment in segments {
            match node.child(segment) {
                Some((_, child)) => node = child,
                None => return false,
            }
        }
        true
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.handle_table().len()
    }

    /// Number of successful and failed data retrievals so far.
    pub fn data_reads(&self) -> usize {
        self.data_reads.load(Ordering::SeqCst)
    }

    /// Make the next call of `point` fail.
    pub fn fail_on(&self, point: FailPoint) {
        self.fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }

    fn check_fail_point(&self, point: FailPoint) -> io::Result<()> {
        let armed = self
            .fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&point);
        if armed {
            return Err(io::Error::other(format!("injected {point:?} failure")));
        }
        Ok(())
    }

    fn tree(&self) -> io::Result<RwLockReadGuard<'_, BTreeMap<Hive, KeyNode>>> {
        self.hives
            .read()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))
    }

    fn tree_mut(&self) -> io::Result<RwLockWriteGuard<'_, BTreeMap<Hive, KeyNode>>> {
        self.hives
            .write()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))
    }

    fn handle_table(&self) -> MutexGuard<'_, HashMap<KeyHandle, OpenHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, key: KeyHandle) -> io::Result<OpenHandle> {
        self.handle_table()
            .get(&key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid key handle"))
    }

    fn register(&self, handle: OpenHandle) -> KeyHandle {
        let key = KeyHandle::from_raw(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.handle_table().insert(key, handle);
        key
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn split_subkey(subkey: &str) -> io::Result<Vec<&str>> {
    if subkey.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = subkey.split(KEY_SEPARATOR).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("empty key name in {subkey:?}"),
        ));
    }
    Ok(segments)
}

fn not_found(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what} not found"))
}

fn denied(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("handle lacks {what} access"))
}

fn find<'t>(hives: &'t BTreeMap<Hive, KeyNode>, handle: &OpenHandle) -> io::Result<&'t KeyNode> {
    let mut node = hives.get(&handle.hive).ok_or_else(|| not_found("hive"))?;
    for segment in &handle.path {
        node = node.subkeys.get(segment).ok_or_else(|| not_found("key"))?;
    }
    Ok(node)
}

fn find_mut<'t>(
    hives: &'t mut BTreeMap<Hive, KeyNode>,
    handle: &OpenHandle,
) -> io::Result<&'t mut KeyNode> {
    let mut node = hives.get_mut(&handle.hive).ok_or_else(|| not_found("hive"))?;
    for segment in &handle.path {
        node = node.subkeys.get_mut(segment).ok_or_else(|| not_found("key"))?;
    }
    Ok(node)
}

impl RegistryBackend for InMemoryRegistry {
    fn open_key(&self, hive: Hive, subkey: &str, access: KeyAccess) -> io::Result<KeyHandle> {
        self.check_fail_point(FailPoint::Open)?;
        let segments = split_subkey(subkey)?;

        let path = {
            let hives = self.tree()?;
            let mut node = hives.get(&hive).ok_or_else(|| not_found("hive"))?;
            let mut path = Vec::with_capacity(segments.len());
            for segment in segments {
                let (actual, child) = node.child(segment).ok_or_else(|| not_found("key"))?;
                path.push(actual.clone());
                node = child;
            }
            path
        };
        Ok(self.register(OpenHandle { hive, path, access }))
    }

    fn query_value(&self, key: KeyHandle, name: &str) -> io::Result<ValueInfo> {
        self.check_fail_point(FailPoint::Query)?;
        let handle = self.handle(key)?;
        if !handle.access.can_read() {
            return Err(denied("read"));
        }
        let hives = self.tree()?;
        let value = find(&hives, &handle)?
            .value(name)
            .ok_or_else(|| not_found("value"))?;
        Ok(ValueInfo {
            kind: value.kind,
            size: value.data.len(),
        })
    }

    fn read_value(&self, key: KeyHandle, name: &str, buf: &mut [u8]) -> io::Result<usize> {
        self.data_reads.fetch_add(1, Ordering::SeqCst);
        self.check_fail_point(FailPoint::Read)?;
        let handle = self.handle(key)?;
        if !handle.access.can_read() {
            return Err(denied("read"));
        }
        let hives = self.tree()?;
        let value = find(&hives, &handle)?
            .value(name)
            .ok_or_else(|| not_found("value"))?;
        let len = value.data.len();
        if buf.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("buffer of {} bytes cannot hold {len}", buf.len()),
            ));
        }
        buf[..len].copy_from_slice(&value.data);
        Ok(len)
    }

    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        kind: ValueType,
        data: &[u8],
    ) -> io::Result<()> {
        self.check_fail_point(FailPoint::Set)?;
        let handle = self.handle(key)?;
        if !handle.access.can_write() {
            return Err(denied("write"));
        }
        let mut hives = self.tree_mut()?;
        find_mut(&mut hives, &handle)?.set_value(
            name,
            StoredValue {
                kind,
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    fn create_key(
        &self,
        parent: KeyHandle,
        name: &str,
        volatility: Volatility,
    ) -> io::Result<KeyHandle> {
        self.check_fail_point(FailPoint::Create)?;
        if name.is_empty() || name.contains(KEY_SEPARATOR) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid key name {name:?}"),
            ));
        }
        let parent = self.handle(parent)?;
        if !parent.access.can_create() {
            return Err(denied("create"));
        }

        let actual = {
            let mut hives = self.tree_mut()?;
            find_mut(&mut hives, &parent)?.ensure_child(name, volatility)
        };
        let mut path = parent.path;
        path.push(actual);
        Ok(self.register(OpenHandle {
            hive: parent.hive,
            path,
            access: KeyAccess::AllAccess,
        }))
    }

    fn close_key(&self, key: KeyHandle) {
        if self.handle_table().remove(&key).is_none() {
            warn!(handle = key.as_raw(), "closing a handle that is not open");
        }
    }
}
