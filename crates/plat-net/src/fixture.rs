//! A fixed host table standing in for the system resolver.
//!
//! [`StaticLookup`] serves embedded deployments that pin host names in
//! configuration, and tests that need deterministic answers. It also counts
//! overlapping calls so callers can check that lookups are serialized.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::record::{AddressFamily, HostRecord, RawHostEntry};
use crate::resolver::{HostLookup, LookupGuard};

/// A host table entry, as written in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFixture {
    /// Canonical name.
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl HostFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn with_address(mut self, addr: IpAddr) -> Self {
        self.addresses.push(addr);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The record a lookup of this entry produces.
    ///
    /// The family is taken from the first address (IPv4 when there is none);
    /// addresses of any other family are dropped, as a single lookup result
    /// carries one family only.
    pub fn to_record(&self) -> HostRecord {
        let family = self
            .addresses
            .first()
            .map(AddressFamily::of)
            .unwrap_or(AddressFamily::Inet);
        let addresses: Vec<Vec<u8>> = self
            .addresses
            .iter()
            .filter(|addr| AddressFamily::of(addr) == family)
            .map(|addr| match addr {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            })
            .collect();
        let addr_len = match family {
            AddressFamily::Inet6 => 16,
            _ => 4,
        };
        HostRecord {
            family,
            addr_len,
            name: self.name.clone(),
            addresses,
            aliases: self.aliases.clone(),
        }
    }
}

impl RawHostEntry for HostRecord {
    fn family(&self) -> AddressFamily {
        self.family
    }

    fn addr_len(&self) -> usize {
        self.addr_len
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn address_count(&self) -> usize {
        self.addresses.len()
    }

    fn address(&self, index: usize) -> &[u8] {
        &self.addresses[index]
    }

    fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    fn alias(&self, index: usize) -> Cow<'_, str> {
        Cow::Borrowed(&self.aliases[index])
    }
}

/// [`HostLookup`] over an in-memory host table.
///
/// Names match case-insensitively. Every call is counted, and a call that
/// starts while another entry is still outstanding is counted as an overlap.
#[derive(Debug, Default)]
pub struct StaticLookup {
    hosts: RwLock<HashMap<String, Arc<HostRecord>>>,
    in_flight: AtomicUsize,
    calls: AtomicUsize,
    overlaps: AtomicUsize,
}

impl StaticLookup {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table answering for each fixture's name and aliases.
    pub fn from_fixtures<I: IntoIterator<Item = HostFixture>>(fixtures: I) -> Self {
        let lookup = Self::new();
        for fixture in fixtures {
            let record = Arc::new(fixture.to_record());
            let mut hosts = lookup.hosts.write().unwrap_or_else(PoisonError::into_inner);
            for key in std::iter::once(&fixture.name).chain(&fixture.aliases) {
                hosts.insert(key.to_ascii_lowercase(), Arc::clone(&record));
            }
        }
        lookup
    }

    /// Answer lookups of `name` with `fixture`, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, fixture: HostFixture) {
        let name = name.into().to_ascii_lowercase();
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(fixture.to_record()));
    }

    /// Number of lookups performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of lookups that started while another was outstanding.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

impl HostLookup for StaticLookup {
    fn lookup<'a>(
        &'a self,
        name: &str,
        _held: &'a LookupGuard,
    ) -> Option<Box<dyn RawHostEntry + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        let found = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_lowercase())
            .cloned();
        // Widen the window a concurrent caller would have to slip through.
        thread::yield_now();

        match found {
            Some(record) => Some(Box::new(FixtureEntry {
                record,
                in_flight: &self.in_flight,
            })),
            None => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                None
            }
        }
    }
}

/// An outstanding entry; releases its in-flight slot on drop.
struct FixtureEntry<'a> {
    record: Arc<HostRecord>,
    in_flight: &'a AtomicUsize,
}

impl Drop for FixtureEntry<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RawHostEntry for FixtureEntry<'_> {
    fn family(&self) -> AddressFamily {
        self.record.family
    }

    fn addr_len(&self) -> usize {
        self.record.addr_len
    }

    fn name(&self) -> Cow<'_, str> {
        self.record.name()
    }

    fn address_count(&self) -> usize {
        self.record.address_count()
    }

    fn address(&self, index: usize) -> &[u8] {
        self.record.address(index)
    }

    fn alias_count(&self) -> usize {
        self.record.alias_count()
    }

    fn alias(&self, index: usize) -> Cow<'_, str> {
        self.record.alias(index)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::resolver::resolve_host_by_name;

    #[test]
    fn to_record_keeps_first_family_only() {
        let fixture = HostFixture::new("dual.local")
            .with_address(IpAddr::V6(Ipv6Addr::LOCALHOST))
            .with_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let record = fixture.to_record();
        assert_eq!(record.family, AddressFamily::Inet6);
        assert_eq!(record.addr_len, 16);
        assert_eq!(record.addresses.len(), 1);
    }

    #[test]
    fn empty_fixture_is_ipv4_without_addresses() {
        let record = HostFixture::new("void.local").to_record();
        assert_eq!(record.family, AddressFamily::Inet);
        assert!(record.addresses.is_empty());
    }

    #[test]
    fn from_fixtures_answers_for_aliases() {
        let lookup = StaticLookup::from_fixtures([HostFixture::new("www.example.test")
            .with_address(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)))
            .with_alias("web")]);

        let record = resolve_host_by_name(&lookup, "WEB").unwrap();
        assert_eq!(record.name, "www.example.test");
        assert_eq!(record.aliases, vec!["web"]);
    }

    #[test]
    fn fixture_deserializes_with_defaults() {
        let fixture: HostFixture =
            serde_json::from_str(r#"{"name":"cache.local","addresses":["10.9.8.7"]}"#).unwrap();
        assert!(fixture.aliases.is_empty());
        assert_eq!(fixture.addresses, vec![IpAddr::V4(Ipv4Addr::new(10, 9, 8, 7))]);
    }

    #[test]
    fn in_flight_slot_is_released() {
        let lookup = StaticLookup::from_fixtures([HostFixture::new("a.local")]);
        resolve_host_by_name(&lookup, "a.local").unwrap();
        resolve_host_by_name(&lookup, "b.local");
        resolve_host_by_name(&lookup, "a.local").unwrap();
        assert_eq!(lookup.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(lookup.overlaps(), 0);
    }
}
