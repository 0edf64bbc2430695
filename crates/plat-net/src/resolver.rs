//! The serialized hostname lookup wrapper.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::record::{HostRecord, RawHostEntry};

/// Guards entry into the non-reentrant lookup primitive, process-wide.
static HOST_LOOKUP_LOCK: Mutex<()> = Mutex::new(());

/// Proof that the calling thread holds the process-wide lookup lock.
///
/// Only [`resolve_host_by_name`] can create one. A [`HostLookup`] receives it
/// by reference, which ties the returned entry's lifetime to the critical
/// section.
pub struct LookupGuard {
    _held: MutexGuard<'static, ()>,
}

impl LookupGuard {
    fn acquire() -> Self {
        // The lock protects no data, so a panic elsewhere leaves nothing to repair.
        let held = HOST_LOOKUP_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Self { _held: held }
    }
}

/// A hostname lookup primitive.
///
/// Implementations may hand out views into shared, reused storage: the entry
/// only has to stay valid while `held` is borrowed.
pub trait HostLookup: Send + Sync {
    /// Look up `name`, returning `None` when it does not resolve.
    fn lookup<'a>(
        &'a self,
        name: &str,
        held: &'a LookupGuard,
    ) -> Option<Box<dyn RawHostEntry + 'a>>;
}

/// Thread-safe lookup of `name` through a non-reentrant primitive.
///
/// Takes the process-wide lookup lock, calls the primitive, and deep-copies
/// the result into an owned [`HostRecord`] while the lock is still held.
/// Returns `None` without building a record when the name is empty or does
/// not resolve.
pub fn resolve_host_by_name<L: HostLookup + ?Sized>(lookup: &L, name: &str) -> Option<HostRecord> {
    if name.is_empty() {
        debug!("empty host name");
        return None;
    }

    let held = LookupGuard::acquire();
    let record = lookup
        .lookup(name, &held)
        .map(|entry| HostRecord::copy_from(entry.as_ref()));
    drop(held);

    let Some(record) = record else {
        debug!(name, "host lookup failed");
        return None;
    };

    debug!(
        name,
        canonical = %record.name,
        addresses = record.addresses.len(),
        aliases = record.aliases.len(),
        "host resolved"
    );
    Some(record)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::fixture::{HostFixture, StaticLookup};
    use crate::record::AddressFamily;

    fn fixture_for(index: usize) -> HostFixture {
        let octet = u8::try_from(index).unwrap();
        HostFixture::new(format!("node{index}.cluster"))
            .with_address(IpAddr::V4(Ipv4Addr::new(10, 1, octet, 1)))
            .with_address(IpAddr::V4(Ipv4Addr::new(10, 2, octet, 1)))
            .with_alias(format!("node{index}"))
    }

    #[test]
    fn single_address_no_aliases() {
        let lookup = StaticLookup::new();
        lookup.insert(
            "api.local",
            HostFixture::new("api.local").with_address(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 7))),
        );

        let record = resolve_host_by_name(&lookup, "api.local").unwrap();
        assert_eq!(record.family, AddressFamily::Inet);
        assert_eq!(record.addr_len, 4);
        assert_eq!(record.name, "api.local");
        assert!(record.aliases.is_empty());
        assert_eq!(record.addresses, vec![vec![192u8, 168, 0, 7]]);
    }

    #[test]
    fn unknown_name_yields_none() {
        let lookup = StaticLookup::new();
        assert!(resolve_host_by_name(&lookup, "missing.local").is_none());
        assert_eq!(lookup.calls(), 1);
    }

    #[test]
    fn empty_name_skips_the_primitive() {
        let lookup = StaticLookup::new();
        assert!(resolve_host_by_name(&lookup, "").is_none());
        assert_eq!(lookup.calls(), 0);
    }

    #[test]
    fn record_outlives_primitive_state() {
        let lookup = StaticLookup::new();
        lookup.insert("a.local", fixture_for(1));
        let first = resolve_host_by_name(&lookup, "a.local").unwrap();

        lookup.insert("a.local", fixture_for(2));
        let second = resolve_host_by_name(&lookup, "a.local").unwrap();

        assert_eq!(first.aliases, vec!["node1"]);
        assert_eq!(second.aliases, vec!["node2"]);
    }

    #[test]
    fn concurrent_lookups_never_interleave() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 200;

        let lookup = Arc::new(StaticLookup::new());
        for index in 0..THREADS {
            lookup.insert(format!("node{index}.cluster"), fixture_for(index));
        }

        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let lookup = Arc::clone(&lookup);
                thread::spawn(move || {
                    let name = format!("node{index}.cluster");
                    let expected = fixture_for(index).to_record();
                    for _ in 0..ROUNDS {
                        let record = resolve_host_by_name(lookup.as_ref(), &name).unwrap();
                        assert_eq!(record, expected);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(lookup.calls(), THREADS * ROUNDS);
        assert_eq!(lookup.overlaps(), 0);
    }
}
