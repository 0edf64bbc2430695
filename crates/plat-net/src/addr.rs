//! Bounded address formatting.

use std::net::Ipv4Addr;

/// Render `addr` in dotted-quad form, truncated to fit a buffer of
/// `capacity` bytes (terminator slot included).
///
/// ```
/// use std::net::Ipv4Addr;
/// use plat_net::inet_to_string;
///
/// assert_eq!(inet_to_string(Ipv4Addr::new(10, 0, 0, 1), 16), "10.0.0.1");
/// assert_eq!(inet_to_string(Ipv4Addr::new(10, 0, 0, 1), 5), "10.0");
/// ```
pub fn inet_to_string(addr: Ipv4Addr, capacity: usize) -> String {
    let mut out = addr.to_string();
    out.truncate(capacity.saturating_sub(1));
    out
}
