//! Fixed working-buffer capacities.
//!
//! Both limits count the terminator slot, so the longest string that fits is
//! one byte shorter than the constant.

/// Capacity of a filesystem path working buffer.
pub const MAX_PATH: usize = 1024;

/// Capacity of a general string working buffer (registry key paths).
pub const MAX_STRING: usize = 2048;

/// Returns `true` if `s` fits in a buffer of `capacity` bytes, leaving room
/// for the terminator slot.
pub fn fits(s: &str, capacity: usize) -> bool {
    capacity > 0 && s.len() < capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_slot_is_reserved() {
        assert!(fits("abc", 4));
        assert!(!fits("abcd", 4));
    }

    #[test]
    fn zero_capacity_fits_nothing() {
        assert!(!fits("", 0));
    }

    #[test]
    fn empty_string_fits_unit_capacity() {
        assert!(fits("", 1));
    }
}
