//! Foundation types for the platform abstraction layer.
//!
//! Every other `plat` crate depends on `plat-types` for the status taxonomy
//! its errors report through and for the buffer limits shared by the path and
//! key-path parsers.
//!
//! # Key Types
//!
//! - [`ErrorCode`]: Symbolic status code carried by every platform error
//! - [`MAX_PATH`] / [`MAX_STRING`]: Working-buffer capacities

pub mod code;
pub mod limits;

pub use code::{ErrorCode, UnknownErrorCode};
pub use limits::{MAX_PATH, MAX_STRING};
