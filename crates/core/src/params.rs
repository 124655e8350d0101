//! Search Engine Parameters
//!
//! Shared constants for pattern compilation and partition scanning.

/// Default alphabet for variable positions: lowercase, uppercase, digits (62 symbols)
pub const DEFAULT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of candidates a worker evaluates between cancellation checks
pub const CHECK_INTERVAL: usize = 4096;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
