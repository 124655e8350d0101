//! # EasyPow Core
//!
//! Brute-force search for strings whose digest satisfies a partial,
//! bit-granular pattern.
//!
//! ## Pieces
//!
//! - [`registry`]: the six supported digests (MD5, SHA-1, SHA-224/256/384/512)
//! - [`codec`]: bit patterns to `(target, mask)` pairs, anchored at either end
//! - [`pattern`]: literal prefix + variable positions + literal suffix
//! - [`search`]: deterministic parallel enumeration
//!
//! The search always returns the *lowest-index* match in canonical order, so
//! the answer does not depend on the number of worker threads.
//!
//! ## Example
//!
//! ```rust
//! use easypow_core::{search_prefix, SearchConfig, DEFAULT_ALPHABET};
//!
//! // A string starting with "abc" whose SHA-256 begins with eight 1-bits
//! let result = search_prefix(
//!     "sha256",
//!     "11111111",
//!     4,
//!     b"abc",
//!     b"",
//!     DEFAULT_ALPHABET,
//!     &SearchConfig::with_threads(2),
//! )
//! .unwrap();
//!
//! let found = result.found().unwrap();
//! assert!(found.starts_with(b"abc"));
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): partitions run on a dedicated rayon pool. Without
//!   it they run one after another and produce the same results.

pub mod codec;
mod params;
pub mod pattern;
pub mod registry;
pub mod search;

pub use codec::{Anchor, TargetMask};
pub use params::*;
pub use pattern::{Candidates, Odometer, Pattern, Slot};
pub use registry::{Algorithm, DigestFn, DigestFunc, lookup};
pub use search::{SearchConfig, SearchResult, search};

/// Errors raised before or while setting up a search
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The digest name is not in the registry
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Bit pattern longer than the digest, or target/mask of the wrong length
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// A variable position has no candidate characters
    #[error("alphabet is empty")]
    EmptyAlphabet,

    /// The worker pool could not be started
    #[error("failed to start worker threads: {0}")]
    ThreadPool(String),
}

/// Convenience result type for search operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Search for a string whose digest *starts* with `bits`.
///
/// Candidates are `literal_prefix ++ variable_len symbols ++ literal_suffix`.
pub fn search_prefix(
    algorithm: &str,
    bits: &str,
    variable_len: usize,
    literal_prefix: &[u8],
    literal_suffix: &[u8],
    alphabet: &[u8],
    config: &SearchConfig,
) -> Result<SearchResult> {
    let (digest, target) = resolve(algorithm, bits, Anchor::Prefix)?;
    let pattern = Pattern::compile(literal_prefix, variable_len, literal_suffix, alphabet)?;
    search(&pattern, &target, digest, config)
}

/// Search for a string whose digest *ends* with `bits`.
///
/// Bit 0 of `bits` is the least-significant bit of the last digest byte.
pub fn search_suffix(
    algorithm: &str,
    bits: &str,
    variable_len: usize,
    literal_prefix: &[u8],
    literal_suffix: &[u8],
    alphabet: &[u8],
    config: &SearchConfig,
) -> Result<SearchResult> {
    let (digest, target) = resolve(algorithm, bits, Anchor::Suffix)?;
    let pattern = Pattern::compile(literal_prefix, variable_len, literal_suffix, alphabet)?;
    search(&pattern, &target, digest, config)
}

fn resolve(
    algorithm: &str,
    bits: &str,
    anchor: Anchor,
) -> Result<(&'static DigestFn, TargetMask)> {
    let digest = lookup(algorithm)?;
    let target = TargetMask::from_bits(bits, anchor, digest.output_len())?;
    Ok((digest, target))
}
