//! Digest registry
//!
//! An immutable table of the supported digest algorithms. Each entry pairs a
//! name and output length with a plain function pointer, so the search engine
//! can stay algorithm-agnostic and never dispatch on names in the hot loop.

use core::fmt;
use core::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::{Error, Result};

/// Signature shared by every digest primitive: hash `input` into `out`.
///
/// `out` is always exactly the algorithm's output length.
pub type DigestFunc = fn(input: &[u8], out: &mut [u8]);

/// A resolved digest function together with its output length
#[derive(Clone, Copy)]
pub struct DigestFn {
    name: &'static str,
    output_len: usize,
    func: DigestFunc,
}

impl DigestFn {
    /// Wrap an arbitrary digest primitive.
    ///
    /// The registry uses this for the built-in algorithms; callers can use it
    /// to search against their own fixed-length functions.
    pub const fn new(name: &'static str, output_len: usize, func: DigestFunc) -> Self {
        Self {
            name,
            output_len,
            func,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Output length in bytes
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Output length in bits
    pub fn bits(&self) -> usize {
        self.output_len * 8
    }

    /// Hash `input` into `out`, which must be `output_len()` bytes long
    #[inline(always)]
    pub fn digest_into(&self, input: &[u8], out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.output_len);
        (self.func)(input, out)
    }

    /// Convenience single-shot hashing into a fresh buffer
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; self.output_len];
        self.digest_into(input, &mut out);
        out
    }
}

impl fmt::Debug for DigestFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestFn")
            .field("name", &self.name)
            .field("output_len", &self.output_len)
            .finish()
    }
}

#[inline(always)]
fn digest_with<D: Digest>(input: &[u8], out: &mut [u8]) {
    out.copy_from_slice(&D::digest(input));
}

/// The built-in algorithms, indexed by `Algorithm as usize`
static REGISTRY: [DigestFn; 6] = [
    DigestFn::new("md5", 16, digest_with::<Md5>),
    DigestFn::new("sha1", 20, digest_with::<Sha1>),
    DigestFn::new("sha224", 28, digest_with::<Sha224>),
    DigestFn::new("sha256", 32, digest_with::<Sha256>),
    DigestFn::new("sha384", 48, digest_with::<Sha384>),
    DigestFn::new("sha512", 64, digest_with::<Sha512>),
];

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// Every registered algorithm, in registry order
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    /// The registry entry for this algorithm
    pub fn digest_fn(self) -> &'static DigestFn {
        &REGISTRY[self as usize]
    }

    /// Lower-case canonical name
    pub fn name(self) -> &'static str {
        self.digest_fn().name()
    }

    /// Output length in bits
    pub fn bits(self) -> usize {
        self.digest_fn().bits()
    }

    /// Output length in bytes
    pub fn output_len(self) -> usize {
        self.digest_fn().output_len()
    }

    pub fn digest(self, input: &[u8]) -> Vec<u8> {
        self.digest_fn().digest(input)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// Resolve a digest function by case-insensitive name
pub fn lookup(name: &str) -> Result<&'static DigestFn> {
    name.parse::<Algorithm>().map(Algorithm::digest_fn)
}
