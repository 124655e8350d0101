//! Bit-pattern codec
//!
//! Turns a partial bit string into a `(target, mask)` pair of digest length.
//! A candidate matches when `digest & mask == target`, so every bit outside
//! the mask is left unconstrained.

use crate::{Error, Result};

/// Which end of the digest a bit pattern is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Bit `i` is counted from the most-significant bit of byte 0
    Prefix,
    /// Bit `i` is counted from the least-significant bit of the last byte,
    /// moving toward lower-indexed bytes as `i` grows
    Suffix,
}

/// Target bits and the mask selecting which of them are constrained.
///
/// Invariant: `target & !mask == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMask {
    target: Vec<u8>,
    mask: Vec<u8>,
}

impl TargetMask {
    /// Build from a raw pair. Target bits outside the mask are cleared.
    pub fn new(mut target: Vec<u8>, mask: Vec<u8>) -> Result<Self> {
        if target.len() != mask.len() {
            return Err(Error::InvalidPattern(format!(
                "target is {} bytes but mask is {} bytes",
                target.len(),
                mask.len()
            )));
        }
        for (t, m) in target.iter_mut().zip(&mask) {
            *t &= *m;
        }
        Ok(Self { target, mask })
    }

    /// Encode a string of `'0'`/`'1'` characters anchored at one end of a
    /// `digest_len`-byte digest.
    pub fn from_bits(pattern: &str, anchor: Anchor, digest_len: usize) -> Result<Self> {
        let bit_len = digest_len * 8;
        if pattern.len() > bit_len {
            return Err(Error::InvalidPattern(format!(
                "{}-bit pattern exceeds {}-bit digest",
                pattern.len(),
                bit_len
            )));
        }

        let mut target = vec![0u8; digest_len];
        let mut mask = vec![0u8; digest_len];

        for (i, ch) in pattern.bytes().enumerate() {
            let set = match ch {
                b'0' => false,
                b'1' => true,
                other => {
                    return Err(Error::InvalidPattern(format!(
                        "bit pattern contains {:?} at position {}",
                        other as char, i
                    )));
                }
            };

            let (byte_index, bit) = match anchor {
                Anchor::Prefix => (i / 8, 0x80u8 >> (i % 8)),
                Anchor::Suffix => (digest_len - 1 - i / 8, 1u8 << (i % 8)),
            };

            mask[byte_index] |= bit;
            if set {
                target[byte_index] |= bit;
            }
        }

        Ok(Self { target, mask })
    }

    /// Require the first `bits` bits of the digest to be `1`
    pub fn leading_ones(bits: usize, digest_len: usize) -> Result<Self> {
        Self::from_bits(&"1".repeat(bits), Anchor::Prefix, digest_len)
    }

    /// Require the digest to start with exactly `bytes`
    pub fn prefix_bytes(bytes: &[u8], digest_len: usize) -> Result<Self> {
        Self::padding(bytes, digest_len)?;

        let mut target = bytes.to_vec();
        target.resize(digest_len, 0);
        let mut mask = vec![0xFFu8; bytes.len()];
        mask.resize(digest_len, 0);

        Ok(Self { target, mask })
    }

    /// Require the digest to end with exactly `bytes`
    pub fn suffix_bytes(bytes: &[u8], digest_len: usize) -> Result<Self> {
        let pad = Self::padding(bytes, digest_len)?;

        let mut target = vec![0u8; pad];
        target.extend_from_slice(bytes);
        let mut mask = vec![0u8; pad];
        mask.resize(digest_len, 0xFF);

        Ok(Self { target, mask })
    }

    fn padding(bytes: &[u8], digest_len: usize) -> Result<usize> {
        digest_len.checked_sub(bytes.len()).ok_or_else(|| {
            Error::InvalidPattern(format!(
                "{}-byte target exceeds {}-byte digest",
                bytes.len(),
                digest_len
            ))
        })
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Byte length of the pair (equals the digest length it was built for)
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Number of constrained bits
    pub fn constrained_bits(&self) -> u32 {
        self.mask.iter().map(|m| m.count_ones()).sum()
    }

    /// `digest & mask == target`
    #[inline(always)]
    pub fn matches(&self, digest: &[u8]) -> bool {
        digest.len() == self.mask.len()
            && digest
                .iter()
                .zip(&self.mask)
                .zip(&self.target)
                .all(|((d, m), t)| d & m == *t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pattern_fills_from_most_significant_bit() {
        let tm = TargetMask::from_bits("111", Anchor::Prefix, 4).unwrap();
        assert_eq!(tm.mask(), &[0xE0, 0, 0, 0]);
        assert_eq!(tm.target(), &[0xE0, 0, 0, 0]);
    }

    #[test]
    fn suffix_pattern_fills_from_least_significant_bit() {
        let tm = TargetMask::from_bits("101", Anchor::Suffix, 4).unwrap();
        assert_eq!(tm.mask(), &[0, 0, 0, 0x07]);
        assert_eq!(tm.target(), &[0, 0, 0, 0x05]);
    }

    #[test]
    fn suffix_pattern_crosses_into_earlier_bytes() {
        // bits 0..8 land in the last byte, bit 8 in the one before it
        let tm = TargetMask::from_bits("000000001", Anchor::Suffix, 4).unwrap();
        assert_eq!(tm.mask(), &[0, 0, 0x01, 0xFF]);
        assert_eq!(tm.target(), &[0, 0, 0x01, 0x00]);
    }

    #[test]
    fn full_length_pattern_is_accepted() {
        let bits = "10".repeat(16);
        let tm = TargetMask::from_bits(&bits, Anchor::Prefix, 4).unwrap();
        assert_eq!(tm.mask(), &[0xFF; 4]);
        assert_eq!(tm.target(), &[0xAA; 4]);
        assert_eq!(tm.constrained_bits(), 32);
    }

    #[test]
    fn oversized_pattern_is_rejected() {
        let bits = "1".repeat(33);
        assert!(matches!(
            TargetMask::from_bits(&bits, Anchor::Prefix, 4),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            TargetMask::from_bits(&bits, Anchor::Suffix, 4),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn non_binary_characters_are_rejected() {
        assert!(matches!(
            TargetMask::from_bits("10x", Anchor::Prefix, 4),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let tm = TargetMask::from_bits("", Anchor::Prefix, 4).unwrap();
        assert!(tm.matches(&[0x12, 0x34, 0x56, 0x78]));
        assert_eq!(tm.constrained_bits(), 0);
    }

    #[test]
    fn raw_pair_is_normalised_and_length_checked() {
        let tm = TargetMask::new(vec![0xFF, 0xFF], vec![0xF0, 0x00]).unwrap();
        assert_eq!(tm.target(), &[0xF0, 0x00]);

        assert!(matches!(
            TargetMask::new(vec![0; 2], vec![0; 3]),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn byte_targets() {
        let tm = TargetMask::prefix_bytes(&[0xAB, 0xCD], 4).unwrap();
        assert_eq!(tm.target(), &[0xAB, 0xCD, 0, 0]);
        assert_eq!(tm.mask(), &[0xFF, 0xFF, 0, 0]);

        let tm = TargetMask::suffix_bytes(&[0xAB, 0xCD], 4).unwrap();
        assert_eq!(tm.target(), &[0, 0, 0xAB, 0xCD]);
        assert_eq!(tm.mask(), &[0, 0, 0xFF, 0xFF]);

        assert!(TargetMask::prefix_bytes(&[0; 5], 4).is_err());
    }

    #[test]
    fn matching_ignores_unmasked_bits() {
        let tm = TargetMask::leading_ones(4, 2).unwrap();
        assert!(tm.matches(&[0xF0, 0x00]));
        assert!(tm.matches(&[0xFF, 0x12]));
        assert!(!tm.matches(&[0xE0, 0x00]));
        // wrong length never matches
        assert!(!tm.matches(&[0xFF]));
    }
}
