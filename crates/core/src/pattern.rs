//! Pattern compiler and odometer
//!
//! A pattern is a sequence of slots, each either a fixed byte or a choice
//! from an ordered alphabet. Candidates are enumerated as a mixed-radix
//! counter over the variable slots only: the rightmost variable slot is the
//! least significant digit, and index 0 picks the first symbol everywhere.

use crate::{Error, Result};

/// One position of a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Fixed(u8),
    /// Ordered, non-empty set of choices
    Variable(Vec<u8>),
}

/// A variable slot's position in the candidate and its symbols
#[derive(Debug, Clone)]
struct Wheel {
    position: usize,
    symbols: Vec<u8>,
}

/// A compiled search pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    slots: Vec<Slot>,
    /// Variable slots, most significant first
    wheels: Vec<Wheel>,
    space: u128,
}

impl Pattern {
    /// `prefix ++ variable_len × alphabet ++ suffix`
    pub fn compile(
        prefix: &[u8],
        variable_len: usize,
        suffix: &[u8],
        alphabet: &[u8],
    ) -> Result<Self> {
        let mut slots = Vec::with_capacity(prefix.len() + variable_len + suffix.len());
        slots.extend(prefix.iter().copied().map(Slot::Fixed));
        slots.extend((0..variable_len).map(|_| Slot::Variable(alphabet.to_vec())));
        slots.extend(suffix.iter().copied().map(Slot::Fixed));
        Self::from_slots(slots)
    }

    /// Build from one byte set per position.
    ///
    /// Single-byte sets become fixed slots; an empty set is an error.
    pub fn from_character_map(map: &[Vec<u8>]) -> Result<Self> {
        let slots = map
            .iter()
            .map(|choices| match choices.as_slice() {
                [byte] => Slot::Fixed(*byte),
                _ => Slot::Variable(choices.clone()),
            })
            .collect();
        Self::from_slots(slots)
    }

    pub fn from_slots(slots: Vec<Slot>) -> Result<Self> {
        let mut wheels = Vec::new();
        let mut space: u128 = 1;

        for (position, slot) in slots.iter().enumerate() {
            if let Slot::Variable(symbols) = slot {
                if symbols.is_empty() {
                    return Err(Error::EmptyAlphabet);
                }
                // Saturates only for spaces no search could finish anyway
                space = space.saturating_mul(symbols.len() as u128);
                wheels.push(Wheel {
                    position,
                    symbols: symbols.clone(),
                });
            }
        }

        Ok(Self {
            slots,
            wheels,
            space,
        })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Candidate length in bytes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of variable slots
    pub fn variable_count(&self) -> usize {
        self.wheels.len()
    }

    /// Total number of candidates (product of the variable alphabet sizes)
    pub fn space_size(&self) -> u128 {
        self.space
    }

    /// Candidate at `index`, or `None` past the end of the space
    pub fn candidate(&self, index: u128) -> Option<Vec<u8>> {
        (index < self.space).then(|| self.odometer(index).candidate().to_vec())
    }

    /// An odometer positioned at `index`
    pub fn odometer(&self, index: u128) -> Odometer<'_> {
        Odometer::new(self, index)
    }

    /// Iterate candidates in canonical order
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            odometer: self.odometer(0),
            remaining: self.space,
        }
    }
}

/// Mixed-radix counter over a pattern's variable slots.
///
/// Holds the materialized candidate so each step rewrites only the digits
/// that changed.
#[derive(Debug, Clone)]
pub struct Odometer<'a> {
    pattern: &'a Pattern,
    digits: Vec<usize>,
    candidate: Vec<u8>,
}

impl<'a> Odometer<'a> {
    fn new(pattern: &'a Pattern, index: u128) -> Self {
        let mut digits = vec![0usize; pattern.wheels.len()];
        let mut rest = index;
        for (digit, wheel) in digits.iter_mut().zip(&pattern.wheels).rev() {
            let radix = wheel.symbols.len() as u128;
            *digit = (rest % radix) as usize;
            rest /= radix;
        }

        let mut candidate: Vec<u8> = pattern
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Fixed(byte) => *byte,
                Slot::Variable(_) => 0,
            })
            .collect();
        for (digit, wheel) in digits.iter().zip(&pattern.wheels) {
            candidate[wheel.position] = wheel.symbols[*digit];
        }

        Self {
            pattern,
            digits,
            candidate,
        }
    }

    /// Bytes of the current candidate
    #[inline(always)]
    pub fn candidate(&self) -> &[u8] {
        &self.candidate
    }

    /// Step to the next index.
    ///
    /// Returns `false` when the counter wraps back to index 0.
    #[inline]
    pub fn advance(&mut self) -> bool {
        for (digit, wheel) in self.digits.iter_mut().zip(&self.pattern.wheels).rev() {
            *digit += 1;
            if *digit < wheel.symbols.len() {
                self.candidate[wheel.position] = wheel.symbols[*digit];
                return true;
            }
            *digit = 0;
            self.candidate[wheel.position] = wheel.symbols[0];
        }
        false
    }
}

/// Iterator over every candidate of a pattern, in canonical order
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    odometer: Odometer<'a>,
    remaining: u128,
}

impl Iterator for Candidates<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.odometer.candidate().to_vec();
        self.remaining -= 1;
        self.odometer.advance();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(pattern: &Pattern) -> Vec<String> {
        pattern
            .candidates()
            .map(|c| String::from_utf8(c).unwrap())
            .collect()
    }

    #[test]
    fn binary_alphabet_counts_in_order() {
        let pattern = Pattern::compile(b"", 3, b"", b"01").unwrap();
        assert_eq!(pattern.space_size(), 8);
        assert_eq!(
            strings(&pattern),
            ["000", "001", "010", "011", "100", "101", "110", "111"]
        );
    }

    #[test]
    fn literals_surround_variable_slots() {
        let pattern = Pattern::compile(b"ab", 1, b"z", b"xy").unwrap();
        assert_eq!(pattern.len(), 4);
        assert_eq!(pattern.variable_count(), 1);
        assert_eq!(strings(&pattern), ["abxz", "abyz"]);
    }

    #[test]
    fn mixed_radix_space_and_decoding() {
        let map = vec![
            vec![b'1', b'2', b'3', b'4'],
            vec![b'1', b'2', b'3'],
            vec![b'-'],
            vec![b'1', b'2'],
            vec![b'1', b'2', b'3', b'4'],
        ];
        let pattern = Pattern::from_character_map(&map).unwrap();
        assert_eq!(pattern.space_size(), 96);
        assert_eq!(pattern.variable_count(), 4);
        assert_eq!(pattern.slots()[2], Slot::Fixed(b'-'));

        // index = ((d0 * 3 + d1) * 2 + d2) * 4 + d3
        assert_eq!(pattern.candidate(0).unwrap(), b"11-11");
        assert_eq!(pattern.candidate(4).unwrap(), b"11-21");
        assert_eq!(pattern.candidate(8).unwrap(), b"12-11");
        assert_eq!(pattern.candidate(24).unwrap(), b"21-11");
        assert_eq!(pattern.candidate(95).unwrap(), b"43-24");
        assert_eq!(pattern.candidate(96), None);
    }

    #[test]
    fn decoding_agrees_with_stepping() {
        let pattern = Pattern::compile(b"p", 3, b"s", b"abc").unwrap();
        let stepped: Vec<Vec<u8>> = pattern.candidates().collect();
        assert_eq!(stepped.len(), 27);
        for (index, candidate) in stepped.iter().enumerate() {
            assert_eq!(pattern.candidate(index as u128).as_ref(), Some(candidate));
        }
    }

    #[test]
    fn odometer_wraps_after_last_index() {
        let pattern = Pattern::compile(b"", 2, b"", b"01").unwrap();
        let mut odometer = pattern.odometer(3);
        assert_eq!(odometer.candidate(), b"11");
        assert!(!odometer.advance());
        assert_eq!(odometer.candidate(), b"00");
    }

    #[test]
    fn no_variable_slots_is_a_single_candidate() {
        let pattern = Pattern::compile(b"fixed", 0, b"", b"").unwrap();
        assert_eq!(pattern.space_size(), 1);
        assert_eq!(strings(&pattern), ["fixed"]);
    }

    #[test]
    fn empty_alphabet_is_rejected() {
        assert!(matches!(
            Pattern::compile(b"", 1, b"", b""),
            Err(Error::EmptyAlphabet)
        ));
        assert!(matches!(
            Pattern::from_character_map(&[vec![b'a'], vec![]]),
            Err(Error::EmptyAlphabet)
        ));
    }

    #[test]
    fn huge_spaces_saturate() {
        let alphabet: Vec<u8> = (0..=255).collect();
        let pattern = Pattern::compile(b"", 20, b"", &alphabet).unwrap();
        assert_eq!(pattern.space_size(), u128::MAX);
    }
}
