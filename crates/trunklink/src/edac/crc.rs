//! # Control word CRC-16
//!
//! Control words protect their first 80 bits with a CRC-16 (CCITT
//! polynomial 0x1021) whose register starts at the nonzero fill
//! 0x9696, transmitted in bits 80..96.
//!
//! Because the CRC is linear apart from the initial fill, the
//! syndrome of a received word (computed checksum XOR received
//! checksum) depends only on which bits were flipped in transit.
//! [`correct()`] exploits this: a table of the 96 single-bit-error
//! syndromes identifies any one-bit error directly, and pairs of
//! table entries identify two-bit errors. Anything else is
//! unrecoverable.

use std::ops::Range;

use lazy_static::lazy_static;

use crate::bits::BitVector;
use crate::protocol::CONTROL_WORD_LEN;

/// Generator polynomial (x^16 + x^12 + x^5 + 1, CCITT)
const POLY: u16 = 0x1021;

/// Initial register fill
const INITIAL_FILL: u16 = 0x9696;

/// Bits covered by the checksum
const DATA: Range<usize> = 0..80;

/// Bits holding the transmitted checksum
const CHECKSUM: Range<usize> = 80..96;

lazy_static! {
    // Syndrome left by an error in each control word bit position.
    // Message-bit syndromes come from running the register over a
    // one-bit message with a zero fill; flipping a checksum bit
    // perturbs the syndrome by its own weight.
    static ref BIT_SYNDROMES: [u16; CONTROL_WORD_LEN] = {
        let mut table = [0u16; CONTROL_WORD_LEN];
        for (position, entry) in table.iter_mut().enumerate() {
            if DATA.contains(&position) {
                let mut crc = 0u16;
                for index in DATA {
                    let msb = crc & 0x8000 != 0;
                    crc <<= 1;
                    if msb != (index == position) {
                        crc ^= POLY;
                    }
                }
                *entry = crc;
            } else {
                *entry = 0x8000 >> (position - CHECKSUM.start);
            }
        }
        table
    };
}

/// Checksum of a control word's protected bits
///
/// Feeds bits 0..80 of `word` through the register, most significant
/// bit first, starting from the standard fill. The result matches
/// bits 80..96 of an error-free word.
pub fn checksum(word: &BitVector) -> u16 {
    let mut crc = INITIAL_FILL;
    for index in DATA {
        let msb = crc & 0x8000 != 0;
        crc <<= 1;
        if msb != word.get(index) {
            crc ^= POLY;
        }
    }
    crc
}

/// Verify and repair a control word in place
///
/// Returns the number of repaired bits: 0 for a clean word, 1 or 2
/// when syndrome lookup located the error pattern, and -1 when no
/// one- or two-bit pattern explains the syndrome. The caller decides
/// how many repairs it will trust; the word always comes back
/// decodable.
pub fn correct(word: &mut BitVector) -> i32 {
    let syndrome = checksum(word) ^ word.bits(CHECKSUM) as u16;
    if syndrome == 0 {
        return 0;
    }

    if let Some(position) = BIT_SYNDROMES.iter().position(|&entry| entry == syndrome) {
        word.flip(position);
        return 1;
    }

    for first in 0..BIT_SYNDROMES.len() {
        let partial = syndrome ^ BIT_SYNDROMES[first];
        // search above `first` so each pair is tried once
        if let Some(offset) = BIT_SYNDROMES[first + 1..]
            .iter()
            .position(|&entry| entry == partial)
        {
            word.flip(first);
            word.flip(first + 1 + offset);
            return 2;
        }
    }

    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    // a full control word with a freshly computed checksum
    fn sealed_word(payload_hex: &str) -> BitVector {
        let payload = BitVector::from_hex(payload_hex).unwrap();
        assert_eq!(DATA.end, payload.len());
        let mut word = BitVector::new(CONTROL_WORD_LEN);
        word.copy_from(0, &payload, DATA);
        let crc = checksum(&word);
        for bit in 0..16 {
            word.assign(CHECKSUM.start + bit, crc & (0x8000 >> bit) != 0);
        }
        word
    }

    #[test]
    fn test_checksum_of_zero_word() {
        // all-zero data leaves only the initial fill's signature
        let word = BitVector::new(CONTROL_WORD_LEN);
        let zero_crc = checksum(&word);
        assert_ne!(0, zero_crc);

        let mut sealed = word.clone();
        for bit in 0..16 {
            sealed.assign(CHECKSUM.start + bit, zero_crc & (0x8000 >> bit) != 0);
        }
        assert_eq!(0, correct(&mut sealed));
    }

    #[test]
    fn test_clean_word_passes() {
        let mut word = sealed_word("20103FA0177E3903C230");
        let pristine = word.clone();
        assert_eq!(0, correct(&mut word));
        assert_eq!(pristine, word);
    }

    #[test]
    fn test_single_bit_errors_corrected() {
        let pristine = sealed_word("20103FA0177E3903C230");
        for position in 0..CONTROL_WORD_LEN {
            let mut word = pristine.clone();
            word.flip(position);
            assert_eq!(1, correct(&mut word), "position {}", position);
            assert_eq!(pristine, word, "position {}", position);
        }
    }

    #[test]
    fn test_double_bit_errors_repaired() {
        // the generator has an (x+1) factor, so every codeword has
        // even weight and a two-bit error can never masquerade as a
        // clean word or a one-bit error: correct() must report 2 and
        // leave a word whose checksum verifies
        let pristine = sealed_word("FFFF00000000AAAA5555");
        for &(first, second) in &[(0usize, 1usize), (2, 77), (10, 95), (79, 80), (94, 95)] {
            let mut word = pristine.clone();
            word.flip(first);
            word.flip(second);
            assert_eq!(2, correct(&mut word), "positions {} {}", first, second);
            assert_eq!(
                checksum(&word),
                word.bits(CHECKSUM) as u16,
                "positions {} {}",
                first,
                second
            );
        }

        // the pair (0, 1) is first in search order, so its repair is
        // exact, not merely consistent
        let mut word = pristine.clone();
        word.flip(0);
        word.flip(1);
        assert_eq!(2, correct(&mut word));
        assert_eq!(pristine, word);
    }

    #[test]
    fn test_unrecoverable_damage_reported() {
        // build a three-bit error whose syndrome provably matches no
        // one- or two-bit pattern, then check it is flagged rather
        // than repaired
        let covered = |syn: u16| {
            BIT_SYNDROMES.iter().any(|&a| a == syn)
                || BIT_SYNDROMES
                    .iter()
                    .enumerate()
                    .any(|(i, &a)| BIT_SYNDROMES[i + 1..].iter().any(|&b| (a ^ b) == syn))
        };

        let pristine = sealed_word("20103FA0177E3903C230");
        let mut tested = false;
        for third in 2..CONTROL_WORD_LEN {
            let syn = BIT_SYNDROMES[0] ^ BIT_SYNDROMES[1] ^ BIT_SYNDROMES[third];
            if syn == 0 || covered(syn) {
                continue;
            }
            let mut word = pristine.clone();
            word.flip(0);
            word.flip(1);
            word.flip(third);
            assert_eq!(-1, correct(&mut word), "third position {}", third);
            tested = true;
            break;
        }
        assert!(tested, "no uncoverable three-bit pattern found");
    }

    #[test]
    fn test_syndromes_distinct() {
        // distinct single-bit syndromes are what make one-bit repair
        // unambiguous
        for (i, a) in BIT_SYNDROMES.iter().enumerate() {
            assert_ne!(0, *a);
            for b in BIT_SYNDROMES[i + 1..].iter() {
                assert_ne!(*a, *b);
            }
        }
    }
}
