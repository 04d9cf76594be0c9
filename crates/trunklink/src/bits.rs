//! # Fixed-length bit buffers
//!
//! Framed messages are fixed-length strings of bits. [`BitVector`]
//! stores one such string, packed eight bits per byte, together with
//! the bookkeeping the rest of the crate needs:
//!
//! * a write pointer, so framers can append one decoded bit at a time
//!   until the vector [is full](BitVector::is_full),
//!
//! * a corrected-bit count, recording how many bits forward error
//!   correction repaired (negative when correction failed), and
//!
//! * field extraction by contiguous range or by explicit bit-index
//!   list, as unsigned, two's-complement signed, or hexadecimal.
//!
//! Bit 0 is the first bit received. Multi-bit fields are read most
//! significant bit first, matching the over-the-air ordering.

use std::fmt;
use std::ops::Range;

/// Fixed-length message bit buffer
///
/// Create with [`new()`](BitVector::new) and fill with
/// [`push()`](BitVector::push), or construct whole with
/// [`from_hex()`](BitVector::from_hex). Once full, a `BitVector` is
/// treated as immutable message payload; only the error-correction
/// pass flips bits in place, and it accounts for every flip via
/// [`set_corrected_count()`](BitVector::set_corrected_count).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    bits: Vec<u8>,
    len: usize,
    pointer: usize,
    corrected: i32,
}

impl BitVector {
    /// Create a zero-filled vector of `len` bits
    ///
    /// The write pointer starts at bit zero.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0u8; (len + 7) / 8],
            len,
            pointer: 0,
            corrected: 0,
        }
    }

    /// Parse from a hexadecimal string
    ///
    /// Each character contributes four bits, most significant first.
    /// Returns `None` if any character is not a hex digit. The
    /// resulting vector is full.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let mut out = Self::new(hex.len() * 4);
        for chr in hex.chars() {
            let nibble = chr.to_digit(16)?;
            for bit in 0..4 {
                out.push(nibble & (0x8 >> bit) != 0);
            }
        }
        Some(out)
    }

    /// Declared length, in bits
    ///
    /// Fixed at construction. Unrelated to how many bits have been
    /// pushed so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the declared length is zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bits pushed so far
    #[inline]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// True once `len()` bits have been pushed
    #[inline]
    pub fn is_full(&self) -> bool {
        self.pointer >= self.len
    }

    /// Append one bit at the write pointer
    ///
    /// Does nothing if the vector is already full.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        if self.pointer < self.len {
            if bit {
                self.bits[self.pointer / 8] |= 0x80 >> (self.pointer % 8);
            }
            self.pointer += 1;
        }
    }

    /// Read the bit at `index`
    ///
    /// Panics if `index` is outside the declared length.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len);
        self.bits[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Set the bit at `index` to one
    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len);
        self.bits[index / 8] |= 0x80 >> (index % 8);
    }

    /// Set the bit at `index` to `bit`
    #[inline]
    pub fn assign(&mut self, index: usize, bit: bool) {
        if bit {
            self.set(index);
        } else {
            assert!(index < self.len);
            self.bits[index / 8] &= !(0x80 >> (index % 8));
        }
    }

    /// Invert the bit at `index`
    ///
    /// Used by the error-correction pass. Does not touch the
    /// corrected-bit count; callers account for their own flips.
    #[inline]
    pub fn flip(&mut self, index: usize) {
        assert!(index < self.len);
        self.bits[index / 8] ^= 0x80 >> (index % 8);
    }

    /// Extract a contiguous range as an unsigned integer
    ///
    /// The first bit of `range` becomes the most significant bit of
    /// the result. `range` must span at most 32 bits.
    pub fn bits(&self, range: Range<usize>) -> u32 {
        debug_assert!(range.end - range.start <= 32);
        let mut value = 0u32;
        for index in range {
            value = (value << 1) | u32::from(self.get(index));
        }
        value
    }

    /// Extract the bits at an explicit index list as an unsigned integer
    ///
    /// The first listed index becomes the most significant bit. At
    /// most 32 indices.
    pub fn field(&self, indices: &[usize]) -> u32 {
        debug_assert!(indices.len() <= 32);
        let mut value = 0u32;
        for &index in indices {
            value = (value << 1) | u32::from(self.get(index));
        }
        value
    }

    /// Extract a contiguous range as a two's-complement signed integer
    ///
    /// The first bit of `range` is the sign bit. `range` must span at
    /// least 1 and at most 32 bits.
    pub fn signed(&self, range: Range<usize>) -> i32 {
        let width = range.end - range.start;
        debug_assert!(width >= 1 && width <= 32);
        let raw = self.bits(range);
        ((raw << (32 - width)) as i32) >> (32 - width)
    }

    /// Extract a contiguous range as uppercase hexadecimal
    ///
    /// Reads `range` four bits at a time, most significant bit first.
    /// The range length must be a multiple of four.
    pub fn hex(&self, range: Range<usize>) -> String {
        debug_assert!((range.end - range.start) % 4 == 0);
        let mut out = String::with_capacity((range.end - range.start) / 4);
        let mut start = range.start;
        while start < range.end {
            let nibble = self.bits(start..start + 4);
            out.push(char::from_digit(nibble, 16).unwrap_or('0').to_ascii_uppercase());
            start += 4;
        }
        out
    }

    /// Copy a bit range from another vector
    ///
    /// Writes `src[src_range]` into `self` starting at bit `offset`,
    /// without moving the write pointer. Used when reassembling
    /// multi-fragment payloads at fixed offsets.
    pub fn copy_from(&mut self, offset: usize, src: &BitVector, src_range: Range<usize>) {
        for (dst_index, src_index) in (offset..).zip(src_range) {
            if dst_index >= self.len {
                break;
            }
            self.assign(dst_index, src.get(src_index));
        }
    }

    /// Bits repaired by forward error correction
    ///
    /// Zero for messages that decoded cleanly, positive for messages
    /// with that many repaired bits, and negative when correction
    /// failed and the contents are unreliable.
    #[inline]
    pub fn corrected_count(&self) -> i32 {
        self.corrected
    }

    /// Record the corrected-bit count
    #[inline]
    pub fn set_corrected_count(&mut self, corrected: i32) {
        self.corrected = corrected;
    }
}

impl fmt::Display for BitVector {
    /// Full contents as uppercase hexadecimal
    ///
    /// If the length is not a multiple of four, the final partial
    /// nibble is padded with zeros on the right.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut start = 0;
        while start < self.len {
            let end = usize::min(start + 4, self.len);
            let mut nibble = self.bits(start..end);
            nibble <<= 4 - (end - start);
            write!(
                f,
                "{}",
                char::from_digit(nibble, 16)
                    .unwrap_or('0')
                    .to_ascii_uppercase()
            )?;
            start += 4;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_fill() {
        let mut vec = BitVector::new(4);
        assert_eq!(4, vec.len());
        assert!(!vec.is_full());

        vec.push(true);
        vec.push(false);
        vec.push(true);
        vec.push(true);
        assert!(vec.is_full());
        assert_eq!(0b1011, vec.bits(0..4));

        // pushes past the end are ignored
        vec.push(true);
        assert_eq!(4, vec.pointer());
        assert_eq!(0b1011, vec.bits(0..4));
    }

    #[test]
    fn test_from_hex() {
        let vec = BitVector::from_hex("08000F8A177E3903C230").unwrap();
        assert_eq!(80, vec.len());
        assert!(vec.is_full());
        assert_eq!(0x08, vec.bits(0..8));
        assert_eq!(0xC230, vec.bits(64..80));
        assert_eq!("08000F8A177E3903C230", format!("{}", vec));

        assert!(BitVector::from_hex("0q").is_none());
    }

    #[test]
    fn test_field_extraction() {
        let vec = BitVector::from_hex("A5").unwrap();

        // 0xA5 = 1010 0101
        assert_eq!(0b1010, vec.bits(0..4));
        assert_eq!(0b0101, vec.bits(4..8));
        assert_eq!(0b10, vec.bits(0..2));

        // explicit index lists, MSB first
        assert_eq!(0b1111, vec.field(&[0, 2, 5, 7]));
        assert_eq!(0b0000, vec.field(&[1, 3, 4, 6]));
        assert_eq!(0b11, vec.field(&[7, 0]));
    }

    #[test]
    fn test_signed_extraction() {
        // 1111 0110 = -10 in 8-bit two's complement
        let vec = BitVector::from_hex("F6").unwrap();
        assert_eq!(-10, vec.signed(0..8));
        assert_eq!(-1, vec.signed(0..4));
        assert_eq!(6, vec.signed(4..8));
        // sign extension at odd widths
        assert_eq!(-10, vec.signed(1..8));
    }

    #[test]
    fn test_hex_extraction() {
        let vec = BitVector::from_hex("08000F8A177E3903C230").unwrap();
        assert_eq!("177E3903", vec.hex(24..56));
        assert_eq!("08", vec.hex(0..8));
    }

    #[test]
    fn test_mutation() {
        let mut vec = BitVector::new(8);
        vec.set(0);
        vec.set(7);
        assert_eq!(0b1000_0001, vec.bits(0..8));

        vec.flip(0);
        vec.flip(1);
        assert_eq!(0b0100_0001, vec.bits(0..8));

        vec.assign(1, false);
        vec.assign(2, true);
        assert_eq!(0b0010_0001, vec.bits(0..8));
    }

    #[test]
    fn test_copy_from() {
        let src = BitVector::from_hex("FF").unwrap();
        let mut dst = BitVector::new(12);
        dst.copy_from(2, &src, 0..4);
        assert_eq!(0b0011_1100_0000, dst.bits(0..12));

        // copies that run past the end are truncated
        dst.copy_from(10, &src, 0..8);
        assert_eq!(0b0011_1100_0011, dst.bits(0..12));
    }

    #[test]
    fn test_corrected_count() {
        let mut vec = BitVector::new(16);
        assert_eq!(0, vec.corrected_count());
        vec.set_corrected_count(2);
        assert_eq!(2, vec.corrected_count());
        vec.set_corrected_count(-1);
        assert_eq!(-1, vec.corrected_count());
    }

    #[test]
    fn test_display_partial_nibble() {
        let mut vec = BitVector::new(6);
        for bit in [true, false, true, true, true, true] {
            vec.push(bit);
        }
        // 1011 11(00) pads to B C
        assert_eq!("BC", format!("{}", vec));
    }
}
