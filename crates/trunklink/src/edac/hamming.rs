//! # Hamming(16,11,4) block code
//!
//! Each of the seven data rows of an embedded link-control block is
//! a Hamming(16,11,4) codeword: eleven data bits followed by five
//! parity bits. Minimum distance four corrects any single-bit error
//! and detects (but cannot correct) double-bit errors.
//!
//! Rows are handled as `[bool; 16]` slices of the de-interleaved
//! block. [`correct()`] repairs a row in place and reports how many
//! bits changed.

/// Row length, in bits
pub const ROW_LEN: usize = 16;

/// Data bits per row
pub const DATA_LEN: usize = 11;

// Parity-check matrix, one 5-bit column per codeword position.
// Data columns first, then the five parity positions. Every column
// is distinct and nonzero, which is what makes single-error
// positions recoverable from the syndrome alone.
const COLUMNS: [u8; ROW_LEN] = [
    0x19, 0x0B, 0x1F, 0x07, 0x0E, 0x15, 0x1A, 0x0D, 0x13, 0x16, 0x1C, 0x01, 0x02, 0x04, 0x08,
    0x10,
];

/// Compute the syndrome of a row
///
/// Zero for a valid codeword.
pub fn syndrome(row: &[bool; ROW_LEN]) -> u8 {
    let mut syn = 0u8;
    for (bit, column) in row.iter().zip(COLUMNS) {
        if *bit {
            syn ^= column;
        }
    }
    syn
}

/// Correct a row in place
///
/// Returns the number of repaired bits (0 or 1), or `None` if the
/// syndrome matches no single-bit error and the row is
/// unrecoverable.
pub fn correct(row: &mut [bool; ROW_LEN]) -> Option<u32> {
    match syndrome(row) {
        0 => Some(0),
        syn => {
            let position = COLUMNS.iter().position(|&column| column == syn)?;
            row[position] = !row[position];
            Some(1)
        }
    }
}

/// Encode eleven data bits into a row
#[cfg(test)]
pub fn encode(data: &[bool; DATA_LEN]) -> [bool; ROW_LEN] {
    let mut row = [false; ROW_LEN];
    row[..DATA_LEN].copy_from_slice(data);
    for parity in 0..(ROW_LEN - DATA_LEN) {
        let mask = 1u8 << parity;
        let mut acc = false;
        for (bit, column) in row[..DATA_LEN].iter().zip(COLUMNS) {
            if *bit && column & mask != 0 {
                acc = !acc;
            }
        }
        row[DATA_LEN + parity] = acc;
    }
    row
}
