//! # Embedded link-control block code
//!
//! Link-control payloads ride across four traffic bursts as a
//! 128-bit interleaved block. De-interleaved with a stride of 16
//! modulo 127, the block forms an 8x16 matrix:
//!
//! * rows 0..6 are [Hamming(16,11,4)](super::hamming) codewords
//!   carrying 77 data bits between them,
//! * row 7 is even parity over each of the 16 columns.
//!
//! The 77 data bits are a 72-bit link-control payload plus a 5-bit
//! checksum, the sum of the payload's nine octets modulo 31.
//!
//! [`decode()`] always produces the 72-bit payload. Repairs are
//! totalled into the payload's corrected-bit count; an unrecoverable
//! row, a failed column parity, or a checksum mismatch marks the
//! payload uncorrectable instead of discarding it.

use crate::bits::BitVector;

use super::hamming;

/// Interleaved block length, in bits
pub const BLOCK_LEN: usize = 128;

/// Link-control payload length, in bits
pub const PAYLOAD_LEN: usize = 72;

// matrix shape
const ROWS: usize = 8;
const COLS: usize = hamming::ROW_LEN;

// payload bit runs within the de-interleaved matrix: all eleven
// data bits of rows 0 and 1, the first ten of rows 2 through 6
const PAYLOAD_RUNS: [(usize, usize); 7] = [
    (0, 11),
    (16, 27),
    (32, 42),
    (48, 58),
    (64, 74),
    (80, 90),
    (96, 106),
];

// checksum bits, most significant first: the eleventh data bit of
// rows 2 through 6
const CHECKSUM_BITS: [usize; 5] = [42, 58, 74, 90, 106];

/// Decode one interleaved 128-bit block
///
/// Returns the 72-bit link-control payload. The payload's
/// corrected-bit count holds the total number of repaired bits, or
/// -1 if the block could not be verified; the payload bits are then
/// a best effort and the resulting message should be flagged
/// invalid.
pub fn decode(block: &BitVector) -> BitVector {
    debug_assert_eq!(BLOCK_LEN, block.len());

    let mut matrix = [false; BLOCK_LEN];
    let mut source = 0usize;
    for slot in matrix.iter_mut() {
        *slot = block.get(source);
        source += COLS;
        if source > BLOCK_LEN - 1 {
            source -= BLOCK_LEN - 1;
        }
    }

    let mut corrected = 0i32;
    let mut failed = false;

    for row_index in 0..ROWS - 1 {
        let mut row = [false; hamming::ROW_LEN];
        row.copy_from_slice(&matrix[row_index * COLS..(row_index + 1) * COLS]);
        match hamming::correct(&mut row) {
            Some(repairs) => corrected += repairs as i32,
            None => failed = true,
        }
        matrix[row_index * COLS..(row_index + 1) * COLS].copy_from_slice(&row);
    }

    if !failed {
        for column in 0..COLS {
            let mut parity = false;
            for row_index in 0..ROWS {
                parity ^= matrix[row_index * COLS + column];
            }
            if parity {
                failed = true;
                break;
            }
        }
    }

    let mut payload = BitVector::new(PAYLOAD_LEN);
    for (start, end) in PAYLOAD_RUNS {
        for index in start..end {
            payload.push(matrix[index]);
        }
    }

    let mut declared = 0u32;
    for (weight, &position) in CHECKSUM_BITS.iter().enumerate() {
        if matrix[position] {
            declared |= 16 >> weight;
        }
    }
    if declared != payload_checksum(&payload) {
        failed = true;
    }

    payload.set_corrected_count(if failed { -1 } else { corrected });
    payload
}

// Checksum over the payload: the sum of its nine octets, modulo 31
fn payload_checksum(payload: &BitVector) -> u32 {
    let mut sum = 0u32;
    for octet in 0..PAYLOAD_LEN / 8 {
        sum += payload.bits(octet * 8..(octet + 1) * 8);
    }
    sum % 31
}

/// Build an interleaved block around the given checksum value
#[cfg(test)]
pub fn assemble(payload: &BitVector, checksum: u32) -> BitVector {
    assert_eq!(PAYLOAD_LEN, payload.len());

    let mut matrix = [false; BLOCK_LEN];
    let mut taken = 0usize;
    for row_index in 0..ROWS - 1 {
        let mut data = [false; hamming::DATA_LEN];
        let run = if row_index < 2 { 11 } else { 10 };
        for (column, slot) in data.iter_mut().take(run).enumerate() {
            *slot = payload.get(taken + column);
        }
        if row_index >= 2 {
            data[10] = checksum & (16 >> (row_index - 2)) != 0;
        }
        taken += run;
        let row = hamming::encode(&data);
        matrix[row_index * COLS..(row_index + 1) * COLS].copy_from_slice(&row);
    }
    for column in 0..COLS {
        let mut parity = false;
        for row_index in 0..ROWS - 1 {
            parity ^= matrix[row_index * COLS + column];
        }
        matrix[(ROWS - 1) * COLS + column] = parity;
    }

    // invert the interleave map, then emit in wire order
    let mut origin = [0usize; BLOCK_LEN];
    let mut target = 0usize;
    for index in 0..BLOCK_LEN {
        origin[target] = index;
        target += COLS;
        if target > BLOCK_LEN - 1 {
            target -= BLOCK_LEN - 1;
        }
    }
    let mut block = BitVector::new(BLOCK_LEN);
    for position in 0..BLOCK_LEN {
        block.push(matrix[origin[position]]);
    }
    block
}

/// Encode a payload into a valid interleaved block
#[cfg(test)]
pub fn encode(payload: &BitVector) -> BitVector {
    assemble(payload, payload_checksum(payload))
}
