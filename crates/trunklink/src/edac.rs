//! # Error detection and correction
//!
//! Every framed message passes through one of two correction paths
//! before decoding:
//!
//! * Control words carry a CRC-16 over their first 80 bits. The
//!   [`crc`] module verifies it and repairs one- and two-bit errors
//!   by syndrome lookup.
//!
//! * Traffic-burst fragments reassemble into a 128-bit block
//!   protected by the embedded link-control block code. The [`bptc`]
//!   module de-interleaves the block and corrects its
//!   [Hamming-protected](hamming) rows.
//!
//! Neither path ever discards a message. Correction failures are
//! recorded as a negative corrected-bit count on the output
//! [`BitVector`](crate::bits::BitVector) and surface as messages
//! flagged invalid.

pub mod bptc;
pub mod crc;
pub mod hamming;
