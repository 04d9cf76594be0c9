//! Traffic burst fragment reassembly
//!
//! Full-length link control does not fit in one traffic burst.
//! It is cut into four 32-bit fragments, tagged with a position
//! in the sequence, and spread across consecutive bursts. The
//! [`FragmentAssembler`] collects the fragments back into one
//! 128-bit block for error correction and decoding.
//!
//! Reception is lossy. Fragments go missing, sequences restart
//! mid-flight, and tags arrive out of order. The assembler never
//! discards signalling silently: incomplete accumulations are
//! padded out, decoded best-effort, and delivered flagged
//! invalid so callers can count them.

use arrayvec::ArrayVec;

use crate::bits::BitVector;
use crate::edac::bptc;
use crate::protocol;

use super::identifier::Origin;
use super::lc::{Envelope, ShortBurst};
use super::Message;

/// Position of a fragment within its sequence, bits `[5..7)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentTag {
    /// Complete in one burst
    Single,

    /// First fragment of four
    First,

    /// Final fragment of four
    Last,

    /// Middle fragment
    Continuation,
}

impl From<u32> for FragmentTag {
    fn from(code: u32) -> Self {
        match code & 0x3 {
            0 => Self::Single,
            1 => Self::First,
            2 => Self::Last,
            _ => Self::Continuation,
        }
    }
}

/// Collects link control fragments from traffic bursts
///
/// Holds at most four pending fragments. Single-fragment bursts
/// pass straight through as [`ShortBurst`] messages.
#[derive(Clone, Debug)]
pub struct FragmentAssembler {
    fragments: ArrayVec<u32, 4>,
    missing: u32,
    active: bool,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self {
            fragments: ArrayVec::new(),
            missing: 0,
            active: false,
        }
    }

    /// Process one framed traffic burst
    ///
    /// Returns zero, one, or two messages: completing a sequence
    /// yields its message, and a burst that implicitly abandons a
    /// previous sequence also yields that sequence's best-effort
    /// decode.
    pub fn process(
        &mut self,
        burst: BitVector,
        timestamp: u64,
        timeslot: u8,
    ) -> ArrayVec<Message, 2> {
        let mut out = ArrayVec::new();
        match FragmentTag::from(burst.bits(5..7)) {
            FragmentTag::Single => {
                let envelope = Envelope::new(burst, timestamp, timeslot, Origin::LinkControl);
                out.push(ShortBurst::decode(envelope));
            }
            FragmentTag::First => {
                if let Some(stale) = self.flush(timestamp, timeslot) {
                    out.push(stale);
                }
                self.begin();
                self.fragments.push(burst.bits(16..48));
            }
            FragmentTag::Continuation => {
                if !self.active {
                    // no first fragment was seen; hold its place
                    self.begin();
                    self.push_missing();
                }
                if self.fragments.is_full() {
                    if let Some(stale) = self.flush(timestamp, timeslot) {
                        out.push(stale);
                    }
                    self.begin();
                    self.push_missing();
                }
                self.fragments.push(burst.bits(16..48));
            }
            FragmentTag::Last => {
                if !self.active {
                    self.begin();
                }
                if self.fragments.is_full() {
                    if let Some(stale) = self.flush(timestamp, timeslot) {
                        out.push(stale);
                    }
                    self.begin();
                }
                while self.fragments.len() < 3 {
                    self.push_missing();
                }
                self.fragments.push(burst.bits(16..48));
                if let Some(message) = self.flush(timestamp, timeslot) {
                    out.push(message);
                }
            }
        }
        out
    }

    /// Abandon any pending fragments without decoding them
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.missing = 0;
        self.active = false;
    }

    fn begin(&mut self) {
        self.fragments.clear();
        self.missing = 0;
        self.active = true;
    }

    fn push_missing(&mut self) {
        self.fragments.push(0);
        self.missing += 1;
    }

    /// Decode whatever has accumulated and clear the state
    ///
    /// An accumulation short of four fragments is zero-padded and
    /// its decode is forced invalid.
    fn flush(&mut self, timestamp: u64, timeslot: u8) -> Option<Message> {
        if self.fragments.is_empty() {
            self.reset();
            return None;
        }

        let incomplete = self.fragments.len() < 4 || self.missing > 0;
        let mut block = BitVector::new(bptc::BLOCK_LEN);
        for index in 0..4 {
            let fragment = self.fragments.get(index).copied().unwrap_or(0);
            for bit in protocol::word_bits(fragment, 32) {
                block.push(bit);
            }
        }
        self.reset();

        let mut payload = bptc::decode(&block);
        if incomplete {
            payload.set_corrected_count(-1);
        }
        let envelope = Envelope::new(payload, timestamp, timeslot, Origin::LinkControl);
        Some(super::dispatch(envelope))
    }
}

impl Default for FragmentAssembler {
    fn default() -> Self {
        Self::new()
    }
}
