//! Sync pattern search and word framing
//!
//! Decoded symbols shift through a search register until the
//! register matches a sync pattern. The symbols that follow are
//! collected into a fixed-length word and handed back, stamped
//! with the time the sync was found. One [`Framer`] runs per
//! sync pattern, so the control and traffic patterns are
//! searched independently.

use crate::bits::BitVector;

/// Outcome of feeding one symbol to a [`Framer`]
#[derive(Clone, Debug, PartialEq)]
pub enum FramerEvent {
    /// Nothing to report
    Idle,

    /// The sync pattern was just matched
    SyncDetected,

    /// A complete word, and the timestamp of its sync match
    Complete(BitVector, u64),
}

#[derive(Clone, Debug)]
enum State {
    /// Shifting symbols through the search register
    Searching,

    /// Collecting the word that follows a sync match
    Reading { word: BitVector, timestamp: u64 },
}

/// Collects fixed-length words that follow a sync pattern
#[derive(Clone, Debug)]
pub struct Framer {
    pattern: u32,
    pattern_len: usize,
    mask: u32,
    register: u32,
    warmup: usize,
    word_len: usize,
    state: State,
}

impl Framer {
    /// Create a framer
    ///
    /// Searches for the `pattern_len` least significant bits of
    /// `pattern`, then collects the `word_len` symbols that
    /// follow each match. `pattern_len` must be between 1 and 32.
    pub fn new(pattern: u32, pattern_len: usize, word_len: usize) -> Self {
        assert!(pattern_len >= 1 && pattern_len <= 32);
        let mask = (u32::MAX) >> (32 - pattern_len);
        Self {
            pattern: pattern & mask,
            pattern_len,
            mask,
            register: 0,
            warmup: 0,
            word_len,
            state: State::Searching,
        }
    }

    /// Process one decoded symbol
    ///
    /// `now` is the receiver timestamp for this symbol. It is
    /// latched when the sync pattern matches and reported with
    /// the completed word.
    pub fn process(&mut self, symbol: bool, now: u64) -> FramerEvent {
        match std::mem::replace(&mut self.state, State::Searching) {
            State::Searching => {
                self.register = ((self.register << 1) | symbol as u32) & self.mask;
                self.warmup = self.warmup.saturating_add(1);
                if self.warmup >= self.pattern_len && self.register == self.pattern {
                    self.state = State::Reading {
                        word: BitVector::new(self.word_len),
                        timestamp: now,
                    };
                    FramerEvent::SyncDetected
                } else {
                    FramerEvent::Idle
                }
            }
            State::Reading {
                mut word,
                timestamp,
            } => {
                word.push(symbol);
                if word.is_full() {
                    self.register = 0;
                    self.warmup = 0;
                    FramerEvent::Complete(word, timestamp)
                } else {
                    self.state = State::Reading { word, timestamp };
                    FramerEvent::Idle
                }
            }
        }
    }

    /// Abandon any word in progress and restart the search
    pub fn reset(&mut self) {
        self.register = 0;
        self.warmup = 0;
        self.state = State::Searching;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol;

    fn feed(framer: &mut Framer, bits: &[bool], start_time: u64) -> Vec<FramerEvent> {
        bits.iter()
            .enumerate()
            .map(|(index, bit)| framer.process(*bit, start_time + index as u64))
            .collect()
    }

    #[test]
    fn test_sync_match_timing() {
        let mut framer = Framer::new(
            protocol::SYNC_CONTROL,
            protocol::SYNC_LEN,
            protocol::CONTROL_WORD_LEN,
        );

        let events = feed(
            &mut framer,
            &protocol::word_bits(protocol::SYNC_CONTROL, protocol::SYNC_LEN),
            100,
        );
        for event in &events[..protocol::SYNC_LEN - 1] {
            assert_eq!(FramerEvent::Idle, *event);
        }
        assert_eq!(FramerEvent::SyncDetected, events[protocol::SYNC_LEN - 1]);
    }

    #[test]
    fn test_word_capture() {
        let mut framer = Framer::new(
            protocol::SYNC_CONTROL,
            protocol::SYNC_LEN,
            protocol::CONTROL_WORD_LEN,
        );
        let expected = BitVector::from_hex("0000000007D16ACE3B000096").unwrap();

        feed(
            &mut framer,
            &protocol::word_bits(protocol::SYNC_CONTROL, protocol::SYNC_LEN),
            40,
        );
        let word: Vec<bool> = (0..expected.len()).map(|i| expected.get(i)).collect();
        let events = feed(&mut framer, &word, 64);

        for event in &events[..events.len() - 1] {
            assert_eq!(FramerEvent::Idle, *event);
        }
        // the timestamp is from the sync match, not the last symbol
        assert_eq!(
            FramerEvent::Complete(expected, 63),
            events[events.len() - 1]
        );
    }

    #[test]
    fn test_register_warmup() {
        // the control pattern has a zero in its highest bit, so a
        // fresh zeroed register must not match one symbol early
        let mut framer = Framer::new(
            protocol::SYNC_CONTROL,
            protocol::SYNC_LEN,
            protocol::CONTROL_WORD_LEN,
        );

        let events = feed(
            &mut framer,
            &protocol::word_bits(protocol::SYNC_CONTROL, protocol::SYNC_LEN - 1),
            0,
        );
        assert!(events.iter().all(|event| *event == FramerEvent::Idle));
    }

    #[test]
    fn test_sync_inside_word_ignored() {
        let mut framer = Framer::new(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN, 48);

        feed(
            &mut framer,
            &protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN),
            0,
        );
        // a word that happens to contain the sync pattern
        let mut word = protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN);
        word.extend(protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN));
        let events = feed(&mut framer, &word, protocol::SYNC_LEN as u64);

        let completions = events
            .iter()
            .filter(|event| matches!(event, FramerEvent::Complete(..)))
            .count();
        let syncs = events
            .iter()
            .filter(|event| matches!(event, FramerEvent::SyncDetected))
            .count();
        assert_eq!(1, completions);
        assert_eq!(0, syncs);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut framer = Framer::new(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN, 48);

        let mut stream = protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN);
        stream.extend(std::iter::repeat(false).take(48));
        stream.extend(protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN));
        stream.extend(std::iter::repeat(true).take(48));

        let events = feed(&mut framer, &stream, 0);
        let completions: Vec<&FramerEvent> = events
            .iter()
            .filter(|event| matches!(event, FramerEvent::Complete(..)))
            .collect();
        assert_eq!(2, completions.len());

        // the second frame requires a full fresh pattern
        if let FramerEvent::Complete(word, timestamp) = completions[1] {
            assert_eq!(48, word.len());
            assert_eq!(0xF, word.bits(0..4));
            assert_eq!(95, *timestamp);
        }
    }

    #[test]
    fn test_reset_abandons_word() {
        let mut framer = Framer::new(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN, 48);
        feed(
            &mut framer,
            &protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN),
            0,
        );
        framer.process(true, 24);
        framer.reset();

        // no completion can arrive without a fresh sync
        for index in 0..200u64 {
            let event = framer.process(false, index);
            assert!(!matches!(event, FramerEvent::Complete(..)));
        }
    }
}
