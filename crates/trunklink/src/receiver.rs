//! Channel receive pipeline
//!
//! [`LinkReceiver`] runs one logical channel end to end: raw
//! demodulated audio in, decoded [`Message`]s out. Per input
//! sample it makes at most one hard decision, at most one symbol
//! decision, and at most one framing/reassembly/decode step.
//! Nothing in the pipeline blocks or performs I/O, so a receiver
//! can be driven from whatever thread owns the audio.
//!
//! Each receiver owns all of its mutable state. Channels that
//! carry both signalling paths, or multiple timeslots, get one
//! receiver per path fed the same samples, with no sharing
//! between them.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use arrayvec::ArrayVec;

use crate::builder::{LinkReceiverBuilder, SignalPath};
use crate::message::{self, AliasAssembler, FragmentAssembler, Message};
use crate::protocol;
use crate::sink::MessageSink;

mod correlate;
mod dcblock;
mod filter;
mod framer;
mod symbol;
mod sync;
mod ted;

pub use sync::SyncState;

use correlate::FskDemodulator;
use dcblock::DcBlocker;
use framer::{Framer, FramerEvent};
use symbol::SymbolBuffer;
use sync::SyncMonitor;
use ted::TimingErrorDetector;

// the most messages one input sample can produce: each framer
// can complete a word, a completion can flush a stale fragment
// run, and every decode can finish a talker alias
const MESSAGES_PER_SAMPLE: usize = 8;

/// Observation points inside the pipeline
///
/// Offered to the optional instrumentation tap as the pipeline
/// runs. With no tap installed none of these are constructed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TapEvent {
    /// Hard decision from the demodulator, one per input sample
    Decision(bool),

    /// Clocked symbol out of the timing recovery
    Symbol(bool),

    /// Sync confidence changed
    Sync(SyncState),
}

/// Demodulator front end, one variant per [`SignalPath`]
#[derive(Clone, Debug)]
enum FrontEnd {
    /// Audible path: noncoherent tone correlation
    Fsk(FskDemodulator),

    /// Sub-audible path: DC removal, then slice on the sign
    Slicer(DcBlocker),
}

impl FrontEnd {
    fn decide(&mut self, sample: f32) -> bool {
        match self {
            FrontEnd::Fsk(demod) => demod.demodulate(sample),
            FrontEnd::Slicer(dc) => dc.filter(sample) > 0.0,
        }
    }

    fn reset(&mut self) {
        match self {
            FrontEnd::Fsk(demod) => demod.reset(),
            FrontEnd::Slicer(dc) => dc.reset(),
        }
    }
}

/// One channel's complete receive chain
///
/// Feed it `f32` samples of FM-demodulated audio and it produces
/// decoded signalling messages:
///
/// 1. A demodulator front end makes one hard decision per input
///    sample: tone correlation on the audible path, DC removal
///    and a sign slicer on the sub-audible path.
/// 2. Symbol timing recovery takes a majority-vote symbol once
///    per symbol period, steered by a zero-crossing timing error
///    detector whose gain follows sync confidence.
/// 3. Framers for the control and traffic sync patterns extract
///    fixed-length words from the symbol stream.
/// 4. Error correction, fragment reassembly, and talker alias
///    collection turn the words into [`Message`]s.
///
/// Create one with a [`LinkReceiverBuilder`]. Use
/// [`iter()`](Self::iter) to pull messages from an iterator of
/// samples, or [`process()`](Self::process) to push buffers with
/// caller-supplied timestamps into a [`MessageSink`].
#[derive(Clone, Debug)]
pub struct LinkReceiver {
    front_end: FrontEnd,
    ted: TimingErrorDetector,
    symbols: SymbolBuffer,
    sync: SyncMonitor,
    control: Framer,
    traffic: Framer,
    fragments: FragmentAssembler,
    aliases: AliasAssembler,
    timing_gains: (f32, f32, f32),
    sync_state: SyncState,
    timeslot: u8,
    input_rate: u32,
    input_sample_counter: u64,
    tap: Option<fn(TapEvent)>,
}

impl LinkReceiver {
    /// Receive messages from a source of audio
    ///
    /// Binds an iterator which consumes `input` and produces
    /// every decoded [`Message`], in decode order. The input
    /// must be mono `f32` PCM at this receiver's
    /// [`input_rate()`](Self::input_rate); no particular scaling
    /// is required, since both front ends compare rather than
    /// measure.
    ///
    /// Message timestamps count milliseconds of audio since the
    /// receiver was created or last [`reset()`](Self::reset). To
    /// stamp messages with a caller-supplied clock instead, use
    /// [`process()`](Self::process).
    ///
    /// The iterator returns `None` once the input is exhausted
    /// and no messages remain.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<I>(&mut self, input: I) -> SourceIter<'_, I::IntoIter>
    where
        I: IntoIterator<Item = f32>,
    {
        SourceIter {
            source: input.into_iter(),
            receiver: self,
            pending: ArrayVec::new(),
        }
    }

    /// Process one buffer of audio, delivering to a sink
    ///
    /// `timestamp_ms` is the caller's clock for the first sample
    /// of `samples`; later samples offset from it at the input
    /// rate. Every decoded message goes to `sink` immediately.
    /// Delivery is fire-and-forget: the sink must not block, and
    /// a sink that drops messages does not disturb decoding.
    pub fn process<S>(&mut self, samples: &[f32], timestamp_ms: u64, sink: &mut S)
    where
        S: MessageSink,
    {
        for (index, sample) in samples.iter().enumerate() {
            let now = timestamp_ms + index as u64 * 1000 / u64::from(self.input_rate);
            for message in self.process_sample(*sample, now) {
                sink.receive(message);
            }
        }
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Lifetime count of processed input samples
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Current sync confidence
    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// Timeslot label applied to decoded messages
    pub fn timeslot(&self) -> u8 {
        self.timeslot
    }

    /// Install or remove the instrumentation tap
    ///
    /// The tap observes every [`TapEvent`] on the thread driving
    /// the receiver. It is intended for debugging and defaults to
    /// `None`, which costs nothing per sample.
    pub fn set_tap(&mut self, tap: Option<fn(TapEvent)>) {
        self.tap = tap;
    }

    /// Clear all state and return to initial conditions
    ///
    /// Partial words and pending fragments are discarded, not
    /// decoded. The sample counter and the derived message clock
    /// restart at zero.
    pub fn reset(&mut self) {
        self.front_end.reset();
        self.ted.reset();
        self.symbols.reset();
        self.symbols.set_timing_gain(self.timing_gains.0);
        self.sync.reset();
        self.control.reset();
        self.traffic.reset();
        self.fragments.reset();
        self.aliases.reset(self.timeslot);
        self.sync_state = SyncState::Coarse;
        self.input_sample_counter = 0;
    }

    // Milliseconds of audio consumed so far, for the pull API
    fn clock_ms(&self) -> u64 {
        self.input_sample_counter * 1000 / u64::from(self.input_rate)
    }

    // Run one sample through the whole pipeline
    //
    // `now` is the timestamp to latch if a sync pattern matches
    // on this sample's symbol.
    fn process_sample(&mut self, sample: f32, now: u64) -> ArrayVec<Message, MESSAGES_PER_SAMPLE> {
        let mut out = ArrayVec::new();
        self.input_sample_counter = self.input_sample_counter.wrapping_add(1);

        let decision = self.front_end.decide(sample);
        self.emit_tap(TapEvent::Decision(decision));
        self.ted.receive(decision);
        self.symbols.receive(decision);
        if !self.symbols.has_symbol() {
            return out;
        }

        let symbol = self.symbols.symbol();
        self.symbols.reset_and_adjust(self.ted.error());
        self.emit_tap(TapEvent::Symbol(symbol));

        self.sync.increment();
        self.update_sync_state();

        match self.control.process(symbol, now) {
            FramerEvent::SyncDetected => {
                self.sync.sync_detected();
                self.update_sync_state();
            }
            FramerEvent::Complete(word, timestamp) => {
                let decoded = message::decode_control(word, timestamp, self.timeslot);
                self.deliver(decoded, &mut out);
            }
            FramerEvent::Idle => {}
        }

        match self.traffic.process(symbol, now) {
            FramerEvent::SyncDetected => {
                self.sync.sync_detected();
                self.update_sync_state();
            }
            FramerEvent::Complete(burst, timestamp) => {
                for decoded in self.fragments.process(burst, timestamp, self.timeslot) {
                    self.deliver(decoded, &mut out);
                }
            }
            FramerEvent::Idle => {}
        }

        out
    }

    // Queue a decoded message, plus any alias it completes
    fn deliver(&mut self, decoded: Message, out: &mut ArrayVec<Message, MESSAGES_PER_SAMPLE>) {
        debug!(
            "[{:<14}] decoded {}",
            self.input_sample_counter,
            &decoded
        );
        let assembled = self.aliases.process(&decoded);
        out.push(decoded);
        if let Some(alias) = assembled {
            debug!("[{:<14}] decoded {}", self.input_sample_counter, &alias);
            out.push(alias);
        }
    }

    // Follow the sync monitor: reschedule the timing gain on any
    // change, and discard in-flight reassembly on sync loss
    fn update_sync_state(&mut self) {
        let state = self.sync.state();
        if state == self.sync_state {
            return;
        }
        debug!(
            "[{:<14}] sync {} -> {}: {}",
            self.input_sample_counter,
            self.sync_state,
            state,
            state.as_display_str()
        );
        self.symbols.set_timing_gain(self.timing_gain(state));
        if state == SyncState::Coarse {
            self.fragments.reset();
            self.aliases.reset(self.timeslot);
        }
        self.sync_state = state;
        self.emit_tap(TapEvent::Sync(state));
    }

    fn timing_gain(&self, state: SyncState) -> f32 {
        match state {
            SyncState::Coarse => self.timing_gains.0,
            SyncState::Medium => self.timing_gains.1,
            SyncState::Fine => self.timing_gains.2,
        }
    }

    #[inline]
    fn emit_tap(&self, event: TapEvent) {
        if let Some(tap) = self.tap {
            tap(event);
        }
    }
}

impl From<&LinkReceiverBuilder> for LinkReceiver {
    /// Create the receiver from its builder
    fn from(cfg: &LinkReceiverBuilder) -> Self {
        let input_rate = cfg.input_rate();
        let samples_per_symbol = match cfg.signal_path() {
            SignalPath::Audible => protocol::samples_per_symbol(input_rate),
            SignalPath::SubAudible => protocol::subaudible_samples_per_symbol(input_rate),
        };
        let front_end = match cfg.signal_path() {
            SignalPath::Audible => FrontEnd::Fsk(FskDemodulator::new(input_rate)),
            SignalPath::SubAudible => {
                let taps = (cfg.dc_block_symbols() * samples_per_symbol).round() as usize;
                FrontEnd::Slicer(DcBlocker::new(taps.max(1)))
            }
        };
        let timing_gains = cfg.timing_gains();
        // slowest cadence a live channel produces: one control word
        // per message, plus up to a message worth of preamble
        let message_length = 2 * (protocol::SYNC_LEN + protocol::CONTROL_WORD_LEN) as u32;

        Self {
            front_end,
            ted: TimingErrorDetector::new(samples_per_symbol),
            symbols: SymbolBuffer::new(samples_per_symbol, timing_gains.0),
            sync: SyncMonitor::new(message_length),
            control: Framer::new(
                protocol::SYNC_CONTROL,
                protocol::SYNC_LEN,
                protocol::CONTROL_WORD_LEN,
            ),
            traffic: Framer::new(
                protocol::SYNC_TRAFFIC,
                protocol::SYNC_LEN,
                protocol::TRAFFIC_BURST_LEN,
            ),
            fragments: FragmentAssembler::new(),
            aliases: AliasAssembler::new(),
            timing_gains,
            sync_state: SyncState::Coarse,
            timeslot: cfg.timeslot(),
            input_rate,
            input_sample_counter: 0,
            tap: None,
        }
    }
}

/// Sample source iterator
///
/// Bound to a source of mono `f32` PCM samples by
/// [`LinkReceiver::iter()`]. Each call to `next()` consumes
/// samples until the receiver produces another [`Message`], and
/// returns `None` once the source is exhausted.
#[derive(Debug)]
pub struct SourceIter<'rx, I>
where
    I: Iterator<Item = f32>,
{
    source: I,
    receiver: &'rx mut LinkReceiver,
    pending: ArrayVec<Message, MESSAGES_PER_SAMPLE>,
}

impl<'rx, I> Iterator for SourceIter<'rx, I>
where
    I: Iterator<Item = f32>,
{
    type Item = Message;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.pending.is_empty() {
                return Some(self.pending.remove(0));
            }
            let sample = self.source.next()?;
            let now = self.receiver.clock_ms();
            self.pending = self.receiver.process_sample(sample, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::bits::BitVector;
    use crate::edac::crc;

    // group voice control word for talkgroup 2001, radio 7000123,
    // sealed with a freshly computed checksum
    fn sealed_group_voice() -> Vec<bool> {
        let mut word = BitVector::new(protocol::CONTROL_WORD_LEN);
        for bit in protocol::word_bits(0x0000_8000, 32) {
            word.push(bit);
        }
        for bit in protocol::word_bits(0x07D1_6AD0, 32) {
            word.push(bit);
        }
        for bit in protocol::word_bits(0x3B00, 16) {
            word.push(bit);
        }
        let crc = crc::checksum(&word);
        for bit in protocol::word_bits(u32::from(crc), 16) {
            word.push(bit);
        }
        (0..word.len()).map(|index| word.get(index)).collect()
    }

    // preamble, control sync, and word, as transmitted
    fn control_frame_bits(word: &[bool], preamble_bytes: usize) -> Vec<bool> {
        let mut bits = protocol::preamble_bits(preamble_bytes);
        bits.extend(protocol::word_bits(protocol::SYNC_CONTROL, protocol::SYNC_LEN));
        bits.extend_from_slice(word);
        bits
    }

    #[test]
    fn test_audible_end_to_end() {
        let word = sealed_group_voice();
        let mut bits = control_frame_bits(&word, 16);
        bits.extend(control_frame_bits(&word, 4));
        // padding so the last symbol clears the DSP delays
        bits.extend(protocol::preamble_bits(2));

        let (samples, _) = protocol::modulate_fsk(&bits, protocol::AUDIBLE_RATE_HZ);
        let mut rx = LinkReceiverBuilder::new(protocol::AUDIBLE_RATE_HZ).build();

        let calls: Vec<Message> = rx
            .iter(samples.iter().copied())
            .filter(|message| matches!(message, Message::GroupVoice(_)))
            .collect();

        assert_eq!(2, calls.len());
        for message in &calls {
            assert!(message.is_valid());
            assert_eq!(0, message.corrected_count());
            match message {
                Message::GroupVoice(call) => {
                    assert_eq!(2001, call.talkgroup());
                    assert_eq!(7_000_123, call.source_radio());
                }
                other => panic!("wrong variant: {:?}", other),
            }
        }

        // timestamps count audio time and follow transmission order
        assert!(calls[0].timestamp() < calls[1].timestamp());

        // two detections in quick succession reach full confidence
        assert_eq!(SyncState::Fine, rx.sync_state());
    }

    #[test]
    fn test_subaudible_end_to_end() {
        const FS: u32 = 8000;

        // single-fragment traffic burst carrying 0xCAFEBABE
        let mut burst = protocol::word_bits(0, 5);
        burst.extend(protocol::word_bits(0, 2)); // tag: single
        burst.extend(protocol::word_bits(0, 9));
        burst.extend(protocol::word_bits(0xCAFEBABE, 32));

        let mut bits = protocol::preamble_bits(16);
        bits.extend(protocol::word_bits(protocol::SYNC_TRAFFIC, protocol::SYNC_LEN));
        bits.extend(burst);
        bits.extend(protocol::preamble_bits(2));

        // NRZ level shift riding on a DC offset, at a fractional
        // 26.67 samples per symbol
        let sps = protocol::subaudible_samples_per_symbol(FS);
        let total = (bits.len() as f32 * sps) as usize;
        let samples: Vec<f32> = (0..total)
            .map(|n| {
                let bit = bits[(n as f32 / sps) as usize];
                0.4 + if bit { 1.0 } else { -1.0 }
            })
            .collect();

        let mut rx = LinkReceiverBuilder::new(FS)
            .with_signal_path(SignalPath::SubAudible)
            .with_timeslot(1)
            .build();

        let bursts: Vec<Message> = rx
            .iter(samples)
            .filter(|message| matches!(message, Message::ShortBurst(_)))
            .collect();

        assert_eq!(1, bursts.len());
        match &bursts[0] {
            Message::ShortBurst(short) => {
                assert_eq!(0xCAFEBABE, short.payload());
                assert_eq!(1, short.envelope().timeslot());
                assert!(short.envelope().is_valid());
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_process_uses_caller_timestamps() {
        let word = sealed_group_voice();
        let mut bits = control_frame_bits(&word, 16);
        bits.extend(protocol::preamble_bits(2));
        let (samples, _) = protocol::modulate_fsk(&bits, protocol::AUDIBLE_RATE_HZ);

        let mut rx = LinkReceiverBuilder::new(protocol::AUDIBLE_RATE_HZ).build();
        let mut seen = Vec::new();
        let mut sink = |message: Message| seen.push(message);
        rx.process(samples.as_slice(), 1_700_000_000_000, &mut sink);

        let call = seen
            .iter()
            .find(|message| matches!(message, Message::GroupVoice(_)))
            .expect("no group voice decoded");
        // stamped at the sync match, offset from the buffer clock
        assert!(call.timestamp() >= 1_700_000_000_000);
        assert!(call.timestamp() < 1_700_000_000_000 + 1000);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let word = sealed_group_voice();
        let bits = control_frame_bits(&word, 16);
        let (samples, _) = protocol::modulate_fsk(&bits, protocol::AUDIBLE_RATE_HZ);

        let mut rx = LinkReceiverBuilder::new(protocol::AUDIBLE_RATE_HZ).build();

        // stop partway through the word, then reset
        let partial = samples.len() - 40 * 6;
        assert_eq!(0, rx.iter(samples.as_slice()[..partial].iter().copied()).count());
        rx.reset();
        assert_eq!(0, rx.input_sample_counter());
        assert_eq!(SyncState::Coarse, rx.sync_state());

        // the remainder alone must not produce a message
        let tail: Vec<f32> = samples.as_slice()[partial..].to_vec();
        assert_eq!(0, rx.iter(tail).count());
    }

    static TAP_DECISIONS: AtomicUsize = AtomicUsize::new(0);

    fn counting_tap(event: TapEvent) {
        if matches!(event, TapEvent::Decision(_)) {
            TAP_DECISIONS.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_tap_observes_every_decision() {
        let mut rx = LinkReceiverBuilder::new(protocol::AUDIBLE_RATE_HZ).build();
        rx.set_tap(Some(counting_tap));
        assert_eq!(0, rx.iter(std::iter::repeat(0.0f32).take(100)).count());
        assert_eq!(100, TAP_DECISIONS.load(Ordering::Relaxed));

        // removing the tap stops the observations
        rx.set_tap(None);
        assert_eq!(0, rx.iter(std::iter::repeat(0.0f32).take(100)).count());
        assert_eq!(100, TAP_DECISIONS.load(Ordering::Relaxed));
    }

    #[test]
    fn test_silence_decodes_nothing() {
        let mut rx = LinkReceiverBuilder::new(protocol::AUDIBLE_RATE_HZ).build();
        assert_eq!(
            0,
            rx.iter(std::iter::repeat(0.0f32).take(7200 * 2)).count()
        );
        assert_eq!(SyncState::Coarse, rx.sync_state());
        assert_eq!(7200 * 2, rx.input_sample_counter());
    }
}
