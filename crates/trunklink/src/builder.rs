use crate::protocol;
use crate::receiver::{LinkReceiver, SyncState};

/// Which embedded signalling path a receiver decodes
///
/// Both paths use the same framing and carry the same messages;
/// they differ in how the bits ride on the demodulated audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalPath {
    /// In-band FSK bursts at 1200 baud
    ///
    /// Mark and space tones sit inside the voice passband. The
    /// receiver detects them with noncoherent tone correlation.
    Audible,

    /// Sub-audible signalling at 300 baud
    ///
    /// The data arrives as a low-frequency level shift beneath
    /// the voice. The receiver removes the DC offset and slices
    /// on the sign.
    SubAudible,
}

/// Builds a trunked-signalling receiver
///
/// The builder comes with a sensible set of default options.
/// All you really need to provide is the input sampling rate;
/// one receiver decodes one [`SignalPath`], and the default is
/// the audible path.
///
/// The API specified by the builder is part of this crate's
/// API. The actual default values are *not*, however, and are
/// subject to revision in any minor release. If you care very
/// strongly about a setting, be sure to configure it here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkReceiverBuilder {
    input_rate: u32,
    signal_path: SignalPath,
    timeslot: u8,
    dc_block_symbols: f32,
    timing_gain_coarse: f32,
    timing_gain_medium: f32,
    timing_gain_fine: f32,
}

impl LinkReceiverBuilder {
    /// New receiver chain with "sensible" defaults
    ///
    /// The only mandatory parameter is the input sampling rate,
    /// in Hz. Rates are accepted from 2400 Hz, which leaves two
    /// samples per audible-path symbol, up to 76800 Hz; rates
    /// outside that range are clamped. Use a rate your FM
    /// demodulator already produces; resampling is not required
    /// as long as the symbol period works out to at least two
    /// samples.
    pub fn new(input_rate: u32) -> Self {
        Self {
            input_rate: input_rate.clamp(2400, 76800),
            signal_path: SignalPath::Audible,
            timeslot: 0,
            dc_block_symbols: 8.0,
            timing_gain_coarse: SyncState::Coarse.timing_gain(),
            timing_gain_medium: SyncState::Medium.timing_gain(),
            timing_gain_fine: SyncState::Fine.timing_gain(),
        }
    }

    /// Build a receiver chain
    ///
    /// Once built, the receiver chain is immediately ready to
    /// process samples.
    pub fn build(&self) -> LinkReceiver {
        LinkReceiver::from(self)
    }

    /// Select the signalling path to decode
    ///
    /// A channel that carries both paths needs two receivers,
    /// one per path, fed the same samples.
    pub fn with_signal_path(&mut self, path: SignalPath) -> &mut Self {
        self.signal_path = path;
        self
    }

    /// Timeslot label for decoded messages
    ///
    /// The receiver does not separate timeslots itself; when an
    /// upstream demultiplexer feeds it a single timeslot's
    /// audio, set the label here so messages report where they
    /// came from.
    pub fn with_timeslot(&mut self, timeslot: u8) -> &mut Self {
        self.timeslot = timeslot % protocol::TIMESLOTS as u8;
        self
    }

    /// DC tracker window length (symbol periods)
    ///
    /// Only used on the sub-audible path. The offset estimate
    /// averages over this many symbol periods; longer windows
    /// ride out longer runs of identical symbols but follow a
    /// drifting offset more slowly.
    pub fn with_dc_block_symbols(&mut self, symbols: f32) -> &mut Self {
        self.dc_block_symbols = f32::clamp(symbols, 1.0, 32.0);
        self
    }

    /// Timing loop gains (fraction of the detected error)
    ///
    /// One gain per [`SyncState`], applied as synchronization
    /// confidence changes:
    ///
    /// 1. `coarse` applies with no recent sync patterns, when
    ///    the timing estimate must move quickly to acquire.
    ///
    /// 2. `medium` applies after one detection.
    ///
    /// 3. `fine` applies once sync patterns arrive steadily, so
    ///    noise cannot walk the estimate off a good lock.
    ///
    /// Each gain is clamped so the sequence never increases.
    pub fn with_timing_gains(&mut self, coarse: f32, medium: f32, fine: f32) -> &mut Self {
        self.timing_gain_coarse = f32::clamp(coarse, 0.0, 1.0);
        self.timing_gain_medium = f32::clamp(medium, 0.0, self.timing_gain_coarse);
        self.timing_gain_fine = f32::clamp(fine, 0.0, self.timing_gain_medium);
        self
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Signalling path to decode
    pub fn signal_path(&self) -> SignalPath {
        self.signal_path
    }

    /// Timeslot label for decoded messages
    pub fn timeslot(&self) -> u8 {
        self.timeslot
    }

    /// DC tracker window length (symbol periods)
    pub fn dc_block_symbols(&self) -> f32 {
        self.dc_block_symbols
    }

    /// Timing loop gains
    ///
    /// Returns the (`coarse`, `medium`, `fine`) gains applied as
    /// synchronization confidence rises.
    pub fn timing_gains(&self) -> (f32, f32, f32) {
        (
            self.timing_gain_coarse,
            self.timing_gain_medium,
            self.timing_gain_fine,
        )
    }
}

impl Default for LinkReceiverBuilder {
    /// Audible-path receiver at 7200 Hz
    fn default() -> Self {
        Self::new(protocol::AUDIBLE_RATE_HZ)
    }
}
