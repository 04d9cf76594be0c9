//! Symbol sampling and majority-vote decisions
//!
//! The demodulator front ends emit one hard decision per input
//! sample, several samples per symbol. [`SymbolBuffer`] delays
//! those decisions, counts down a fractional sample budget to
//! find the middle of each symbol period, and takes the symbol
//! decision by majority vote over the samples surrounding that
//! midpoint. The countdown is corrected each symbol by the
//! timing error detector so the vote stays centered.

/// Delay line and symbol timing countdown
///
/// `has_symbol()` becomes true when the midpoint of a symbol
/// period has been reached. The caller then takes `symbol()` and
/// calls `reset_and_adjust()` to schedule the next midpoint.
#[derive(Clone, Debug)]
pub struct SymbolBuffer {
    delay_line: Vec<bool>,
    buffer_pointer: usize,
    half_len: usize,
    samples_per_symbol: f32,
    mid_symbol_point: f32,
    timing_gain: f32,
    vote_len: usize,
    vote_offset: usize,
}

impl SymbolBuffer {
    /// Create a buffer for the given symbol length
    ///
    /// `samples_per_symbol` need not be integral and must be at
    /// least 2. `timing_gain` scales the corrections applied via
    /// [`reset_and_adjust()`](Self::reset_and_adjust).
    pub fn new(samples_per_symbol: f32, timing_gain: f32) -> Self {
        let half_len = (2.0 * samples_per_symbol).floor() as usize;
        Self {
            delay_line: vec![false; 2 * half_len],
            buffer_pointer: 0,
            half_len,
            samples_per_symbol,
            mid_symbol_point: samples_per_symbol,
            timing_gain,
            vote_len: samples_per_symbol.round() as usize,
            vote_offset: (1.5 * samples_per_symbol).floor() as usize,
        }
    }

    /// Shift one hard decision into the delay line
    ///
    /// Each sample is written twice, a half-buffer apart, so a
    /// contiguous slice ending at the newest sample is always
    /// available without wraparound handling.
    pub fn receive(&mut self, sample: bool) {
        self.delay_line[self.buffer_pointer] = sample;
        self.delay_line[self.buffer_pointer + self.half_len] = sample;
        self.buffer_pointer = (self.buffer_pointer + 1) % self.half_len;
        self.mid_symbol_point -= 1.0;
    }

    /// True when the current symbol's midpoint has been reached
    #[inline]
    pub fn has_symbol(&self) -> bool {
        self.mid_symbol_point < 1.0
    }

    /// Take the symbol decision by majority vote
    ///
    /// Votes over one symbol period of samples centered one and
    /// a half symbol periods behind the newest sample. Requires a
    /// strict majority to report a mark; a tie reports space.
    pub fn symbol(&self) -> bool {
        let newest_end = self.buffer_pointer + self.half_len;
        let start = newest_end - self.vote_offset;
        let votes = self.delay_line[start..start + self.vote_len]
            .iter()
            .filter(|sample| **sample)
            .count();
        votes * 2 > self.vote_len
    }

    /// Schedule the next symbol midpoint
    ///
    /// Rearms the countdown one symbol period ahead, shifted by
    /// the scaled `timing_error`. Any leftover fraction of the
    /// current countdown carries into the next period, preserving
    /// non-integral symbol lengths.
    pub fn reset_and_adjust(&mut self, timing_error: f32) {
        self.mid_symbol_point += self.samples_per_symbol + timing_error * self.timing_gain;
    }

    /// Change the timing correction gain
    pub fn set_timing_gain(&mut self, timing_gain: f32) {
        self.timing_gain = timing_gain;
    }

    /// Reset to initial conditions
    pub fn reset(&mut self) {
        self.delay_line.fill(false);
        self.buffer_pointer = 0;
        self.mid_symbol_point = self.samples_per_symbol;
    }
}
