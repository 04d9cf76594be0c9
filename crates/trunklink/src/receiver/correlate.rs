//! Audible-band 2FSK demodulation
//!
//! The audible signalling path keys between two tones, one per
//! binary symbol. [`FskDemodulator`] correlates the incoming
//! samples against complex references for both tones and votes
//! for whichever correlation is stronger. Taking the complex
//! magnitude makes the vote insensitive to the carrier phase, so
//! no phase recovery is required ahead of the demodulator.

use num_complex::Complex;

use crate::protocol;

use super::dcblock::MovingAverage;
use super::filter::{FilterCoeff, Window};

/// Non-coherent 2FSK demodulator
///
/// Emits one hard binary decision per input sample. The decisions
/// are oversampled at the input rate; symbol timing recovery
/// happens downstream.
#[derive(Clone, Debug)]
pub struct FskDemodulator {
    window: Window<f32>,
    mark: FilterCoeff<Complex<f32>>,
    space: FilterCoeff<Complex<f32>>,
    mark_magnitude: MovingAverage,
    space_magnitude: MovingAverage,
}

impl FskDemodulator {
    /// Create a demodulator for the given input rate
    ///
    /// The correlation references span one symbol period at
    /// `input_rate`, and the correlation magnitudes are smoothed
    /// over one symbol period before the vote.
    pub fn new(input_rate: u32) -> Self {
        let (mark, space) = protocol::reference_tones(input_rate);
        let smoothing = protocol::samples_per_symbol(input_rate) as usize + 1;
        Self {
            window: Window::new(mark.len()),
            mark: FilterCoeff::from_slice(mark.as_slice()),
            space: FilterCoeff::from_slice(space.as_slice()),
            mark_magnitude: MovingAverage::new(smoothing),
            space_magnitude: MovingAverage::new(smoothing),
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.window.reset();
        self.mark_magnitude.reset();
        self.space_magnitude.reset();
    }

    /// Demodulate one sample
    ///
    /// Returns `true` if the mark tone currently dominates the
    /// space tone.
    pub fn demodulate(&mut self, sample: f32) -> bool {
        self.window.push_scalar(sample);
        let mark: Complex<f32> = self.mark.filter(self.window.iter());
        let space: Complex<f32> = self.space.filter(self.window.iter());
        let (mark_magnitude, _) = self.mark_magnitude.filter(mark.norm());
        let (space_magnitude, _) = self.space_magnitude.filter(space.norm());
        mark_magnitude > space_magnitude
    }
}
