//! # Signalling constants
//!
//! Parameters of the two signalling paths carried in demodulated
//! audio, and generation of the reference tones the correlation
//! demodulator matches against.
//!
//! The audible path carries control words and traffic bursts as
//! 1200-baud 2FSK. Input audio should be resampled to an integer
//! multiple of the baud rate; [`AUDIBLE_RATE_HZ`] is the reference
//! rate. The sub-audible path carries the same traffic bursts as
//! 300-baud binary signalling below the voice band, sliced directly
//! after DC removal.

use nalgebra::DVector;
use num_complex::Complex;

/// Mark frequency (Hz), audible 2FSK
pub const FSK_MARK_HZ: f32 = 1200.0;

/// Space frequency (Hz), audible 2FSK
pub const FSK_SPACE_HZ: f32 = 1800.0;

/// Audible-path baud rate (Hz)
pub const BAUD_HZ: f32 = 1200.0;

/// Reference input rate for the audible path (Hz)
///
/// Six samples per symbol. Other integer multiples of [`BAUD_HZ`]
/// work as well.
pub const AUDIBLE_RATE_HZ: u32 = 7200;

/// Sub-audible-path baud rate (Hz)
///
/// At the usual 8 kHz input rate this is a fractional 26.67 samples
/// per symbol; the timing recovery carries the fraction.
pub const SUBAUDIBLE_BAUD_HZ: f32 = 300.0;

/// Bit-synchronization preamble byte
///
/// Transmitters precede every message with a run of alternating
/// bits. It carries no data; it exists so symbol timing can settle
/// before the sync pattern arrives.
pub const PREAMBLE: u8 = 0xAA;

/// Sync pattern opening a control word
pub const SYNC_CONTROL: u32 = 0x75D2B1;

/// Sync pattern opening a traffic burst
pub const SYNC_TRAFFIC: u32 = 0x3AC9E4;

/// Length of both sync patterns, in bits
pub const SYNC_LEN: usize = 24;

/// Control word length, in bits, following [`SYNC_CONTROL`]
///
/// Layout: protect flag bit 0, reserved bit 1, opcode bits 2..8,
/// vendor bits 8..16, payload bits 16..80, CRC-16 bits 80..96.
pub const CONTROL_WORD_LEN: usize = 96;

/// Traffic burst length, in bits, following [`SYNC_TRAFFIC`]
///
/// Layout: color code bits 0..4, reserved bit 4, fragment position
/// tag bits 5..7, embedded parity bits 7..16, fragment payload bits
/// 16..48.
pub const TRAFFIC_BURST_LEN: usize = 48;

/// Number of TDMA timeslots carried by a single channel
pub const TIMESLOTS: usize = 2;

/// Audible-path symbol period at the given sampling rate, in
/// fractional samples
pub fn samples_per_symbol(fs: u32) -> f32 {
    fs as f32 / BAUD_HZ
}

/// Sub-audible-path symbol period at the given sampling rate, in
/// fractional samples
pub fn subaudible_samples_per_symbol(fs: u32) -> f32 {
    fs as f32 / SUBAUDIBLE_BAUD_HZ
}

/// Generate mark and space reference tones
///
/// Returns a tuple of (`mark`, `space`) reference waveforms for
/// correlation at the given input sampling rate `fs`. Each reference
/// spans one symbol period plus two samples, so a symbol-length
/// window correlates fully even with one sample of timing slip in
/// either direction.
pub fn reference_tones(fs: u32) -> (DVector<Complex<f32>>, DVector<Complex<f32>>) {
    let ntaps = f32::floor(samples_per_symbol(fs)) as usize + 2;
    let mark = cisoid_reference(ntaps, FSK_MARK_HZ / fs as f32);
    let space = cisoid_reference(ntaps, FSK_SPACE_HZ / fs as f32);
    (mark, space)
}

// Generate one reference tone
//
// A time-reversed, complex-conjugated cisoid at the fixed frequency
// `freq_fs`, expressed as a fraction of the sampling rate, with unit
// DC gain. Correlating a real tone burst against this reference and
// taking the magnitude gives a phase-independent detection statistic.
fn cisoid_reference(points: usize, freq_fs: f32) -> DVector<Complex<f32>> {
    let mut out = DVector::from_element(points, Complex::new(0.0, 0.0));
    for (iter, o) in out.iter_mut().enumerate() {
        *o = Complex::new(
            0.0,
            2.0 * std::f32::consts::PI * freq_fs * ((points - 1 - iter) as f32),
        );
        *o = 2.0f32 * o.exp().conj() / points as f32;
    }
    out
}

/// Very simple continuous-phase 2FSK modulator
///
/// This method is designed for use in tests. `fs` must be an
/// integer multiple of the baud rate. One bits are modulated as the
/// mark tone and zero bits as the space tone. Returns the modulated
/// signal and the number of samples per symbol.
#[cfg(test)]
pub fn modulate_fsk(bits: &[bool], fs: u32) -> (DVector<f32>, usize) {
    const TWOPI: f32 = 2.0f32 * std::f32::consts::PI;

    let mark_rad_per_sa = TWOPI * FSK_MARK_HZ / (fs as f32);
    let space_rad_per_sa = TWOPI * FSK_SPACE_HZ / (fs as f32);
    let symlen = f32::round(samples_per_symbol(fs)) as usize;

    let mut out = DVector::from_element(bits.len() * symlen, 0.0f32);
    let mut phase = 0.0f32;
    for (itr, sa) in out.iter_mut().enumerate() {
        if bits[itr / symlen] {
            phase += mark_rad_per_sa;
        } else {
            phase += space_rad_per_sa;
        }
        if phase > TWOPI {
            // wrapped
            phase = -TWOPI + phase;
        }
        *sa = phase.cos();
    }

    (out, symlen)
}

/// Expand an integer to bits, most significant bit first
///
/// Emits the low `len` bits of `word`. Transmission order for sync
/// patterns and message words is most significant bit first.
pub fn word_bits(word: u32, len: usize) -> Vec<bool> {
    let mut v = Vec::with_capacity(len);
    for shift in (0..len).rev() {
        v.push(word & (1 << shift) != 0);
    }
    v
}

/// Repeated preamble, as bits
#[cfg(test)]
pub fn preamble_bits(repeats: usize) -> Vec<bool> {
    let mut v = Vec::with_capacity(repeats * 8);
    for _ in 0..repeats {
        v.extend(word_bits(PREAMBLE as u32, 8));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisoid_reference() {
        const FREQ_FS: f32 = 0.0944807256f32;
        const EXPECT_REAL: &[f32] = &[-0.719973f32, -0.208581, 0.374184, 0.828910, 1.000000];
        const EXPECT_IMAG: &[f32] = &[-0.694002f32, -0.978005, -0.927355, -0.559382, -0.000000];

        let gain = 2.0f32 / EXPECT_REAL.len() as f32;
        let out = cisoid_reference(EXPECT_REAL.len(), FREQ_FS);
        for (i, item) in out.iter().enumerate() {
            let d = (item - gain * Complex::new(EXPECT_REAL[i], EXPECT_IMAG[i])).norm();
            assert!(d < 1e-4);
        }
    }

    #[test]
    fn test_reference_tone_length() {
        let (mark, space) = reference_tones(AUDIBLE_RATE_HZ);
        assert_eq!(8, mark.len());
        assert_eq!(8, space.len());
    }

    #[test]
    fn test_word_bits() {
        const EXPECT: &[bool] = &[
            false, true, true, true, false, true, false, true, // 0x75
            true, true, false, true, false, false, true, false, // 0xD2
            true, false, true, true, false, false, false, true, // 0xB1
        ];
        assert_eq!(EXPECT, word_bits(SYNC_CONTROL, SYNC_LEN).as_slice());
    }

    #[test]
    fn test_modulate_fsk() {
        let (samples, symlen) = modulate_fsk(&[true, false, true], AUDIBLE_RATE_HZ);
        assert_eq!(6, symlen);
        assert_eq!(18, samples.len());
        for sa in samples.iter() {
            assert!(sa.abs() <= 1.0);
        }
    }
}
