//! DC offset removal for the sub-audible slicer

use super::filter::Window;

/// DC-blocking filter
///
/// Removes slowly-varying offsets from the input while passing
/// the signalling tones, using the dual moving-average structure
/// from
///
/// * R. Yates, "DC Blocker Algorithms," IEEE Sig. Proc. Mag.,
///   March 2008: pp 132-134
///
/// Both averages have `len` taps. The filter is linear-phase
/// with a group delay of `len - 1` samples, and a length of `1`
/// passes the input unchanged.
#[derive(Clone, Debug)]
pub struct DcBlocker {
    feedforward: MovingAverage,
    feedback: MovingAverage,
}

impl DcBlocker {
    /// Create a DC blocker with `len > 0` taps per stage
    pub fn new(len: usize) -> Self {
        Self {
            feedforward: MovingAverage::new(len),
            feedback: MovingAverage::new(len),
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.feedforward.reset();
        self.feedback.reset();
    }

    /// Remove DC from the input
    ///
    /// Returns `input` delayed by `len - 1` samples with the
    /// running offset estimate subtracted.
    pub fn filter(&mut self, input: f32) -> f32 {
        let (stage_one, delayed) = self.feedforward.filter(input);
        let (offset, _) = self.feedback.filter(stage_one);
        if self.feedforward.len() > 1 {
            delayed - offset
        } else {
            delayed
        }
    }
}

/// Moving average filter
///
/// Equivalent to an FIR filter of `len` taps at `1 / len` each,
/// computed with a running sum. The average is delayed by
/// `len - 1` samples relative to its input.
#[derive(Clone, Debug)]
pub(super) struct MovingAverage {
    window: Window<f32>,
    inv_len: f32,
    moving_sum: f32,
}

impl MovingAverage {
    /// New moving average over `len > 0` samples
    pub fn new(len: usize) -> Self {
        assert!(len > 0);
        Self {
            window: Window::new(len),
            inv_len: 1.0f32 / (len as f32),
            moving_sum: 0.0f32,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.window.reset();
        self.moving_sum = 0.0f32;
    }

    /// Number of samples averaged
    #[inline]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Filter one sample
    ///
    /// Returns the moving average and the input sample delayed
    /// by the length of the window.
    #[inline]
    pub fn filter(&mut self, input: f32) -> (f32, f32) {
        let aged = self.window.push_scalar(input);
        self.moving_sum += input - aged;
        (self.moving_sum * self.inv_len, self.window.front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_moving_average() {
        // length 1 is a pass-through
        let mut mavg = MovingAverage::new(1);
        let (avg, delayed) = mavg.filter(4.0f32);
        assert_eq!(4.0f32, delayed);
        assert_approx_eq!(4.0f32, avg);

        // length 3 matches the FIR filter [1 1 1]/3
        let mut mavg = MovingAverage::new(3);
        let (avg, delayed) = mavg.filter(3.0f32);
        assert_eq!(0.0f32, delayed);
        assert_approx_eq!(1.0f32, avg);
        let (avg, _) = mavg.filter(6.0f32);
        assert_approx_eq!(3.0f32, avg);
        let (avg, delayed) = mavg.filter(-3.0f32);
        assert_eq!(3.0f32, delayed);
        assert_approx_eq!(2.0f32, avg);
        let (avg, delayed) = mavg.filter(0.0f32);
        assert_eq!(6.0f32, delayed);
        assert_approx_eq!(1.0f32, avg);
    }

    #[test]
    fn test_dc_block_length_one() {
        let mut blocker = DcBlocker::new(1);
        assert_eq!(50.0f32, blocker.filter(50.0f32));
        assert_eq!(-75.0f32, blocker.filter(-75.0f32));
    }

    #[test]
    fn test_dc_block_square_wave() {
        // a +/-1 square wave riding on a large offset comes out
        // centered about zero once the averages settle
        let mut blocker = DcBlocker::new(27);
        let mut out = (0.0f32, 0.0f32);
        let mut clk = 1.0f32;
        for _ in 0..128 {
            out = (out.1, blocker.filter(1000.0f32 + clk));
            clk = -clk;
        }
        assert_approx_eq!(out.0, 1.0f32, 1.0e-2);
        assert_approx_eq!(out.1, -1.0f32, 1.0e-2);
    }

    #[test]
    fn test_dc_block_reset() {
        let mut blocker = DcBlocker::new(8);
        for _ in 0..32 {
            blocker.filter(100.0f32);
        }
        blocker.reset();
        assert_eq!(0.0f32, blocker.filter(0.0f32));
    }
}
