//! Zero-crossing symbol timing error detection
//!
//! Symbol decisions are taken from the middle of each symbol
//! period. To keep the sampling instant centered, the detector
//! watches one symbol period's worth of hard bit decisions and
//! measures where the bit transitions fall relative to the
//! center of that window. The signed distance from the ideal
//! center drives the timing loop in
//! [`SymbolBuffer`](super::symbol::SymbolBuffer).

use arraydeque::ArrayDeque;

// enough for the sub-audible path at the highest supported
// input rate
const WINDOW_CAP: usize = 256;

/// Transition-based timing error detector
///
/// Operates on the oversampled hard decisions, one per input
/// sample. The reported error is in units of samples, positive
/// when sampling should move later.
#[derive(Clone, Debug)]
pub struct TimingErrorDetector {
    window: ArrayDeque<bool, WINDOW_CAP>,
    size: usize,
    ideal_center: f32,
}

impl TimingErrorDetector {
    /// Create a detector for the given symbol length
    ///
    /// `samples_per_symbol` need not be integral. The observation
    /// window covers one full symbol period.
    pub fn new(samples_per_symbol: f32) -> Self {
        let size = (samples_per_symbol.ceil() as usize).clamp(1, WINDOW_CAP);
        Self {
            window: ArrayDeque::new(),
            size,
            ideal_center: samples_per_symbol / 2.0,
        }
    }

    /// Shift one hard decision into the observation window
    pub fn receive(&mut self, sample: bool) {
        if self.window.len() >= self.size {
            self.window.pop_front();
        }
        self.window.push_back(sample).ok();
    }

    /// Current timing error, in samples
    ///
    /// Examines the bit transitions in the observation window.
    /// A lone transition pulls the sampling instant toward it,
    /// as does the closer of two transitions. Windows with no
    /// transitions, or with three or more, yield no correction.
    pub fn error(&self) -> f32 {
        let mut transitions = 0u32;
        let mut first = 0usize;
        let mut second = 0usize;
        let mut previous: Option<bool> = None;
        for (index, sample) in self.window.iter().enumerate() {
            if let Some(prev) = previous {
                if prev != *sample {
                    transitions += 1;
                    match transitions {
                        1 => first = index - 1,
                        2 => second = index - 1,
                        _ => return 0.0,
                    }
                }
            }
            previous = Some(*sample);
        }

        match transitions {
            0 => 0.0,
            1 => self.ideal_center - first as f32,
            _ => {
                let toward_first = self.ideal_center - first as f32;
                let toward_second = self.ideal_center - second as f32;
                if toward_first.abs() <= toward_second.abs() {
                    toward_first
                } else {
                    toward_second
                }
            }
        }
    }

    /// Discard the observation window
    pub fn reset(&mut self) {
        self.window.clear();
    }
}
