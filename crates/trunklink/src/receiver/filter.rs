//! Sample windows and FIR correlation taps
//!
//! [`Window`] is a fixed-length lookback queue of the most
//! recent input samples. One sample enters, the oldest sample
//! ages off. [`FilterCoeff`] holds a set of feedforward taps
//! and computes their dot product against a `Window`, which is
//! the multiply-accumulate half of an FIR filter:
//!
//! ```ignore
//! let taps = FilterCoeff::from_slice(&[0.5f32, 0.5f32]);
//! let mut window: Window<f32> = Window::new(2);
//! window.push_scalar(2.0);
//! window.push_scalar(4.0);
//! let out: f32 = taps.filter(window.iter()); // 3.0
//! ```
//!
//! The taps are given oldest-lag last: `taps[0]` multiplies the
//! *newest* sample in the window. Real windows may be filtered
//! against complex taps, which is how the FSK correlators obtain
//! their quadrature outputs.

use std::collections::VecDeque;

use nalgebra::base::Scalar;
use nalgebra::DVector;
use num_traits::Zero;

/// Feedforward taps for FIR correlation
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoeff<T>(DVector<T>)
where
    T: Copy + Scalar + Zero;

impl<T> FilterCoeff<T>
where
    T: Copy + Scalar + Zero,
{
    /// Create from a slice of taps
    ///
    /// `h[0]` is the zeroth lag and multiplies the most recent
    /// input sample.
    pub fn from_slice<S>(h: S) -> Self
    where
        S: AsRef<[T]>,
    {
        let inp = h.as_ref();
        FilterCoeff(DVector::from_iterator(inp.len(), inp.iter().copied()))
    }

    /// Number of taps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Multiply-accumulate against a sample history
    ///
    /// `history` must iterate from the oldest sample to the
    /// newest sample, the way [`Window::iter()`] does. The newest
    /// sample is matched with the zeroth tap. If the history is
    /// shorter than the taps, the missing samples are taken as
    /// zero; excess history is ignored.
    pub fn filter<W, In, Out>(&self, history: W) -> Out
    where
        W: IntoIterator<Item = In>,
        W::IntoIter: DoubleEndedIterator,
        In: Copy + Scalar + std::ops::Mul<T, Output = Out>,
        Out: Copy + Scalar + Zero + std::ops::AddAssign,
    {
        let mut out = Out::zero();
        for (hist, tap) in history.into_iter().rev().zip(self.0.iter()) {
            out += hist * *tap;
        }
        out
    }

    /// Taps as a slice, zeroth lag first
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }
}

impl<T> AsRef<[T]> for FilterCoeff<T>
where
    T: Copy + Scalar + Zero,
{
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

/// Fixed-length sliding sample window
#[derive(Clone, Debug)]
pub struct Window<T>(VecDeque<T>)
where
    T: Copy + Scalar + Zero;

#[allow(dead_code)]
impl<T> Window<T>
where
    T: Copy + Scalar + Zero,
{
    /// Create a window of `len` samples, zero-filled
    pub fn new(len: usize) -> Self {
        let mut queue = VecDeque::with_capacity(len);
        queue.resize(len, T::zero());
        Self(queue)
    }

    /// Overwrite the window with zeros
    pub fn reset(&mut self) {
        for sample in &mut self.0 {
            *sample = T::zero()
        }
    }

    /// Window length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Push one sample onto the window
    ///
    /// `input` becomes the newest sample in the window. Returns
    /// the sample that aged off, which entered the window
    /// `self.len()` pushes ago.
    #[inline]
    pub fn push_scalar(&mut self, input: T) -> T {
        let aged = self.0.pop_front().unwrap_or(T::zero());
        self.0.push_back(input);
        aged
    }

    /// Iterator over the window, oldest sample first
    pub fn iter(&self) -> <&Window<T> as IntoIterator>::IntoIter {
        self.into_iter()
    }

    /// Copy the window to a vector, oldest sample first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Oldest sample still in the window
    #[inline]
    pub fn front(&self) -> T {
        self.0.front().copied().unwrap_or(T::zero())
    }

    /// Newest sample in the window
    #[inline]
    pub fn back(&self) -> T {
        self.0.back().copied().unwrap_or(T::zero())
    }
}

impl<'a, T> IntoIterator for &'a Window<T>
where
    T: Copy + Scalar + Zero,
{
    type Item = T;

    type IntoIter = std::iter::Copied<std::collections::vec_deque::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
