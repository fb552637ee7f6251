/*MIT License

Copyright (c) 2025 David Maseda Neira

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! FFT backend abstraction and the real-signal adapter.
//!
//! The engine only ever needs a complex FFT of one fixed size. The
//! `FftBackend` trait keeps the concrete primitive swappable; the default
//! implementation plans transforms through `rustfft`. [`RealFft`] adapts the
//! complex transform pair to the half-spectrum form the rest of the crate
//! works with: a real signal of length N has only N/2 + 1 non-redundant
//! frequency bins.
//!
//! Transforms take caller-provided scratch. rustfft's plain `process` call
//! allocates its own scratch for several algorithms, which would put an
//! allocation on the streaming path; `process_with_scratch` avoids that.

use std::sync::Arc;

use num_traits::Float;

use crate::FilterError;

// Re-export the complex type so downstream code does not depend on rustfft
// directly.
pub use rustfft::num_complex::Complex;

/// Sample types the FFT backend accepts.
pub trait FftNum: Float + rustfft::FftNum + Send + Sync + 'static {}

impl FftNum for f32 {}
impl FftNum for f64 {}

/// A planned complex FFT of fixed size, applied in place.
pub trait FftBackend<T: FftNum>: Send + Sync {
    /// Transform `buffer` in place. `buffer.len()` must equal [`Self::len`]
    /// and `scratch.len()` must be at least [`Self::scratch_len`].
    fn process_with_scratch(&self, buffer: &mut [Complex<T>], scratch: &mut [Complex<T>]);

    /// Scratch elements required by [`Self::process_with_scratch`].
    fn scratch_len(&self) -> usize;

    /// The transform size.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates forward and inverse [`FftBackend`] instances.
pub trait FftPlannerTrait<T: FftNum> {
    fn new() -> Self;

    fn plan_fft_forward(&mut self, size: usize) -> Arc<dyn FftBackend<T>>;

    fn plan_fft_inverse(&mut self, size: usize) -> Arc<dyn FftBackend<T>>;
}

struct RustFftWrapper<T: FftNum> {
    fft: Arc<dyn rustfft::Fft<T>>,
}

impl<T: FftNum> FftBackend<T> for RustFftWrapper<T> {
    fn process_with_scratch(&self, buffer: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        self.fft.process_with_scratch(buffer, scratch);
    }

    fn scratch_len(&self) -> usize {
        self.fft.get_inplace_scratch_len()
    }

    fn len(&self) -> usize {
        self.fft.len()
    }
}

/// FFT planner backed by `rustfft`.
pub struct FftPlanner<T: FftNum> {
    planner: rustfft::FftPlanner<T>,
}

impl<T: FftNum> FftPlannerTrait<T> for FftPlanner<T> {
    fn new() -> Self {
        Self {
            planner: rustfft::FftPlanner::new(),
        }
    }

    fn plan_fft_forward(&mut self, size: usize) -> Arc<dyn FftBackend<T>> {
        Arc::new(RustFftWrapper {
            fft: self.planner.plan_fft_forward(size),
        })
    }

    fn plan_fft_inverse(&mut self, size: usize) -> Arc<dyn FftBackend<T>> {
        Arc::new(RustFftWrapper {
            fft: self.planner.plan_fft_inverse(size),
        })
    }
}

/// Real-signal adapter around a forward/inverse complex FFT pair.
///
/// `forward` maps N real samples to the N/2 + 1 non-redundant bins.
/// `backward` rebuilds the conjugate-symmetric full spectrum and applies the
/// 1/N factor the underlying library omits, so `backward(forward(x))`
/// returns `x` up to floating-point rounding.
///
/// Both directions reuse buffers allocated at construction; calling them
/// never allocates.
pub struct RealFft<T: FftNum> {
    forward: Arc<dyn FftBackend<T>>,
    inverse: Arc<dyn FftBackend<T>>,
    buffer: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
    fft_size: usize,
}

impl<T: FftNum> RealFft<T> {
    /// Plan a transform pair of length `fft_size`.
    pub fn new(planner: &mut FftPlanner<T>, fft_size: usize) -> Result<Self, FilterError<T>> {
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        if forward.len() != fft_size || inverse.len() != fft_size {
            return Err(FilterError::FftInitFailed { fft_size });
        }
        let scratch_len = forward.scratch_len().max(inverse.scratch_len());
        Ok(Self {
            forward,
            inverse,
            buffer: vec![Complex::new(T::zero(), T::zero()); fft_size],
            scratch: vec![Complex::new(T::zero(), T::zero()); scratch_len],
            fft_size,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn spectrum_size(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Forward transform of `time` (length N) into `spectrum` (length N/2 + 1).
    pub fn forward(&mut self, time: &[T], spectrum: &mut [Complex<T>]) {
        debug_assert_eq!(time.len(), self.fft_size);
        debug_assert_eq!(spectrum.len(), self.spectrum_size());

        for (slot, &sample) in self.buffer.iter_mut().zip(time) {
            *slot = Complex::new(sample, T::zero());
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        spectrum.copy_from_slice(&self.buffer[..spectrum.len()]);
    }

    /// Inverse transform of `spectrum` (length N/2 + 1) into `time` (length N).
    pub fn backward(&mut self, spectrum: &[Complex<T>], time: &mut [T]) {
        debug_assert_eq!(spectrum.len(), self.spectrum_size());
        debug_assert_eq!(time.len(), self.fft_size);

        self.buffer[..spectrum.len()].copy_from_slice(spectrum);
        // Negative frequencies by conjugate symmetry. DC and Nyquist have no
        // mirror.
        for bin in 1..spectrum.len() - 1 {
            self.buffer[self.fft_size - bin] = self.buffer[bin].conj();
        }
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = T::one() / T::from(self.fft_size).unwrap();
        for (slot, value) in time.iter_mut().zip(&self.buffer) {
            *slot = value.re * scale;
        }
    }
}
