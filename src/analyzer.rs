//! Windowed forward transform and the overlap-add inverse.

use crate::buffer::{SpectrumBlock, TimeBlock};
use crate::fft_backend::{FftNum, FftPlanner, RealFft};
use crate::window::WindowTable;
use crate::FilterError;

/// Per-stream analysis/synthesis state.
///
/// `analyze` windows one full FFT frame and produces its half spectrum.
/// `synthesize` inverts one spectrum, applies the normalized synthesis
/// window, overlap-adds it with the tail carried from the previous frame
/// and emits exactly one hop of finished samples per call.
pub struct Analyzer<T: FftNum> {
    windows: WindowTable<T>,
    fft: RealFft<T>,
    hop_size: usize,
    scratch: Vec<T>,
    result: Vec<T>,
    previous_tail: Vec<Vec<T>>,
}

impl<T: FftNum> Analyzer<T> {
    pub fn new(
        planner: &mut FftPlanner<T>,
        windows: WindowTable<T>,
        hop_size: usize,
        channel_count: usize,
    ) -> Result<Self, FilterError<T>> {
        let fft_size = windows.len();
        let fft = RealFft::new(planner, fft_size)?;
        Ok(Self {
            windows,
            fft,
            hop_size,
            scratch: vec![T::zero(); fft_size],
            result: vec![T::zero(); fft_size],
            previous_tail: vec![vec![T::zero(); fft_size - hop_size]; channel_count],
        })
    }

    /// Window length; equals the FFT size.
    pub fn window_size(&self) -> usize {
        self.windows.len()
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn spectrum_size(&self) -> usize {
        self.fft.spectrum_size()
    }

    /// Forward path: `time` holds one full frame per channel, `spectrum`
    /// receives its half spectrum.
    pub fn analyze(&mut self, time: &TimeBlock<T>, spectrum: &mut SpectrumBlock<T>) {
        debug_assert_eq!(time.frame_count(), self.window_size());
        debug_assert_eq!(spectrum.bin_count(), self.spectrum_size());

        for channel_idx in 0..time.channel_count() {
            let analysis = self.windows.analysis();
            let input = time.channel(channel_idx);
            for (slot, (&sample, &weight)) in
                self.scratch.iter_mut().zip(input.iter().zip(analysis))
            {
                *slot = sample * weight;
            }
            self.fft.forward(&self.scratch, spectrum.channel_mut(channel_idx));
        }
    }

    /// Inverse path: emits `hop_size` finished samples per channel into
    /// `pcm` and stores the remaining windowed tail for the next call.
    pub fn synthesize(&mut self, spectrum: &SpectrumBlock<T>, pcm: &mut TimeBlock<T>) {
        debug_assert_eq!(spectrum.bin_count(), self.spectrum_size());
        debug_assert_eq!(pcm.frame_count(), self.hop_size);

        let window_size = self.windows.len();
        let tail_size = window_size - self.hop_size;

        for channel_idx in 0..spectrum.channel_count() {
            self.fft
                .backward(spectrum.channel(channel_idx), &mut self.scratch);

            // Tail contribution of earlier frames plus the windowed inverse
            // of this one.
            let inverse = self.windows.inverse();
            let tail = &mut self.previous_tail[channel_idx];
            for i in 0..window_size {
                let carried = if i < tail_size { tail[i] } else { T::zero() };
                self.result[i] = carried + self.scratch[i] * inverse[i];
            }

            pcm.channel_mut(channel_idx)
                .copy_from_slice(&self.result[..self.hop_size]);
            tail.copy_from_slice(&self.result[self.hop_size..]);
        }
    }

    /// Drop carried overlap state, as if no frame had been synthesized yet.
    pub fn reset(&mut self) {
        for tail in &mut self.previous_tail {
            for slot in tail.iter_mut() {
                *slot = T::zero();
            }
        }
    }
}
