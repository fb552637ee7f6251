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

//! Real-time time–frequency filtering.
//!
//! `freqfilt` turns a continuous multichannel PCM stream into STFT frames,
//! hands the complex half-spectrum of every frame to a user transform and
//! reconstructs a gapless output stream by normalized overlap-add. Callers
//! feed blocks of any size: paired ring buffers decouple the caller's block
//! size from the FFT window and hop sizes, and the reconstruction is
//! bit-identical however the input is partitioned. After initialization the
//! streaming path performs no allocation.
//!
//! The typical filter is one input stream to one output stream with an
//! in-place spectrum closure:
//!
//! ```
//! use freqfilt::prelude::*;
//!
//! let mut filter = StftFilterF32::new();
//! filter.set_block_size(256);
//! filter.init_with(2, 1024, 512).unwrap();
//!
//! // Keep only the lower half of the spectrum.
//! filter.set_spectrum_fn(|spectrum| {
//!     let cutoff = spectrum.bin_count() / 2;
//!     for channel_idx in 0..spectrum.channel_count() {
//!         for bin in &mut spectrum.channel_mut(channel_idx)[cutoff..] {
//!             *bin = Complex::new(0.0, 0.0);
//!         }
//!     }
//! });
//!
//! let mut block = WaveformF32::new(256, 2);
//! // ... fill `block` from the audio callback ...
//! filter.process_block(&mut block);
//! // `block` now holds filtered PCM, delayed by `filter.frame_latency()`.
//! ```
//!
//! Mixing topologies (N input streams to M output streams) go through
//! [`StftFilter::with_streams`] and a [`SpectrumTransform`] implementation.

use std::fmt;

use num_traits::Float;

pub mod analyzer;
pub mod buffer;
pub mod fft_backend;
pub mod filter;
pub mod ring;
pub mod window;

pub use buffer::{SpectrumBlock, TimeBlock, Waveform};
pub use fft_backend::Complex;
pub use filter::{identity_transform, SpectrumTransform, StftFilter};
pub use window::{WindowTable, WindowType};

pub mod prelude {
    pub use crate::buffer::{SpectrumBlock, TimeBlock, Waveform};
    pub use crate::fft_backend::Complex;
    pub use crate::filter::{identity_transform, SpectrumTransform, StftFilter};
    pub use crate::window::{WindowTable, WindowType};
    pub use crate::{
        FilterError, FilterErrorF32, FilterErrorF64, SpectrumBlockF32, SpectrumBlockF64,
        StftFilterF32, StftFilterF64, WaveformF32, WaveformF64,
    };
}

/// Errors surfaced by filter initialization. The streaming path is
/// infallible by contract.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError<T: Float + fmt::Debug> {
    /// Rejected configuration parameters.
    ConfigInvalid { reason: &'static str },
    /// The overlap-add envelope of the window pair dips to or below the
    /// threshold somewhere; dividing by it would blow up the
    /// reconstruction.
    WindowInvalid { min_gain: T, threshold: T },
    /// The FFT backend could not provide a transform of the requested size.
    FftInitFailed { fft_size: usize },
}

impl<T: Float + fmt::Display + fmt::Debug> fmt::Display for FilterError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::ConfigInvalid { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            FilterError::WindowInvalid {
                min_gain,
                threshold,
            } => {
                write!(
                    f,
                    "invalid window: overlap-add gain {} dips below threshold {}",
                    min_gain, threshold
                )
            }
            FilterError::FftInitFailed { fft_size } => {
                write!(f, "could not create an FFT of size {}", fft_size)
            }
        }
    }
}

impl<T: Float + fmt::Display + fmt::Debug> std::error::Error for FilterError<T> {}

// Type aliases for the common float types.
pub type StftFilterF32 = StftFilter<f32>;
pub type StftFilterF64 = StftFilter<f64>;

pub type WaveformF32 = Waveform<f32>;
pub type WaveformF64 = Waveform<f64>;

pub type SpectrumBlockF32 = SpectrumBlock<f32>;
pub type SpectrumBlockF64 = SpectrumBlock<f64>;

pub type TimeBlockF32 = TimeBlock<f32>;
pub type TimeBlockF64 = TimeBlock<f64>;

pub type FilterErrorF32 = FilterError<f32>;
pub type FilterErrorF64 = FilterError<f64>;
