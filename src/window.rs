//! Window generation and the constant-overlap-add normalization table.

use std::fmt;

use num_traits::Float;

use crate::FilterError;

/// Supported window shapes. Analysis and synthesis use the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowType {
    Hamming,
    Hann,
    Blackman,
}

/// Symmetric window of `size` samples.
pub fn generate_window<T: Float>(window_type: WindowType, size: usize) -> Vec<T> {
    let pi = T::from(std::f64::consts::PI).unwrap();
    let two = T::from(2.0).unwrap();
    let denominator = T::from(size - 1).unwrap();

    match window_type {
        WindowType::Hamming => (0..size)
            .map(|i| {
                let i_t = T::from(i).unwrap();
                T::from(0.54).unwrap() - T::from(0.46).unwrap() * (two * pi * i_t / denominator).cos()
            })
            .collect(),
        WindowType::Hann => (0..size)
            .map(|i| {
                let half = T::from(0.5).unwrap();
                let i_t = T::from(i).unwrap();
                half * (T::one() - (two * pi * i_t / denominator).cos())
            })
            .collect(),
        WindowType::Blackman => (0..size)
            .map(|i| {
                let i_t = T::from(i).unwrap();
                let angle = two * pi * i_t / denominator;
                T::from(0.42).unwrap() - T::from(0.5).unwrap() * angle.cos()
                    + T::from(0.08).unwrap() * (two * angle).cos()
            })
            .collect(),
    }
}

/// Precomputed window tables shared by the analysis and synthesis sides.
///
/// `inverse` is the synthesis window pre-divided by the periodic
/// constant-overlap-add envelope of `analysis × synthesis`, so the
/// synthesis inner loop costs one multiply per sample instead of a multiply
/// and a divide.
#[derive(Debug, Clone)]
pub struct WindowTable<T: Float> {
    window_type: WindowType,
    analysis: Vec<T>,
    inverse: Vec<T>,
}

impl<T: Float + fmt::Debug> WindowTable<T> {
    /// Envelope values at or below this fail validation: dividing by them
    /// would blow up the reconstruction.
    pub const COLA_THRESHOLD: f64 = 1e-6;

    /// Build the tables for a window of `fft_size` samples advancing by
    /// `hop_size` between frames.
    pub fn new(
        window_type: WindowType,
        fft_size: usize,
        hop_size: usize,
    ) -> Result<Self, FilterError<T>> {
        assert!(fft_size >= 2, "window needs at least two samples");
        assert!(
            hop_size >= 1 && hop_size <= fft_size,
            "hop must be between 1 and the window length"
        );
        let analysis = generate_window::<T>(window_type, fft_size);
        let synthesis = analysis.clone();

        // Periodic overlap-add envelope of analysis × synthesis, one period
        // of hop_size samples.
        let mut envelope = vec![T::zero(); hop_size];
        for i in 0..fft_size {
            envelope[i % hop_size] = envelope[i % hop_size] + analysis[i] * synthesis[i];
        }

        let threshold = T::from(Self::COLA_THRESHOLD).unwrap();
        let min_gain = envelope.iter().copied().fold(T::infinity(), T::min);
        if min_gain <= threshold {
            return Err(FilterError::WindowInvalid {
                min_gain,
                threshold,
            });
        }

        let inverse = synthesis
            .iter()
            .enumerate()
            .map(|(i, &w)| w / envelope[i % hop_size])
            .collect();

        Ok(Self {
            window_type,
            analysis,
            inverse,
        })
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Window length; equals the FFT size.
    pub fn len(&self) -> usize {
        self.analysis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analysis.is_empty()
    }

    pub fn analysis(&self) -> &[T] {
        &self.analysis
    }

    /// Synthesis window with the COLA normalization folded in.
    pub fn inverse(&self) -> &[T] {
        &self.inverse
    }
}
