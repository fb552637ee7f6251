//! Owned multichannel storage.
//!
//! [`Waveform`] is the caller-facing planar PCM block with pure
//! interleaved↔planar conversions. [`TimeBlock`] and [`SpectrumBlock`] are
//! the engine's reusable scratch blocks, allocated once at init.

use num_traits::Float;

use crate::fft_backend::Complex;

/// Planar multichannel PCM block. Owned by the caller; every channel holds
/// the same number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform<T> {
    channels: Vec<Vec<T>>,
}

impl<T: Float> Waveform<T> {
    /// Zero-filled waveform of `frame_count` frames per channel.
    pub fn new(frame_count: usize, channel_count: usize) -> Self {
        assert!(channel_count > 0, "channel_count must be non-zero");
        Self {
            channels: vec![vec![T::zero(); frame_count]; channel_count],
        }
    }

    /// Wrap existing planar channels.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is empty or channel lengths differ.
    pub fn from_channels(channels: Vec<Vec<T>>) -> Self {
        assert!(!channels.is_empty(), "channels must not be empty");
        let frame_count = channels[0].len();
        for (channel_idx, channel) in channels.iter().enumerate() {
            assert_eq!(
                channel.len(),
                frame_count,
                "channel {} has length {}, expected {}",
                channel_idx,
                channel.len(),
                frame_count
            );
        }
        Self { channels }
    }

    /// Deinterleave `data` (e.g. `[L,R,L,R,...]` for stereo) into a new
    /// waveform.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not divisible by `channel_count`.
    pub fn from_interleaved(data: &[T], channel_count: usize) -> Self {
        assert!(channel_count > 0, "channel_count must be non-zero");
        assert_eq!(
            data.len() % channel_count,
            0,
            "data length {} must be divisible by channel count {}",
            data.len(),
            channel_count
        );
        let mut waveform = Self::new(data.len() / channel_count, channel_count);
        waveform.copy_from_interleaved(data);
        waveform
    }

    /// Deinterleave `data` into this waveform without reallocating.
    /// `data.len()` must equal `frame_count × channel_count`.
    pub fn copy_from_interleaved(&mut self, data: &[T]) {
        let channel_count = self.channel_count();
        debug_assert_eq!(data.len(), self.frame_count() * channel_count);
        for (channel_idx, channel) in self.channels.iter_mut().enumerate() {
            for (frame_idx, slot) in channel.iter_mut().enumerate() {
                *slot = data[frame_idx * channel_count + channel_idx];
            }
        }
    }

    /// Interleave into a new buffer.
    pub fn to_interleaved(&self) -> Vec<T> {
        let mut data = vec![T::zero(); self.frame_count() * self.channel_count()];
        self.copy_to_interleaved(&mut data);
        data
    }

    /// Interleave into `data` without allocating. `data.len()` must equal
    /// `frame_count × channel_count`.
    pub fn copy_to_interleaved(&self, data: &mut [T]) {
        let channel_count = self.channel_count();
        debug_assert_eq!(data.len(), self.frame_count() * channel_count);
        for (channel_idx, channel) in self.channels.iter().enumerate() {
            for (frame_idx, &sample) in channel.iter().enumerate() {
                data[frame_idx * channel_count + channel_idx] = sample;
            }
        }
    }

    pub fn channel(&self, channel_idx: usize) -> &[T] {
        &self.channels[channel_idx]
    }

    pub fn channel_mut(&mut self, channel_idx: usize) -> &mut [T] {
        &mut self.channels[channel_idx]
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn fill(&mut self, value: T) {
        for channel in &mut self.channels {
            for slot in channel.iter_mut() {
                *slot = value;
            }
        }
    }
}

/// Engine-owned time-domain scratch block, reused for every frame.
#[derive(Debug, Clone)]
pub struct TimeBlock<T> {
    channels: Vec<Vec<T>>,
}

impl<T: Float> TimeBlock<T> {
    pub fn new(frame_count: usize, channel_count: usize) -> Self {
        Self {
            channels: vec![vec![T::zero(); frame_count]; channel_count],
        }
    }

    pub fn channel(&self, channel_idx: usize) -> &[T] {
        &self.channels[channel_idx]
    }

    pub fn channel_mut(&mut self, channel_idx: usize) -> &mut [T] {
        &mut self.channels[channel_idx]
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Complex half-spectrum storage: `fft_size / 2 + 1` bins per channel.
///
/// Engine-owned and reused; the user transform borrows these for the
/// duration of one call.
#[derive(Debug, Clone)]
pub struct SpectrumBlock<T> {
    channels: Vec<Vec<Complex<T>>>,
}

impl<T: Float> SpectrumBlock<T> {
    pub fn new(bin_count: usize, channel_count: usize) -> Self {
        Self {
            channels: vec![vec![Complex::new(T::zero(), T::zero()); bin_count]; channel_count],
        }
    }

    pub fn channel(&self, channel_idx: usize) -> &[Complex<T>] {
        &self.channels[channel_idx]
    }

    pub fn channel_mut(&mut self, channel_idx: usize) -> &mut [Complex<T>] {
        &mut self.channels[channel_idx]
    }

    pub fn bin_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Copy every bin of every channel from `other`. Shapes must match.
    pub fn copy_from(&mut self, other: &SpectrumBlock<T>) {
        debug_assert_eq!(self.channel_count(), other.channel_count());
        debug_assert_eq!(self.bin_count(), other.bin_count());
        for (target, source) in self.channels.iter_mut().zip(&other.channels) {
            target.copy_from_slice(source);
        }
    }

    pub fn fill(&mut self, value: Complex<T>) {
        for channel in &mut self.channels {
            for bin in channel.iter_mut() {
                *bin = value;
            }
        }
    }

    #[inline]
    pub fn bin(&self, channel_idx: usize, bin: usize) -> Complex<T> {
        self.channels[channel_idx][bin]
    }

    #[inline]
    pub fn set_bin(&mut self, channel_idx: usize, bin: usize, value: Complex<T>) {
        self.channels[channel_idx][bin] = value;
    }

    #[inline]
    pub fn magnitude(&self, channel_idx: usize, bin: usize) -> T {
        let c = &self.channels[channel_idx][bin];
        (c.re * c.re + c.im * c.im).sqrt()
    }

    /// Phase of a bin in radians.
    #[inline]
    pub fn phase(&self, channel_idx: usize, bin: usize) -> T {
        let c = &self.channels[channel_idx][bin];
        c.im.atan2(c.re)
    }

    pub fn set_magnitude_phase(&mut self, channel_idx: usize, bin: usize, magnitude: T, phase: T) {
        self.channels[channel_idx][bin] =
            Complex::new(magnitude * phase.cos(), magnitude * phase.sin());
    }

    /// All magnitudes of one channel. Allocates; not for the streaming path.
    pub fn magnitudes(&self, channel_idx: usize) -> Vec<T> {
        self.channels[channel_idx]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }

    /// All phases of one channel. Allocates; not for the streaming path.
    pub fn phases(&self, channel_idx: usize) -> Vec<T> {
        self.channels[channel_idx]
            .iter()
            .map(|c| c.im.atan2(c.re))
            .collect()
    }
}
