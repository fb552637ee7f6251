//! Fixed-capacity ring buffers for the streaming pipeline.
//!
//! [`RingBuffer`] is a plain FIFO. [`OverlapRingBuffer`] reads a full
//! analysis window but advances by a smaller step, so consecutive reads
//! overlap. Both are sized once and never reallocate; overflowing a ring is
//! a programming error caught by `debug_assert`.

use num_traits::Float;

use crate::buffer::{TimeBlock, Waveform};

/// Single-channel FIFO with fixed capacity.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    write_index: usize,
    read_index: usize,
    available: usize,
}

impl<T: Float> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        Self {
            buffer: vec![T::zero(); capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
        }
    }

    /// Pre-fill with `count` zero samples.
    pub fn fill_with_zeros(&mut self, count: usize) {
        debug_assert!(self.available + count <= self.capacity(), "ring overflow");
        for _ in 0..count {
            self.buffer[self.write_index] = T::zero();
            self.write_index = (self.write_index + 1) % self.buffer.len();
        }
        self.available += count;
    }

    pub fn write(&mut self, src: &[T]) {
        debug_assert!(
            self.available + src.len() <= self.capacity(),
            "ring overflow"
        );
        for &sample in src {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.buffer.len();
        }
        self.available += src.len();
    }

    /// Copies `dst.len()` samples out and consumes them. Returns false
    /// without touching state when not enough samples are buffered.
    pub fn read(&mut self, dst: &mut [T]) -> bool {
        if self.available < dst.len() {
            return false;
        }
        for slot in dst.iter_mut() {
            *slot = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % self.buffer.len();
        }
        self.available -= dst.len();
        true
    }

    pub fn available(&self) -> usize {
        self.available
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }
}

/// Sliding-window FIFO: reads a window of `read_size` samples, advances by
/// `step_size`. Consecutive successful reads overlap by
/// `read_size - step_size` samples.
#[derive(Debug, Clone)]
pub struct OverlapRingBuffer<T> {
    buffer: Vec<T>,
    read_size: usize,
    step_size: usize,
    write_index: usize,
    read_index: usize,
    available: usize,
}

impl<T: Float> OverlapRingBuffer<T> {
    pub fn new(read_size: usize, step_size: usize, capacity: usize) -> Self {
        assert!(step_size <= read_size, "step size cannot exceed read size");
        assert!(read_size <= capacity, "capacity cannot hold one window");
        Self {
            buffer: vec![T::zero(); capacity],
            read_size,
            step_size,
            write_index: 0,
            read_index: 0,
            available: 0,
        }
    }

    /// Pre-fill with `count` zero samples.
    pub fn fill_with_zeros(&mut self, count: usize) {
        debug_assert!(self.available + count <= self.capacity(), "ring overflow");
        for _ in 0..count {
            self.buffer[self.write_index] = T::zero();
            self.write_index = (self.write_index + 1) % self.buffer.len();
        }
        self.available += count;
    }

    pub fn write(&mut self, src: &[T]) {
        debug_assert!(
            self.available + src.len() <= self.capacity(),
            "ring overflow"
        );
        for &sample in src {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.buffer.len();
        }
        self.available += src.len();
    }

    /// Copies `read_size` samples into `dst` and advances the cursor by
    /// `step_size`, leaving the trailing `read_size - step_size` samples
    /// visible for the next read. Returns false without touching state when
    /// fewer than `read_size` samples are buffered.
    pub fn read(&mut self, dst: &mut [T]) -> bool {
        debug_assert_eq!(dst.len(), self.read_size);
        if self.available < self.read_size {
            return false;
        }
        let mut index = self.read_index;
        for slot in dst.iter_mut() {
            *slot = self.buffer[index];
            index = (index + 1) % self.buffer.len();
        }
        self.read_index = (self.read_index + self.step_size) % self.buffer.len();
        self.available -= self.step_size;
        true
    }

    pub fn read_size(&self) -> usize {
        self.read_size
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn available(&self) -> usize {
        self.available
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

/// Per-channel [`RingBuffer`]s with uniform write/read semantics.
///
/// All channels hold identical fill counts by construction, so a failed
/// read on the first channel short-circuits the rest.
#[derive(Debug, Clone)]
pub struct MultichannelRingBuffer<T> {
    channels: Vec<RingBuffer<T>>,
}

impl<T: Float> MultichannelRingBuffer<T> {
    pub fn new(capacity: usize, channel_count: usize) -> Self {
        Self {
            channels: (0..channel_count).map(|_| RingBuffer::new(capacity)).collect(),
        }
    }

    pub fn fill_with_zeros(&mut self, count: usize) {
        for channel in &mut self.channels {
            channel.fill_with_zeros(count);
        }
    }

    pub fn write(&mut self, source: &TimeBlock<T>, frame_count: usize) {
        debug_assert_eq!(source.channel_count(), self.channels.len());
        for (channel_idx, ring) in self.channels.iter_mut().enumerate() {
            ring.write(&source.channel(channel_idx)[..frame_count]);
        }
    }

    pub fn read(&mut self, target: &mut Waveform<T>, frame_count: usize) -> bool {
        debug_assert_eq!(target.channel_count(), self.channels.len());
        for (channel_idx, ring) in self.channels.iter_mut().enumerate() {
            if !ring.read(&mut target.channel_mut(channel_idx)[..frame_count]) {
                return false;
            }
        }
        true
    }

    pub fn channel(&self, channel_idx: usize) -> &RingBuffer<T> {
        &self.channels[channel_idx]
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples buffered per channel.
    pub fn available(&self) -> usize {
        self.channels.first().map_or(0, RingBuffer::available)
    }
}

/// Per-channel [`OverlapRingBuffer`]s with uniform write/read semantics.
#[derive(Debug, Clone)]
pub struct MultichannelOverlapRingBuffer<T> {
    channels: Vec<OverlapRingBuffer<T>>,
}

impl<T: Float> MultichannelOverlapRingBuffer<T> {
    pub fn new(
        read_size: usize,
        step_size: usize,
        capacity: usize,
        channel_count: usize,
    ) -> Self {
        Self {
            channels: (0..channel_count)
                .map(|_| OverlapRingBuffer::new(read_size, step_size, capacity))
                .collect(),
        }
    }

    pub fn fill_with_zeros(&mut self, count: usize) {
        for channel in &mut self.channels {
            channel.fill_with_zeros(count);
        }
    }

    pub fn write(&mut self, source: &Waveform<T>, frame_count: usize) {
        debug_assert_eq!(source.channel_count(), self.channels.len());
        for (channel_idx, ring) in self.channels.iter_mut().enumerate() {
            ring.write(&source.channel(channel_idx)[..frame_count]);
        }
    }

    /// Reads one full window per channel into `target`, advancing every
    /// channel by the step size. Returns false and leaves all channels
    /// untouched when a window is not available yet.
    pub fn read(&mut self, target: &mut TimeBlock<T>) -> bool {
        debug_assert_eq!(target.channel_count(), self.channels.len());
        for (channel_idx, ring) in self.channels.iter_mut().enumerate() {
            if !ring.read(target.channel_mut(channel_idx)) {
                return false;
            }
        }
        true
    }

    pub fn channel(&self, channel_idx: usize) -> &OverlapRingBuffer<T> {
        &self.channels[channel_idx]
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples buffered per channel.
    pub fn available(&self) -> usize {
        self.channels.first().map_or(0, OverlapRingBuffer::available)
    }
}
