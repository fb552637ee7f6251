//! The streaming engine: PCM in, user spectrum transform, PCM out.
//!
//! [`StftFilter`] accepts arbitrarily sized PCM blocks, buffers them until a
//! full FFT frame is available, runs the analysis / transform / synthesis
//! loop once per frame and reconstructs a gapless output stream delayed by
//! [`StftFilter::frame_latency`] samples. After a successful init the
//! streaming path performs no allocation.

use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::buffer::{SpectrumBlock, TimeBlock, Waveform};
use crate::fft_backend::{Complex, FftNum, FftPlanner, FftPlannerTrait};
use crate::ring::{MultichannelOverlapRingBuffer, MultichannelRingBuffer};
use crate::window::{WindowTable, WindowType};
use crate::FilterError;

/// Per-frame spectrum manipulation injected into the streaming loop.
///
/// Called synchronously once per STFT frame, on the thread that called
/// [`StftFilter::write`]. The callee must fill every bin of every output
/// block for the current frame; it may read any input bin; it must not
/// retain references past return.
///
/// Every `FnMut(&[SpectrumBlock<T>], &mut [SpectrumBlock<T>])` closure is a
/// transform; carry state by capturing it.
pub trait SpectrumTransform<T: FftNum>: Send {
    fn process(&mut self, inputs: &[SpectrumBlock<T>], outputs: &mut [SpectrumBlock<T>]);
}

impl<T, F> SpectrumTransform<T> for F
where
    T: FftNum,
    F: FnMut(&[SpectrumBlock<T>], &mut [SpectrumBlock<T>]) + Send,
{
    fn process(&mut self, inputs: &[SpectrumBlock<T>], outputs: &mut [SpectrumBlock<T>]) {
        self(inputs, outputs);
    }
}

/// Default transform: copies each input spectrum to its paired output
/// bin-for-bin. Unpaired extra outputs are zeroed.
pub fn identity_transform<T: FftNum>(
    inputs: &[SpectrumBlock<T>],
    outputs: &mut [SpectrumBlock<T>],
) {
    let paired = inputs.len().min(outputs.len());
    for (output, input) in outputs.iter_mut().zip(inputs) {
        output.copy_from(input);
    }
    for output in outputs.iter_mut().skip(paired) {
        output.fill(Complex::new(T::zero(), T::zero()));
    }
}

/// Streaming time–frequency filter.
///
/// ```
/// use freqfilt::prelude::*;
///
/// let mut filter = StftFilterF32::new();
/// filter.set_block_size(128);
/// filter.init_with(1, 512, 256).unwrap();
/// filter.set_spectrum_fn(|spectrum| {
///     for channel_idx in 0..spectrum.channel_count() {
///         for bin in spectrum.channel_mut(channel_idx) {
///             *bin = *bin * 0.5f32;
///         }
///     }
/// });
///
/// let mut block = WaveformF32::new(128, 1);
/// filter.process_block(&mut block);
/// ```
pub struct StftFilter<T: FftNum> {
    fft_size: usize,
    overlap: usize,
    window_type: WindowType,
    block_size: usize,
    channel_count: usize,
    input_count: usize,
    output_count: usize,
    input_rings: Vec<MultichannelOverlapRingBuffer<T>>,
    output_rings: Vec<MultichannelRingBuffer<T>>,
    analyzers: Vec<Analyzer<T>>,
    synthesizers: Vec<Analyzer<T>>,
    time_blocks: Vec<TimeBlock<T>>,
    spectra_in: Vec<SpectrumBlock<T>>,
    spectra_out: Vec<SpectrumBlock<T>>,
    hop_blocks: Vec<TimeBlock<T>>,
    transform: Box<dyn SpectrumTransform<T>>,
    initialized: bool,
}

impl<T: FftNum> StftFilter<T> {
    /// An uninitialized 1-in/1-out filter with the default parameters:
    /// FFT size 2048, overlap 1024, Hamming window, block size 512, identity
    /// transform. Call one of the `init` forms before streaming.
    pub fn new() -> Self {
        Self::with_streams(1, 1)
    }

    /// An uninitialized filter with `input_count` input streams and
    /// `output_count` output streams, for mixing topologies.
    pub fn with_streams(input_count: usize, output_count: usize) -> Self {
        assert!(input_count > 0, "input_count must be non-zero");
        assert!(output_count > 0, "output_count must be non-zero");
        Self {
            fft_size: 2048,
            overlap: 1024,
            window_type: WindowType::Hamming,
            block_size: 512,
            channel_count: 0,
            input_count,
            output_count,
            input_rings: Vec::new(),
            output_rings: Vec::new(),
            analyzers: Vec::new(),
            synthesizers: Vec::new(),
            time_blocks: Vec::new(),
            spectra_in: Vec::new(),
            spectra_out: Vec::new(),
            hop_blocks: Vec::new(),
            transform: Box::new(identity_transform::<T>),
            initialized: false,
        }
    }

    /// Initialize with the current STFT parameters.
    pub fn init(&mut self, channel_count: usize) -> Result<(), FilterError<T>> {
        self.channel_count = channel_count;
        self.configure()
    }

    /// Initialize with explicit FFT size and overlap, keeping the current
    /// window type.
    pub fn init_with(
        &mut self,
        channel_count: usize,
        fft_size: usize,
        overlap: usize,
    ) -> Result<(), FilterError<T>> {
        self.init_with_window(channel_count, fft_size, overlap, self.window_type)
    }

    /// Initialize with the full parameter set. Every other `init` form
    /// reduces to this one. A repeat call fully replaces prior state.
    pub fn init_with_window(
        &mut self,
        channel_count: usize,
        fft_size: usize,
        overlap: usize,
        window_type: WindowType,
    ) -> Result<(), FilterError<T>> {
        self.fft_size = fft_size;
        self.overlap = overlap;
        self.window_type = window_type;
        self.channel_count = channel_count;
        self.configure()
    }

    fn configure(&mut self) -> Result<(), FilterError<T>> {
        self.initialized = false;

        if let Err(error) = self.validate() {
            warn!(?error, "rejecting filter configuration");
            return Err(error);
        }

        let hop_size = self.hop_size();
        let channel_count = self.channel_count;
        let windows = WindowTable::new(self.window_type, self.fft_size, hop_size)
            .map_err(|error| {
                warn!(?error, "rejecting window configuration");
                error
            })?;

        let mut planner = FftPlanner::new();
        self.analyzers = (0..self.input_count)
            .map(|_| Analyzer::new(&mut planner, windows.clone(), hop_size, channel_count))
            .collect::<Result<_, _>>()?;
        self.synthesizers = (0..self.output_count)
            .map(|_| Analyzer::new(&mut planner, windows.clone(), hop_size, channel_count))
            .collect::<Result<_, _>>()?;

        let fft_size = self.fft_size;
        let spectrum_size = self.spectrum_size();
        self.time_blocks = (0..self.input_count)
            .map(|_| TimeBlock::new(fft_size, channel_count))
            .collect();
        self.spectra_in = (0..self.input_count)
            .map(|_| SpectrumBlock::new(spectrum_size, channel_count))
            .collect();
        self.spectra_out = (0..self.output_count)
            .map(|_| SpectrumBlock::new(spectrum_size, channel_count))
            .collect();
        self.hop_blocks = (0..self.output_count)
            .map(|_| TimeBlock::new(hop_size, channel_count))
            .collect();

        self.rebuild_rings();
        self.initialized = true;
        debug!(
            channel_count = self.channel_count,
            fft_size = self.fft_size,
            overlap = self.overlap,
            hop_size,
            block_size = self.block_size,
            "filter initialized"
        );
        Ok(())
    }

    fn validate(&self) -> Result<(), FilterError<T>> {
        if self.channel_count == 0 {
            return Err(FilterError::ConfigInvalid {
                reason: "channel count must be at least 1",
            });
        }
        if self.channel_count > 255 {
            return Err(FilterError::ConfigInvalid {
                reason: "channel count must not exceed 255",
            });
        }
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(FilterError::ConfigInvalid {
                reason: "fft size must be a power of two of at least 2",
            });
        }
        if self.overlap >= self.fft_size {
            return Err(FilterError::ConfigInvalid {
                reason: "overlap must be smaller than the fft size",
            });
        }
        Ok(())
    }

    fn rebuild_rings(&mut self) {
        let hop_size = self.hop_size();
        let fft_size = self.fft_size;
        let block_size = self.block_size;
        let channel_count = self.channel_count;

        // One window plus one caller block always fits, whatever the
        // write/read interleaving.
        let input_capacity = fft_size + block_size;
        self.input_rings = (0..self.input_count)
            .map(|_| {
                let mut ring = MultichannelOverlapRingBuffer::new(
                    fft_size,
                    hop_size,
                    input_capacity,
                    channel_count,
                );
                // Pre-pad so the first emitted hop lines up with the start
                // of the caller's sample stream.
                if fft_size > block_size {
                    ring.fill_with_zeros(fft_size - block_size);
                }
                ring
            })
            .collect();

        // The synthesis side writes one hop at a time; keep room for it
        // even when the caller block is tiny.
        let mut output_capacity = block_size * 8;
        if output_capacity <= hop_size {
            output_capacity = hop_size * 2;
        }
        self.output_rings = (0..self.output_count)
            .map(|_| MultichannelRingBuffer::new(output_capacity, channel_count))
            .collect();
    }

    /// Replace the per-frame transform. The default is
    /// [`identity_transform`].
    pub fn set_transform(&mut self, transform: Box<dyn SpectrumTransform<T>>) {
        self.transform = transform;
    }

    /// Replace the per-frame transform with a closure over the full
    /// input/output spectrum lists. Convenience over [`Self::set_transform`]
    /// that keeps closure type inference happy.
    pub fn set_transform_fn<F>(&mut self, transform: F)
    where
        F: FnMut(&[SpectrumBlock<T>], &mut [SpectrumBlock<T>]) + Send + 'static,
    {
        self.transform = Box::new(transform);
    }

    /// In-place sugar for the 1-in/1-out topology: the closure receives the
    /// output spectrum pre-filled with the input and mutates it in place.
    ///
    /// # Panics
    ///
    /// Panics unless the filter has exactly one input and one output stream.
    pub fn set_spectrum_fn<F>(&mut self, mut transform: F)
    where
        F: FnMut(&mut SpectrumBlock<T>) + Send + 'static,
    {
        assert!(
            self.input_count == 1 && self.output_count == 1,
            "in-place transforms require a 1-in/1-out filter"
        );
        self.transform = Box::new(
            move |inputs: &[SpectrumBlock<T>], outputs: &mut [SpectrumBlock<T>]| {
                outputs[0].copy_from(&inputs[0]);
                transform(&mut outputs[0]);
            },
        );
    }

    /// Number of frames each caller block is expected to hold. Rebuilds the
    /// stream buffers; call between streaming sessions, not mid-stream.
    pub fn set_block_size(&mut self, block_size: usize) {
        assert!(block_size > 0, "block size must be non-zero");
        self.block_size = block_size;
        if self.initialized {
            self.rebuild_rings();
            for synthesizer in &mut self.synthesizers {
                synthesizer.reset();
            }
            debug!(block_size, "stream buffers rebuilt");
        }
    }

    /// Push caller PCM through the pipeline, running the STFT loop for
    /// every complete frame. Infallible; never blocks, never allocates.
    ///
    /// # Panics
    ///
    /// Panics if the filter is not initialized or `inputs.len()` does not
    /// match the input stream count.
    pub fn write(&mut self, inputs: &[Waveform<T>]) {
        assert!(
            self.initialized,
            "filter must be initialized before streaming"
        );
        assert_eq!(
            inputs.len(),
            self.input_count,
            "expected {} input waveforms, got {}",
            self.input_count,
            inputs.len()
        );

        for (ring, waveform) in self.input_rings.iter_mut().zip(inputs) {
            ring.write(waveform, waveform.frame_count());
        }

        let hop_size = self.hop_size();
        loop {
            // A failed read on any stream means no stream has a complete
            // frame: all streams advance in lockstep.
            for (stream, ring) in self.input_rings.iter_mut().enumerate() {
                if !ring.read(&mut self.time_blocks[stream]) {
                    return;
                }
            }

            for stream in 0..self.input_count {
                self.analyzers[stream]
                    .analyze(&self.time_blocks[stream], &mut self.spectra_in[stream]);
            }

            self.transform.process(&self.spectra_in, &mut self.spectra_out);

            for stream in 0..self.output_count {
                self.synthesizers[stream]
                    .synthesize(&self.spectra_out[stream], &mut self.hop_blocks[stream]);
                self.output_rings[stream].write(&self.hop_blocks[stream], hop_size);
            }
        }
    }

    /// Pop reconstructed PCM, one waveform per output stream. When a stream
    /// has produced fewer samples than requested the waveform is filled
    /// with zeros instead; that is backpressure, not an error.
    ///
    /// # Panics
    ///
    /// Panics if the filter is not initialized or `outputs.len()` does not
    /// match the output stream count.
    pub fn read(&mut self, outputs: &mut [Waveform<T>]) {
        assert!(
            self.initialized,
            "filter must be initialized before streaming"
        );
        assert_eq!(
            outputs.len(),
            self.output_count,
            "expected {} output waveforms, got {}",
            self.output_count,
            outputs.len()
        );

        for (ring, waveform) in self.output_rings.iter_mut().zip(outputs.iter_mut()) {
            let frame_count = waveform.frame_count();
            if !ring.read(waveform, frame_count) {
                waveform.fill(T::zero());
            }
        }
    }

    /// Write-then-read sugar for the 1-in/1-out topology, in place on one
    /// buffer.
    pub fn process_block(&mut self, io: &mut Waveform<T>) {
        self.write(std::slice::from_ref(io));
        self.read(std::slice::from_mut(io));
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn hop_size(&self) -> usize {
        self.fft_size - self.overlap
    }

    /// Same as the FFT size.
    pub fn window_size(&self) -> usize {
        self.fft_size
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Number of meaningful bins per channel: `fft_size / 2 + 1`.
    pub fn spectrum_size(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Input samples consumed before the first caller-aligned output sample
    /// appears, assuming the caller reads `block_size` frames after every
    /// write of `block_size` frames. Informational: use it to align
    /// timestamps.
    pub fn frame_latency(&self) -> usize {
        let hop_size = self.hop_size();
        if hop_size % self.block_size == 0 {
            self.fft_size - self.block_size
        } else if self.block_size < self.fft_size {
            self.fft_size
        } else {
            self.block_size
        }
    }
}

impl<T: FftNum> Default for StftFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}
