//! Minimal 1-in/1-out filter: halve the spectrum, stream a sine through it
//! and print input/output RMS.

use freqfilt::prelude::*;

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let block_size = 256;
    let mut filter = StftFilterF32::new();
    filter.set_block_size(block_size);
    filter.init_with(1, 1024, 512).expect("valid configuration");
    filter.set_spectrum_fn(|spectrum| {
        for channel_idx in 0..spectrum.channel_count() {
            for bin in spectrum.channel_mut(channel_idx) {
                *bin = *bin * 0.5f32;
            }
        }
    });

    let total = 48_000;
    let input: Vec<f32> = (0..total)
        .map(|n| (2.0 * std::f32::consts::PI * 440.0 * n as f32 / 48_000.0).sin())
        .collect();

    let mut output = Vec::with_capacity(total);
    for chunk in input.chunks(block_size) {
        let mut block = WaveformF32::new(chunk.len(), 1);
        block.channel_mut(0).copy_from_slice(chunk);
        filter.process_block(&mut block);
        output.extend_from_slice(block.channel(0));
    }

    let latency = filter.frame_latency();
    println!("frame latency: {} samples", latency);
    println!("input  RMS: {:.4}", rms(&input[latency..]));
    println!("output RMS: {:.4}", rms(&output[latency..]));
}
