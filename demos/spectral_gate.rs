//! Spectral gate: zero every bin whose magnitude falls under a threshold.
//! A sine buried in broadband noise comes out noticeably cleaner.

use freqfilt::prelude::*;

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let block_size = 512;
    let threshold = 2.0f32;

    let mut filter = StftFilterF32::new();
    filter.set_block_size(block_size);
    filter.init_with(1, 2048, 1536).expect("valid configuration");
    filter.set_spectrum_fn(move |spectrum| {
        for channel_idx in 0..spectrum.channel_count() {
            for bin in spectrum.channel_mut(channel_idx) {
                if bin.norm() < threshold {
                    *bin = Complex::new(0.0, 0.0);
                }
            }
        }
    });

    // deterministic pseudo-noise, no rng dependency needed for a demo
    let mut state = 0x2545_f491u32;
    let mut noise = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state as f32 / u32::MAX as f32) - 0.5
    };

    let total = 96_000;
    let input: Vec<f32> = (0..total)
        .map(|n| {
            let tone = (2.0 * std::f32::consts::PI * 440.0 * n as f32 / 48_000.0).sin();
            tone + 0.05 * noise()
        })
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
    println!("gated  RMS: {:.4}", rms(&output[latency..]));
}
