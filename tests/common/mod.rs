/// Common test utilities
use freqfilt::prelude::*;

pub fn calculate_snr(original: &[f32], reconstructed: &[f32]) -> f32 {
    assert_eq!(original.len(), reconstructed.len());

    let signal_power: f32 = original.iter().map(|x| x.powi(2)).sum();
    let noise_power: f32 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).powi(2))
        .sum();

    if noise_power == 0.0 {
        f32::INFINITY
    } else {
        10.0 * (signal_power / noise_power).log10()
    }
}

#[allow(dead_code)]
pub fn max_abs_error(original: &[f32], reconstructed: &[f32]) -> f32 {
    original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).abs())
        .max_by(|a, b| a.partial_cmp(b).unwrap())
        .unwrap_or(0.0)
}

#[allow(dead_code)]
pub fn sine(frequency: f32, sample_rate: f32, length: usize) -> Vec<f32> {
    (0..length)
        .map(|n| (2.0 * std::f32::consts::PI * frequency * n as f32 / sample_rate).sin())
        .collect()
}

#[allow(dead_code)]
pub fn ramp(length: usize) -> Vec<f32> {
    (0..length).map(|n| n as f32).collect()
}

/// Push planar `input` channels through `filter` in blocks of
/// `filter.block_size()`, reading the same amount back after every write.
/// Returns the collected output channels, same length as the input. The
/// collected stream equals the input delayed by `filter.frame_latency()`
/// samples (zero-filled while the pipeline warms up).
#[allow(dead_code)]
pub fn run_through(filter: &mut StftFilterF32, input: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let block_size = filter.block_size();
    let channel_count = input.len();
    let total = input[0].len();
    let mut output = vec![Vec::new(); channel_count];
    let mut position = 0;

    while position < total {
        let count = block_size.min(total - position);
        let mut block = WaveformF32::new(count, channel_count);
        for (channel_idx, channel) in input.iter().enumerate() {
            block
                .channel_mut(channel_idx)
                .copy_from_slice(&channel[position..position + count]);
        }

        filter.write(std::slice::from_ref(&block));
        filter.read(std::slice::from_mut(&mut block));

        for channel_idx in 0..channel_count {
            output[channel_idx].extend_from_slice(block.channel(channel_idx));
        }
        position += count;
    }

    output
}

/// Assert that `output` equals `input` delayed by `latency` samples, within
/// `tolerance` per sample.
#[allow(dead_code)]
pub fn assert_delayed_match(input: &[f32], output: &[f32], latency: usize, tolerance: f32) {
    assert!(output.len() > latency, "output shorter than the latency");
    let compare_len = output.len() - latency;
    for i in 0..compare_len {
        let expected = input[i];
        let actual = output[latency + i];
        assert!(
            (expected - actual).abs() <= tolerance,
            "sample {} mismatch: expected {}, got {}",
            i,
            expected,
            actual
        );
    }
}
