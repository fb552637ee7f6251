mod common;

use freqfilt::prelude::*;

fn make_filter(
    channel_count: usize,
    fft_size: usize,
    overlap: usize,
    block_size: usize,
) -> StftFilterF32 {
    let mut filter = StftFilterF32::new();
    filter.set_block_size(block_size);
    filter.init_with(channel_count, fft_size, overlap).unwrap();
    filter
}

#[test]
fn test_identity_mono_ramp() {
    let mut filter = make_filter(1, 8, 4, 4);
    assert_eq!(filter.frame_latency(), 4);

    let input = common::ramp(64);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    // the ramp reaches 63, so keep the tolerance absolute but proportionate
    common::assert_delayed_match(&input, &output[0], 4, 1e-4);
}

#[test]
fn test_identity_default_configuration_snr() {
    let mut filter = StftFilterF32::new();
    filter.init(1).unwrap();
    assert_eq!(filter.frame_latency(), 2048 - 512);

    let input = common::sine(440.0, 48_000.0, 16 * 1024);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    let latency = filter.frame_latency();
    let compare_len = output[0].len() - latency;
    let snr = common::calculate_snr(&input[..compare_len], &output[0][latency..]);
    assert!(snr > 100.0, "SNR too low: {:.2} dB", snr);
}

#[test]
fn test_identity_stereo_mismatched_block_size() {
    let mut filter = make_filter(2, 16, 12, 5);
    assert_eq!(filter.frame_latency(), 16);

    let left = common::sine(440.0, 48_000.0, 1024);
    let right = common::sine(880.0, 48_000.0, 1024);
    let input = vec![left, right];
    let output = common::run_through(&mut filter, &input);

    for channel_idx in 0..2 {
        common::assert_delayed_match(&input[channel_idx], &output[channel_idx], 16, 1e-5);
    }
}

#[test]
fn test_null_transform_outputs_silence() {
    let mut filter = make_filter(1, 16, 8, 8);
    filter.set_transform_fn(|_inputs, outputs| {
        for output in outputs.iter_mut() {
            output.fill(Complex::new(0.0, 0.0));
        }
    });

    let input = common::sine(440.0, 48_000.0, 256);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    for &sample in &output[0] {
        assert_eq!(sample, 0.0);
    }
}

#[test]
fn test_gain_transform() {
    let mut filter = make_filter(1, 16, 8, 8);
    filter.set_spectrum_fn(|spectrum| {
        for channel_idx in 0..spectrum.channel_count() {
            for bin in spectrum.channel_mut(channel_idx) {
                *bin = *bin * 0.5f32;
            }
        }
    });
    let latency = filter.frame_latency();

    let input = common::sine(440.0, 48_000.0, 512);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    let scaled: Vec<f32> = input.iter().map(|&x| x * 0.5).collect();
    common::assert_delayed_match(&scaled, &output[0], latency, 1e-5);
}

#[test]
fn test_read_before_write_pads_zeros() {
    let mut filter = make_filter(1, 8, 4, 4);

    let mut early = WaveformF32::new(64, 1);
    early.fill(1.0);
    filter.read(std::slice::from_mut(&mut early));
    assert_eq!(early.channel(0), &[0.0f32; 64][..]);

    // the filter stays valid and streams normally afterwards
    let input = common::ramp(64);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));
    common::assert_delayed_match(&input, &output[0], 4, 1e-4);
}

#[test]
fn test_latency_block_out_of_phase_with_hop() {
    // hop 4 does not divide block 3: the filter needs a full window of
    // lead-in before output lines up with the caller's reads
    let mut filter = make_filter(1, 8, 4, 3);
    assert_eq!(filter.frame_latency(), 8);

    let input = common::sine(440.0, 48_000.0, 60);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));
    common::assert_delayed_match(&input, &output[0], 8, 1e-5);
}

#[test]
fn test_latency_block_larger_than_window() {
    let mut filter = make_filter(1, 8, 4, 16);
    assert_eq!(filter.frame_latency(), 16);

    let input = common::sine(440.0, 48_000.0, 64);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    // With no lead-in padding the first `overlap` reconstructed samples are
    // still missing their predecessor frames; alignment holds from there on.
    let latency = filter.frame_latency();
    let settled = latency + filter.overlap();
    for i in settled..output[0].len() {
        let expected = input[i - latency];
        assert!(
            (output[0][i] - expected).abs() <= 1e-5,
            "sample {} mismatch: expected {}, got {}",
            i,
            expected,
            output[0][i]
        );
    }
}

#[test]
fn test_output_is_invariant_under_input_partitioning() {
    let run = |chunks: &[usize]| -> Vec<f32> {
        let mut filter = make_filter(1, 8, 4, 16);
        let input = common::sine(1000.0, 48_000.0, 96);

        let mut position = 0;
        for &chunk in chunks {
            let mut block = WaveformF32::new(chunk, 1);
            block
                .channel_mut(0)
                .copy_from_slice(&input[position..position + chunk]);
            filter.write(std::slice::from_ref(&block));
            position += chunk;
        }
        assert_eq!(position, 96);

        // 96 input samples yield 23 complete frames of hop 4: 92 samples
        let mut collected = WaveformF32::new(80, 1);
        filter.read(std::slice::from_mut(&mut collected));
        assert!(collected.channel(0).iter().any(|&s| s != 0.0));
        collected.channel(0).to_vec()
    };

    let whole_blocks = run(&[16, 16, 16, 16, 16, 16]);
    let ragged = run(&[5, 11, 16, 13, 3, 16, 16, 16]);
    let tiny = run(&[1; 96]);

    // same sample stream, same frames, bit-identical output
    assert_eq!(whole_blocks, ragged);
    assert_eq!(whole_blocks, tiny);
}

#[test]
fn test_linearity_of_a_fixed_linear_transform() {
    let gain = |spectrum: &mut SpectrumBlockF32| {
        for channel_idx in 0..spectrum.channel_count() {
            for bin in spectrum.channel_mut(channel_idx) {
                *bin = *bin * 0.5f32;
            }
        }
    };
    let run = |input: &[f32]| -> Vec<f32> {
        let mut filter = make_filter(1, 16, 8, 8);
        filter.set_spectrum_fn(gain);
        common::run_through(&mut filter, std::slice::from_ref(&input.to_vec()))
            .remove(0)
    };

    let x = common::sine(440.0, 48_000.0, 512);
    let y = common::sine(1330.0, 48_000.0, 512);
    let combined: Vec<f32> = x
        .iter()
        .zip(&y)
        .map(|(&a, &b)| 2.0 * a + 3.0 * b)
        .collect();

    let out_x = run(&x);
    let out_y = run(&y);
    let out_combined = run(&combined);

    for i in 0..out_combined.len() {
        let superposed = 2.0 * out_x[i] + 3.0 * out_y[i];
        assert!(
            (out_combined[i] - superposed).abs() <= 1e-4,
            "sample {}: {} vs {}",
            i,
            out_combined[i],
            superposed
        );
    }
}

#[test]
fn test_process_block_matches_write_then_read() {
    let input = common::sine(440.0, 48_000.0, 512);

    let mut manual = make_filter(1, 16, 8, 8);
    let expected = common::run_through(&mut manual, std::slice::from_ref(&input));

    let mut sugar = make_filter(1, 16, 8, 8);
    let mut collected = Vec::new();
    for chunk in input.chunks(8) {
        let mut block = WaveformF32::new(chunk.len(), 1);
        block.channel_mut(0).copy_from_slice(chunk);
        sugar.process_block(&mut block);
        collected.extend_from_slice(block.channel(0));
    }

    assert_eq!(expected[0], collected);
}

#[test]
fn test_reinit_discards_stream_state() {
    let mut filter = make_filter(1, 8, 4, 4);

    // leave the pipeline mid-stream
    let noise = common::sine(700.0, 48_000.0, 36);
    let _ = common::run_through(&mut filter, std::slice::from_ref(&noise));

    // re-init fully replaces buffered samples and carried tails
    filter.init_with(1, 8, 4).unwrap();
    let input = common::ramp(64);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    let mut fresh = make_filter(1, 8, 4, 4);
    let expected = common::run_through(&mut fresh, std::slice::from_ref(&input));
    assert_eq!(expected[0], output[0]);
}

#[test]
fn test_set_block_size_between_sessions() {
    let mut filter = make_filter(1, 16, 8, 4);

    let warmup = common::sine(300.0, 48_000.0, 64);
    let _ = common::run_through(&mut filter, std::slice::from_ref(&warmup));

    // a new session with a different block size behaves like a fresh filter
    filter.set_block_size(8);
    let input = common::sine(440.0, 48_000.0, 256);
    let output = common::run_through(&mut filter, std::slice::from_ref(&input));

    let mut fresh = make_filter(1, 16, 8, 8);
    let expected = common::run_through(&mut fresh, std::slice::from_ref(&input));
    assert_eq!(expected[0], output[0]);
}

#[test]
#[should_panic(expected = "initialized")]
fn test_write_before_init_panics() {
    let mut filter = StftFilterF32::new();
    let block = WaveformF32::new(512, 1);
    filter.write(std::slice::from_ref(&block));
}
