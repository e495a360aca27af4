#![allow(clippy::float_cmp)]

use soundfield::eq::GraphicEq;
use soundfield::iir::{pinkifier_filter, PeakingFilter};
use soundfield::math::{db_to_linear, is_equal_with, linear_to_db};
use soundfield::prelude::*;

fn noise_signal(len: usize) -> Vec<Sample> {
    // Deterministic broadband-ish test signal.
    (0..len)
        .map(|k| {
            let k = k as Sample;
            (0.3 * k).sin() + 0.5 * (1.7 * k).sin() - 0.25 * (4.1 * k + 0.5).sin()
        })
        .collect()
}

#[test]
fn test_fir_basic_convolution() {
    let mut filter = FirFilter::new(vec![0.0, 1.0], 64);
    assert_eq!(filter.process_sample(0.5), 0.0);
    assert_eq!(filter.process_sample(0.0), 0.5);

    let mut filter = FirFilter::new(vec![1.0, 0.5, 0.25], 64);
    let mut output = vec![0.0; 5];
    filter.process_block(&[1.0, 0.0, 0.0, 0.0, 0.0], &mut output);
    assert!(soundfield::math::is_equal_slice(
        &output,
        &[1.0, 0.5, 0.25, 0.0, 0.0]
    ));
}

#[test]
fn test_fir_sample_and_block_agree() {
    let impulse_response: Vec<Sample> = vec![0.2, -0.4, 1.0, 0.3, -0.1, 0.05, 0.6, -0.3];
    let input = noise_signal(100);

    let mut sample_filter = FirFilter::new(impulse_response.clone(), 128);
    let sample_output: Vec<Sample> =
        input.iter().map(|x| sample_filter.process_sample(*x)).collect();

    // One whole block.
    let mut block_filter = FirFilter::new(impulse_response.clone(), 128);
    let mut block_output = vec![0.0; input.len()];
    block_filter.process_block(&input, &mut block_output);
    for (a, b) in sample_output.iter().zip(&block_output) {
        assert!(is_equal_with(*a, *b, 1.0e-6));
    }

    // Mixed strides, including ones shorter than the filter.
    let mut mixed_filter = FirFilter::new(impulse_response, 128);
    let mut mixed_output = vec![0.0; input.len()];
    let mut k = 0;
    for stride in [3usize, 20, 5, 40, 9, 23] {
        mixed_filter.process_block(&input[k..k + stride], &mut mixed_output[k..k + stride]);
        k += stride;
    }
    for (a, b) in sample_output.iter().zip(&mixed_output) {
        assert!(is_equal_with(*a, *b, 1.0e-6));
    }
}

#[test]
fn test_fir_crossfade_monotonicity() {
    // With single-tap responses the output of a constant input reads
    // the active coefficient directly.
    let update_length = 4;
    let mut filter = FirFilter::new(vec![1.0], 64);
    assert_eq!(filter.process_sample(1.0), 1.0);
    filter.set_impulse_response(&[3.0], update_length);
    let mut coefficients = Vec::new();
    for _ in 0..(update_length + 3) {
        coefficients.push(filter.process_sample(1.0));
    }
    // w = (k+1)/(U+1): 1.4, 1.8, 2.2, 2.6, 3.0, then the target holds.
    for (k, c) in coefficients.iter().enumerate().take(update_length + 1) {
        let w = (k as Sample + 1.0) / (update_length as Sample + 1.0);
        assert!(is_equal_with(*c, 1.0 + 2.0 * w, 1.0e-12), "sample {k}");
    }
    assert_eq!(coefficients[update_length + 1], 3.0);
    assert_eq!(coefficients[update_length + 2], 3.0);
}

#[test]
fn test_fir_crossfade_retarget_continues_from_interpolated() {
    let mut filter = FirFilter::new(vec![0.0], 64);
    filter.set_impulse_response(&[1.0], 9);
    // Half way through the fade the active coefficient is 0.5.
    for _ in 0..4 {
        filter.process_sample(1.0);
    }
    assert!(is_equal_with(filter.process_sample(1.0), 0.5, 1.0e-12));
    // Retargeting back to zero fades from 0.5, not from 1.0.
    filter.set_impulse_response(&[0.0], 4);
    let first = filter.process_sample(1.0);
    assert!(is_equal_with(first, 0.5 * (1.0 - 1.0 / 5.0), 1.0e-12));
    let mut last = first;
    for _ in 0..5 {
        let value = filter.process_sample(1.0);
        assert!(value <= last + 1.0e-12);
        last = value;
    }
    assert!(is_equal_with(last, 0.0, 1.0e-12));
}

#[test]
fn test_fir_length_change_resets() {
    let mut filter = FirFilter::new(vec![1.0, 1.0], 64);
    filter.process_sample(1.0);
    filter.set_impulse_response(&[2.0, 0.0, 0.0], 100);
    // New length applies immediately, state cleared.
    assert_eq!(filter.process_sample(1.0), 2.0);
    assert_eq!(filter.impulse_response(), &[2.0, 0.0, 0.0]);
}

#[test]
fn test_gain_and_identical_filters() {
    let mut gain = GainFilter::new(0.25);
    assert_eq!(gain.process_sample(2.0), 0.5);
    let mut identical = IdenticalFilter;
    assert_eq!(identical.process_sample(0.7), 0.7);
    let mut fir_gain = FirFilter::gain_filter(3.0);
    assert_eq!(fir_gain.process_sample(0.5), 1.5);
}

#[test]
fn test_iir_impulse_response() {
    // One-pole low-pass: y[n] = x[n] + 0.5 y[n-1].
    let mut filter = IirFilter::new(vec![1.0, 0.0], vec![1.0, -0.5]);
    let mut output = Vec::new();
    let mut input = vec![0.0; 6];
    input[0] = 1.0;
    for x in &input {
        output.push(filter.process_sample(*x));
    }
    for (k, y) in output.iter().enumerate() {
        assert!(is_equal_with(*y, (0.5 as Sample).powi(k as i32), 1.0e-12));
    }

    // Denormalised coefficients report back unchanged and behave
    // identically to the normalised form.
    let scaled = IirFilter::new(vec![2.0, 0.0], vec![2.0, -1.0]);
    assert!(soundfield::math::is_equal_slice(&scaled.b(), &[2.0, 0.0]));
    assert!(soundfield::math::is_equal_slice(&scaled.a(), &[2.0, -1.0]));
    let mut scaled = scaled;
    let mut reference = IirFilter::new(vec![1.0, 0.0], vec![1.0, -0.5]);
    for x in noise_signal(32) {
        assert!(is_equal_with(
            scaled.process_sample(x),
            reference.process_sample(x),
            1.0e-12
        ));
    }
}

#[test]
fn test_iir_sample_and_block_agree() {
    let input = noise_signal(64);
    let mut a = wall_filter(WallType::CarpetPile, 44100.0);
    let mut b = wall_filter(WallType::CarpetPile, 44100.0);
    let sample_output: Vec<Sample> = input.iter().map(|x| a.process_sample(*x)).collect();
    let mut block_output = vec![0.0; input.len()];
    b.process_block(&input, &mut block_output);
    for (x, y) in sample_output.iter().zip(&block_output) {
        assert!(is_equal_with(*x, *y, 1.0e-6));
    }
}

#[test]
fn test_wall_filter_fingerprints() {
    let carpet = wall_filter(WallType::CarpetPile, 44100.0);
    let b = carpet.b();
    let a = carpet.a();
    assert!(is_equal_with(b[0], 0.5627, 1.0e-4));
    assert!(is_equal_with(b[1], -1.0326, 1.0e-4));
    assert!(is_equal_with(b[2], 0.4700, 1.0e-4));
    assert!(is_equal_with(a[0], 1.0, 1.0e-4));
    assert!(is_equal_with(a[1], -1.8961, 1.0e-4));
    assert!(is_equal_with(a[2], 0.8964, 1.0e-4));

    // The rigid wall passes signals through untouched.
    let mut rigid = wall_filter(WallType::Rigid, 44100.0);
    assert_eq!(rigid.process_sample(0.3), 0.3);
    assert_eq!(rigid.b()[0], 1.0);

    // The other presets exist and have a stable leading tap.
    assert!(is_equal_with(
        wall_filter(WallType::CarpetCotton, 44100.0).b()[0],
        0.687580695329600,
        1.0e-12
    ));
    assert!(is_equal_with(
        wall_filter(WallType::WallBricks, 44100.0).b()[0],
        0.978495798553620,
        1.0e-12
    ));
    assert!(is_equal_with(
        wall_filter(WallType::CeilingTile, 44100.0).b()[0],
        0.168413736374283,
        1.0e-12
    ));
}

#[test]
#[should_panic]
fn test_wall_filter_rejects_other_rates() {
    let _ = wall_filter(WallType::CarpetPile, 48000.0);
}

#[test]
fn test_iir_frequency_response() {
    // A pure gain has a flat response.
    let gain = IirFilter::gain_filter(0.5);
    let response = gain.frequency_response(&[100.0, 1000.0, 10000.0], 44100.0);
    for h in response {
        assert!((h.norm() - 0.5).abs() < 1.0e-12);
    }
    // A one-sample delay has unit magnitude everywhere.
    let delay = IirFilter::new(vec![0.0, 1.0], vec![1.0, 0.0]);
    for h in delay.frequency_response(&[500.0, 5000.0], 44100.0) {
        assert!((h.norm() - 1.0).abs() < 1.0e-12);
    }
}

#[test]
fn test_peaking_filter_gain_at_centre() {
    let fs: Time = 44100.0;
    let fc: Sample = 1000.0;
    let gain = db_to_linear(6.0);
    let filter = PeakingFilter::with_gain(fc, gain, 1.0, fs);
    let response = filter.frequency_response(&[fc], fs);
    assert!(is_equal_with(response[0].norm() as Sample, gain, 1.0e-6));

    // Unit gain leaves the filter transparent.
    let mut flat = PeakingFilter::new(fc, 1.0, fs);
    for x in noise_signal(32) {
        assert!(is_equal_with(flat.process_sample(x), x, 1.0e-12));
    }
}

#[test]
fn test_graphic_eq_identity() {
    let bands: Vec<Sample> = vec![125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];
    let mut eq = GraphicEq::new(&bands, 1.0, 44100.0);
    eq.set_gain(&vec![1.0; bands.len()]);
    let input = noise_signal(512);
    let mut output = vec![0.0; input.len()];
    eq.process_block(&input, &mut output);
    let rms: Sample = input
        .iter()
        .zip(&output)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<Sample>()
        .sqrt()
        / (input.len() as Sample).sqrt();
    assert!(rms < 1.0e-5, "identity deviation rms {rms}");
}

#[test]
fn test_graphic_eq_band_solve() {
    // Boosting one band by 6 dB lands within a dB of 6 at its centre.
    let bands: Vec<Sample> = vec![125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];
    let fs: Time = 44100.0;
    let mut gains = vec![1.0; bands.len()];
    gains[2] = db_to_linear(6.0);
    let eq = GraphicEq::with_gain(&gains, &bands, 1.0, fs);
    // Measure the cascade response with a long impulse.
    let mut eq = eq;
    let mut impulse = vec![0.0; 16384];
    impulse[0] = 1.0;
    let mut response = vec![0.0; impulse.len()];
    eq.process_block(&impulse, &mut response);
    let fir = IirFilter::new(response.clone(), {
        let mut a = vec![0.0; response.len()];
        a[0] = 1.0;
        a
    });
    let measured = fir.frequency_response(&[bands[2]], fs);
    let measured_db = linear_to_db(measured[0].norm() as Sample);
    assert!(
        (measured_db - 6.0).abs() < 1.0,
        "band response {measured_db} dB"
    );
}

#[test]
fn test_graphic_eq_update_skips_when_equal() {
    let bands: Vec<Sample> = vec![250.0, 1000.0, 4000.0];
    let mut eq = GraphicEq::new(&bands, 1.0, 44100.0);
    eq.set_target_gain(&[2.0, 1.0, 0.5]);
    eq.update_gain(1.0);
    // Retargeting to the same gains leaves processing stable.
    let before: Vec<Sample> = noise_signal(16);
    let mut eq_clone = eq.clone();
    let mut output_a = vec![0.0; 16];
    let mut output_b = vec![0.0; 16];
    eq.update_gain(1.0);
    eq.process_block(&before, &mut output_a);
    eq_clone.process_block(&before, &mut output_b);
    assert!(soundfield::math::is_equal_slice(&output_a, &output_b));
}

#[test]
fn test_pinkifier_rolls_off() {
    // Pink-ish filters attenuate high frequencies relative to low.
    let filter = pinkifier_filter();
    let response = filter.frequency_response(&[100.0, 10000.0], 44100.0);
    assert!(response[0].norm() > response[1].norm());
}
