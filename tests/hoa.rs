#![allow(clippy::float_cmp)]

use soundfield::ambisonics::{
    crossover_filter_high, crossover_filter_low, max_energy_dec_weight, nfc_filter,
    poletti_panning_gain,
};
use soundfield::math::{is_equal_with, uniform_angles, PI, SQRT_2};
use soundfield::prelude::*;

#[test]
fn test_hoa_channel_addressing() {
    // FuMa full-3D table.
    let cases = [
        (0usize, 0isize, 0usize),
        (1, 1, 1),
        (1, -1, 2),
        (1, 0, 3),
        (2, 0, 4),
        (2, 1, 5),
        (2, -1, 6),
        (2, 2, 7),
        (2, -2, 8),
    ];
    for (n, m, id) in cases {
        assert_eq!(
            hoa_channel_id(n, m, HoaOrdering::FuMa, HoaDimensionality::ThreeD),
            id,
            "FuMa ({n}, {m})"
        );
    }
    // ACN: id = n^2 + n + m.
    for n in 0usize..4 {
        for m in -(n as isize)..=(n as isize) {
            assert_eq!(
                hoa_channel_id(n, m, HoaOrdering::Acn, HoaDimensionality::ThreeD),
                ((n * n + n) as isize + m) as usize
            );
        }
    }
    // Horizontal: cosine channels odd, sine channels even.
    assert_eq!(
        hoa_channel_id(0, 0, HoaOrdering::Acn, HoaDimensionality::Horizontal),
        0
    );
    assert_eq!(
        hoa_channel_id(2, 2, HoaOrdering::Acn, HoaDimensionality::Horizontal),
        3
    );
    assert_eq!(
        hoa_channel_id(2, -2, HoaOrdering::Acn, HoaDimensionality::Horizontal),
        4
    );

    assert_eq!(num_hoa_channels(3, HoaDimensionality::ThreeD), 16);
    assert_eq!(num_hoa_channels(3, HoaDimensionality::Horizontal), 7);
}

#[test]
fn test_hoa_buffer_addressing() {
    let mut buffer = HoaBuffer::with_conventions(
        2,
        4,
        HoaOrdering::FuMa,
        HoaNormalisation::Sn3d,
        HoaDimensionality::ThreeD,
    );
    assert_eq!(buffer.num_channels(), 9);
    buffer.set_hoa_sample(2, -1, 3, 0.25);
    assert_eq!(buffer.get_sample(6, 3), 0.25);
    buffer.add_hoa_sample(2, -1, 3, 0.25);
    assert_eq!(buffer.get_hoa_sample(2, -1, 3), 0.5);
}

#[test]
fn test_horizontal_encoding_coefficients() {
    let theta: Angle = 0.7;
    let mut encoder = HoaEncoder::horizontal(2);
    let mut buffer = HoaBuffer::with_conventions(
        2,
        1,
        HoaOrdering::Acn,
        HoaNormalisation::N3d,
        HoaDimensionality::Horizontal,
    );
    let direction = Point::new(theta.cos(), theta.sin(), 0.0);
    encoder.receive_and_add(&[1.0], direction, &mut buffer.as_view_mut());
    assert!(is_equal_with(buffer.get_sample(0, 0), 1.0, 1.0e-12));
    assert!(is_equal_with(
        buffer.get_sample(1, 0),
        SQRT_2 * theta.cos(),
        1.0e-12
    ));
    assert!(is_equal_with(
        buffer.get_sample(2, 0),
        SQRT_2 * theta.sin(),
        1.0e-12
    ));
    assert!(is_equal_with(
        buffer.get_sample(3, 0),
        SQRT_2 * (2.0 * theta).cos(),
        1.0e-12
    ));
    assert!(is_equal_with(
        buffer.get_sample(4, 0),
        SQRT_2 * (2.0 * theta).sin(),
        1.0e-12
    ));
}

#[test]
fn test_spherical_harmonics_basics() {
    // Order zero is unity for N3D and SN3D.
    assert!(is_equal_with(
        real_spherical_harmonic(0, 0, 0.3, -0.8, HoaNormalisation::N3d),
        1.0,
        1.0e-12
    ));
    // First-order N3D on the axes.
    let sqrt3 = (3.0 as Sample).sqrt();
    assert!(is_equal_with(
        real_spherical_harmonic(1, 1, 0.0, 0.0, HoaNormalisation::N3d),
        sqrt3,
        1.0e-12
    ));
    assert!(is_equal_with(
        real_spherical_harmonic(1, -1, PI / 2.0, 0.0, HoaNormalisation::N3d),
        sqrt3,
        1.0e-12
    ));
    assert!(is_equal_with(
        real_spherical_harmonic(1, 0, 0.0, PI / 2.0, HoaNormalisation::N3d),
        sqrt3,
        1.0e-12
    ));
    // SN3D drops the sqrt(2n+1).
    assert!(is_equal_with(
        real_spherical_harmonic(1, 1, 0.0, 0.0, HoaNormalisation::Sn3d),
        1.0,
        1.0e-12
    ));
    // FuMa attenuates W by 1/sqrt(2).
    assert!(is_equal_with(
        real_spherical_harmonic(0, 0, 0.0, 0.0, HoaNormalisation::FuMa),
        1.0 / SQRT_2,
        1.0e-12
    ));
}

#[test]
fn test_poletti_round_trip() {
    // Encode a plane wave, decode on a regular ring: loudspeaker 0
    // follows the panning law to 1e-10.
    for order in [1usize, 2, 3] {
        let num_loudspeakers = 2 * order + 3;
        let angles = uniform_angles(num_loudspeakers, 0.0);
        let mut decoder = AmbisonicsHorizDec::new(
            order,
            false,
            0.0,
            &angles,
            false,
            1.0,
            44100.0,
            SOUND_SPEED,
        );
        for theta in [0.0 as Angle, 0.3, 1.2, -2.0] {
            let mut encoder = HoaEncoder::horizontal(order);
            let mut hoa = HoaBuffer::with_conventions(
                order,
                1,
                HoaOrdering::Acn,
                HoaNormalisation::N3d,
                HoaDimensionality::Horizontal,
            );
            encoder.receive_and_add(
                &[1.0],
                Point::new(theta.cos(), theta.sin(), 0.0),
                &mut hoa.as_view_mut(),
            );
            let mut feeds = Buffer::new(num_loudspeakers, 1);
            decoder.decode(&hoa, &mut feeds);
            let expected = poletti_panning_gain(order, num_loudspeakers, theta);
            assert!(
                (feeds.get_sample(0, 0) - expected).abs() < 1.0e-10,
                "order {order}, angle {theta}"
            );
        }
    }
}

#[test]
fn test_max_energy_weights() {
    let order = 3;
    for n in 0..=order {
        let expected = ((n as Sample) * PI / (2.0 * (order as Sample + 1.0))).cos();
        assert!(is_equal_with(max_energy_dec_weight(n, order), expected, 1.0e-12));
    }
    // Weights decrease with the degree.
    assert!(max_energy_dec_weight(1, 3) > max_energy_dec_weight(2, 3));
}

#[test]
fn test_crossover_reconstructs_flat() {
    // The two branches add back to (minus) an allpass: magnitudes stay
    // unity across the band.
    let fs: Time = 44100.0;
    let cutoff: Time = 1000.0;
    let low = crossover_filter_low(cutoff, fs);
    let high = crossover_filter_high(cutoff, fs);
    let frequencies: Vec<Sample> = vec![50.0, 200.0, 1000.0, 4000.0, 15000.0];
    let low_response = low.frequency_response(&frequencies, fs);
    let high_response = high.frequency_response(&frequencies, fs);
    for (l, h) in low_response.iter().zip(&high_response) {
        let sum = l + h;
        assert!((sum.norm() - 1.0).abs() < 1.0e-9);
    }
}

#[test]
fn test_nfc_filter_shapes() {
    // Order zero is a pass-through; higher orders tame the low end,
    // compensating the proximity boost of the spherical waves.
    let fs: Time = 44100.0;
    let zero = nfc_filter(0, 2.0, fs, SOUND_SPEED);
    for h in zero.frequency_response(&[100.0, 1000.0, 10000.0], fs) {
        assert!((h.norm() - 1.0).abs() < 1.0e-12);
    }
    for order in 1..=6 {
        let filter = nfc_filter(order, 2.0, fs, SOUND_SPEED);
        let response = filter.frequency_response(&[50.0, 10000.0], fs);
        assert!(
            response[0].norm() < response[1].norm(),
            "order {order} should attenuate the low end"
        );
    }
}

#[test]
fn test_energy_decoding_splits_bands() {
    // With energy decoding on, a decoded impulse still carries the
    // mode-matched energy: the DC gain of the combined paths matches
    // the plain decoder.
    let order = 1;
    let num_loudspeakers = 5;
    let angles = uniform_angles(num_loudspeakers, 0.0);
    let fs: Time = 44100.0;
    let theta: Angle = 0.4;

    let render = |energy: bool| -> Vec<Sample> {
        let mut decoder = AmbisonicsHorizDec::new(
            order,
            energy,
            700.0,
            &angles,
            false,
            1.0,
            fs,
            SOUND_SPEED,
        );
        let num_samples = 4096;
        let mut encoder = HoaEncoder::horizontal(order);
        let mut hoa = HoaBuffer::with_conventions(
            order,
            num_samples,
            HoaOrdering::Acn,
            HoaNormalisation::N3d,
            HoaDimensionality::Horizontal,
        );
        let mut impulse = vec![0.0; num_samples];
        impulse[0] = 1.0;
        encoder.receive_and_add(
            &impulse,
            Point::new(theta.cos(), theta.sin(), 0.0),
            &mut hoa.as_view_mut(),
        );
        let mut feeds = Buffer::new(num_loudspeakers, num_samples);
        decoder.decode(&hoa, &mut feeds);
        (0..num_loudspeakers)
            .map(|l| feeds.get_read_view(l).iter().sum())
            .collect()
    };

    let plain = render(false);
    let energy = render(true);
    for (a, b) in plain.iter().zip(&energy) {
        // DC: the low path passes, the high path sums to zero, and the
        // max-rE weighting leaves order zero untouched... the gains
        // differ only through the first-order weight.
        assert!((a - b).abs() < 0.5, "dc gains {a} vs {b}");
    }
}

#[test]
fn test_nfc_decode_runs() {
    // Near-field corrected decoding stays finite and stateful across
    // blocks.
    let order = 2;
    let angles = uniform_angles(5, 0.0);
    let mut decoder =
        AmbisonicsHorizDec::new(order, false, 0.0, &angles, true, 2.0, 44100.0, SOUND_SPEED);
    let mut encoder = HoaEncoder::horizontal(order);
    let mut hoa = HoaBuffer::with_conventions(
        order,
        64,
        HoaOrdering::Acn,
        HoaNormalisation::N3d,
        HoaDimensionality::Horizontal,
    );
    let mut impulse = vec![0.0; 64];
    impulse[0] = 1.0;
    encoder.receive_and_add(&impulse, Point::new(1.0, 0.0, 0.0), &mut hoa.as_view_mut());
    let mut feeds = Buffer::new(5, 64);
    decoder.decode(&hoa, &mut feeds);
    for l in 0..5 {
        for v in feeds.get_read_view(l) {
            assert!(v.is_finite());
        }
    }
    decoder.reset_state();
}
