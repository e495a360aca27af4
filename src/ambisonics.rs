//! Higher-order ambisonics: encoding, buffers and horizontal decoding
//! with near-field correction.

use super::buffer::{Buffer, BufferViewMut};
use super::directivity::DirectivityOps;
use super::fir::DigitalFilter;
use super::iir::IirFilter;
use super::math::{self, poly, real_part, Matrix, PI};
use super::point::Point;
use super::sh::{
    hoa_channel_id, horizontal_encoding, num_hoa_channels, real_spherical_harmonic,
    HoaDimensionality, HoaNormalisation, HoaOrdering,
};
use super::{Angle, Length, Sample, Time};
use num_complex::Complex64;
use std::ops::{Deref, DerefMut};

/// A buffer whose channels hold one HOA stream, addressed by
/// spherical-harmonic degree and order under configurable ordering and
/// normalisation conventions.
#[derive(Clone, Debug)]
pub struct HoaBuffer {
    buffer: Buffer,
    order: usize,
    ordering: HoaOrdering,
    normalisation: HoaNormalisation,
    dimensionality: HoaDimensionality,
}

impl HoaBuffer {
    /// A zeroed full-3D HOA buffer with ACN ordering and N3D
    /// normalisation.
    pub fn new(order: usize, num_samples: usize) -> Self {
        Self::with_conventions(
            order,
            num_samples,
            HoaOrdering::Acn,
            HoaNormalisation::N3d,
            HoaDimensionality::ThreeD,
        )
    }

    pub fn with_conventions(
        order: usize,
        num_samples: usize,
        ordering: HoaOrdering,
        normalisation: HoaNormalisation,
        dimensionality: HoaDimensionality,
    ) -> Self {
        Self {
            buffer: Buffer::new(num_hoa_channels(order, dimensionality), num_samples),
            order,
            ordering,
            normalisation,
            dimensionality,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn ordering(&self) -> HoaOrdering {
        self.ordering
    }

    #[inline]
    pub fn normalisation(&self) -> HoaNormalisation {
        self.normalisation
    }

    #[inline]
    pub fn dimensionality(&self) -> HoaDimensionality {
        self.dimensionality
    }

    /// Channel index of degree `n` and order `m` under this buffer's
    /// conventions.
    pub fn channel_id(&self, n: usize, m: isize) -> usize {
        hoa_channel_id(n, m, self.ordering, self.dimensionality)
    }

    pub fn get_hoa_sample(&self, n: usize, m: isize, sample: usize) -> Sample {
        self.buffer.get_sample(self.channel_id(n, m), sample)
    }

    pub fn set_hoa_sample(&mut self, n: usize, m: isize, sample: usize, value: Sample) {
        self.buffer.set_sample(self.channel_id(n, m), sample, value);
    }

    pub fn add_hoa_sample(&mut self, n: usize, m: isize, sample: usize, value: Sample) {
        self.buffer.add_sample(self.channel_id(n, m), sample, value);
    }
}

impl Deref for HoaBuffer {
    type Target = Buffer;
    fn deref(&self) -> &Buffer {
        &self.buffer
    }
}

impl DerefMut for HoaBuffer {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }
}

/// HOA encoding directivity: multiplies each plane-wave sample by the
/// spherical harmonics of its direction of arrival and accumulates
/// the products into the HOA channels.
#[derive(Clone, Debug)]
pub struct HoaEncoder {
    order: usize,
    ordering: HoaOrdering,
    normalisation: HoaNormalisation,
    dimensionality: HoaDimensionality,
    // Geometry cache; each per-wave clone tracks its own direction.
    last_point: Option<Point>,
    coefficients: Vec<Sample>,
}

impl HoaEncoder {
    /// A full-3D encoder with ACN ordering and N3D normalisation.
    pub fn new(order: usize) -> Self {
        Self::with_conventions(
            order,
            HoaOrdering::Acn,
            HoaNormalisation::N3d,
            HoaDimensionality::ThreeD,
        )
    }

    /// A horizontal-only encoder producing the classical
    /// `sqrt(2) cos / sin` channel pairs.
    pub fn horizontal(order: usize) -> Self {
        Self::with_conventions(
            order,
            HoaOrdering::Acn,
            HoaNormalisation::N3d,
            HoaDimensionality::Horizontal,
        )
    }

    pub fn with_conventions(
        order: usize,
        ordering: HoaOrdering,
        normalisation: HoaNormalisation,
        dimensionality: HoaDimensionality,
    ) -> Self {
        if normalisation == HoaNormalisation::FuMa {
            assert!(order <= 3, "FuMa normalisation is defined up to third order");
        }
        let num_channels = num_hoa_channels(order, dimensionality);
        Self {
            order,
            ordering,
            normalisation,
            dimensionality,
            last_point: None,
            coefficients: vec![0.0; num_channels],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.coefficients.len()
    }

    fn update_coefficients(&mut self, point: &Point) {
        let theta = point.phi();
        match self.dimensionality {
            HoaDimensionality::Horizontal => {
                self.coefficients[0] = 1.0;
                for i in 1..=self.order {
                    self.coefficients[2 * i - 1] = math::SQRT_2 * (i as Angle * theta).cos();
                    self.coefficients[2 * i] = math::SQRT_2 * (i as Angle * theta).sin();
                }
            }
            HoaDimensionality::ThreeD => {
                // Elevation is the angle formed with the x-y plane.
                let phi = PI / 2.0 - point.theta();
                for n in 0..=self.order {
                    for m in -(n as isize)..=(n as isize) {
                        let id = hoa_channel_id(n, m, self.ordering, self.dimensionality);
                        self.coefficients[id] =
                            real_spherical_harmonic(n, m, theta, phi, self.normalisation);
                    }
                }
            }
        }
    }
}

impl DirectivityOps for HoaEncoder {
    fn receive_and_add(&mut self, input: &[Sample], point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_channels() >= self.num_channels());
        debug_assert!(output.num_samples() >= input.len());
        let point = if point.has_nan() || point.norm() == 0.0 {
            // Undefined direction of arrival; encode from the front.
            Point::new(1.0, 0.0, 0.0)
        } else {
            point
        };
        let needs_update = match &self.last_point {
            Some(last) => !last.is_equal(&point),
            None => true,
        };
        if needs_update {
            self.update_coefficients(&point);
            self.last_point = Some(point);
        }
        for (channel, coefficient) in self.coefficients.iter().enumerate() {
            for (k, x) in input.iter().enumerate() {
                output.add_sample(channel, k, *x * coefficient);
            }
        }
    }

    fn reset_state(&mut self) {}
}

/// Horizontal HOA decoder for a ring of loudspeakers.
///
/// Runs the mode-matching matrix and optionally, when energy decoding
/// is on, a max-rE weighted path crossed over at high frequency
/// through a Linkwitz-Riley pair. Near-field correction applies one
/// IIR per HOA channel ahead of the matrices, following Daniel (2003).
pub struct AmbisonicsHorizDec {
    order: usize,
    loudspeaker_angles: Vec<Angle>,
    energy_decoding: bool,
    near_field_correction: bool,
    mode_matching_matrix: Matrix,
    max_energy_matrix: Matrix,
    nfc_filters: Vec<IirFilter>,
    crossover_low: Vec<IirFilter>,
    crossover_high: Vec<IirFilter>,
    // Per-sample scratch, sized at construction.
    frame: Vec<Sample>,
    weighted_frame: Vec<Sample>,
    feeds_low: Vec<Sample>,
    feeds_high: Vec<Sample>,
}

impl AmbisonicsHorizDec {
    /// Creates a decoder for `loudspeaker_angles` (radians, horizontal
    /// ring at `loudspeakers_distance` metres). `cut_off_frequency`
    /// splits the energy-decoding crossover when that mode is on.
    pub fn new(
        order: usize,
        energy_decoding: bool,
        cut_off_frequency: Time,
        loudspeaker_angles: &[Angle],
        near_field_correction: bool,
        loudspeakers_distance: Length,
        sampling_frequency: Time,
        sound_speed: Sample,
    ) -> Self {
        assert!(
            !loudspeaker_angles.is_empty(),
            "the decoder needs at least one loudspeaker"
        );
        assert!(
            sampling_frequency > 0.0,
            "the sampling frequency must be positive"
        );
        let num_loudspeakers = loudspeaker_angles.len();
        let num_channels = 2 * order + 1;
        let mut nfc_filters = Vec::new();
        if near_field_correction {
            assert!(
                loudspeakers_distance > 0.0,
                "the loudspeaker distance must be positive"
            );
            // One filter per channel; both degrees of an order share
            // the same correction.
            nfc_filters.push(nfc_filter(
                0,
                loudspeakers_distance,
                sampling_frequency,
                sound_speed,
            ));
            for n in 1..=order {
                for _ in 0..2 {
                    nfc_filters.push(nfc_filter(
                        n,
                        loudspeakers_distance,
                        sampling_frequency,
                        sound_speed,
                    ));
                }
            }
            debug_assert_eq!(nfc_filters.len(), num_channels);
        }
        let (crossover_low, crossover_high) = if energy_decoding {
            assert!(
                cut_off_frequency > 0.0 && cut_off_frequency < sampling_frequency / 2.0,
                "the crossover cut-off must sit below Nyquist"
            );
            let low = crossover_filter_low(cut_off_frequency, sampling_frequency);
            let high = crossover_filter_high(cut_off_frequency, sampling_frequency);
            (
                vec![low; num_loudspeakers],
                vec![high; num_loudspeakers],
            )
        } else {
            (Vec::new(), Vec::new())
        };
        Self {
            order,
            loudspeaker_angles: loudspeaker_angles.to_vec(),
            energy_decoding,
            near_field_correction,
            mode_matching_matrix: mode_matching_dec(order, loudspeaker_angles),
            max_energy_matrix: max_energy_dec(order),
            nfc_filters,
            crossover_low,
            crossover_high,
            frame: vec![0.0; num_channels],
            weighted_frame: vec![0.0; num_channels],
            feeds_low: vec![0.0; num_loudspeakers],
            feeds_high: vec![0.0; num_loudspeakers],
        }
    }

    pub fn num_loudspeakers(&self) -> usize {
        self.loudspeaker_angles.len()
    }

    /// Decodes a horizontal HOA buffer into per-loudspeaker feeds;
    /// `output` needs one channel per loudspeaker.
    pub fn decode(&mut self, input: &HoaBuffer, output: &mut Buffer) {
        assert_eq!(
            input.dimensionality(),
            HoaDimensionality::Horizontal,
            "the horizontal decoder expects a horizontal HOA buffer"
        );
        assert_eq!(input.order(), self.order, "HOA order mismatch");
        debug_assert!(output.num_channels() >= self.num_loudspeakers());
        debug_assert!(output.num_samples() >= input.num_samples());
        let num_channels = 2 * self.order + 1;
        for sample_id in 0..input.num_samples() {
            for channel in 0..num_channels {
                self.frame[channel] = input.get_sample(channel, sample_id);
            }
            if self.near_field_correction {
                for (value, filter) in self.frame.iter_mut().zip(self.nfc_filters.iter_mut()) {
                    *value = filter.process_sample(*value);
                }
            }
            self.mode_matching_matrix
                .multiply_vector_into(&self.frame, &mut self.feeds_low);
            if self.energy_decoding {
                self.max_energy_matrix
                    .multiply_vector_into(&self.frame, &mut self.weighted_frame);
                self.mode_matching_matrix
                    .multiply_vector_into(&self.weighted_frame, &mut self.feeds_high);
                for l in 0..self.num_loudspeakers() {
                    let low = self.crossover_low[l].process_sample(self.feeds_low[l]);
                    let high = self.crossover_high[l].process_sample(self.feeds_high[l]);
                    output.set_sample(l, sample_id, low + high);
                }
            } else {
                for l in 0..self.num_loudspeakers() {
                    output.set_sample(l, sample_id, self.feeds_low[l]);
                }
            }
        }
    }

    /// Clears the state of the correction and crossover filters.
    pub fn reset_state(&mut self) {
        for filter in &mut self.nfc_filters {
            filter.reset_state();
        }
        for filter in &mut self.crossover_low {
            filter.reset_state();
        }
        for filter in &mut self.crossover_high {
            filter.reset_state();
        }
    }
}

/// Mode-matching decoding matrix `(1/L) E^T`, where `E` holds the
/// encoding coefficients at each loudspeaker angle; the Poletti
/// panning law for regular rings.
pub fn mode_matching_dec(order: usize, loudspeaker_angles: &[Angle]) -> Matrix {
    let num_loudspeakers = loudspeaker_angles.len();
    let mut encoding = Matrix::zeros(2 * order + 1, num_loudspeakers);
    for (l, angle) in loudspeaker_angles.iter().enumerate() {
        encoding.set_column(l, &horizontal_encoding(order, *angle));
    }
    encoding.transpose().scale(1.0 / num_loudspeakers as Sample)
}

/// Weight of HOA order `n` in the max-rE decoder of the given order.
pub fn max_energy_dec_weight(n: usize, order: usize) -> Sample {
    ((n as Sample) * PI / (2.0 * (order as Sample + 1.0))).cos()
}

/// Diagonal max-rE re-weighting matrix.
pub fn max_energy_dec(order: usize) -> Matrix {
    let mut matrix = Matrix::zeros(2 * order + 1, 2 * order + 1);
    matrix.set(0, 0, max_energy_dec_weight(0, order));
    let mut k = 1;
    for n in 1..=order {
        matrix.set(k, k, max_energy_dec_weight(n, order));
        k += 1;
        matrix.set(k, k, max_energy_dec_weight(n, order));
        k += 1;
    }
    matrix
}

/// Low branch of the Linkwitz-Riley crossover.
pub fn crossover_filter_low(cut_off_frequency: Time, sampling_frequency: Time) -> IirFilter {
    let k = (PI * cut_off_frequency / sampling_frequency).tan();
    let denominator = k * k + 2.0 * k + 1.0;
    let b0 = k * k / denominator;
    let b = vec![b0, 2.0 * b0, b0];
    let a = vec![
        1.0,
        2.0 * (k * k - 1.0) / denominator,
        (k * k - 2.0 * k + 1.0) / denominator,
    ];
    IirFilter::new(b, a)
}

/// High branch of the Linkwitz-Riley crossover. The numerator sign is
/// flipped so the two branch outputs add instead of subtracting.
pub fn crossover_filter_high(cut_off_frequency: Time, sampling_frequency: Time) -> IirFilter {
    let k = (PI * cut_off_frequency / sampling_frequency).tan();
    let denominator = k * k + 2.0 * k + 1.0;
    let b0 = -1.0 / denominator;
    let b = vec![b0, -2.0 * b0, b0];
    let low = crossover_filter_low(cut_off_frequency, sampling_frequency);
    IirFilter::new(b, low.a())
}

// Complex zeros X_Mq(n) of the spherical transfer functions, tabulated
// in Daniel (2003) up to sixth order.
fn nfc_zeros(order: usize) -> Vec<Complex64> {
    match order {
        0 => vec![],
        1 => vec![Complex64::new(-2.0, 0.0)],
        2 => {
            let x = Complex64::new(-3.0000, 1.7321);
            vec![x, x.conj()]
        }
        3 => {
            let x = Complex64::new(-3.6778, 3.5088);
            vec![x, x.conj(), Complex64::new(-4.6444, 0.0)]
        }
        4 => {
            let x0 = Complex64::new(-4.2076, 5.3148);
            let x2 = Complex64::new(-5.7924, 1.7345);
            vec![x0, x0.conj(), x2, x2.conj()]
        }
        5 => {
            let x0 = Complex64::new(-4.6493, 7.1420);
            let x2 = Complex64::new(-6.7039, 3.4853);
            vec![x0, x0.conj(), x2, x2.conj(), Complex64::new(-7.2935, 0.0)]
        }
        6 => {
            let x0 = Complex64::new(-5.0319, 8.9853);
            let x2 = Complex64::new(-7.4714, 5.2525);
            let x4 = Complex64::new(-8.4967, 1.7350);
            vec![x0, x0.conj(), x2, x2.conj(), x4, x4.conj()]
        }
        _ => panic!("near-field correction is tabulated up to sixth order"),
    }
}

/// Near-field correction filter for one HOA degree, evaluated at the
/// loudspeaker array radius; formulation due to Daniel (2003).
pub fn nfc_filter(
    order: usize,
    loudspeaker_distance: Length,
    sampling_frequency: Time,
    sound_speed: Sample,
) -> IirFilter {
    let zeros = nfc_zeros(order);
    let a = 4.0 * sampling_frequency as f64 * loudspeaker_distance as f64 / sound_speed as f64;
    let mapped: Vec<Complex64> = zeros
        .iter()
        .map(|x| (Complex64::new(1.0, 0.0) + *x / a) / (Complex64::new(1.0, 0.0) - *x / a))
        .collect();
    let scale: Complex64 = zeros
        .iter()
        .map(|x| Complex64::new(1.0, 0.0) - *x / a)
        .product();
    let ones = vec![Complex64::new(1.0, 0.0); order];
    let b = real_part(&poly(&ones));
    let a_coefficients = real_part(
        &poly(&mapped)
            .iter()
            .map(|c| *c * scale)
            .collect::<Vec<Complex64>>(),
    );
    IirFilter::new(b, a_coefficients)
}

/// Decodes the horizontal HOA stream captured by an
/// [`HoaEncoder`](HoaEncoder) ring test back to a plane-wave gain;
/// convenience used by hosts to sanity-check layouts.
pub fn poletti_panning_gain(order: usize, num_loudspeakers: usize, theta: Angle) -> Sample {
    let mut gain = 1.0;
    for i in 1..=order {
        gain += 2.0 * (i as Angle * theta).cos();
    }
    gain / num_loudspeakers as Sample
}
