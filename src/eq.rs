//! Graphic equaliser: a shelf-peaking-shelf cascade with matrix-solved
//! band gains.

use super::fir::DigitalFilter;
use super::iir::{PeakHighShelf, PeakLowShelf, PeakingFilter};
use super::math::{db_to_linear, linear_to_db, lerp, Matrix};
use super::{Sample, Time};

// Prototype gain (dB) used to measure each filter's band leakage when
// building the control matrix.
const PROTOTYPE_DB: Sample = 1.0;

// Floor for band gains; the equaliser controls magnitudes only.
const MIN_GAIN: Sample = 1.0e-20;

/// Graphic equaliser over a set of band centre frequencies.
///
/// The first band drives a low shelf, the last a high shelf and the
/// bands in between peaking filters, all in series. Requested band
/// gains are converted to per-filter gains by multiplying with the
/// inverse of the interaction matrix measured at construction, which
/// compensates for the overlap between neighbouring filters. Gains can
/// be retargeted and linearly interpolated for click-free changes;
/// when the current gains already match the target the update path
/// does nothing.
#[derive(Clone, Debug)]
pub struct GraphicEq {
    low_shelf: PeakLowShelf,
    peaking_filters: Vec<PeakingFilter>,
    high_shelf: PeakHighShelf,
    // Inverse interaction matrix: target band dB -> per-filter dB.
    matrix: Matrix,
    target_gain: Vec<Sample>,
    current_gain: Vec<Sample>,
    // Scratch for the dB solve.
    db_gain: Vec<Sample>,
    input_gain: Vec<Sample>,
    equal: bool,
}

impl GraphicEq {
    /// Creates an equaliser with flat (unit) gains over the given
    /// centre frequencies, which must be at least two and ascending.
    pub fn new(centre_frequencies: &[Sample], q: Sample, sampling_frequency: Time) -> Self {
        assert!(
            centre_frequencies.len() >= 2,
            "a graphic equaliser needs at least two bands"
        );
        assert!(
            centre_frequencies.windows(2).all(|w| w[0] < w[1]),
            "the centre frequencies must be ascending"
        );
        let num_filters = centre_frequencies.len();
        let low_shelf = PeakLowShelf::new(centre_frequencies[0], q, sampling_frequency);
        let high_shelf =
            PeakHighShelf::new(centre_frequencies[num_filters - 1], q, sampling_frequency);
        let peaking_filters: Vec<PeakingFilter> = centre_frequencies[1..num_filters - 1]
            .iter()
            .map(|fc| PeakingFilter::new(*fc, q, sampling_frequency))
            .collect();
        let matrix = Self::interaction_matrix(centre_frequencies, q, sampling_frequency);
        Self {
            low_shelf,
            peaking_filters,
            high_shelf,
            matrix,
            target_gain: vec![1.0; num_filters],
            current_gain: vec![1.0; num_filters],
            db_gain: vec![0.0; num_filters],
            input_gain: vec![0.0; num_filters],
            equal: true,
        }
    }

    /// Creates an equaliser and applies the given band gains at once.
    pub fn with_gain(
        gain: &[Sample],
        centre_frequencies: &[Sample],
        q: Sample,
        sampling_frequency: Time,
    ) -> Self {
        let mut eq = Self::new(centre_frequencies, q, sampling_frequency);
        eq.set_gain(gain);
        eq
    }

    pub fn num_bands(&self) -> usize {
        self.target_gain.len()
    }

    // dB response of filter `j` at band `i` per dB of commanded gain,
    // inverted so band targets solve directly to filter gains.
    fn interaction_matrix(
        centre_frequencies: &[Sample],
        q: Sample,
        sampling_frequency: Time,
    ) -> Matrix {
        let num_filters = centre_frequencies.len();
        let prototype = db_to_linear(PROTOTYPE_DB);
        let mut interaction = Matrix::zeros(num_filters, num_filters);
        for j in 0..num_filters {
            let response = if j == 0 {
                PeakLowShelf::with_gain(centre_frequencies[0], prototype, q, sampling_frequency)
                    .frequency_response(centre_frequencies, sampling_frequency)
            } else if j == num_filters - 1 {
                PeakHighShelf::with_gain(
                    centre_frequencies[num_filters - 1],
                    prototype,
                    q,
                    sampling_frequency,
                )
                .frequency_response(centre_frequencies, sampling_frequency)
            } else {
                PeakingFilter::with_gain(centre_frequencies[j], prototype, q, sampling_frequency)
                    .frequency_response(centre_frequencies, sampling_frequency)
            };
            for (i, h) in response.iter().enumerate() {
                interaction.set(i, j, linear_to_db(h.norm() as Sample) / PROTOTYPE_DB);
            }
        }
        interaction.inverse()
    }

    /// Applies the given linear band gains immediately. The equaliser
    /// shapes magnitudes only; gains enter as absolute values.
    pub fn set_gain(&mut self, gains: &[Sample]) {
        assert_eq!(gains.len(), self.num_bands(), "one gain per band");
        for (target, gain) in self.target_gain.iter_mut().zip(gains) {
            *target = gain.abs().max(MIN_GAIN);
        }
        self.current_gain.copy_from_slice(&self.target_gain);
        self.equal = true;
        self.apply_current_gain();
    }

    /// Retargets the band gains without touching the filters; follow
    /// with [`update_gain`](Self::update_gain) from the audio thread.
    pub fn set_target_gain(&mut self, gains: &[Sample]) {
        assert_eq!(gains.len(), self.num_bands(), "one gain per band");
        for (target, gain) in self.target_gain.iter_mut().zip(gains) {
            *target = gain.abs().max(MIN_GAIN);
        }
        self.equal = self.current_gain == self.target_gain;
    }

    /// Moves the current gains toward the targets by `lerp_factor`
    /// (1 jumps straight to the target) and updates the filters. Does
    /// nothing when the gains already match.
    pub fn update_gain(&mut self, lerp_factor: Sample) {
        if self.equal {
            return;
        }
        let mut all_reached = true;
        for (current, target) in self.current_gain.iter_mut().zip(&self.target_gain) {
            *current = lerp(*current, *target, lerp_factor.clamp(0.0, 1.0));
            if (*current - *target).abs() > 1.0e-6 * target.abs() {
                all_reached = false;
            } else {
                *current = *target;
            }
        }
        self.equal = all_reached;
        self.apply_current_gain();
    }

    fn apply_current_gain(&mut self) {
        for (db, gain) in self.db_gain.iter_mut().zip(&self.current_gain) {
            *db = linear_to_db(*gain);
        }
        self.matrix.multiply_vector_into(&self.db_gain, &mut self.input_gain);
        self.low_shelf.set_gain(db_to_linear(self.input_gain[0]));
        let num_filters = self.num_bands();
        for (filter, db) in self
            .peaking_filters
            .iter_mut()
            .zip(&self.input_gain[1..num_filters - 1])
        {
            filter.set_gain(db_to_linear(*db));
        }
        self.high_shelf
            .set_gain(db_to_linear(self.input_gain[num_filters - 1]));
    }
}

impl DigitalFilter for GraphicEq {
    fn process_sample(&mut self, input: Sample) -> Sample {
        let mut value = self.low_shelf.process_sample(input);
        for filter in &mut self.peaking_filters {
            value = filter.process_sample(value);
        }
        self.high_shelf.process_sample(value)
    }

    fn reset_state(&mut self) {
        self.low_shelf.reset_state();
        for filter in &mut self.peaking_filters {
            filter.reset_state();
        }
        self.high_shelf.reset_state();
    }
}
