//! IIR filters: direct-form-II sections, parametric biquads and the
//! wall absorption presets.

use super::fir::DigitalFilter;
use super::math::{self, is_equal, poly, real_part};
use super::{Sample, Time};
use num_complex::Complex64;

/// Frequency absorption presets for the cuboid room walls.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WallType {
    /// 6 mm pile carpet bonded to open-cell foam underlay.
    CarpetPile,
    /// Cotton carpet.
    CarpetCotton,
    /// Walls, hard surfaces average (brick walls, plaster, hard floors).
    WallBricks,
    /// Fissured ceiling tile.
    CeilingTile,
    /// Perfectly reflective, frequency independent.
    Rigid,
}

/// Direct-form-II IIR filter with real coefficients.
///
/// The denominator is normalised so `a[0] == 1` internally; the
/// original leading coefficient is retained so [`b`](Self::b) and
/// [`a`](Self::a) report the constructor's numerator and denominator.
#[derive(Clone, Debug)]
pub struct IirFilter {
    b: Vec<Sample>,
    a: Vec<Sample>,
    a0: Sample,
    state: Vec<Sample>,
}

impl IirFilter {
    /// Constructs the filter from numerator `b` and denominator `a`,
    /// which must have the same length of at least one tap.
    pub fn new(b: Vec<Sample>, a: Vec<Sample>) -> Self {
        assert_eq!(b.len(), a.len(), "B and A must have the same length");
        assert!(!b.is_empty(), "the coefficients cannot be empty");
        let a0 = a[0];
        assert!(a0 != 0.0, "A[0] cannot be zero");
        let (b, a) = if is_equal(a0, 1.0) {
            (b, a)
        } else {
            (
                b.iter().map(|x| x / a0).collect(),
                a.iter().map(|x| x / a0).collect(),
            )
        };
        let state = vec![0.0; b.len()];
        Self { b, a, a0, state }
    }

    /// A filter for which `output == gain * input`.
    pub fn gain_filter(gain: Sample) -> Self {
        Self::new(vec![gain], vec![1.0])
    }

    /// Pass-through filter.
    pub fn identical_filter() -> Self {
        Self::gain_filter(1.0)
    }

    /// The numerator as passed to the constructor.
    pub fn b(&self) -> Vec<Sample> {
        self.b.iter().map(|x| x * self.a0).collect()
    }

    /// The denominator as passed to the constructor.
    pub fn a(&self) -> Vec<Sample> {
        self.a.iter().map(|x| x * self.a0).collect()
    }

    /// Replaces the coefficients, keeping the filter state. The new
    /// vectors must match the current lengths.
    pub fn set_coefficients(&mut self, b: Vec<Sample>, a: Vec<Sample>) {
        assert_eq!(b.len(), self.b.len());
        assert_eq!(a.len(), self.a.len());
        let a0 = a[0];
        assert!(a0 != 0.0, "A[0] cannot be zero");
        self.a0 = a0;
        if is_equal(a0, 1.0) {
            self.b = b;
            self.a = a;
        } else {
            self.b = b.iter().map(|x| x / a0).collect();
            self.a = a.iter().map(|x| x / a0).collect();
        }
    }

    /// Complex frequency response at the given frequencies (Hz) for
    /// sampling frequency `fs`.
    pub fn frequency_response(&self, frequencies: &[Sample], fs: Time) -> Vec<Complex64> {
        frequencies
            .iter()
            .map(|f| {
                let z1 = Complex64::from_polar(1.0, -std::f64::consts::TAU * (*f as f64) / fs as f64);
                let mut z = Complex64::new(1.0, 0.0);
                let mut numerator = Complex64::new(0.0, 0.0);
                let mut denominator = Complex64::new(0.0, 0.0);
                for (b, a) in self.b.iter().zip(&self.a) {
                    numerator += Complex64::new(*b as f64, 0.0) * z;
                    denominator += Complex64::new(*a as f64, 0.0) * z;
                    z *= z1;
                }
                numerator / denominator
            })
            .collect()
    }
}

impl DigitalFilter for IirFilter {
    fn process_sample(&mut self, input: Sample) -> Sample {
        let size = self.b.len();
        // Fast path for plain gains.
        if size == 1 {
            return input * self.b[0];
        }
        // Branch index i follows the classic direct-form-II plot, the
        // top branch (b[0] only) being i = 0.
        let mut v = input;
        let mut output = 0.0;
        for i in 1..size {
            v += self.state[i - 1] * -self.a[i];
            output += self.state[i - 1] * self.b[i];
        }
        for i in (1..size).rev() {
            self.state[i] = self.state[i - 1];
        }
        self.state[0] = v;
        output + v * self.b[0]
    }

    fn reset_state(&mut self) {
        self.state.fill(0.0);
    }
}

fn cos_omega_and_alpha(fc: Sample, q: Sample, fs: Time) -> (Sample, Sample) {
    assert!(fs > 0.0, "the sampling frequency must be positive");
    assert!(fc > 0.0 && fc < fs / 2.0, "the centre frequency must be below Nyquist");
    assert!(q > 0.0, "the quality factor must be positive");
    let omega = math::TAU * fc / fs;
    (omega.cos(), omega.sin() / (2.0 * q))
}

/// Second-order low shelf from the audio-EQ cookbook, used by the
/// graphic equaliser. The gain is linear and retargetable.
#[derive(Clone, Debug)]
pub struct PeakLowShelf {
    filter: IirFilter,
    cos_omega: Sample,
    alpha: Sample,
}

impl PeakLowShelf {
    pub fn new(fc: Sample, q: Sample, fs: Time) -> Self {
        let (cos_omega, alpha) = cos_omega_and_alpha(fc, q, fs);
        let mut shelf = Self {
            filter: IirFilter::new(vec![0.0; 3], vec![1.0, 0.0, 0.0]),
            cos_omega,
            alpha,
        };
        shelf.set_gain(1.0);
        shelf
    }

    pub fn with_gain(fc: Sample, gain: Sample, q: Sample, fs: Time) -> Self {
        let mut shelf = Self::new(fc, q, fs);
        shelf.set_gain(gain);
        shelf
    }

    /// Retargets the linear shelf gain.
    pub fn set_gain(&mut self, gain: Sample) {
        assert!(gain > 0.0, "the shelf gain must be positive");
        let a = gain.sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * self.alpha;
        let b = vec![
            a * ((a + 1.0) - (a - 1.0) * self.cos_omega + two_sqrt_a_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * self.cos_omega),
            a * ((a + 1.0) - (a - 1.0) * self.cos_omega - two_sqrt_a_alpha),
        ];
        let a_coefficients = vec![
            (a + 1.0) + (a - 1.0) * self.cos_omega + two_sqrt_a_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * self.cos_omega),
            (a + 1.0) + (a - 1.0) * self.cos_omega - two_sqrt_a_alpha,
        ];
        self.filter.set_coefficients(b, a_coefficients);
    }

    pub fn frequency_response(&self, frequencies: &[Sample], fs: Time) -> Vec<Complex64> {
        self.filter.frequency_response(frequencies, fs)
    }
}

impl DigitalFilter for PeakLowShelf {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.filter.process_sample(input)
    }

    fn reset_state(&mut self) {
        self.filter.reset_state();
    }
}

/// Second-order high shelf from the audio-EQ cookbook.
#[derive(Clone, Debug)]
pub struct PeakHighShelf {
    filter: IirFilter,
    cos_omega: Sample,
    alpha: Sample,
}

impl PeakHighShelf {
    pub fn new(fc: Sample, q: Sample, fs: Time) -> Self {
        let (cos_omega, alpha) = cos_omega_and_alpha(fc, q, fs);
        let mut shelf = Self {
            filter: IirFilter::new(vec![0.0; 3], vec![1.0, 0.0, 0.0]),
            cos_omega,
            alpha,
        };
        shelf.set_gain(1.0);
        shelf
    }

    pub fn with_gain(fc: Sample, gain: Sample, q: Sample, fs: Time) -> Self {
        let mut shelf = Self::new(fc, q, fs);
        shelf.set_gain(gain);
        shelf
    }

    /// Retargets the linear shelf gain.
    pub fn set_gain(&mut self, gain: Sample) {
        assert!(gain > 0.0, "the shelf gain must be positive");
        let a = gain.sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * self.alpha;
        let b = vec![
            a * ((a + 1.0) + (a - 1.0) * self.cos_omega + two_sqrt_a_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * self.cos_omega),
            a * ((a + 1.0) + (a - 1.0) * self.cos_omega - two_sqrt_a_alpha),
        ];
        let a_coefficients = vec![
            (a + 1.0) - (a - 1.0) * self.cos_omega + two_sqrt_a_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * self.cos_omega),
            (a + 1.0) - (a - 1.0) * self.cos_omega - two_sqrt_a_alpha,
        ];
        self.filter.set_coefficients(b, a_coefficients);
    }

    pub fn frequency_response(&self, frequencies: &[Sample], fs: Time) -> Vec<Complex64> {
        self.filter.frequency_response(frequencies, fs)
    }
}

impl DigitalFilter for PeakHighShelf {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.filter.process_sample(input)
    }

    fn reset_state(&mut self) {
        self.filter.reset_state();
    }
}

/// Second-order peaking filter from the audio-EQ cookbook.
#[derive(Clone, Debug)]
pub struct PeakingFilter {
    filter: IirFilter,
    cos_omega: Sample,
    alpha: Sample,
}

impl PeakingFilter {
    pub fn new(fc: Sample, q: Sample, fs: Time) -> Self {
        let (cos_omega, alpha) = cos_omega_and_alpha(fc, q, fs);
        let mut filter = Self {
            filter: IirFilter::new(vec![0.0; 3], vec![1.0, 0.0, 0.0]),
            cos_omega,
            alpha,
        };
        filter.set_gain(1.0);
        filter
    }

    pub fn with_gain(fc: Sample, gain: Sample, q: Sample, fs: Time) -> Self {
        let mut filter = Self::new(fc, q, fs);
        filter.set_gain(gain);
        filter
    }

    /// Retargets the linear peak gain.
    pub fn set_gain(&mut self, gain: Sample) {
        assert!(gain > 0.0, "the peak gain must be positive");
        let a = gain.sqrt();
        let b = vec![
            1.0 + self.alpha * a,
            -2.0 * self.cos_omega,
            1.0 - self.alpha * a,
        ];
        let a_coefficients = vec![
            1.0 + self.alpha / a,
            -2.0 * self.cos_omega,
            1.0 - self.alpha / a,
        ];
        self.filter.set_coefficients(b, a_coefficients);
    }

    pub fn frequency_response(&self, frequencies: &[Sample], fs: Time) -> Vec<Complex64> {
        self.filter.frequency_response(frequencies, fs)
    }
}

impl DigitalFilter for PeakingFilter {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.filter.process_sample(input)
    }

    fn reset_state(&mut self) {
        self.filter.reset_state();
    }
}

/// An IIR approximating the published absorption table of the given
/// wall material. Only tabulated for 44.1 kHz.
pub fn wall_filter(wall_type: WallType, sampling_frequency: Time) -> IirFilter {
    assert!(
        is_equal(sampling_frequency, 44100.0),
        "wall filters are tabulated for 44.1 kHz only"
    );
    match wall_type {
        WallType::CarpetPile => IirFilter::new(
            vec![0.562666833756030, -1.032627191365576, 0.469961155406544],
            vec![1.000000000000000, -1.896102349247713, 0.896352947528892],
        ),
        WallType::CarpetCotton => IirFilter::new(
            vec![
                0.687580695329600,
                -1.920746652319969,
                1.789915765926473,
                -0.556749690855965,
            ],
            vec![
                1.000000000000000,
                -2.761840732459190,
                2.536820778736938,
                -0.774942833868750,
            ],
        ),
        WallType::WallBricks => IirFilter::new(
            vec![0.978495798553620, -1.817487798457697, 0.839209660516074],
            vec![1.000000000000000, -1.858806492488240, 0.859035906864860],
        ),
        WallType::CeilingTile => IirFilter::new(
            vec![0.168413736374283, -0.243270224986791, 0.074863520490536],
            vec![1.000000000000000, -1.845049094190385, 0.845565720138466],
        ),
        WallType::Rigid => IirFilter::identical_filter(),
    }
}

/// The classical pole/zero pinking filter, handy for reference signals.
pub fn pinkifier_filter() -> IirFilter {
    let poles = [0.9986823, 0.9914651, 0.9580812, 0.8090598, 0.2896591];
    let zeros = [0.9963594, 0.9808756, 0.9097290, 0.6128445, -0.0324723];
    let numerator = poly(&zeros.map(|x| Complex64::new(x, 0.0)));
    let denominator = poly(&poles.map(|x| Complex64::new(x, 0.0)));
    IirFilter::new(real_part(&numerator), real_part(&denominator))
}
