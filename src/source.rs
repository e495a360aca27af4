//! Sound sources, including directional sources described by
//! spherical-harmonic coefficient tables.

use super::eq::GraphicEq;
use super::fir::DigitalFilter;
use super::point::Point;
use super::quaternion::Quaternion;
use super::sh::complex_spherical_harmonic;
use super::{Sample, Time};
use lazy_static::lazy_static;
use num_complex::Complex64;

/// A point source: a position and a look direction. Audio is pushed
/// through the engine externally, one sample or block at a time; the
/// source holds no playback queue.
#[derive(Clone, Debug)]
pub struct Source {
    position: Point,
    orientation: Quaternion,
}

impl Source {
    pub fn new(position: Point) -> Self {
        Self::with_orientation(position, Quaternion::identity())
    }

    pub fn with_orientation(position: Point, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation;
    }
}

#[derive(Clone)]
struct ShSourceInstance {
    filter: GraphicEq,
    previous_point: Option<Point>,
}

/// A directional source whose radiation pattern is a table of
/// per-frequency spherical-harmonic coefficient vectors.
///
/// The transfer function toward an observation point `p` in the
/// source-local frame is `H(f, p) = sum c_nm(f) Y_n^m(theta(p), phi(p))`
/// in the front-pole frame (the pole on the look direction). Each
/// plane wave gets a graphic equaliser whose band gains track the real
/// part of `H` at the band centres, retargeted through the smooth
/// gain-setting path whenever the observation direction moves.
#[derive(Clone)]
pub struct ShSource {
    source: Source,
    // Geometric band midpoints; EQ centres and lookup boundaries.
    centre_frequencies: Vec<Sample>,
    sh_coefficients: Vec<Vec<Complex64>>,
    sampling_frequency: Time,
    instances: Vec<Option<ShSourceInstance>>,
    gain_scratch: Vec<Sample>,
}

impl ShSource {
    /// `centre_frequencies` are the measurement frequencies of the
    /// coefficient table, one coefficient vector (of square length)
    /// per frequency.
    pub fn new(
        position: Point,
        orientation: Quaternion,
        centre_frequencies: &[Sample],
        sh_coefficients: Vec<Vec<Complex64>>,
        sampling_frequency: Time,
    ) -> Self {
        assert!(
            centre_frequencies.len() >= 3,
            "the directivity table needs at least three frequencies"
        );
        assert_eq!(
            centre_frequencies.len(),
            sh_coefficients.len(),
            "one coefficient vector per centre frequency"
        );
        assert!(
            sampling_frequency > 0.0,
            "the sampling frequency must be positive"
        );
        for coefficients in &sh_coefficients {
            let order = (coefficients.len() as f64).sqrt() as usize;
            assert_eq!(
                order * order,
                coefficients.len(),
                "coefficient vectors must have square length"
            );
        }
        let mut sh_coefficients = sh_coefficients;
        // Fold the constant harmonic into the zeroth coefficient so the
        // on-axis gain reads directly from the table.
        let y00 = complex_spherical_harmonic(0, 0, 0.0, 0.0);
        for coefficients in sh_coefficients.iter_mut() {
            coefficients[0] *= y00;
        }
        let boundaries: Vec<Sample> = centre_frequencies
            .windows(2)
            .map(|pair| pair[0] * (pair[1] / pair[0]).sqrt())
            .collect();
        let num_bands = boundaries.len();
        Self {
            source: Source::with_orientation(position, orientation),
            centre_frequencies: boundaries,
            sh_coefficients,
            sampling_frequency,
            instances: Vec::new(),
            gain_scratch: vec![0.0; num_bands],
        }
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.source.position()
    }

    pub fn set_position(&mut self, position: Point) {
        self.source.set_position(position);
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.source.orientation()
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.source.set_orientation(orientation);
    }

    /// Directivity transfer function at frequency `f` toward `point`
    /// (in the source-local frame, look direction along +x).
    pub fn transfer_function(&self, f: Sample, point: &Point) -> Sample {
        // Front-pole coordinates: theta from the look axis, phi around
        // it. An undefined direction falls back to on-axis.
        let norm = point.norm();
        let theta = if norm > 0.0 {
            (point.x() / norm).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
        let phi = point.y().atan2(point.z());
        let freq_index = self.centre_frequencies.partition_point(|b| *b <= f);
        let coefficients = &self.sh_coefficients[freq_index];
        let mut output = coefficients[0];
        let order = (coefficients.len() as f64).sqrt() as usize;
        for n in 1..order {
            for m in -(n as isize)..=(n as isize) {
                let sh = complex_spherical_harmonic(n, m, theta, phi);
                let sh_index = ((n * n + n) as isize + m) as usize;
                output += coefficients[sh_index] * sh;
            }
        }
        output.re as Sample
    }

    /// Transfer function sampled at several frequencies.
    pub fn transfer_functions(&self, frequencies: &[Sample], point: &Point) -> Vec<Sample> {
        frequencies
            .iter()
            .map(|f| self.transfer_function(*f, point))
            .collect()
    }

    fn fill_gains(&mut self, point: &Point) {
        for band in 0..self.centre_frequencies.len() {
            self.gain_scratch[band] =
                self.transfer_function(self.centre_frequencies[band], point);
        }
    }

    fn prototype_filter(&mut self) -> GraphicEq {
        let front = Point::new(1.0, 0.0, 0.0);
        self.fill_gains(&front);
        GraphicEq::with_gain(
            &self.gain_scratch,
            &self.centre_frequencies,
            1.0,
            self.sampling_frequency,
        )
    }

    /// Filters `input` by the directivity toward
    /// `observation_point` (relative to the source look direction)
    /// and writes the result to `output`. Waves are tracked by
    /// `wave_id` like on the receiver side.
    pub fn process_audio_relative(
        &mut self,
        input: &[Sample],
        observation_point: &Point,
        wave_id: usize,
        output: &mut [Sample],
    ) {
        if wave_id >= self.instances.len() {
            self.instances.resize_with(wave_id + 1, || None);
        }
        if self.instances[wave_id].is_none() {
            let filter = self.prototype_filter();
            self.instances[wave_id] = Some(ShSourceInstance {
                filter,
                previous_point: None,
            });
        }
        let needs_update = match &self.instances[wave_id].as_ref().unwrap().previous_point {
            Some(previous) => !previous.is_equal(observation_point),
            None => true,
        };
        if needs_update {
            self.fill_gains(observation_point);
            let instance = self.instances[wave_id].as_mut().unwrap();
            instance.filter.set_target_gain(&self.gain_scratch);
            instance.filter.update_gain(1.0);
            instance.previous_point = Some(*observation_point);
        }
        let instance = self.instances[wave_id].as_mut().unwrap();
        instance.filter.process_block(input, output);
    }

    /// Clears the filter state of every per-wave equaliser.
    pub fn reset_filters_state(&mut self) {
        for instance in self.instances.iter_mut().flatten() {
            instance.filter.reset_state();
        }
    }
}

/// Measurement frequencies of the studio-monitor directivity table
/// below.
pub const MONITOR_DIRECTIVITY_FREQUENCIES: [Sample; 9] =
    [62.5, 125.0, 250.0, 500.0, 1.0e3, 2.0e3, 4.0e3, 8.0e3, 16.0e3];

lazy_static! {
    /// Spherical-harmonic directivity of a small two-way studio
    /// monitor, fitted from the BRAS database measurements; pairs with
    /// [`MONITOR_DIRECTIVITY_FREQUENCIES`] in [`ShSource::new`].
    pub static ref MONITOR_DIRECTIVITY_SH_COEFFICIENTS: Vec<Vec<Complex64>> = vec![
        vec![Complex64::new(2.766636223198812, 0.0)],
        vec![Complex64::new(3.510204359731806, 0.0)],
        vec![Complex64::new(3.370669764960976, 0.0)],
        vec![
            Complex64::new(2.64325252062826, 0.0),
            Complex64::new(-0.0637887899933280, 0.00709043682858875),
            Complex64::new(0.475502894948934, 0.0),
            Complex64::new(0.0637887899933280, 0.00709043682858875),
            Complex64::new(-0.00766656882903998, 0.00502613096609965),
            Complex64::new(0.00552595525197679, 0.00669867042959554),
            Complex64::new(0.146385344721295, 0.0),
            Complex64::new(-0.00552595525197679, 0.00669867042959554),
            Complex64::new(-0.00766656882903998, -0.00502613096609965),
        ],
        vec![
            Complex64::new(1.97128124928243, 0.0),
            Complex64::new(0.0288955622920283, 0.0101887659330981),
            Complex64::new(0.543116368361039, 0.0),
            Complex64::new(-0.0288955622920283, 0.0101887659330981),
            Complex64::new(-0.0222949902191432, 0.00482095521649736),
            Complex64::new(0.0143165526072852, 0.00317936142931662),
            Complex64::new(0.144068751090373, 0.0),
            Complex64::new(-0.0143165526072852, 0.00317936142931662),
            Complex64::new(-0.0222949902191432, -0.00482095521649736),
        ],
        vec![
            Complex64::new(1.37100588209144, 0.0),
            Complex64::new(0.0146562216497114, 0.00515044599364579),
            Complex64::new(0.720386999496995, 0.0),
            Complex64::new(-0.0146562216497114, 0.00515044599364579),
            Complex64::new(-0.0650615377560616, 0.00397170007680051),
            Complex64::new(0.0367209089864466, 0.00618685999609908),
            Complex64::new(0.351953301197736, 0.0),
            Complex64::new(-0.0367209089864466, 0.00618685999609908),
            Complex64::new(-0.0650615377560616, -0.00397170007680051),
            Complex64::new(-0.0357384354633624, -0.00265237385647239),
            Complex64::new(-0.0532304055163828, 0.00285715119698396),
            Complex64::new(0.0496970488762515, 0.00389936245744877),
            Complex64::new(0.121330122148826, 0.0),
            Complex64::new(-0.0496970488762515, 0.00389936245744877),
            Complex64::new(-0.0532304055163828, -0.00285715119698396),
            Complex64::new(0.0357384354633624, -0.00265237385647239),
        ],
        vec![
            Complex64::new(1.07987502306489, 0.0),
            Complex64::new(-0.0159120139766602, 0.0352113761857916),
            Complex64::new(0.664568633630202, 0.0),
            Complex64::new(0.0159120139766602, 0.0352113761857916),
            Complex64::new(-0.0339235653998775, 0.00392905938423214),
            Complex64::new(-0.0136105518477092, 0.0159126538918982),
            Complex64::new(0.287751426442446, 0.0),
            Complex64::new(0.0136105518477092, 0.0159126538918982),
            Complex64::new(-0.0339235653998775, -0.00392905938423214),
            Complex64::new(-0.0394958780644998, -0.00110778262618036),
            Complex64::new(-0.0375235021578686, 0.00291360976273746),
            Complex64::new(0.0348035789199694, 0.00885765396282877),
            Complex64::new(0.120961170905888, 0.0),
            Complex64::new(-0.0348035789199694, 0.00885765396282877),
            Complex64::new(-0.0375235021578686, -0.00291360976273746),
            Complex64::new(0.0394958780644998, -0.00110778262618036),
        ],
        vec![
            Complex64::new(1.02095654461750, 0.0),
            Complex64::new(0.0241799203216629, 0.0362664242624599),
            Complex64::new(0.771135355920134, 0.0),
            Complex64::new(-0.0241799203216629, 0.0362664242624599),
            Complex64::new(-0.0167508380936951, 0.00257611255022035),
            Complex64::new(0.000676587781659708, 0.0274680154532966),
            Complex64::new(0.348051354619507, 0.0),
            Complex64::new(-0.000676587781659708, 0.0274680154532966),
            Complex64::new(-0.0167508380936951, -0.00257611255022035),
            Complex64::new(-0.00414471799601657, -0.00130780159524470),
            Complex64::new(-0.0342853542828136, 0.00308769607090894),
            Complex64::new(0.0152598563883195, 0.0152615542290605),
            Complex64::new(0.106841233812882, 0.0),
            Complex64::new(-0.0152598563883195, 0.0152615542290605),
            Complex64::new(-0.0342853542828136, -0.00308769607090894),
            Complex64::new(0.00414471799601657, -0.00130780159524470),
        ],
        vec![
            Complex64::new(1.07838488548815, 0.0),
            Complex64::new(-0.0394941970606158, -0.0388894927032113),
            Complex64::new(0.998186478509121, 0.0),
            Complex64::new(0.0394941970606158, -0.0388894927032113),
            Complex64::new(-0.0374103834948442, 0.00765545389631506),
            Complex64::new(-0.0755795876724971, -0.0353076305014837),
            Complex64::new(0.507222386717422, 0.0),
            Complex64::new(0.0755795876724971, -0.0353076305014837),
            Complex64::new(-0.0374103834948442, -0.00765545389631506),
            Complex64::new(0.0411095458969911, 0.0491546186817065),
            Complex64::new(-0.0416257687194416, 0.00144233306080249),
            Complex64::new(-0.0597357730591135, -0.0255126272371865),
            Complex64::new(0.141051073362225, 0.0),
            Complex64::new(0.0597357730591135, -0.0255126272371865),
            Complex64::new(-0.0416257687194416, -0.00144233306080249),
            Complex64::new(-0.0411095458969911, 0.0491546186817065),
        ],
    ];
}
