//! Image-source model for cuboid rooms.

use super::buffer::Buffer;
use super::delay::DelayLine;
use super::directivity::DirectivityOps;
use super::fir::{DigitalFilter, FirFilter};
use super::math::{sinc, TAU};
use super::point::{distance, Point};
use super::receiver::Receiver;
use super::room::CuboidRoom;
use super::{Length, Sample, Time, SOUND_SPEED};
use funutd::Rnd;

// Window length of the Peterson fractional-delay interpolation, the
// standard value from the paper.
const PETERSON_WINDOW: Time = 0.004;

// Block-path scratch size of the per-image fractional filters.
const MAX_IMAGE_BLOCK: usize = 1 << 10;

/// Fractional-delay write policy for the image taps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum IsmInterpolation {
    /// One tap of the full attenuation at the rounded delay.
    #[default]
    None,
    /// Hann-windowed sinc spread around the true delay.
    Peterson,
}

/// One enumerated reflection.
#[derive(Clone, Debug)]
pub struct ImageSource {
    pub position: Point,
    pub delay: Time,
    pub attenuation: Sample,
    /// Number of wall bounces along the path (0 for the direct sound).
    pub order: usize,
}

/// Enumerates the image sources of a cuboid room between one source
/// and one receiver and renders their combined response.
///
/// The room geometry and both positions are captured at construction;
/// [`update`](Self::update) marks the response stale after any change
/// so the next processing call rebuilds it. The omnidirectional path
/// convolves with the room impulse response in one go; the spatial
/// path drives a directional receiver with one delayed, filtered tap
/// per image so each reflection keeps its direction of arrival.
pub struct Ism {
    room: CuboidRoom,
    source_position: Point,
    receiver_position: Point,
    interpolation: IsmInterpolation,
    rir_length: usize,
    sampling_frequency: Time,
    // Uniform +-r jitter (metres) on each image distance; zero is off.
    random_distance: Length,
    rng: Rnd,
    modified: bool,
    rir: Vec<Sample>,
    rir_filter: FirFilter,
    images: Vec<ImageSource>,
    images_int_delay: Vec<DelayLine>,
    images_frac_filter: Vec<FirFilter>,
    scratch: Vec<Sample>,
    delayed: Vec<Sample>,
}

impl Ism {
    pub fn new(
        room: &CuboidRoom,
        source_position: Point,
        receiver_position: Point,
        interpolation: IsmInterpolation,
        rir_length: usize,
        sampling_frequency: Time,
    ) -> Self {
        assert!(rir_length > 0, "the response length must be positive");
        assert!(
            sampling_frequency > 0.0,
            "the sampling frequency must be positive"
        );
        Self {
            room: room.clone(),
            source_position,
            receiver_position,
            interpolation,
            rir_length,
            sampling_frequency,
            random_distance: 0.0,
            rng: Rnd::from_u64(1),
            modified: true,
            rir: Vec::new(),
            rir_filter: FirFilter::gain_filter(0.0),
            images: Vec::new(),
            images_int_delay: Vec::new(),
            images_frac_filter: Vec::new(),
            scratch: Vec::new(),
            delayed: Vec::new(),
        }
    }

    pub fn set_source_position(&mut self, position: Point) {
        self.source_position = position;
        self.update();
    }

    pub fn set_receiver_position(&mut self, position: Point) {
        self.receiver_position = position;
        self.update();
    }

    /// Enables a uniform `+-r` metres perturbation of every image
    /// distance, breaking the comb-filter periodicity of identical
    /// timings.
    pub fn set_random_distance(&mut self, random_distance: Length) {
        assert!(random_distance >= 0.0, "the jitter radius cannot be negative");
        self.random_distance = random_distance;
        self.update();
    }

    /// Marks the response stale; the next processing call recomputes
    /// it.
    pub fn update(&mut self) {
        self.modified = true;
        self.rir.clear();
        self.images.clear();
        self.images_int_delay.clear();
        self.images_frac_filter.clear();
    }

    /// The room impulse response, valid after the last processing
    /// call.
    pub fn rir(&self) -> &[Sample] {
        &self.rir
    }

    /// The enumerated reflections, valid after the last processing
    /// call.
    pub fn images(&self) -> &[ImageSource] {
        &self.images
    }

    /// Convolves `input` with the room response and adds the result
    /// into `output` (the omnidirectional fast path).
    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) {
        debug_assert_eq!(input.len(), output.len());
        if self.modified {
            self.calculate_rir();
        }
        if self.scratch.len() < input.len() {
            self.scratch.resize(input.len(), 0.0);
        }
        let scratch = &mut self.scratch[..input.len()];
        self.rir_filter.process_block(input, scratch);
        for (y, s) in output.iter_mut().zip(scratch.iter()) {
            *y += *s;
        }
    }

    /// Renders every reflection into `receiver`, one wave per image,
    /// so directional receivers see each image from its own direction.
    pub fn process_block_spatial<D: DirectivityOps>(
        &mut self,
        input: &[Sample],
        receiver: &mut Receiver<D>,
        output: &mut Buffer,
    ) {
        debug_assert!(output.num_samples() >= input.len());
        if self.modified {
            self.calculate_rir();
        }
        if self.delayed.len() < input.len() {
            self.delayed.resize(input.len(), 0.0);
        }
        if self.scratch.len() < input.len() {
            self.scratch.resize(input.len(), 0.0);
        }
        let num_channels = output.num_channels();
        for (k, image) in self.images.iter().enumerate() {
            let delay_line = &mut self.images_int_delay[k];
            let frac_filter = &mut self.images_frac_filter[k];
            let delayed = &mut self.delayed[..input.len()];
            for (x, d) in input.iter().zip(delayed.iter_mut()) {
                delay_line.write(*x);
                *d = delay_line.read();
                delay_line.tick();
            }
            let filtered = &mut self.scratch[..input.len()];
            frac_filter.process_block(delayed, filtered);
            let mut view = output.view_mut(0, num_channels, 0, input.len());
            receiver.receive_and_add(filtered, image.position, k, &mut view);
        }
    }

    /// Clears the per-image filter state without discarding the
    /// enumerated response.
    pub fn reset_state(&mut self) {
        self.rir_filter.reset_state();
        for delay_line in &mut self.images_int_delay {
            delay_line.reset_state();
        }
        for filter in &mut self.images_frac_filter {
            filter.reset_state();
        }
    }

    fn calculate_rir(&mut self) {
        let filters = self.room.wall_filters();
        // Leading numerator magnitude of each wall filter, indexed
        // beta[side][axis].
        let mut beta = [[0.0; 3]; 2];
        for axis in 0..3 {
            beta[0][axis] = filters[axis * 2].b()[0];
            beta[1][axis] = filters[axis * 2 + 1].b()[0];
        }

        let dimensions = self.room.dimensions();
        self.rir = vec![0.0; self.rir_length];

        let rir_time = self.rir_length as Time / self.sampling_frequency;
        let reach = rir_time * SOUND_SPEED;
        let n1 = (reach / (2.0 * dimensions.x())).floor() as isize + 1;
        let n2 = (reach / (2.0 * dimensions.y())).floor() as isize + 1;
        let n3 = (reach / (2.0 * dimensions.z())).floor() as isize + 1;

        let randomisation = self.random_distance != 0.0;
        for mx in -n1..=n1 {
            for my in -n2..=n2 {
                for mz in -n3..=n3 {
                    for px in 0..=1 {
                        for py in 0..=1 {
                            for pz in 0..=1 {
                                let image_position = self.room.image_source_position(
                                    &self.source_position,
                                    mx,
                                    my,
                                    mz,
                                    px,
                                    py,
                                    pz,
                                );
                                let mut delay = distance(&image_position, &self.receiver_position)
                                    / SOUND_SPEED;
                                if randomisation {
                                    let jitter = (self.rng.f64() as Sample * 2.0 - 1.0)
                                        * self.random_distance;
                                    delay += jitter / SOUND_SPEED;
                                }
                                let rounded = (delay * self.sampling_frequency).round();
                                if rounded < 0.0 || rounded >= self.rir_length as Time {
                                    continue;
                                }
                                let gid = beta[0][0].powf((mx - px).abs() as Sample)
                                    * beta[1][0].powf(mx.abs() as Sample)
                                    * beta[0][1].powf((my - py).abs() as Sample)
                                    * beta[1][1].powf(my.abs() as Sample)
                                    * beta[0][2].powf((mz - pz).abs() as Sample)
                                    * beta[1][2].powf(mz.abs() as Sample);
                                let attenuation = gid / (delay * self.sampling_frequency);
                                let order = ((mx - px).abs()
                                    + mx.abs()
                                    + (my - py).abs()
                                    + my.abs()
                                    + (mz - pz).abs()
                                    + mz.abs())
                                    as usize;
                                self.images.push(ImageSource {
                                    position: image_position,
                                    delay,
                                    attenuation,
                                    order,
                                });
                                self.write_sample(delay, attenuation);
                            }
                        }
                    }
                }
            }
        }
        self.rir_filter = FirFilter::new(self.rir.clone(), 1 << 12);
        self.modified = false;
    }

    fn write_sample(&mut self, delay: Time, attenuation: Sample) {
        let delay_norm = delay * self.sampling_frequency;
        let id_round = delay_norm.round() as usize;
        match self.interpolation {
            IsmInterpolation::None => {
                self.rir[id_round] += attenuation;
                self.images_int_delay.push(DelayLine::new(id_round, id_round));
                self.images_frac_filter
                    .push(FirFilter::new(vec![attenuation], MAX_IMAGE_BLOCK));
            }
            IsmInterpolation::Peterson => {
                // Cutoff at 90% of Nyquist, Hann-weighted over the
                // window.
                let f_c = 0.9 * self.sampling_frequency / 2.0;
                let t_w = PETERSON_WINDOW;
                let tau = delay;
                let mut coefficients = Vec::new();
                let integer_delay =
                    (self.sampling_frequency * (-t_w / 2.0 + tau)).floor() as isize;
                let last = (self.sampling_frequency * (t_w / 2.0 + tau)).floor() as isize;
                for n in (integer_delay + 1)..last {
                    if n < 0 || n >= self.rir_length as isize {
                        continue;
                    }
                    let t = n as Time / self.sampling_frequency - tau;
                    let low_pass = 0.5 * (1.0 + (TAU * t / t_w).cos()) * sinc(TAU * f_c * t);
                    coefficients.push(attenuation * low_pass);
                    self.rir[n as usize] += attenuation * low_pass;
                }
                if coefficients.is_empty() {
                    coefficients.push(0.0);
                }
                let latency = integer_delay.max(0) as usize;
                self.images_int_delay.push(DelayLine::new(latency, latency));
                self.images_frac_filter
                    .push(FirFilter::new(coefficients, MAX_IMAGE_BLOCK));
            }
        }
    }
}
