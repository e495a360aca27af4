//! Propagation line: distance to (delay, attenuation) with smoothed
//! transitions.

use super::delay::DelayLine;
use super::math::is_equal;
use super::smoother::RampSmoother;
use super::{AttenuationType, InterpolationType, Length, Sample, Time, SOUND_SPEED};

/// Models the acoustic path between one source and one receiver as a
/// delay plus a gain.
///
/// A distance of `d` metres at sampling frequency `fs` maps to a delay
/// of `d * fs / c` samples and an inverse-distance gain normalised to
/// unity at the one-sample reference distance `c / fs`. Distance
/// changes ramp both the delay tap and the gain along the sample
/// clock; the line never reallocates after construction, and distances
/// beyond the maximum clamp and log.
#[derive(Clone, Debug)]
pub struct PropagationLine {
    delay_filter: DelayLine,
    sampling_frequency: Time,
    sound_speed: Sample,
    max_distance: Length,
    current_distance: Length,
    current_latency: Time,
    current_attenuation: Sample,
    latency_smoother: RampSmoother,
    attenuation_smoother: RampSmoother,
    interpolation: InterpolationType,
    attenuation_type: AttenuationType,
    warned_zero_distance: bool,
}

impl PropagationLine {
    /// A line for the given initial distance with the default
    /// configuration: 100 m maximum distance, nearest-tap reads and
    /// inverse square law attenuation.
    pub fn new(distance: Length, sampling_frequency: Time) -> Self {
        Self::with_config(
            distance,
            sampling_frequency,
            100.0,
            InterpolationType::Rounding,
            AttenuationType::InverseSquareLaw,
        )
    }

    pub fn with_config(
        distance: Length,
        sampling_frequency: Time,
        max_distance: Length,
        interpolation: InterpolationType,
        attenuation_type: AttenuationType,
    ) -> Self {
        assert!(
            sampling_frequency > 0.0,
            "the sampling frequency must be positive"
        );
        assert!(distance >= 0.0, "the distance cannot be negative");
        assert!(
            max_distance >= distance,
            "the maximum distance must cover the initial distance"
        );
        let max_latency =
            (max_distance * sampling_frequency / SOUND_SPEED).ceil() as usize + 1;
        let latency = distance * sampling_frequency / SOUND_SPEED;
        let mut line = Self {
            delay_filter: DelayLine::new(latency.round() as usize, max_latency),
            sampling_frequency,
            sound_speed: SOUND_SPEED,
            max_distance,
            current_distance: distance,
            current_latency: latency,
            current_attenuation: 0.0,
            latency_smoother: RampSmoother::new(latency, sampling_frequency),
            attenuation_smoother: RampSmoother::new(0.0, sampling_frequency),
            interpolation,
            attenuation_type,
            warned_zero_distance: false,
        };
        let attenuation = line.compute_attenuation(distance);
        line.current_attenuation = attenuation;
        line.attenuation_smoother = RampSmoother::new(attenuation, sampling_frequency);
        line
    }

    /// One-sample propagation distance, the unit-gain reference.
    #[inline]
    pub fn reference_distance(&self) -> Length {
        self.sound_speed / self.sampling_frequency
    }

    #[inline]
    pub fn distance(&self) -> Length {
        self.current_distance
    }

    /// The current delay of the line in samples.
    #[inline]
    pub fn latency(&self) -> Time {
        self.current_latency
    }

    /// The current gain of the line.
    #[inline]
    pub fn attenuation(&self) -> Sample {
        self.current_attenuation
    }

    fn compute_attenuation(&mut self, distance: Length) -> Sample {
        let reference = self.reference_distance();
        let distance = match self.attenuation_type {
            AttenuationType::InverseSquareLaw => {
                if distance < reference {
                    if !self.warned_zero_distance && distance < reference * 1.0e-3 {
                        log::warn!(
                            "propagation distance ({distance} m) is close to zero; \
                             clamping the gain at the reference distance"
                        );
                        self.warned_zero_distance = true;
                    }
                    reference
                } else {
                    distance
                }
            }
            AttenuationType::ConstantLos => 1.0,
        };
        reference / distance
    }

    /// Retargets the line to a new distance, ramping delay and gain
    /// over `ramp_time` seconds. A zero ramp applies the change on the
    /// next [`tick`](Self::tick). Distances beyond the configured
    /// maximum clamp and log; the line never reallocates.
    pub fn set_distance(&mut self, distance: Length, ramp_time: Time) {
        assert!(distance >= 0.0, "the distance cannot be negative");
        let distance = if distance > self.max_distance {
            log::error!(
                "requested distance ({} m) exceeds the maximum distance ({} m); clamping",
                distance,
                self.max_distance
            );
            self.max_distance
        } else {
            distance
        };
        self.current_distance = distance;
        let latency = distance * self.sampling_frequency / self.sound_speed;
        self.latency_smoother.set_target_value(latency, ramp_time);
        let attenuation = self.compute_attenuation(distance);
        self.attenuation_smoother
            .set_target_value(attenuation, ramp_time);
    }

    /// Retargets the gain directly, bypassing the distance law.
    pub fn set_attenuation(&mut self, attenuation: Sample, ramp_time: Time) {
        self.attenuation_smoother
            .set_target_value(attenuation, ramp_time);
    }

    /// Stores `sample` at the line input.
    #[inline]
    pub fn write(&mut self, sample: Sample) {
        self.delay_filter.write(sample);
    }

    /// Writes a block of consecutive input samples.
    pub fn write_block(&mut self, input: &[Sample]) {
        self.delay_filter.write_block(input);
    }

    /// Returns the attenuated sample at the line output.
    #[inline]
    pub fn read(&self) -> Sample {
        match self.interpolation {
            InterpolationType::Rounding => self.delay_filter.read() * self.current_attenuation,
            InterpolationType::Linear => {
                self.delay_filter.fractional_read_at(self.current_latency)
                    * self.current_attenuation
            }
        }
    }

    /// Reads a block of consecutive output samples, attenuated by the
    /// current gain.
    pub fn read_block(&self, output: &mut [Sample]) {
        self.delay_filter.read_block(output);
        for sample in output.iter_mut() {
            *sample *= self.current_attenuation;
        }
    }

    /// Advances simulated time by one sample, applying any pending
    /// delay and gain ramp step.
    pub fn tick(&mut self) {
        self.current_latency = self.latency_smoother.next_value();
        self.current_attenuation = self.attenuation_smoother.next_value();
        self.delay_filter
            .set_latency(self.current_latency.round() as usize);
        self.delay_filter.tick();
    }

    /// Advances simulated time by `num_samples` at once.
    pub fn tick_n(&mut self, num_samples: usize) {
        if num_samples == 0 {
            return;
        }
        self.current_latency = self.latency_smoother.next_value_n(num_samples);
        self.current_attenuation = self.attenuation_smoother.next_value_n(num_samples);
        self.delay_filter
            .set_latency(self.current_latency.round() as usize);
        self.delay_filter.tick_n(num_samples);
    }

    /// Zeroes the stored samples.
    pub fn reset_state(&mut self) {
        self.delay_filter.reset_state();
    }

    /// True while a distance or gain ramp is still in flight.
    pub fn is_updating(&self) -> bool {
        self.latency_smoother.is_updating()
            || self.attenuation_smoother.is_updating()
            || !is_equal(self.current_attenuation, self.attenuation_smoother.target_value())
    }
}
