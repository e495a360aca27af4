//! Receiver directivities: the capability trait and the basic
//! variants.

use super::ambisonics::HoaEncoder;
use super::binaural::BinauralDirectivity;
use super::buffer::BufferViewMut;
use super::point::Point;
use super::{HeadRefOrientation, Sample};

/// What a per-wave directivity instance can do: filter the samples of
/// one plane wave arriving from a direction in the receiver's local
/// frame and accumulate them into the output channels. Prototypes are
/// deep-cloned into per-wave instances, so implementors are `Clone`.
pub trait DirectivityOps: Clone {
    /// Filters `input` as a plane wave arriving from `point` (in the
    /// receiver's local frame) and adds the result into `output`.
    fn receive_and_add(&mut self, input: &[Sample], point: Point, output: &mut BufferViewMut);

    /// Clears any internal filter state.
    fn reset_state(&mut self);
}

/// Identity gain into channel 0.
#[derive(Copy, Clone, Debug, Default)]
pub struct OmniDirectivity;

impl DirectivityOps for OmniDirectivity {
    fn receive_and_add(&mut self, input: &[Sample], _point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_samples() >= input.len());
        for (k, x) in input.iter().enumerate() {
            output.add_sample(0, k, *x);
        }
    }

    fn reset_state(&mut self) {}
}

/// Fixed scalar gain into channel 0.
#[derive(Copy, Clone, Debug)]
pub struct GainDirectivity {
    gain: Sample,
}

impl GainDirectivity {
    pub fn new(gain: Sample) -> Self {
        Self { gain }
    }
}

impl DirectivityOps for GainDirectivity {
    fn receive_and_add(&mut self, input: &[Sample], _point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_samples() >= input.len());
        for (k, x) in input.iter().enumerate() {
            output.add_sample(0, k, *x * self.gain);
        }
    }

    fn reset_state(&mut self) {}
}

/// Axisymmetric polynomial directivity: the gain is
/// `sum_i c_i * cos(theta)^i` with `theta` the angle formed with the
/// acoustic axis.
#[derive(Clone, Debug)]
pub struct TrigDirectivity {
    coefficients: Vec<Sample>,
    reference_orientation: HeadRefOrientation,
}

impl TrigDirectivity {
    pub fn new(coefficients: Vec<Sample>) -> Self {
        Self::with_orientation(coefficients, HeadRefOrientation::Standard)
    }

    pub fn with_orientation(
        coefficients: Vec<Sample>,
        reference_orientation: HeadRefOrientation,
    ) -> Self {
        assert!(
            !coefficients.is_empty(),
            "the directivity needs at least one coefficient"
        );
        Self {
            coefficients,
            reference_orientation,
        }
    }

    fn directivity(&self, point: &Point) -> Sample {
        let norm = point.norm();
        let cos_theta = if norm > 0.0 {
            match self.reference_orientation {
                HeadRefOrientation::Standard => point.x() / norm,
                HeadRefOrientation::YZ => point.y() / norm,
            }
        } else {
            // Collocated observation point; take the on-axis gain.
            1.0
        };
        let mut gain = self.coefficients[0];
        let mut power = 1.0;
        for c in &self.coefficients[1..] {
            power *= cos_theta;
            gain += c * power;
        }
        gain
    }
}

impl DirectivityOps for TrigDirectivity {
    fn receive_and_add(&mut self, input: &[Sample], point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_samples() >= input.len());
        let gain = self.directivity(&point);
        for (k, x) in input.iter().enumerate() {
            output.add_sample(0, k, *x * gain);
        }
    }

    fn reset_state(&mut self) {}
}

/// Copies the per-wave input into every output channel unfiltered; a
/// debug aid and latency reference.
#[derive(Copy, Clone, Debug, Default)]
pub struct BypassDirectivity;

impl DirectivityOps for BypassDirectivity {
    fn receive_and_add(&mut self, input: &[Sample], _point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_samples() >= input.len());
        for channel in 0..output.num_channels() {
            for (k, x) in input.iter().enumerate() {
                output.add_sample(channel, k, *x);
            }
        }
    }

    fn reset_state(&mut self) {}
}

/// Sum type over the shipped directivities, for receivers that pick
/// their directivity at run time (the free-field driver works with
/// these).
#[derive(Clone)]
pub enum Directivity {
    Omni(OmniDirectivity),
    Gain(GainDirectivity),
    Trig(TrigDirectivity),
    Bypass(BypassDirectivity),
    Hoa(HoaEncoder),
    Binaural(BinauralDirectivity),
}

impl DirectivityOps for Directivity {
    fn receive_and_add(&mut self, input: &[Sample], point: Point, output: &mut BufferViewMut) {
        match self {
            Directivity::Omni(d) => d.receive_and_add(input, point, output),
            Directivity::Gain(d) => d.receive_and_add(input, point, output),
            Directivity::Trig(d) => d.receive_and_add(input, point, output),
            Directivity::Bypass(d) => d.receive_and_add(input, point, output),
            Directivity::Hoa(d) => d.receive_and_add(input, point, output),
            Directivity::Binaural(d) => d.receive_and_add(input, point, output),
        }
    }

    fn reset_state(&mut self) {
        match self {
            Directivity::Omni(d) => d.reset_state(),
            Directivity::Gain(d) => d.reset_state(),
            Directivity::Trig(d) => d.reset_state(),
            Directivity::Bypass(d) => d.reset_state(),
            Directivity::Hoa(d) => d.reset_state(),
            Directivity::Binaural(d) => d.reset_state(),
        }
    }
}

/// Number of output channels each directivity variant writes.
impl Directivity {
    pub fn num_channels(&self) -> usize {
        match self {
            Directivity::Omni(_) | Directivity::Gain(_) | Directivity::Trig(_) => 1,
            Directivity::Bypass(_) => 1,
            Directivity::Hoa(encoder) => encoder.num_channels(),
            Directivity::Binaural(_) => 2,
        }
    }
}
