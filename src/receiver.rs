//! Receivers: position, orientation and a pool of per-wave
//! directivity instances.

use super::buffer::BufferViewMut;
use super::directivity::DirectivityOps;
use super::point::Point;
use super::quaternion::{quat_inverse, quat_rotate, Quaternion};
use super::{Handedness, Sample};

/// A receiver dispatches incoming plane waves to per-wave directivity
/// instances cloned lazily from its prototype.
///
/// Consecutive samples of the same wavefront share a `wave_id`, so a
/// directivity with memory (an HRIR pair, an EQ) keeps its state
/// between calls. The first call with a new `wave_id` allocates that
/// wave's instance; everything after that is allocation-free.
#[derive(Clone)]
pub struct Receiver<D: DirectivityOps> {
    position: Point,
    orientation: Quaternion,
    handedness: Handedness,
    prototype: D,
    instances: Vec<Option<D>>,
    // Geometry cache per wave: the last world point seen and its
    // translation into the local frame.
    last_points: Vec<Option<(Point, Point)>>,
    warned_coincident: bool,
}

impl<D: DirectivityOps> Receiver<D> {
    /// A receiver at `position` looking along `orientation`, with its
    /// acoustic axis on the local x-axis.
    pub fn new(directivity_prototype: D, position: Point, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
            handedness: Handedness::RightHanded,
            prototype: directivity_prototype,
            instances: Vec::new(),
            last_points: Vec::new(),
            warned_coincident: false,
        }
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.last_points.fill(None);
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation;
        self.last_points.fill(None);
    }

    pub fn set_handedness(&mut self, handedness: Handedness) {
        self.handedness = handedness;
        self.last_points.fill(None);
    }

    /// Translates a world point into the receiver's local frame:
    /// centre on the position, then undo the orientation.
    pub fn relative_point(&mut self, point: &Point) -> Point {
        if point.is_equal(&self.position) && !self.warned_coincident {
            log::warn!(
                "observation point ({}, {}, {}) coincides with the receiver position; \
                 the local direction is undefined",
                point.x(),
                point.y(),
                point.z()
            );
            self.warned_coincident = true;
        }
        quat_rotate(
            &quat_inverse(&self.orientation),
            &(*point - self.position),
            self.handedness,
        )
    }

    /// Routes `input`, a stretch of plane-wave samples arriving from
    /// the world-frame `point`, into this wave's directivity instance
    /// and accumulates the result in `output`.
    pub fn receive_and_add(
        &mut self,
        input: &[Sample],
        point: Point,
        wave_id: usize,
        output: &mut BufferViewMut,
    ) {
        if wave_id >= self.instances.len() {
            self.instances.resize_with(wave_id + 1, || None);
            self.last_points.resize_with(wave_id + 1, || None);
        }
        let cached = match &self.last_points[wave_id] {
            Some((last, cached)) if last.is_equal(&point) => Some(*cached),
            _ => None,
        };
        let relative = match cached {
            Some(relative) => relative,
            None => {
                let relative = self.relative_point(&point);
                self.last_points[wave_id] = Some((point, relative));
                relative
            }
        };
        let prototype = &self.prototype;
        let instance = self.instances[wave_id].get_or_insert_with(|| prototype.clone());
        instance.receive_and_add(input, relative, output);
    }

    /// Clears the filter state of every directivity instance.
    pub fn reset_state(&mut self) {
        for instance in self.instances.iter_mut().flatten() {
            instance.reset_state();
        }
    }
}
