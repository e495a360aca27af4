//! Points and 3-D vector geometry.

use super::math::*;
use super::quaternion::{quat_inverse, quat_rotate, EulerOrder, Quaternion};
use super::{Angle, Handedness, Length, Sample};
use std::ops::{Add, Mul, Neg, Sub};

/// A point (or vector) in 3-D space. Immutable value type.
///
/// The spherical convention throughout the crate: `theta` is the angle
/// formed with the z-axis and `phi` the angle formed by the projection
/// on the x-y plane with the x-axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    x: Sample,
    y: Sample,
    z: Sample,
}

impl Point {
    pub fn new(x: Sample, y: Sample, z: Sample) -> Self {
        Self { x, y, z }
    }

    /// Constructs a point from spherical coordinates, with `(r, 0, 0)`
    /// on the z-axis and `(r, pi/2, 0)` on the x-axis.
    pub fn from_spherical(r: Length, theta: Angle, phi: Angle) -> Self {
        Self {
            x: r * theta.sin() * phi.cos(),
            y: r * theta.sin() * phi.sin(),
            z: r * theta.cos(),
        }
    }

    #[inline]
    pub fn x(&self) -> Sample {
        self.x
    }

    #[inline]
    pub fn y(&self) -> Sample {
        self.y
    }

    #[inline]
    pub fn z(&self) -> Sample {
        self.z
    }

    /// Distance of the point from the origin.
    #[inline]
    pub fn norm(&self) -> Length {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Angle formed with the z-axis.
    pub fn theta(&self) -> Angle {
        (self.z / self.norm()).acos()
    }

    /// Angle formed by the projection on the x-y plane with the x-axis.
    pub fn phi(&self) -> Angle {
        self.y.atan2(self.x)
    }

    /// Returns a point with the same direction and unit norm.
    pub fn normalized(&self) -> Point {
        *self * (1.0 / self.norm())
    }

    pub fn is_equal(&self, other: &Point) -> bool {
        is_equal(self.x, other.x) && is_equal(self.y, other.y) && is_equal(self.z, other.z)
    }

    pub fn has_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Expresses the point in a reference frame rotated by the given
    /// Euler angles (see
    /// [`Quaternion::from_euler`](crate::quaternion::Quaternion::from_euler)
    /// for the angle convention): the inverse of the active rotation.
    pub fn rotate_euler(
        &self,
        angle_1: Angle,
        angle_2: Angle,
        angle_3: Angle,
        order: EulerOrder,
    ) -> Point {
        let q = Quaternion::from_euler(angle_1, angle_2, angle_3, order);
        quat_rotate(&quat_inverse(&q), self, Handedness::RightHanded)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Sample> for Point {
    type Output = Point;
    fn mul(self, constant: Sample) -> Point {
        Point::new(self.x * constant, self.y * constant, self.z * constant)
    }
}

/// Rotates the point about the x-axis with the right-hand rule,
/// e.g. `rotate_about_x(Point(0,1,0), pi/2) == Point(0,0,1)`.
pub fn rotate_about_x(point: &Point, angle: Angle) -> Point {
    let (sin, cos) = (angle.sin(), angle.cos());
    Point::new(
        point.x(),
        point.y() * cos - point.z() * sin,
        point.y() * sin + point.z() * cos,
    )
}

/// Rotates the point about the y-axis with the right-hand rule,
/// e.g. `rotate_about_y(Point(1,0,0), pi/2) == Point(0,0,-1)`.
pub fn rotate_about_y(point: &Point, angle: Angle) -> Point {
    let (sin, cos) = (angle.sin(), angle.cos());
    Point::new(
        point.x() * cos + point.z() * sin,
        point.y(),
        -point.x() * sin + point.z() * cos,
    )
}

/// Rotates the point about the z-axis with the right-hand rule,
/// e.g. `rotate_about_z(Point(0,1,0), pi/2) == Point(-1,0,0)`.
pub fn rotate_about_z(point: &Point, angle: Angle) -> Point {
    let (sin, cos) = (angle.sin(), angle.cos());
    Point::new(
        point.x() * cos - point.y() * sin,
        point.x() * sin + point.y() * cos,
        point.z(),
    )
}

#[inline]
pub fn dot_product(a: &Point, b: &Point) -> Sample {
    a.x() * b.x() + a.y() * b.y() + a.z() * b.z()
}

/// Cross product with the right-hand rule.
pub fn cross_product(a: &Point, b: &Point) -> Point {
    Point::new(
        a.y() * b.z() - a.z() * b.y(),
        a.z() * b.x() - a.x() * b.z(),
        a.x() * b.y() - a.y() * b.x(),
    )
}

#[inline]
pub fn distance(a: &Point, b: &Point) -> Length {
    (*a - *b).norm()
}

/// Angle between the directions of two points as seen from the origin.
pub fn angle_between_points(a: &Point, b: &Point) -> Angle {
    let cosine = dot_product(a, b) / (a.norm() * b.norm());
    clamp(-1.0, 1.0, cosine).acos()
}

/// The point on the line from `a` to `b` at distance `dist` from `a`.
pub fn point_on_line(a: &Point, b: &Point, dist: Length) -> Point {
    *a + (*b - *a).normalized() * dist
}

/// Projection of `vector` on the plane through the origin with normal
/// `plane_normal`.
pub fn projection(vector: &Point, plane_normal: &Point) -> Point {
    let normal = plane_normal.normalized();
    *vector - normal * dot_product(vector, &normal)
}

/// Whether the line `line_point + d * line_direction` intersects the
/// plane through `plane_point` with normal `plane_normal` (a line lying
/// in the plane counts as intersecting).
pub fn intersection_plane_line_exists(
    line_point: &Point,
    line_direction: &Point,
    plane_point: &Point,
    plane_normal: &Point,
) -> bool {
    let denominator = dot_product(line_direction, plane_normal);
    if denominator.abs() > VERY_SMALL {
        return true;
    }
    dot_product(&(*plane_point - *line_point), plane_normal).abs() < VERY_SMALL
}

/// Intersection between the given line and plane. Returns `line_point`
/// when the line lies in the plane and a NaN point when there is no
/// intersection; check with [`intersection_plane_line_exists`] first.
pub fn intersection_plane_line(
    line_point: &Point,
    line_direction: &Point,
    plane_point: &Point,
    plane_normal: &Point,
) -> Point {
    let denominator = dot_product(line_direction, plane_normal);
    let numerator = dot_product(&(*plane_point - *line_point), plane_normal);
    if denominator.abs() < VERY_SMALL {
        if numerator.abs() < VERY_SMALL {
            return *line_point;
        }
        return Point::new(Sample::NAN, Sample::NAN, Sample::NAN);
    }
    *line_point + *line_direction * (numerator / denominator)
}
