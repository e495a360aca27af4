//! Quaternions and orientation conversions.

use super::point::Point;
use super::{Angle, Handedness, Sample};

/// Orderings for composing Euler angle rotations. The letters give the
/// sequence in which the axis rotations are applied to the frame; `Zyx`
/// is the default convention throughout the crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EulerOrder {
    Zxz,
    Xyx,
    Yzy,
    Zyz,
    Xzx,
    Yxy,
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    #[default]
    Zyx,
    Yxz,
}

/// Axis-angle representation of a rotation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxAng {
    pub x: Sample,
    pub y: Sample,
    pub z: Sample,
    pub angle: Angle,
}

/// A quaternion `w + x*i + y*j + z*k` describing an orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quaternion {
    w: Sample,
    x: Sample,
    y: Sample,
    z: Sample,
}

impl Quaternion {
    /// Constructs a quaternion with scalar component `w` followed by
    /// the vector components.
    pub fn new(w: Sample, x: Sample, y: Sample, z: Sample) -> Self {
        Self { w, x, y, z }
    }

    /// The multiplicative identity, neutral to rotations.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Builds the rotation named by `order`: the letters, read left to
    /// right, give the axes of `angle_3`, `angle_2` and `angle_1`, and
    /// the rightmost rotation is applied first. For the default `Zyx`,
    /// `angle_1` rotates about x, `angle_2` about y and `angle_3`
    /// about z.
    pub fn from_euler(angle_1: Angle, angle_2: Angle, angle_3: Angle, order: EulerOrder) -> Self {
        let axis = |letter: char, angle: Angle| match letter {
            'x' => axang_to_quat(1.0, 0.0, 0.0, angle),
            'y' => axang_to_quat(0.0, 1.0, 0.0, angle),
            _ => axang_to_quat(0.0, 0.0, 1.0, angle),
        };
        let letters = match order {
            EulerOrder::Zxz => ['z', 'x', 'z'],
            EulerOrder::Xyx => ['x', 'y', 'x'],
            EulerOrder::Yzy => ['y', 'z', 'y'],
            EulerOrder::Zyz => ['z', 'y', 'z'],
            EulerOrder::Xzx => ['x', 'z', 'x'],
            EulerOrder::Yxy => ['y', 'x', 'y'],
            EulerOrder::Xyz => ['x', 'y', 'z'],
            EulerOrder::Yzx => ['y', 'z', 'x'],
            EulerOrder::Zxy => ['z', 'x', 'y'],
            EulerOrder::Xzy => ['x', 'z', 'y'],
            EulerOrder::Zyx => ['z', 'y', 'x'],
            EulerOrder::Yxz => ['y', 'x', 'z'],
        };
        quat_multiply(
            &quat_multiply(&axis(letters[0], angle_3), &axis(letters[1], angle_2)),
            &axis(letters[2], angle_1),
        )
    }

    #[inline]
    pub fn w(&self) -> Sample {
        self.w
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

    /// Euler angle about the x-axis for the `Zyx` convention.
    pub fn euler_x(&self) -> Angle {
        (-2.0 * self.y * self.z + 2.0 * self.w * self.x).atan2(
            self.w * self.w + self.z * self.z - self.y * self.y - self.x * self.x,
        )
    }

    /// Euler angle about the y-axis for the `Zyx` convention.
    pub fn euler_y(&self) -> Angle {
        (2.0 * self.x * self.z + 2.0 * self.w * self.y).asin()
    }

    /// Euler angle about the z-axis for the `Zyx` convention.
    pub fn euler_z(&self) -> Angle {
        (-2.0 * self.x * self.y + 2.0 * self.w * self.z).atan2(
            self.w * self.w + self.x * self.x - self.y * self.y - self.z * self.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Quaternion for a rotation of `angle` about the axis `(x, y, z)`.
pub fn axang_to_quat(x: Sample, y: Sample, z: Sample, angle: Angle) -> Quaternion {
    let norm = (x * x + y * y + z * z).sqrt();
    assert!(norm > 0.0, "rotation axis cannot be the zero vector");
    let half = angle / 2.0;
    Quaternion::new(
        half.cos(),
        half.sin() * x / norm,
        half.sin() * y / norm,
        half.sin() * z / norm,
    )
}

/// Axis-angle representation of a quaternion.
pub fn quat_to_axang(q: &Quaternion) -> AxAng {
    let norm = quat_norm(q);
    let q = Quaternion::new(q.w() / norm, q.x() / norm, q.y() / norm, q.z() / norm);
    let angle = 2.0 * q.w().acos();
    let s = (1.0 - q.w() * q.w()).sqrt();
    if s < super::math::VERY_SMALL {
        AxAng {
            x: 1.0,
            y: 0.0,
            z: 0.0,
            angle,
        }
    } else {
        AxAng {
            x: q.x() / s,
            y: q.y() / s,
            z: q.z() / s,
            angle,
        }
    }
}

pub fn quat_conj(q: &Quaternion) -> Quaternion {
    Quaternion::new(q.w(), -q.x(), -q.y(), -q.z())
}

/// Norm of a quaternion, as the Euclidean norm in R^4.
pub fn quat_norm(q: &Quaternion) -> Sample {
    (q.w() * q.w() + q.x() * q.x() + q.y() * q.y() + q.z() * q.z()).sqrt()
}

/// Inverse rotation. For the unit quaternions used as orientations this
/// equals the conjugate up to normalisation.
pub fn quat_inverse(q: &Quaternion) -> Quaternion {
    let norm_squared = quat_norm(q) * quat_norm(q);
    let conj = quat_conj(q);
    Quaternion::new(
        conj.w() / norm_squared,
        conj.x() / norm_squared,
        conj.y() / norm_squared,
        conj.z() / norm_squared,
    )
}

/// Hamilton quaternion product.
pub fn quat_multiply(q: &Quaternion, r: &Quaternion) -> Quaternion {
    Quaternion::new(
        r.w() * q.w() - r.x() * q.x() - r.y() * q.y() - r.z() * q.z(),
        r.w() * q.x() + r.x() * q.w() - r.y() * q.z() + r.z() * q.y(),
        r.w() * q.y() + r.x() * q.z() + r.y() * q.w() - r.z() * q.x(),
        r.w() * q.z() - r.x() * q.y() + r.y() * q.x() + r.z() * q.w(),
    )
}

/// Rotates point `r` by quaternion `q`. Right-handed rotation computes
/// `q r q*`; left-handed computes `q* r q`.
pub fn quat_rotate(q: &Quaternion, r: &Point, handedness: Handedness) -> Point {
    let norm = quat_norm(q);
    let q = Quaternion::new(q.w() / norm, q.x() / norm, q.y() / norm, q.z() / norm);
    let p = Quaternion::new(0.0, r.x(), r.y(), r.z());
    let result = match handedness {
        Handedness::RightHanded => quat_multiply(&quat_multiply(&q, &p), &quat_conj(&q)),
        Handedness::LeftHanded => quat_multiply(&quat_multiply(&quat_conj(&q), &p), &q),
    };
    Point::new(result.x(), result.y(), result.z())
}
