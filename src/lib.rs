//! Spatial audio simulation and rendering library.
//!
//! The crate models acoustic propagation between point sources and
//! directional receivers, sample by sample or block by block:
//! fractional delay lines with smoothed distance changes, an online FIR
//! engine with click-free impulse response swaps, parametric IIR filters
//! and a graphic equaliser, higher-order ambisonic encoding and
//! decoding, binaural rendering over HRIR datasets, an image-source
//! model for cuboid rooms, and a free-field driver that routes every
//! source through every receiver.
//!
//! Everything is single-threaded and allocation-free in the steady
//! state: buffers, delay lines and filter state are sized at
//! construction and parameter changes ramp along the sample clock.

#![allow(clippy::too_many_arguments)]

pub mod ambisonics;
pub mod binaural;
pub mod buffer;
pub mod delay;
pub mod directivity;
pub mod eq;
pub mod fir;
pub mod freefield;
pub mod iir;
pub mod ism;
pub mod math;
pub mod point;
pub mod prelude;
pub mod propagation;
pub mod quaternion;
pub mod receiver;
pub mod room;
pub mod sh;
pub mod smoother;
pub mod source;

/// One audio value. 64-bit by default; the `single` feature selects
/// 32-bit samples instead.
#[cfg(not(feature = "single"))]
pub type Sample = f64;
/// One audio value. 64-bit by default; the `single` feature selects
/// 32-bit samples instead.
#[cfg(feature = "single")]
pub type Sample = f32;

/// Time in seconds.
pub type Time = Sample;
/// Length in metres.
pub type Length = Sample;
/// Angle in radians unless a function says otherwise.
pub type Angle = Sample;

/// Speed of sound in air (m/s).
pub const SOUND_SPEED: Sample = 343.0;

/// Interpolation used when reading a fractional delay tap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InterpolationType {
    /// Nearest-tap read. Fewer artefacts while the delay is static.
    #[default]
    Rounding,
    /// Two-tap linear read. Smoother on the move, slightly low-passed.
    Linear,
}

/// Distance-to-gain policy of a propagation line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AttenuationType {
    /// Inverse square law, unit gain at the reference distance.
    #[default]
    InverseSquareLaw,
    /// Direct-path components pinned to the 1 metre gain.
    ConstantLos,
}

/// Handedness of the reference frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Handedness {
    #[default]
    RightHanded,
    LeftHanded,
}

/// Reference orientation of a directional head or receiver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HeadRefOrientation {
    /// Acoustic axis along +x, azimuth in the x-y plane.
    #[default]
    Standard,
    /// Acoustic axis along +y, elevation in the y-z plane.
    YZ,
}

/// One of the two ears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ear {
    Left,
    Right,
}
