//! Convenience re-exports of the crate's main types.

pub use super::ambisonics::{AmbisonicsHorizDec, HoaBuffer, HoaEncoder};
pub use super::binaural::{
    BinauralDirectivity, CipicLoader, HrirDatabase, HrirLoader, KemarLoader,
};
pub use super::buffer::{Buffer, BufferView, BufferViewMut, MonoBuffer, StereoBuffer};
pub use super::delay::DelayLine;
pub use super::directivity::{
    BypassDirectivity, Directivity, DirectivityOps, GainDirectivity, OmniDirectivity,
    TrigDirectivity,
};
pub use super::eq::GraphicEq;
pub use super::fir::{DigitalFilter, FirFilter, GainFilter, IdenticalFilter};
pub use super::freefield::FreeFieldSim;
pub use super::iir::{
    pinkifier_filter, wall_filter, IirFilter, PeakHighShelf, PeakLowShelf, PeakingFilter,
    WallType,
};
pub use super::ism::{ImageSource, Ism, IsmInterpolation};
pub use super::math::uniform_angles;
pub use super::point::Point;
pub use super::propagation::PropagationLine;
pub use super::quaternion::{
    axang_to_quat, quat_conj, quat_inverse, quat_multiply, quat_norm, quat_rotate, quat_to_axang,
    AxAng, EulerOrder, Quaternion,
};
pub use super::receiver::Receiver;
pub use super::room::CuboidRoom;
pub use super::sh::{
    hoa_channel_id, num_hoa_channels, real_spherical_harmonic, HoaDimensionality,
    HoaNormalisation, HoaOrdering,
};
pub use super::smoother::RampSmoother;
pub use super::source::{ShSource, Source};
pub use super::{
    Angle, AttenuationType, Ear, Handedness, HeadRefOrientation, InterpolationType, Length,
    Sample, Time, SOUND_SPEED,
};
