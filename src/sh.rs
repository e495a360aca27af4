//! Real and complex spherical harmonics and the HOA channel
//! conventions.

use super::math::{factorial, legendre_p, SQRT_2};
use super::{Angle, Sample};
use num_complex::Complex64;

/// Channel ordering convention of an HOA stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HoaOrdering {
    /// Classical B-format ordering (WXYZ, then RSTUV, ...).
    FuMa,
    /// Ambisonic Channel Number: `id = n^2 + n + m`.
    #[default]
    Acn,
}

/// Normalisation convention of the stored HOA coefficients.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HoaNormalisation {
    /// Full 3-D normalisation (orthonormal up to `sqrt(4 pi)`).
    #[default]
    N3d,
    /// Schmidt semi-normalisation.
    Sn3d,
    /// MaxN weighting with the attenuated W channel; defined up to
    /// third order.
    FuMa,
}

/// Whether an HOA stream spans the full sphere or the horizontal
/// plane only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HoaDimensionality {
    /// `2 * order + 1` channels of circular harmonics.
    Horizontal,
    /// `(order + 1)^2` channels of spherical harmonics.
    #[default]
    ThreeD,
}

/// Number of channels of an HOA stream of the given order.
pub fn num_hoa_channels(order: usize, dimensionality: HoaDimensionality) -> usize {
    match dimensionality {
        HoaDimensionality::Horizontal => 2 * order + 1,
        HoaDimensionality::ThreeD => (order + 1) * (order + 1),
    }
}

/// Channel index of degree `n` and order `m` under the given
/// conventions. Panics when `|m| > n`; horizontal streams carry only
/// the sectorial components `|m| == n`, addressed the same way under
/// both orderings (cosine term first).
pub fn hoa_channel_id(
    n: usize,
    m: isize,
    ordering: HoaOrdering,
    dimensionality: HoaDimensionality,
) -> usize {
    assert!(
        m.unsigned_abs() <= n,
        "invalid spherical harmonic degree/order pair"
    );
    match dimensionality {
        HoaDimensionality::Horizontal => {
            assert!(
                n == 0 || m.unsigned_abs() == n,
                "horizontal streams hold only the components with |m| == n"
            );
            if n == 0 {
                0
            } else if m > 0 {
                2 * n - 1
            } else {
                2 * n
            }
        }
        HoaDimensionality::ThreeD => match ordering {
            HoaOrdering::Acn => ((n * n + n) as isize + m) as usize,
            HoaOrdering::FuMa => {
                // First order keeps the traditional WXYZ layout; from
                // the second order on the zonal term leads and the
                // pairs follow outward.
                if n == 0 {
                    0
                } else if n == 1 {
                    match m {
                        1 => 1,
                        -1 => 2,
                        _ => 3,
                    }
                } else if m == 0 {
                    n * n
                } else if m > 0 {
                    n * n + 2 * m as usize - 1
                } else {
                    n * n + 2 * m.unsigned_abs()
                }
            }
        },
    }
}

fn fuma_weight(n: usize, m_abs: usize) -> Sample {
    match (n, m_abs) {
        (0, 0) => 1.0 / SQRT_2,
        (1, _) => 1.0,
        (2, 0) => 1.0,
        (2, _) => 2.0 / (3.0 as Sample).sqrt(),
        (3, 0) => 1.0,
        (3, 1) => (45.0 as Sample / 32.0).sqrt(),
        (3, 2) => 3.0 / (5.0 as Sample).sqrt(),
        (3, 3) => (8.0 as Sample / 5.0).sqrt(),
        _ => panic!("FuMa normalisation is defined up to third order only"),
    }
}

/// Real spherical harmonic `Y_n^m` at azimuth `theta` (from the
/// x-axis, right-handed about z) and elevation `phi` (from the x-y
/// plane), under the given normalisation. Positive orders carry the
/// cosine terms, negative orders the sine terms; `Y_0^0 == 1` for N3D
/// and SN3D.
pub fn real_spherical_harmonic(
    n: usize,
    m: isize,
    theta: Angle,
    phi: Angle,
    normalisation: HoaNormalisation,
) -> Sample {
    let m_abs = m.unsigned_abs();
    assert!(m_abs <= n, "invalid spherical harmonic degree/order pair");
    let sn3d = {
        let delta = if m == 0 { 1.0 } else { 2.0 };
        (delta * factorial((n - m_abs) as u32) / factorial((n + m_abs) as u32)).sqrt()
    };
    let scaling = match normalisation {
        HoaNormalisation::N3d => sn3d * (2.0 * n as Sample + 1.0).sqrt(),
        HoaNormalisation::Sn3d => sn3d,
        HoaNormalisation::FuMa => sn3d * fuma_weight(n, m_abs),
    };
    let legendre = legendre_p(n as u32, m_abs as u32, phi.sin());
    let azimuthal = if m >= 0 {
        (m as Angle * theta).cos()
    } else {
        (m_abs as Angle * theta).sin()
    };
    scaling * legendre * azimuthal
}

/// Complex orthonormal spherical harmonic of degree `n` and order `m`,
/// with `theta` the angle formed with the z-axis and `phi` the azimuth
/// from the x-axis. Includes the Condon-Shortley phase.
pub fn complex_spherical_harmonic(n: usize, m: isize, theta: Angle, phi: Angle) -> Complex64 {
    let m_abs = m.unsigned_abs();
    assert!(m_abs <= n, "invalid spherical harmonic degree/order pair");
    let normalisation = ((2.0 * n as f64 + 1.0) / (4.0 * std::f64::consts::PI)
        * factorial((n - m_abs) as u32) as f64
        / factorial((n + m_abs) as u32) as f64)
        .sqrt();
    // Condon-Shortley phase on the positive-order function.
    let phase = if m_abs % 2 == 1 { -1.0 } else { 1.0 };
    let legendre = phase * legendre_p(n as u32, m_abs as u32, theta.cos() as Sample) as f64;
    let positive =
        Complex64::from_polar(1.0, m_abs as f64 * phi as f64) * normalisation * legendre;
    if m >= 0 {
        positive
    } else {
        // Y_n^{-m} = (-1)^m conj(Y_n^m).
        positive.conj() * phase
    }
}

/// Horizontal HOA encoding coefficients at azimuth `theta`:
/// `[1, sqrt(2) cos(theta), sqrt(2) sin(theta), sqrt(2) cos(2 theta), ...]`.
pub fn horizontal_encoding(order: usize, theta: Angle) -> Vec<Sample> {
    let mut output = Vec::with_capacity(2 * order + 1);
    output.push(1.0);
    for i in 1..=order {
        output.push(SQRT_2 * (i as Angle * theta).cos());
        output.push(SQRT_2 * (i as Angle * theta).sin());
    }
    output
}
