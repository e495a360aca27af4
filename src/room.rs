//! Cuboid rooms and their reflective walls.

use super::iir::{wall_filter, IirFilter, WallType};
use super::point::Point;
use super::{Length, Time};

/// A shoe-box room: three side lengths and one absorption filter per
/// face. The room sits in the positive octant with one corner at the
/// origin.
///
/// Wall filters are ordered `x1, x2, y1, y2, z1, z2`, where `x1` is
/// the face on the plane `x = 0` and `x2` the face at `x = Lx`.
#[derive(Clone, Debug)]
pub struct CuboidRoom {
    dimensions: Point,
    wall_filters: Vec<IirFilter>,
}

impl CuboidRoom {
    pub fn new(lx: Length, ly: Length, lz: Length, wall_filters: Vec<IirFilter>) -> Self {
        assert!(
            lx > 0.0 && ly > 0.0 && lz > 0.0,
            "the room dimensions must be positive"
        );
        assert_eq!(wall_filters.len(), 6, "a cuboid room has six wall filters");
        Self {
            dimensions: Point::new(lx, ly, lz),
            wall_filters,
        }
    }

    /// A room with the same absorption preset on every face.
    pub fn with_wall_type(
        lx: Length,
        ly: Length,
        lz: Length,
        wall_type: WallType,
        sampling_frequency: Time,
    ) -> Self {
        let filter = wall_filter(wall_type, sampling_frequency);
        Self::new(lx, ly, lz, vec![filter; 6])
    }

    #[inline]
    pub fn dimensions(&self) -> Point {
        self.dimensions
    }

    pub fn wall_filters(&self) -> &[IirFilter] {
        &self.wall_filters
    }

    pub fn set_wall_filters(&mut self, wall_filters: Vec<IirFilter>) {
        assert_eq!(wall_filters.len(), 6, "a cuboid room has six wall filters");
        self.wall_filters = wall_filters;
    }

    /// Position of the image source indexed by the classical
    /// Allen-Berkley expansion: `m` counts room periods along each
    /// axis and `p` picks the mirrored copy.
    pub fn image_source_position(
        &self,
        source_position: &Point,
        mx: isize,
        my: isize,
        mz: isize,
        px: isize,
        py: isize,
        pz: isize,
    ) -> Point {
        debug_assert!((0..=1).contains(&px) && (0..=1).contains(&py) && (0..=1).contains(&pz));
        let r2l_x = 2.0 * self.dimensions.x() * mx as Length;
        let r2l_y = 2.0 * self.dimensions.y() * my as Length;
        let r2l_z = 2.0 * self.dimensions.z() * mz as Length;
        Point::new(
            (1.0 - 2.0 * px as Length) * source_position.x() + r2l_x,
            (1.0 - 2.0 * py as Length) * source_position.y() + r2l_y,
            (1.0 - 2.0 * pz as Length) * source_position.z() + r2l_z,
        )
    }
}
