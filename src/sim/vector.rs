//! Compass-style vector helpers on top of `glam::DVec2`

use glam::DVec2;

use crate::{cartesian_to_polar, polar_to_cartesian};

/// 2D vector used throughout the core (value semantics, `Copy`)
pub type Vector = DVec2;

/// Polar construction, direction and reflection for [`Vector`]
pub trait VectorExt: Sized {
    /// Build from a magnitude and a direction (0 = north, clockwise, any range)
    fn from_polar(magnitude: f64, direction: f64) -> Self;

    /// Direction in [0, 2π), 0 = north, clockwise
    fn direction(self) -> f64;

    /// Rotate clockwise by `angle` radians
    fn rotated(self, angle: f64) -> Self;

    /// Mirror across the line perpendicular to a unit `normal`.
    ///
    /// Standard reflection: v' = v - 2(v·n)n. The magnitude is unchanged.
    fn reflect_across(self, normal: Self) -> Self;
}

impl VectorExt for DVec2 {
    #[inline]
    fn from_polar(magnitude: f64, direction: f64) -> Self {
        polar_to_cartesian(magnitude, direction)
    }

    #[inline]
    fn direction(self) -> f64 {
        cartesian_to_polar(self).1
    }

    #[inline]
    fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        DVec2::new(self.x * cos + self.y * sin, self.y * cos - self.x * sin)
    }

    #[inline]
    fn reflect_across(self, normal: Self) -> Self {
        self - 2.0 * self.dot(normal) * normal
    }
}
