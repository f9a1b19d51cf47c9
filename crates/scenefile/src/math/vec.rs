pub use glam::Vec3;

use super::float::FloatAsExt;

/// Below this length a direction is considered degenerate
pub const DEGENERATE_EPS: f32 = 1e-6;

pub trait Vec3AsNonZero: Sized {
    fn into_non_zero(self, eps: f32) -> Option<Self>;
}

impl Vec3AsNonZero for Vec3 {
    fn into_non_zero(self, eps: f32) -> Option<Self> {
        self.length_squared().into_non_zero(eps * eps).and(Some(self))
    }
}

pub trait Vec3CollinearExt {
    /// True if the two directions are (anti)parallel, or either one is zero
    fn is_collinear(self, other: Self) -> bool;
}

impl Vec3CollinearExt for Vec3 {
    fn is_collinear(self, other: Self) -> bool {
        match (
            self.into_non_zero(DEGENERATE_EPS),
            other.into_non_zero(DEGENERATE_EPS),
        ) {
            (Some(a), Some(b)) => a
                .normalize()
                .cross(b.normalize())
                .into_non_zero(DEGENERATE_EPS)
                .is_none(),
            _ => true,
        }
    }
}
