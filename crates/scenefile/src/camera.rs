use glam::Vec3;

use crate::math::vec::{Vec3AsNonZero, Vec3CollinearExt, DEGENERATE_EPS};
use crate::variant::Variant;

/// Viewing frame of a pinhole-like camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub eye: Vec3,
    /// Viewing direction, not normalized
    pub look: Vec3,
    pub up: Vec3,
}

impl CameraFrame {
    /// Frame described by a camera variant, `None` for cameras without a known layout.
    ///
    /// The viewing direction is `focus - eye` when a focus point is given, else `look`, else
    /// towards the origin.
    pub fn from_variant(camera: &Variant) -> Option<Self> {
        if camera.is_dynamic() {
            return None;
        }
        let eye = camera.vec3("eye")?;
        let up = camera.vec3("up")?;
        let look = match (camera.vec3("focus"), camera.vec3("look")) {
            (Some(focus), _) => focus - eye,
            (None, Some(look)) => look,
            (None, None) => -eye,
        };
        Some(Self { eye, look, up })
    }

    /// Whether `up` and the viewing direction span a plane
    pub fn is_degenerate(&self) -> bool {
        self.look.into_non_zero(DEGENERATE_EPS).is_none() || self.up.is_collinear(self.look)
    }

    /// Orthonormal `(right, up, forward)` basis, `None` if degenerate
    pub fn basis(&self) -> Option<(Vec3, Vec3, Vec3)> {
        if self.is_degenerate() {
            return None;
        }
        let forward = self.look.normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        Some((right, up, forward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::document::RawValue;
    use crate::error::DocPath;
    use crate::schema::{Family, Registry};

    fn camera(text: &str) -> Variant {
        let raw = RawValue::parse(text).unwrap();
        Dispatcher::new(Registry::global(), false)
            .dispatch(Family::Camera, &raw, None, &DocPath::root())
            .unwrap()
    }

    #[test]
    fn direction_sources() {
        let frame = CameraFrame::from_variant(&camera(r#"{"type": "pinhole", "eye": [0, 0, 5], "focus": [0, 0, 1]}"#))
            .unwrap();
        assert_eq!(frame.look, Vec3::new(0.0, 0.0, -4.0));

        let frame = CameraFrame::from_variant(&camera(r#"{"type": "pinhole", "look": [1, 0, 0]}"#)).unwrap();
        assert_eq!(frame.look, Vec3::X);

        let frame = CameraFrame::from_variant(&camera(r#"{"type": "pinhole"}"#)).unwrap();
        assert_eq!(frame.look, Vec3::new(-2.0, -2.0, -1.0));
        assert!(!frame.is_degenerate());
    }

    #[test]
    fn collinear_up_is_degenerate() {
        let frame =
            CameraFrame::from_variant(&camera(r#"{"type": "pinhole", "eye": [0, 5, 0], "up": [0, 1, 0]}"#)).unwrap();
        assert!(frame.is_degenerate());
        assert!(frame.basis().is_none());
    }

    #[test]
    fn basis_is_orthonormal() {
        let frame = CameraFrame::from_variant(&camera(r#"{"type": "thinlens"}"#)).unwrap();
        let (right, up, forward) = frame.basis().unwrap();
        assert!(right.dot(up).abs() < 1e-6);
        assert!(right.dot(forward).abs() < 1e-6);
        assert!((up.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dynamic_camera_has_no_frame() {
        let dynamic = camera(r#"{"type": "dynamic", "path": "cam.so"}"#);
        assert!(CameraFrame::from_variant(&dynamic).is_none());
    }
}
