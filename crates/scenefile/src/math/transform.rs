use glam::{Mat4, Vec3};

use super::vec::{Vec3AsNonZero, DEGENERATE_EPS};
use crate::document::RawValue;
use crate::error::{DocPath, LoadError};
use crate::schema::{FieldSpec, FieldType};
use crate::value::{coerce, CoercedValue};

/// Keys of a transform block that are directives rather than child nodes
pub const DIRECTIVE_KEYS: [&str; 4] = ["scale", "rotate", "translate", "arbitraryTransform"];

/// One entry of a transform block
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformDirective {
    Scale(Vec3),
    /// Rotation of `degrees` around the line through `point` along `axis`
    Rotate { point: Vec3, axis: Vec3, degrees: f32 },
    Translate(Vec3),
    Arbitrary(Mat4),
}

impl TransformDirective {
    /// Parses the directive stored under `key`, `Ok(None)` if `key` is not a directive
    pub fn from_raw(key: &str, raw: &RawValue, path: &DocPath) -> Result<Option<Self>, LoadError> {
        let directive = match key {
            "scale" => Self::Scale(vec3(raw, path)?),
            "translate" => Self::Translate(vec3(raw, path)?),
            "rotate" => rotate(raw, path)?,
            "arbitraryTransform" => {
                let m = numbers(raw, FieldType::Vector(16), path)?;
                let mut cols = [0.0f32; 16];
                for (dst, src) in cols.iter_mut().zip(m) {
                    *dst = src as f32;
                }
                // the document lists the matrix row by row
                Self::Arbitrary(Mat4::from_cols_array(&cols).transpose())
            }
            _ => return Ok(None),
        };
        Ok(Some(directive))
    }

    fn matrix(&self) -> Mat4 {
        match *self {
            Self::Scale(s) => Mat4::from_scale(s),
            Self::Translate(t) => Mat4::from_translation(t),
            Self::Rotate {
                point,
                axis,
                degrees,
            } => {
                Mat4::from_translation(point)
                    * Mat4::from_axis_angle(axis.normalize(), degrees.to_radians())
                    * Mat4::from_translation(-point)
            }
            Self::Arbitrary(m) => m,
        }
    }
}

/// Merges the directives of one transform block into a single matrix.
///
/// Points are scaled, then rotated, then translated, then put through the arbitrary matrix,
/// whatever the order the directives were written in. Directives of the same kind multiply in
/// declaration order.
pub fn compose(directives: &[TransformDirective]) -> Mat4 {
    let mut scale = Mat4::IDENTITY;
    let mut rotate = Mat4::IDENTITY;
    let mut translate = Mat4::IDENTITY;
    let mut arbitrary = Mat4::IDENTITY;

    for directive in directives {
        let m = directive.matrix();
        match directive {
            TransformDirective::Scale(_) => scale *= m,
            TransformDirective::Rotate { .. } => rotate *= m,
            TransformDirective::Translate(_) => translate *= m,
            TransformDirective::Arbitrary(_) => arbitrary *= m,
        }
    }

    arbitrary * translate * rotate * scale
}

fn numbers(raw: &RawValue, ty: FieldType, path: &DocPath) -> Result<Vec<f64>, LoadError> {
    match coerce(raw, &FieldSpec::required("", ty)) {
        Ok(CoercedValue::Vector(v)) => Ok(v),
        Ok(_) => Err(LoadError::mismatch(path, ty.to_string(), raw.kind())),
        Err(err) => Err(err.at(path)),
    }
}

fn vec3(raw: &RawValue, path: &DocPath) -> Result<Vec3, LoadError> {
    let v = numbers(raw, FieldType::Vector(3), path)?;
    Ok(to_vec3(&v))
}

fn to_vec3(v: &[f64]) -> Vec3 {
    Vec3::new(v[0] as f32, v[1] as f32, v[2] as f32)
}

fn rotate(raw: &RawValue, path: &DocPath) -> Result<TransformDirective, LoadError> {
    let (point, axis, degrees) = match raw {
        RawValue::Mapping(_) => {
            let point = match raw.get("point") {
                Some(p) => vec3(p, &path.key("point"))?,
                None => Vec3::ZERO,
            };
            let axis = raw
                .get("axis")
                .ok_or_else(|| LoadError::missing(path, "axis"))
                .and_then(|a| vec3(a, &path.key("axis")))?;
            let angle_path = path.key("angle");
            let degrees = raw
                .get("angle")
                .ok_or_else(|| LoadError::missing(path, "angle"))?;
            let degrees = match coerce(degrees, &FieldSpec::required("angle", FieldType::Real)) {
                Ok(value) => value.as_f64().unwrap_or_default() as f32,
                Err(err) => return Err(err.at(&angle_path)),
            };
            for (key, _) in raw.as_mapping().unwrap_or_default() {
                if !matches!(key.as_str(), "point" | "axis" | "angle") {
                    return Err(LoadError::UnknownField {
                        path: path.clone(),
                        field: key.clone(),
                    });
                }
            }
            (point, axis, degrees)
        }
        _ => {
            let v = numbers(raw, FieldType::Vector(7), path)?;
            (to_vec3(&v[0..3]), to_vec3(&v[3..6]), v[6] as f32)
        }
    };

    if axis.into_non_zero(DEGENERATE_EPS).is_none() {
        return Err(LoadError::mismatch(path, "non-zero rotation axis", "zero vector"));
    }

    Ok(TransformDirective::Rotate {
        point,
        axis,
        degrees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(key: &str, text: &str) -> TransformDirective {
        TransformDirective::from_raw(key, &RawValue::parse(text).unwrap(), &DocPath::root())
            .unwrap()
            .unwrap()
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a} != {b}");
    }

    #[test]
    fn fixed_order() {
        // scale by 1/2, rotate 90 degrees about x, then move 3 along x
        let m = compose(&[
            directive("translate", "[3, 0, 0]"),
            directive("rotate", "[0, 0, 0, 1, 0, 0, 90]"),
            directive("scale", "[0.5, 0.5, 0.5]"),
        ]);
        assert_close(m.transform_point3(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(3.0, 0.0, 0.5));
    }

    #[test]
    fn rotation_about_a_point() {
        let r = directive("rotate", r#"{"point": [1, 0, 0], "axis": [0, 0, 1], "angle": 180}"#);
        let m = compose(&[r]);
        assert_close(m.transform_point3(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
        assert_close(m.transform_point3(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn object_and_flat_rotate_agree() {
        let flat = directive("rotate", "[1, 2, 3, 0, 1, 0, 30]");
        let object = directive("rotate", r#"{"point": [1, 2, 3], "axis": [0, 1, 0], "angle": 30}"#);
        assert_eq!(flat, object);
    }

    #[test]
    fn same_kind_in_declaration_order() {
        let m = compose(&[directive("translate", "[1, 0, 0]"), directive("translate", "[0, 2, 0]")]);
        assert_close(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn arbitrary_is_row_major() {
        let m = directive(
            "arbitraryTransform",
            "[1, 0, 0, 5,  0, 1, 0, 6,  0, 0, 1, 7,  0, 0, 0, 1]",
        );
        assert_close(compose(&[m]).transform_point3(Vec3::ZERO), Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn arbitrary_applies_last() {
        let m = compose(&[
            directive("arbitraryTransform", "[2, 0, 0, 0,  0, 2, 0, 0,  0, 0, 2, 0,  0, 0, 0, 1]"),
            directive("translate", "[1, 0, 0]"),
        ]);
        assert_close(m.transform_point3(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn malformed_directives() {
        let path = DocPath::root().key("rotate");
        let zero_axis = TransformDirective::from_raw(
            "rotate",
            &RawValue::parse("[0, 0, 0, 0, 0, 0, 90]").unwrap(),
            &path,
        );
        assert!(matches!(zero_axis, Err(LoadError::FieldTypeMismatch { .. })));

        let short = TransformDirective::from_raw("scale", &RawValue::parse("[1, 2]").unwrap(), &path);
        assert!(matches!(short, Err(LoadError::FieldTypeMismatch { .. })));

        let nine = TransformDirective::from_raw(
            "arbitraryTransform",
            &RawValue::parse("[1, 0, 0, 0, 1, 0, 0, 0, 1]").unwrap(),
            &path,
        );
        assert!(nine.is_err());

        let missing_angle =
            TransformDirective::from_raw("rotate", &RawValue::parse(r#"{"axis": [0, 1, 0]}"#).unwrap(), &path);
        assert!(matches!(missing_angle, Err(LoadError::MissingRequiredField { .. })));

        assert_eq!(
            TransformDirective::from_raw("cube", &RawValue::Mapping(vec![]), &path),
            Ok(None)
        );
    }
}
