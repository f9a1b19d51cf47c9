//! Typed field values and the coercion rules from raw document values.

use glam::Vec3;

use crate::document::RawValue;
use crate::error::{DocPath, LoadError};
use crate::math::float::FloatAsExt;
use crate::schema::{FieldSpec, FieldType, Range};
use crate::variant::Variant;

/// Channel count a scalar spectrum is broadcast to
pub const SPECTRUM_CHANNELS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum ClampedSpectrum {
    Scalar(f64),
    Vector(Vec<f64>),
    /// Texture map, resolved by the renderer
    TexturePath(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Bool(bool),
    UInt(u64),
    Real(f64),
    RealPositive(f64),
    Vector(Vec<f64>),
    Spectrum(Vec<f64>),
    ClampedSpectrum(ClampedSpectrum),
    Color([f64; 3]),
    Enum(String),
    Path(String),
    String(String),
    Variant(Box<Variant>),
    List(Vec<CoercedValue>),
}

impl CoercedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CoercedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CoercedValue::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Any scalar number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CoercedValue::UInt(n) => Some(*n as f64),
            CoercedValue::Real(x) | CoercedValue::RealPositive(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            CoercedValue::Vector(v) | CoercedValue::Spectrum(v) => Some(v),
            CoercedValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self.as_slice()? {
            [x, y, z] => Some(Vec3::new(*x as f32, *y as f32, *z as f32)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CoercedValue::Enum(s) | CoercedValue::Path(s) | CoercedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_clamped(&self) -> Option<&ClampedSpectrum> {
        match self {
            CoercedValue::ClampedSpectrum(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            CoercedValue::Variant(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CoercedValue]> {
        match self {
            CoercedValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Coercion failure, without location. The caller attaches the document path.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    Mismatch { expected: String, found: &'static str },
    Range { value: f64, range: Range },
    Element { index: usize, source: Box<CoercionError> },
}

impl CoercionError {
    fn mismatch(expected: impl ToString, raw: &RawValue) -> Self {
        Self::Mismatch {
            expected: expected.to_string(),
            found: raw.kind(),
        }
    }

    fn element(index: usize, source: CoercionError) -> Self {
        Self::Element {
            index,
            source: Box::new(source),
        }
    }

    pub fn at(self, path: &DocPath) -> LoadError {
        match self {
            CoercionError::Mismatch { expected, found } => LoadError::mismatch(path, expected, found),
            CoercionError::Range { value, range } => LoadError::RangeViolation {
                path: path.clone(),
                value,
                range,
            },
            CoercionError::Element { index, source } => source.at(&path.index(index)),
        }
    }
}

/// Coerces `raw` into the field's semantic type.
///
/// Nested variants are not handled here, they need the registry (see [`crate::dispatch`]).
pub fn coerce(raw: &RawValue, field: &FieldSpec) -> Result<CoercedValue, CoercionError> {
    coerce_as(raw, &field.ty, field.range)
}

fn coerce_as(raw: &RawValue, ty: &FieldType, range: Option<Range>) -> Result<CoercedValue, CoercionError> {
    let value = match ty {
        FieldType::Bool => match raw {
            RawValue::Bool(b) => CoercedValue::Bool(*b),
            _ => return Err(CoercionError::mismatch(ty, raw)),
        },
        FieldType::UInt => {
            let n = number(raw, ty)?;
            if n < 0.0 {
                return Err(CoercionError::Range {
                    value: n,
                    range: Range::NON_NEGATIVE,
                });
            }
            if n.fract() != 0.0 || n > u64::MAX as f64 {
                return Err(CoercionError::mismatch(ty, raw));
            }
            CoercedValue::UInt(check(n, range)? as u64)
        }
        FieldType::Real => CoercedValue::Real(check(number(raw, ty)?, range)?),
        FieldType::RealPositive => {
            let x = check(number(raw, ty)?, Some(Range::POSITIVE))?;
            CoercedValue::RealPositive(check(x, range)?)
        }
        FieldType::Vector(n) => {
            let values = numbers(raw, ty, range)?;
            if values.len() != *n {
                return Err(CoercionError::Mismatch {
                    expected: ty.to_string(),
                    found: array_of_len(values.len()),
                });
            }
            CoercedValue::Vector(values)
        }
        FieldType::Spectrum => match raw {
            RawValue::Number(_) => {
                CoercedValue::Spectrum(vec![check(number(raw, ty)?, range)?; SPECTRUM_CHANNELS])
            }
            _ => CoercedValue::Spectrum(non_empty(numbers(raw, ty, range)?, ty, raw)?),
        },
        FieldType::ClampedSpectrum => {
            let range = range.unwrap_or(Range::UNIT);
            let clamped = match raw {
                RawValue::String(path) => ClampedSpectrum::TexturePath(path.clone()),
                RawValue::Number(_) => ClampedSpectrum::Scalar(check(number(raw, ty)?, Some(range))?),
                _ => ClampedSpectrum::Vector(non_empty(numbers(raw, ty, Some(range))?, ty, raw)?),
            };
            CoercedValue::ClampedSpectrum(clamped)
        }
        FieldType::Color3 => {
            let values = numbers(raw, ty, Some(range.unwrap_or(Range::UNIT)))?;
            match values[..] {
                [r, g, b] => CoercedValue::Color([r, g, b]),
                _ => {
                    return Err(CoercionError::Mismatch {
                        expected: ty.to_string(),
                        found: array_of_len(values.len()),
                    })
                }
            }
        }
        FieldType::Enum(allowed) => match raw {
            RawValue::String(s) if allowed.contains(&s.as_str()) => CoercedValue::Enum(s.clone()),
            _ => return Err(CoercionError::mismatch(ty, raw)),
        },
        FieldType::Path => match raw {
            RawValue::String(s) => CoercedValue::Path(s.clone()),
            _ => return Err(CoercionError::mismatch(ty, raw)),
        },
        FieldType::String => match raw {
            RawValue::String(s) => CoercedValue::String(s.clone()),
            _ => return Err(CoercionError::mismatch(ty, raw)),
        },
        FieldType::List(elem) => {
            let items = raw.as_sequence().ok_or_else(|| CoercionError::mismatch(ty, raw))?;
            let coerced = items
                .iter()
                .enumerate()
                .map(|(i, item)| coerce_as(item, elem, range).map_err(|e| CoercionError::element(i, e)))
                .collect::<Result<Vec<_>, _>>()?;
            CoercedValue::List(coerced)
        }
        FieldType::Variant(_) => return Err(CoercionError::mismatch(ty, raw)),
    };
    Ok(value)
}

fn number(raw: &RawValue, ty: &FieldType) -> Result<f64, CoercionError> {
    raw.as_f64()
        .and_then(FloatAsExt::into_finite)
        .ok_or_else(|| CoercionError::mismatch(ty, raw))
}

fn numbers(raw: &RawValue, ty: &FieldType, range: Option<Range>) -> Result<Vec<f64>, CoercionError> {
    let items = raw.as_sequence().ok_or_else(|| CoercionError::mismatch(ty, raw))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            number(item, &FieldType::Real)
                .and_then(|x| check(x, range))
                .map_err(|e| CoercionError::element(i, e))
        })
        .collect()
}

fn non_empty(values: Vec<f64>, ty: &FieldType, raw: &RawValue) -> Result<Vec<f64>, CoercionError> {
    if values.is_empty() {
        Err(CoercionError::Mismatch {
            expected: format!("non-empty {ty}"),
            found: raw.kind(),
        })
    } else {
        Ok(values)
    }
}

fn check(x: f64, range: Option<Range>) -> Result<f64, CoercionError> {
    match range {
        Some(range) if !range.contains(x) => Err(CoercionError::Range { value: x, range }),
        _ => Ok(x),
    }
}

fn array_of_len(len: usize) -> &'static str {
    match len {
        0 => "empty array",
        1 => "array of 1 number",
        2 => "array of 2 numbers",
        3 => "array of 3 numbers",
        _ => "array of the wrong length",
    }
}
