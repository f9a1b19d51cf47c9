//! Schema registry: every variant family, its legal tags and their fields.
//!
//! The registry is plain data built once (see [`tables`]) and only read afterwards, so a single
//! instance can be shared by any number of concurrent loads.

mod tables;

use std::collections::HashMap;
use std::fmt;

use crate::document::RawValue;
use crate::error::{DocPath, LoadError};

/// Tag accepted by every family, pointing at an external plugin
pub const DYNAMIC: &str = "dynamic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Family {
    #[display("renderer")]
    Renderer,
    #[display("camera")]
    Camera,
    #[display("output")]
    Output,
    #[display("background emitter")]
    Background,
    #[display("bsdf")]
    Bsdf,
    #[display("emitter")]
    Emitter,
    #[display("medium")]
    Medium,
    #[display("filter")]
    Filter,
    #[display("generator")]
    Generator,
    #[display("shape")]
    Shape,
    #[display("metaobject")]
    MetaObject,
    #[display("spatial accelerator")]
    SpatialAccel,
}

impl Family {
    pub const ALL: [Family; 12] = [
        Family::Renderer,
        Family::Camera,
        Family::Output,
        Family::Background,
        Family::Bsdf,
        Family::Emitter,
        Family::Medium,
        Family::Filter,
        Family::Generator,
        Family::Shape,
        Family::MetaObject,
        Family::SpatialAccel,
    ];
}

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    UInt,
    Real,
    RealPositive,
    /// Exactly N numbers
    Vector(usize),
    /// Any positive number of channels; a scalar broadcasts to RGB
    Spectrum,
    /// Per-channel value in [0, 1], or a texture path
    ClampedSpectrum,
    /// Three components in [0, 1]
    Color3,
    Enum(&'static [&'static str]),
    Path,
    String,
    Variant(Family),
    List(&'static FieldType),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("boolean"),
            FieldType::UInt => f.write_str("unsigned integer"),
            FieldType::Real => f.write_str("real"),
            FieldType::RealPositive => f.write_str("positive real"),
            FieldType::Vector(n) => write!(f, "vector{n}"),
            FieldType::Spectrum => f.write_str("spectrum"),
            FieldType::ClampedSpectrum => f.write_str("clamped spectrum"),
            FieldType::Color3 => f.write_str("color"),
            FieldType::Enum(allowed) => write!(f, "one of {}", allowed.join(", ")),
            FieldType::Path => f.write_str("path"),
            FieldType::String => f.write_str("string"),
            FieldType::Variant(family) => write!(f, "{family}"),
            FieldType::List(elem) => write!(f, "array of {elem}"),
        }
    }
}

/// Numeric interval a value (or every component of it) must lie in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl Range {
    pub const UNIT: Range = Range::closed(0.0, 1.0);
    pub const POSITIVE: Range = Range {
        min: 0.0,
        max: f64::INFINITY,
        min_inclusive: false,
        max_inclusive: false,
    };
    pub const NON_NEGATIVE: Range = Range {
        min: 0.0,
        max: f64::INFINITY,
        min_inclusive: true,
        max_inclusive: false,
    };

    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub const fn open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    pub const fn half_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: false,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        let above = if self.min_inclusive { v >= self.min } else { v > self.min };
        let below = if self.max_inclusive { v <= self.max } else { v < self.max };
        above && below
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let max = if self.max.is_infinite() { "inf".to_owned() } else { self.max.to_string() };
        write!(f, "{open}{}, {max}{close}", self.min)
    }
}

/// Registry default, turned into a raw value and coerced like user input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Number(f64),
    Numbers(&'static [f64]),
    Str(&'static str),
}

impl DefaultValue {
    pub fn to_raw(self) -> RawValue {
        match self {
            DefaultValue::Bool(b) => RawValue::Bool(b),
            DefaultValue::Number(n) => RawValue::Number(n),
            DefaultValue::Numbers(ns) => {
                RawValue::Sequence(ns.iter().copied().map(RawValue::Number).collect())
            }
            DefaultValue::Str(s) => RawValue::String(s.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub optional: bool,
    pub default: Option<DefaultValue>,
    /// Overrides the natural range of the type (e.g. [0, 1] for clamped spectra)
    pub range: Option<Range>,
    /// Informational only
    pub units: Option<&'static str>,
}

impl FieldSpec {
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            optional: true,
            default: None,
            range: None,
            units: None,
        }
    }

    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            optional: false,
            ..Self::optional(name, ty)
        }
    }

    pub const fn default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn within(self, range: Range) -> Self {
        Self {
            range: Some(range),
            ..self
        }
    }

    pub const fn units(self, units: &'static str) -> Self {
        Self {
            units: Some(units),
            ..self
        }
    }
}

/// Another tag this one is shorthand for, with the fields the shorthand pins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canonical {
    pub tag: &'static str,
    pub implied: &'static [(&'static str, DefaultValue)],
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    pub family: Family,
    pub tag: &'static str,
    /// Own fields followed by the fields of every shared group
    pub fields: Vec<FieldSpec>,
    pub shared_field_groups: Vec<&'static str>,
    pub canonical: Option<Canonical>,
    /// Accepts unconstrained extra fields
    pub open: bool,
}

impl VariantSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownVariant {
    pub family: Family,
    pub tag: String,
}

impl UnknownVariant {
    pub fn at(self, path: &DocPath) -> LoadError {
        LoadError::UnknownVariant {
            path: path.clone(),
            family: self.family,
            tag: self.tag,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FamilySchema {
    default_tag: Option<&'static str>,
    variants: Vec<VariantSpec>,
    aliases: HashMap<&'static str, &'static str>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    families: HashMap<Family, FamilySchema>,
    material: VariantSpec,
}

lazy_static::lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut families: HashMap<Family, FamilySchema> = HashMap::new();

        for spec in tables::variants() {
            families.entry(spec.family).or_default().variants.push(spec);
        }
        for &(family, alias, tag) in tables::ALIASES {
            families.entry(family).or_default().aliases.insert(alias, tag);
        }
        for &(family, tag) in tables::DEFAULT_TAGS {
            families.entry(family).or_default().default_tag = Some(tag);
        }
        for family in Family::ALL {
            families.entry(family).or_default().variants.push(VariantSpec {
                family,
                tag: DYNAMIC,
                fields: vec![FieldSpec::required("path", FieldType::Path)],
                shared_field_groups: vec![],
                canonical: None,
                open: true,
            });
        }

        Self {
            families,
            material: tables::material_block(),
        }
    }

    /// Process-wide registry
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn lookup(&self, family: Family, tag: &str) -> Result<&VariantSpec, UnknownVariant> {
        let unknown = || UnknownVariant {
            family,
            tag: tag.to_owned(),
        };
        let schema = self.families.get(&family).ok_or_else(unknown)?;
        let tag = schema.aliases.get(tag).copied().unwrap_or(tag);
        schema.variants.iter().find(|v| v.tag == tag).ok_or_else(unknown)
    }

    /// Whether `key` names a tag (or alias) of `family`
    pub fn is_tag(&self, family: Family, key: &str) -> bool {
        self.lookup(family, key).is_ok()
    }

    /// Canonical tags of a family, in registry order
    pub fn tags(&self, family: Family) -> impl Iterator<Item = &'static str> + '_ {
        self.families
            .get(&family)
            .into_iter()
            .flat_map(|schema| schema.variants.iter().map(|v| v.tag))
    }

    /// Tag used when an object of this family omits `type`
    pub fn default_tag(&self, family: Family) -> Option<&'static str> {
        self.families.get(&family).and_then(|schema| schema.default_tag)
    }

    /// Fields of a `material` block
    pub fn material(&self) -> &VariantSpec {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_family_accepts_dynamic() {
        let registry = Registry::new();
        for family in Family::ALL {
            let spec = registry.lookup(family, DYNAMIC).unwrap();
            assert!(spec.open);
            assert!(!spec.field("path").unwrap().optional);
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_spec() {
        let registry = Registry::global();
        let tag = |family, t| registry.lookup(family, t).unwrap().tag;
        assert_eq!(tag(Family::Renderer, "bidirPathTracer"), "bidirectionalPathTracer");
        assert_eq!(tag(Family::Renderer, "MLT"), "mlt");
        assert_eq!(tag(Family::Renderer, "OpenGL"), "preview");
        assert_eq!(tag(Family::Bsdf, "modifiedPhong"), "phong");
        assert_eq!(tag(Family::Bsdf, "dieletric"), "dielectric");
        assert_eq!(tag(Family::Filter, "lanzcosSinc"), "lanczosSinc");
    }

    #[test]
    fn unknown_tag() {
        let err = Registry::global().lookup(Family::Bsdf, "velvet").unwrap_err();
        assert_eq!(err.family, Family::Bsdf);
        assert_eq!(err.tag, "velvet");
    }

    #[test]
    fn bsdf_tags() {
        let tags: Vec<_> = Registry::global().tags(Family::Bsdf).collect();
        assert_eq!(
            tags,
            vec![
                "absorbent",
                "diffuse",
                "dielectric",
                "phong",
                "specular",
                "transmissive",
                "aggregate",
                DYNAMIC
            ]
        );
    }

    #[test]
    fn point_sample_group_is_shared() {
        let registry = Registry::global();
        for tag in ["rayCaster", "rayTracer", "pathTracer", "bidirectionalPathTracer", "photonMapper", "mlt"] {
            let spec = registry.lookup(Family::Renderer, tag).unwrap();
            assert!(spec.shared_field_groups.contains(&"pointSampleRenderer"), "{tag}");
            let threads = spec.field("noRenderThreads").unwrap();
            assert_eq!(threads.default, Some(DefaultValue::Number(8.0)));
            assert!(spec.field("generator").is_some());
            assert!(spec.field("directSampleGenerator").is_some());
        }
        assert!(registry.lookup(Family::Renderer, "preview").unwrap().field("generator").is_none());
    }

    #[test]
    fn range_display_and_contains() {
        let threshold = Range::half_open(0.0, 0.2);
        assert!(threshold.contains(0.0));
        assert!(threshold.contains(0.1999));
        assert!(!threshold.contains(0.2));
        assert_eq!(threshold.to_string(), "[0, 0.2)");
        assert_eq!(Range::POSITIVE.to_string(), "(0, inf)");
    }
}
