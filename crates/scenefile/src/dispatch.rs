//! Selects the registry entry for a raw object and coerces its fields.

use crate::document::RawValue;
use crate::error::{DocPath, LoadError, Warning};
use crate::schema::{Family, FieldSpec, FieldType, Registry, VariantSpec};
use crate::value::{coerce, CoercedValue};
use crate::variant::Variant;

pub struct Dispatcher<'r> {
    registry: &'r Registry,
    strict: bool,
    warnings: Vec<Warning>,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry, strict: bool) -> Self {
        Self {
            registry,
            strict,
            warnings: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn warn(&mut self, path: &DocPath, message: impl Into<String>) {
        self.warnings.push(Warning::new(path, message));
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Reports a key nobody recognised: a warning, or an error in strict mode
    pub fn unknown_field(&mut self, path: &DocPath, field: &str) -> Result<(), LoadError> {
        if self.strict {
            Err(LoadError::UnknownField {
                path: path.clone(),
                field: field.to_owned(),
            })
        } else {
            self.warn(path, format!("unknown field `{field}` ignored"));
            Ok(())
        }
    }

    /// Dispatches `raw` as a member of `family`.
    ///
    /// `shorthand` is the key the object was found under when that key is itself a tag
    /// (`"sphere": {}`).
    pub fn dispatch(
        &mut self,
        family: Family,
        raw: &RawValue,
        shorthand: Option<&str>,
        path: &DocPath,
    ) -> Result<Variant, Vec<LoadError>> {
        self.dispatch_filtered(family, raw, shorthand, &|_: &str| false, path)
    }

    /// Same as [`Self::dispatch`] but keys for which `skip` holds are left to the caller
    pub fn dispatch_filtered(
        &mut self,
        family: Family,
        raw: &RawValue,
        shorthand: Option<&str>,
        skip: &dyn Fn(&str) -> bool,
        path: &DocPath,
    ) -> Result<Variant, Vec<LoadError>> {
        let entries = match raw {
            // bare tag, e.g. `"generator": "super"`
            RawValue::String(tag) => return self.dispatch_tag(family, tag, &[], skip, path),
            RawValue::Mapping(entries) => entries,
            _ => {
                return Err(vec![LoadError::mismatch(
                    path,
                    format!("{family} object"),
                    raw.kind(),
                )])
            }
        };

        let tag = match raw.get("type") {
            Some(RawValue::String(tag)) => tag.as_str(),
            Some(other) => {
                return Err(vec![LoadError::mismatch(&path.key("type"), "string", other.kind())])
            }
            None => match (shorthand, entries.as_slice()) {
                (Some(tag), _) => tag,
                // `{"ball": {...}}` wrapping form
                (None, [(key, inner @ RawValue::Mapping(_))]) if self.registry.is_tag(family, key) => {
                    return self.dispatch_filtered(family, inner, Some(key.as_str()), skip, &path.key(key));
                }
                _ => match self.registry.default_tag(family) {
                    Some(tag) => tag,
                    None => return Err(vec![LoadError::missing(path, "type")]),
                },
            },
        };

        self.dispatch_tag(family, tag, entries, skip, path)
    }

    fn dispatch_tag(
        &mut self,
        family: Family,
        tag: &str,
        entries: &[(String, RawValue)],
        skip: &dyn Fn(&str) -> bool,
        path: &DocPath,
    ) -> Result<Variant, Vec<LoadError>> {
        let registry = self.registry;
        let spec = registry
            .lookup(family, tag)
            .map_err(|err| vec![err.at(&path.key("type"))])?;
        let mut variant = self.coerce_fields(spec, entries, &|key: &str| key == "type" || skip(key), path)?;

        if let Some(canonical) = spec.canonical {
            let target = registry
                .lookup(family, canonical.tag)
                .map_err(|err| vec![err.at(path)])?;
            let mut errors = Vec::new();
            for &(name, default) in canonical.implied {
                if let Some(field) = target.field(name) {
                    match self.coerce_field(&default.to_raw(), field, &path.key(name)) {
                        Ok(value) => variant.insert(field.name, value),
                        Err(errs) => errors.extend(errs),
                    }
                }
            }
            for field in &target.fields {
                if variant.get(field.name).is_none() {
                    if let Some(default) = field.default {
                        match self.coerce_field(&default.to_raw(), field, &path.key(field.name)) {
                            Ok(value) => variant.insert(field.name, value),
                            Err(errs) => errors.extend(errs),
                        }
                    }
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            variant.tag = target.tag;
        }

        log::trace!("{path}: {family} `{}`", variant.declared);
        Ok(variant)
    }

    /// Coerces the entries of an object against `spec`, filling defaults. Every failing field is
    /// reported, not only the first one.
    pub fn coerce_fields(
        &mut self,
        spec: &VariantSpec,
        entries: &[(String, RawValue)],
        skip: &dyn Fn(&str) -> bool,
        path: &DocPath,
    ) -> Result<Variant, Vec<LoadError>> {
        let mut variant = Variant::new(spec.family, spec.tag);
        let mut errors = Vec::new();
        let mut seen: Vec<&'static str> = Vec::new();

        for (key, raw) in entries {
            if skip(key) {
                continue;
            }
            let field_path = path.key(key);
            let Some(field) = spec.field(key) else {
                if spec.open {
                    variant.extra.push((key.clone(), raw.clone()));
                } else if let Err(err) = self.unknown_field(path, key) {
                    errors.push(err);
                }
                continue;
            };
            if seen.contains(&field.name) {
                errors.push(LoadError::structural(
                    &field_path,
                    format!("field `{key}` is given more than once"),
                ));
                continue;
            }
            seen.push(field.name);
            match self.coerce_field(raw, field, &field_path) {
                Ok(value) => {
                    variant.insert(field.name, value);
                    variant.explicit.insert(field.name);
                }
                Err(errs) => errors.extend(errs),
            }
        }

        for field in &spec.fields {
            if seen.contains(&field.name) {
                continue;
            }
            match field.default {
                Some(default) => match self.coerce_field(&default.to_raw(), field, &path.key(field.name)) {
                    Ok(value) => variant.insert(field.name, value),
                    Err(errs) => errors.extend(errs),
                },
                None if !field.optional => errors.push(LoadError::missing(path, field.name)),
                None => {}
            }
        }

        if errors.is_empty() {
            Ok(variant)
        } else {
            Err(errors)
        }
    }

    /// Coerces one field, recursing into nested variants
    pub fn coerce_field(
        &mut self,
        raw: &RawValue,
        field: &FieldSpec,
        path: &DocPath,
    ) -> Result<CoercedValue, Vec<LoadError>> {
        match field.ty {
            FieldType::Variant(family) => self
                .dispatch(family, raw, None, path)
                .map(|v| CoercedValue::Variant(Box::new(v))),
            FieldType::List(&FieldType::Variant(family)) => {
                let items = raw.as_sequence().ok_or_else(|| {
                    vec![LoadError::mismatch(path, field.ty.to_string(), raw.kind())]
                })?;
                let mut values = Vec::with_capacity(items.len());
                let mut errors = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    match self.dispatch(family, item, None, &path.index(i)) {
                        Ok(v) => values.push(CoercedValue::Variant(Box::new(v))),
                        Err(errs) => errors.extend(errs),
                    }
                }
                if errors.is_empty() {
                    Ok(CoercedValue::List(values))
                } else {
                    Err(errors)
                }
            }
            _ => coerce(raw, field).map_err(|err| vec![err.at(path)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ClampedSpectrum;

    fn dispatch(family: Family, text: &str) -> Result<Variant, Vec<LoadError>> {
        let raw = RawValue::parse(text).unwrap();
        Dispatcher::new(Registry::global(), false).dispatch(family, &raw, None, &DocPath::root())
    }

    #[test]
    fn minimal_bsdfs_get_documented_defaults() {
        let phong = dispatch(Family::Bsdf, r#"{"type": "phong"}"#).unwrap();
        assert_eq!(phong.real("n"), Some(1.0));
        assert_eq!(phong.clamped("kd"), Some(&ClampedSpectrum::Scalar(0.5)));
        assert!(!phong.is_explicit("n"));

        let diffuse = dispatch(Family::Bsdf, r#"{"type": "diffuse"}"#).unwrap();
        assert_eq!(diffuse.clamped("kd"), Some(&ClampedSpectrum::Scalar(0.5)));

        let dielectric = dispatch(Family::Bsdf, r#"{"type": "dielectric"}"#).unwrap();
        assert_eq!(dielectric.clamped("opacity"), Some(&ClampedSpectrum::Scalar(1.0)));
        assert!(dielectric.get("transparency").is_none());

        for tag in ["absorbent", "specular", "transmissive", "modifiedPhong"] {
            assert!(dispatch(Family::Bsdf, &format!(r#"{{"type": "{tag}"}}"#)).is_ok(), "{tag}");
        }
    }

    #[test]
    fn specular_and_transmissive_are_dielectrics() {
        let specular = dispatch(Family::Bsdf, r#"{"type": "specular", "ks": 0.8}"#).unwrap();
        assert_eq!(specular.tag, "dielectric");
        assert_eq!(specular.declared, "specular");
        assert_eq!(specular.clamped("ks"), Some(&ClampedSpectrum::Scalar(0.8)));
        assert_eq!(specular.clamped("opacity"), Some(&ClampedSpectrum::Scalar(1.0)));

        let transmissive = dispatch(Family::Bsdf, r#"{"type": "transmissive"}"#).unwrap();
        assert_eq!(transmissive.tag, "dielectric");
        assert_eq!(transmissive.clamped("opacity"), Some(&ClampedSpectrum::Scalar(0.0)));
    }

    #[test]
    fn nested_variant_defaults() {
        let renderer = dispatch(Family::Renderer, r#"{"type": "pathTracer"}"#).unwrap();
        assert_eq!(renderer.uint("noRenderThreads"), Some(8));
        let generator = renderer.variant("generator").unwrap();
        assert_eq!(generator.tag, "super");
        assert_eq!(generator.uint("noSuperSamples"), Some(4));
        assert_eq!(renderer.variant("directSampleGenerator").unwrap().tag, "jittered");
        assert_eq!(renderer.bool("efficientDirect"), Some(true));
    }

    #[test]
    fn bare_string_tag() {
        let accel = dispatch(Family::SpatialAccel, r#""kdTree""#).unwrap();
        assert_eq!(accel.uint("kdMaxDepth"), Some(24));
        assert_eq!(accel.str("kdSplitPlaneType"), Some("splitPlaneSAH"));
    }

    #[test]
    fn family_default_tags() {
        assert_eq!(dispatch(Family::Medium, r#"{"ior": 1.5}"#).unwrap().tag, "homogenous");
        assert_eq!(dispatch(Family::Output, "{}").unwrap().tag, "reconstruction");
        let missing = dispatch(Family::Bsdf, r#"{"kd": 0.5}"#).unwrap_err();
        assert!(matches!(&missing[..], [LoadError::MissingRequiredField { field, .. }] if field == "type"));
    }

    #[test]
    fn wrapped_shorthand() {
        let ball = dispatch(Family::MetaObject, r#"{"ball": {"radius": 2}}"#).unwrap();
        assert_eq!(ball.tag, "ball");
        assert_eq!(ball.real("radius"), Some(2.0));
        assert_eq!(ball.bool("negative"), Some(false));
    }

    #[test]
    fn errors_are_collected_per_field() {
        let errors = dispatch(
            Family::Camera,
            r#"{"type": "thinlens", "eye": 2, "fstop": -1, "focalPoint": [0.5, 1.5]}"#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        let paths: Vec<_> = errors.iter().filter_map(|e| e.path()).map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["eye", "fstop", "focalPoint[1]"]);
    }

    #[test]
    fn unknown_variant_and_missing_required() {
        let errors = dispatch(Family::Bsdf, r#"{"type": "velvet"}"#).unwrap_err();
        assert!(matches!(&errors[..], [LoadError::UnknownVariant { tag, .. }] if tag == "velvet"));

        let errors = dispatch(Family::Shape, r#"{"type": "mesh"}"#).unwrap_err();
        assert!(matches!(&errors[..], [LoadError::MissingRequiredField { field, .. }] if field == "path"));
    }

    #[test]
    fn unknown_fields_warn_or_fail() {
        let raw = RawValue::parse(r#"{"type": "pinhole", "aperture": 10}"#).unwrap();
        let mut lenient = Dispatcher::new(Registry::global(), false);
        assert!(lenient.dispatch(Family::Camera, &raw, None, &DocPath::root()).is_ok());
        assert_eq!(lenient.take_warnings().len(), 1);

        let mut strict = Dispatcher::new(Registry::global(), true);
        let errors = strict.dispatch(Family::Camera, &raw, None, &DocPath::root()).unwrap_err();
        assert!(matches!(&errors[..], [LoadError::UnknownField { field, .. }] if field == "aperture"));
    }

    #[test]
    fn dynamic_keeps_extras_even_in_strict_mode() {
        let raw = RawValue::parse(
            r#"{"type": "dynamic", "path": "photon/libphoton.so", "noRenderThreads": 10, "generator": "super"}"#,
        )
        .unwrap();
        let mut strict = Dispatcher::new(Registry::global(), true);
        let renderer = strict.dispatch(Family::Renderer, &raw, None, &DocPath::root()).unwrap();
        assert!(renderer.is_dynamic());
        assert_eq!(renderer.str("path"), Some("photon/libphoton.so"));
        assert_eq!(renderer.extra.len(), 2);

        let no_path = RawValue::parse(r#"{"type": "dynamic"}"#).unwrap();
        assert!(strict.dispatch(Family::Shape, &no_path, None, &DocPath::root()).is_err());
    }

    #[test]
    fn aggregate_lists() {
        let aggregate = dispatch(
            Family::Bsdf,
            r#"{"type": "aggregate", "bsdfs": [{"type": "diffuse"}, "phong"], "weights": [0.3, 0.7]}"#,
        )
        .unwrap();
        assert_eq!(aggregate.list("bsdfs").unwrap().len(), 2);
        assert_eq!(aggregate.list("weights").unwrap().len(), 2);
    }
}
