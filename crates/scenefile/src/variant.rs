use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;

use crate::document::RawValue;
use crate::schema::{Family, DYNAMIC};
use crate::value::{ClampedSpectrum, CoercedValue};

/// A dispatched object: the registry entry it matched and its coerced fields, defaults included
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub family: Family,
    /// Canonical tag (aliases already resolved)
    pub tag: &'static str,
    /// Tag as the registry knows the spelling that was written, e.g. `specular` for a
    /// dielectric declared through its shorthand
    pub declared: &'static str,
    pub(crate) fields: BTreeMap<&'static str, CoercedValue>,
    pub(crate) explicit: BTreeSet<&'static str>,
    /// Unvalidated fields of a `dynamic` variant
    pub extra: Vec<(String, RawValue)>,
}

impl Variant {
    pub(crate) fn new(family: Family, tag: &'static str) -> Self {
        Self {
            family,
            tag,
            declared: tag,
            fields: BTreeMap::new(),
            explicit: BTreeSet::new(),
            extra: Vec::new(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.tag == DYNAMIC
    }

    pub fn get(&self, name: &str) -> Option<&CoercedValue> {
        self.fields.get(name)
    }

    /// Whether the document spelled the field out, as opposed to it holding a default
    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit.contains(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &CoercedValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(CoercedValue::as_f64)
    }

    pub fn uint(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(CoercedValue::as_u64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(CoercedValue::as_bool)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(CoercedValue::as_str)
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        self.get(name).and_then(CoercedValue::as_vec3)
    }

    pub fn numbers(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(CoercedValue::as_slice)
    }

    pub fn clamped(&self, name: &str) -> Option<&ClampedSpectrum> {
        self.get(name).and_then(CoercedValue::as_clamped)
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.get(name).and_then(CoercedValue::as_variant)
    }

    pub fn list(&self, name: &str) -> Option<&[CoercedValue]> {
        self.get(name).and_then(CoercedValue::as_list)
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: CoercedValue) {
        self.fields.insert(name, value);
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<CoercedValue> {
        self.explicit.remove(name);
        self.fields.remove(name)
    }
}
