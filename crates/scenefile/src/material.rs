use crate::dispatch::Dispatcher;
use crate::error::{DocPath, LoadError};
use crate::schema::Registry;
use crate::value::{ClampedSpectrum, CoercedValue};
use crate::variant::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

impl MaterialId {
    /// Gray diffuse material used by shapes declared outside any material block
    pub const DEFAULT: MaterialId = MaterialId(0);
}

/// Surface description attached to shapes
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: Option<String>,
    pub bsdf: Variant,
    pub emitter: Variant,
    pub bump_map: Option<String>,
    pub bump_intensity: f64,
    pub medium: Option<Variant>,
    pub filter: Variant,
    pub repeat_u: f64,
    pub repeat_v: f64,
    /// Where the material block was declared
    pub path: DocPath,
}

impl Material {
    /// Builds a material from a coerced `material` block
    pub fn from_block(mut block: Variant, path: &DocPath) -> Result<Self, LoadError> {
        let mut variant = |name: &str| {
            block
                .take(name)
                .and_then(|v| match v {
                    CoercedValue::Variant(v) => Some(*v),
                    _ => None,
                })
                .ok_or_else(|| LoadError::missing(path, name))
        };
        let bsdf = variant("bsdf")?;
        let emitter = variant("emitter")?;
        let filter = variant("filter")?;
        let medium = variant("medium").ok();

        Ok(Self {
            label: block.str("name").map(str::to_owned),
            bsdf,
            emitter,
            bump_map: block.str("bumpMap").map(str::to_owned),
            bump_intensity: block.real("bumpIntensity").unwrap_or(5.0),
            medium,
            filter,
            repeat_u: block.real("repeatU").unwrap_or(1.0),
            repeat_v: block.real("repeatV").unwrap_or(1.0),
            path: path.clone(),
        })
    }

    pub fn is_emissive(&self) -> bool {
        self.emitter.tag != "null"
    }

    /// Reflectance of a diffuse bsdf, if the material has one
    pub fn diffuse(&self) -> Option<&ClampedSpectrum> {
        (self.bsdf.tag == "diffuse").then(|| self.bsdf.clamped("kd")).flatten()
    }
}

/// All materials of a scene. Index 0 always holds the default material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new(registry: &Registry) -> Result<Self, Vec<LoadError>> {
        let mut dispatcher = Dispatcher::new(registry, true);
        let path = DocPath::root();
        let block = dispatcher.coerce_fields(registry.material(), &[], &|_: &str| false, &path)?;
        let mut default = Material::from_block(block, &path).map_err(|e| vec![e])?;
        default.label = Some("default".to_owned());
        Ok(Self {
            materials: vec![default],
        })
    }

    /// Insert a material and returns the Material ID associated with this material
    pub fn insert(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().enumerate().map(|(i, m)| (MaterialId(i), m))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_gray_diffuse() {
        let table = MaterialTable::new(Registry::global()).unwrap();
        let default = table.get(MaterialId::DEFAULT).unwrap();
        assert_eq!(default.bsdf.tag, "diffuse");
        assert_eq!(default.diffuse(), Some(&ClampedSpectrum::Scalar(0.5)));
        assert_eq!(default.emitter.tag, "null");
        assert!(!default.is_emissive());
        assert_eq!(default.filter.tag, "triangle");
        assert_eq!(default.bump_intensity, 5.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insert_returns_sequential_ids() {
        let mut table = MaterialTable::new(Registry::global()).unwrap();
        let default = table.get(MaterialId::DEFAULT).unwrap().clone();
        assert_eq!(table.insert(default.clone()), MaterialId(1));
        assert_eq!(table.insert(default), MaterialId(2));
    }
}
