//! Shape geometry as declared in a scene
//!
//! Geometry lives behind a [`ShapeHandle`] so that named shapes can be shared with every
//! `{"instance": name}` site referring to them without being copied.

use std::sync::{Arc, OnceLock};

use glam::{Mat4, Vec3};

use crate::error::DocPath;
use crate::graph::SceneNode;
use crate::variant::Variant;

/// Shape tags that carry spatial-accelerator settings
pub const ACCELERATED_SHAPES: [&str; 3] = ["mesh", "blob", "shapeSet"];

const KD_KEYS: [&str; 9] = [
    "kdSplitPlaneType",
    "kdSplitAxisType",
    "kdMinPrimitives",
    "kdMaxDepth",
    "kdNoThreads",
    "kdPostCompress",
    "kdCostTraversal",
    "kdCostIntersect",
    "kdEmptyBias",
];

/// A shape's own definition: its dispatched variant and, for shape sets, the nodes it groups
#[derive(Debug)]
pub struct ShapeDef {
    pub variant: Variant,
    pub children: Vec<SceneNode>,
}

pub type ShapeHandle = Arc<ShapeDef>;

impl ShapeDef {
    pub fn tag(&self) -> &'static str {
        self.variant.tag
    }

    pub fn name(&self) -> Option<&str> {
        self.variant.str("name")
    }

    /// Placement of the primitive inside its own object space.
    ///
    /// Spheres are unit-diameter primitives moved by `position` and scaled by `radius`; every
    /// other shape is already expressed in object space.
    pub fn local_transform(&self) -> Mat4 {
        match self.tag() {
            "sphere" => {
                let position = self.variant.vec3("position").unwrap_or(Vec3::ZERO);
                let radius = self.variant.real("radius").unwrap_or(0.5) as f32;
                Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(2.0 * radius))
            }
            _ => Mat4::IDENTITY,
        }
    }
}

/// A `{"instance": name}` site, filled once every shape of the document is known
#[derive(Debug)]
pub struct InstanceSite {
    pub name: String,
    pub path: DocPath,
    target: OnceLock<ShapeHandle>,
}

impl InstanceSite {
    pub fn new(name: impl Into<String>, path: &DocPath) -> Self {
        Self {
            name: name.into(),
            path: path.clone(),
            target: OnceLock::new(),
        }
    }

    /// Shared definition this site refers to, `None` before resolution
    pub fn target(&self) -> Option<&ShapeHandle> {
        self.target.get()
    }

    pub(crate) fn resolve(&self, handle: ShapeHandle) {
        // a site is resolved once, later attempts keep the first target
        let _ = self.target.set(handle);
    }
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Defined(ShapeHandle),
    Instance(Arc<InstanceSite>),
}

impl Geometry {
    /// The underlying definition, following instance references
    pub fn definition(&self) -> Option<&ShapeHandle> {
        match self {
            Geometry::Defined(handle) => Some(handle),
            Geometry::Instance(site) => site.target(),
        }
    }
}

/// Moves the flat `kd*` fields of an accelerated shape into its accelerator hints.
///
/// Returns the names of the fields that had nothing to apply to (non kd-tree accelerator).
pub fn merge_kd_fields(shape: &mut Variant, accel: &mut Variant) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    for key in KD_KEYS {
        let explicit = shape.is_explicit(key);
        if let Some(value) = shape.take(key) {
            if !explicit {
                continue;
            }
            if accel.tag == "kdTree" {
                accel.insert(key, value);
                accel.explicit.insert(key);
            } else {
                ignored.push(key);
            }
        }
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::document::RawValue;
    use crate::schema::{Family, Registry};

    fn dispatch(family: Family, text: &str) -> Variant {
        let raw = RawValue::parse(text).unwrap();
        Dispatcher::new(Registry::global(), false)
            .dispatch(family, &raw, None, &DocPath::root())
            .unwrap()
    }

    #[test]
    fn sphere_local_transform() {
        let def = ShapeDef {
            variant: dispatch(Family::Shape, r#"{"type": "sphere", "position": [1, 2, 3], "radius": 2}"#),
            children: vec![],
        };
        let p = def.local_transform().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));

        let unit = ShapeDef {
            variant: dispatch(Family::Shape, r#"{"type": "sphere"}"#),
            children: vec![],
        };
        assert_eq!(unit.local_transform(), Mat4::IDENTITY);
    }

    #[test]
    fn kd_fields_merge_into_kd_tree() {
        let mut blob = dispatch(
            Family::Shape,
            r#"{"type": "blob", "metaObjects": ["ball"], "kdMaxDepth": 16}"#,
        );
        let mut accel = dispatch(Family::SpatialAccel, r#""kdTree""#);
        assert!(merge_kd_fields(&mut blob, &mut accel).is_empty());
        assert_eq!(accel.uint("kdMaxDepth"), Some(16));
        assert_eq!(accel.uint("kdMinPrimitives"), Some(3));
        assert!(blob.get("kdMaxDepth").is_none());

        let mut naive = dispatch(Family::SpatialAccel, r#""naive""#);
        let mut mesh = dispatch(Family::Shape, r#"{"type": "mesh", "path": "a.obj", "kdNoThreads": 2}"#);
        assert_eq!(merge_kd_fields(&mut mesh, &mut naive), vec!["kdNoThreads"]);
    }

    #[test]
    fn unresolved_site_has_no_target() {
        let site = InstanceSite::new("bunny", &DocPath::root());
        assert!(site.target().is_none());
        let geometry = Geometry::Instance(Arc::new(site));
        assert!(geometry.definition().is_none());
    }
}
