//! Scene graph and the recursive-descent builder producing it.
//!
//! A scene body is a list of nodes: `material` blocks, `transform` blocks and shapes, written
//! either as `"shape": {"type": ...}` or with the tag as key (`"sphere": {}`). Keys may repeat;
//! every occurrence is a sibling. While walking, the builder threads an [`InheritedEnv`] down
//! the tree and records `instance` references for later resolution.

use std::sync::Arc;

use glam::Mat4;

use crate::dispatch::Dispatcher;
use crate::document::RawValue;
use crate::error::{DocPath, LoadError};
use crate::instance::{InstanceEntry, InstanceTable, PendingReference};
use crate::material::{Material, MaterialId, MaterialTable};
use crate::math::transform::{compose, TransformDirective, DIRECTIVE_KEYS};
use crate::schema::Family;
use crate::shape::{merge_kd_fields, Geometry, InstanceSite, ShapeDef, ACCELERATED_SHAPES};
use crate::value::CoercedValue;
use crate::variant::Variant;

#[derive(Debug)]
pub enum SceneNode {
    Material(MaterialNode),
    Transform(TransformNode),
    Shape(ShapeNode),
}

#[derive(Debug)]
pub struct MaterialNode {
    pub id: MaterialId,
    pub path: DocPath,
    pub children: Vec<SceneNode>,
}

#[derive(Debug)]
pub struct TransformNode {
    /// The block's own composed directives
    pub local: Mat4,
    /// Accumulated transform from this block to world space
    pub world: Mat4,
    pub path: DocPath,
    pub children: Vec<SceneNode>,
}

#[derive(Debug)]
pub struct ShapeNode {
    pub name: Option<String>,
    pub geometry: Geometry,
    /// Effective material: the override if any, else the inherited one
    pub material: MaterialId,
    pub material_override: Option<MaterialId>,
    /// Placement of the shape's object space, shared by a definition and its instances
    pub to_world: Mat4,
    /// Effective spatial-accelerator hints
    pub accel: Arc<Variant>,
    pub path: DocPath,
}

impl SceneNode {
    pub fn children(&self) -> &[SceneNode] {
        match self {
            SceneNode::Material(m) => &m.children,
            SceneNode::Transform(t) => &t.children,
            SceneNode::Shape(s) => match &s.geometry {
                Geometry::Defined(def) => &def.children,
                Geometry::Instance(_) => &[],
            },
        }
    }

    /// Visits this node and its descendants in document order, without entering instances
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SceneNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeNode> {
        match self {
            SceneNode::Shape(s) => Some(s),
            _ => None,
        }
    }
}

impl ShapeNode {
    /// Full primitive-to-world transform, including the definition's own placement (sphere
    /// `position`/`radius`). `None` for an instance site that is not resolved.
    pub fn primitive_to_world(&self) -> Option<Mat4> {
        let def = self.geometry.definition()?;
        Some(self.to_world * def.local_transform())
    }
}

/// State inherited by nodes from their ancestors
#[derive(Debug, Clone)]
pub struct InheritedEnv {
    pub material: MaterialId,
    pub world: Mat4,
    pub accel: Arc<Variant>,
}

impl InheritedEnv {
    /// Environment at the scene root: default material, identity transform, default kd-tree
    pub fn root(dispatcher: &mut Dispatcher) -> Result<Self, Vec<LoadError>> {
        let accel = dispatcher.dispatch(
            Family::SpatialAccel,
            &RawValue::String("kdTree".to_owned()),
            None,
            &DocPath::root(),
        )?;
        Ok(Self {
            material: MaterialId::DEFAULT,
            world: Mat4::IDENTITY,
            accel: Arc::new(accel),
        })
    }
}

/// Everything the builder produced besides the tree itself
#[derive(Debug)]
pub struct BuildOutput {
    pub materials: MaterialTable,
    pub instances: InstanceTable,
    pub pending: Vec<PendingReference>,
    pub background: Option<Background>,
}

/// The `background` element of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// Every `emitter` child, in document order. A valid background has exactly one.
    pub emitters: Vec<Variant>,
    pub path: DocPath,
}

impl Background {
    pub fn emitter(&self) -> Option<&Variant> {
        match self.emitters.as_slice() {
            [emitter] => Some(emitter),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Body {
    Scene,
    Material,
    Transform,
    ShapeSet,
}

pub struct Builder<'d, 'r> {
    dispatcher: &'d mut Dispatcher<'r>,
    materials: MaterialTable,
    instances: InstanceTable,
    pending: Vec<PendingReference>,
    background: Option<Background>,
    /// Names of the named shape sets currently being built
    enclosing: Vec<String>,
    errors: Vec<LoadError>,
}

impl<'d, 'r> Builder<'d, 'r> {
    pub fn new(dispatcher: &'d mut Dispatcher<'r>) -> Result<Self, Vec<LoadError>> {
        let materials = MaterialTable::new(dispatcher.registry())?;
        Ok(Self {
            dispatcher,
            materials,
            instances: InstanceTable::new(),
            pending: Vec::new(),
            background: None,
            enclosing: Vec::new(),
            errors: Vec::new(),
        })
    }

    /// Builds a `scene` object into the root shape set.
    ///
    /// Failing subtrees are reported and skipped so that their siblings are still checked.
    pub fn build(&mut self, scene: &RawValue, env: &InheritedEnv, path: &DocPath) -> Result<SceneNode, Vec<LoadError>> {
        let errors_before = self.errors.len();
        let root = match scene.as_mapping() {
            Some(entries) => {
                let children = self.build_body(entries, Body::Scene, env, path);
                let variant = Variant::new(Family::Shape, "shapeSet");
                SceneNode::Shape(ShapeNode {
                    name: None,
                    geometry: Geometry::Defined(Arc::new(ShapeDef { variant, children })),
                    material: env.material,
                    material_override: None,
                    to_world: env.world,
                    accel: env.accel.clone(),
                    path: path.clone(),
                })
            }
            None => return Err(vec![LoadError::mismatch(path, "scene object", scene.kind())]),
        };
        if self.errors.len() > errors_before {
            Err(self.errors[errors_before..].to_vec())
        } else {
            Ok(root)
        }
    }

    pub fn finish(self) -> BuildOutput {
        BuildOutput {
            materials: self.materials,
            instances: self.instances,
            pending: self.pending,
            background: self.background,
        }
    }

    fn report(&mut self, errors: impl IntoIterator<Item = LoadError>) {
        self.errors.extend(errors);
    }

    fn is_node_key(&self, key: &str) -> bool {
        matches!(key, "material" | "transform" | "shape") || self.dispatcher.registry().is_tag(Family::Shape, key)
    }

    fn build_body(
        &mut self,
        entries: &[(String, RawValue)],
        body: Body,
        env: &InheritedEnv,
        path: &DocPath,
    ) -> Vec<SceneNode> {
        let mut children = Vec::new();
        for ((key, raw), child_path) in entries.iter().zip(child_paths(entries, path)) {
            let node = match key.as_str() {
                "material" => self.build_material(raw, env, &child_path),
                "transform" => self.build_transform(raw, env, &child_path),
                "shape" => self.build_shape(raw, None, env, &child_path),
                "background" if body == Body::Scene => {
                    self.build_background(raw, &child_path);
                    None
                }
                k if self.dispatcher.registry().is_tag(Family::Shape, k) => {
                    self.build_shape(raw, Some(k), env, &child_path)
                }
                // handled by the enclosing block
                k if body == Body::Transform && DIRECTIVE_KEYS.contains(&k) => None,
                _ if body == Body::Material || body == Body::ShapeSet => None,
                k => {
                    if let Err(err) = self.dispatcher.unknown_field(path, k) {
                        self.report([err]);
                    }
                    None
                }
            };
            children.extend(node);
        }
        children
    }

    fn build_material(&mut self, raw: &RawValue, env: &InheritedEnv, path: &DocPath) -> Option<SceneNode> {
        let entries = match raw {
            RawValue::Null => {
                return Some(SceneNode::Material(MaterialNode {
                    id: MaterialId::DEFAULT,
                    path: path.clone(),
                    children: vec![],
                }))
            }
            RawValue::Mapping(entries) => entries,
            other => {
                self.report([LoadError::mismatch(path, "material object", other.kind())]);
                return None;
            }
        };

        let id = self.material_block(entries, path)?;
        log::debug!("{path}: material {}", id.0);

        // a material changes what its children are made of, never where they are
        let child_env = InheritedEnv {
            material: id,
            ..env.clone()
        };
        let children = self.build_body(entries, Body::Material, &child_env, path);
        Some(SceneNode::Material(MaterialNode {
            id,
            path: path.clone(),
            children,
        }))
    }

    /// Coerces the fields of a material block and stores the material
    fn material_block(&mut self, entries: &[(String, RawValue)], path: &DocPath) -> Option<MaterialId> {
        let registry = self.dispatcher.registry();
        let is_node = |key: &str| {
            matches!(key, "material" | "transform" | "shape") || registry.is_tag(Family::Shape, key)
        };
        let block = self
            .dispatcher
            .coerce_fields(registry.material(), entries, &is_node, path);
        match block.and_then(|block| Material::from_block(block, path).map_err(|e| vec![e])) {
            Ok(material) => Some(self.materials.insert(material)),
            Err(errors) => {
                self.report(errors);
                None
            }
        }
    }

    fn build_transform(&mut self, raw: &RawValue, env: &InheritedEnv, path: &DocPath) -> Option<SceneNode> {
        let Some(entries) = raw.as_mapping() else {
            self.report([LoadError::mismatch(path, "transform object", raw.kind())]);
            return None;
        };

        let mut directives = Vec::new();
        let mut failed = false;
        for ((key, value), directive_path) in entries.iter().zip(child_paths(entries, path)) {
            match TransformDirective::from_raw(key, value, &directive_path) {
                Ok(Some(directive)) => directives.push(directive),
                Ok(None) => {}
                Err(err) => {
                    self.report([err]);
                    failed = true;
                }
            }
        }
        if failed {
            return None;
        }

        let local = compose(&directives);
        let world = env.world * local;
        log::debug!("{path}: transform with {} directive(s)", directives.len());

        let child_env = InheritedEnv {
            world,
            ..env.clone()
        };
        let children = self.build_body(entries, Body::Transform, &child_env, path);
        Some(SceneNode::Transform(TransformNode {
            local,
            world,
            path: path.clone(),
            children,
        }))
    }

    fn build_shape(
        &mut self,
        raw: &RawValue,
        shorthand: Option<&str>,
        env: &InheritedEnv,
        path: &DocPath,
    ) -> Option<SceneNode> {
        let Some(entries) = raw.as_mapping() else {
            self.report([LoadError::mismatch(path, "shape object", raw.kind())]);
            return None;
        };

        let is_set = shorthand == Some("shapeSet") || raw.get("type").and_then(RawValue::as_str) == Some("shapeSet");
        // inside a set, `material` keys are child material nodes
        let material_override = if is_set {
            None
        } else {
            self.material_override(entries, path)?
        };
        let material = material_override.unwrap_or(env.material);

        if let Some(instance) = raw.get("instance") {
            return self.build_instance(instance, entries, material, material_override, env, path);
        }

        let registry = self.dispatcher.registry();
        let skip = |key: &str| {
            key == "material"
                || (is_set && (matches!(key, "transform" | "shape") || registry.is_tag(Family::Shape, key)))
        };
        let mut variant = match self.dispatcher.dispatch_filtered(Family::Shape, raw, shorthand, &skip, path) {
            Ok(variant) => variant,
            Err(errors) => {
                self.report(errors);
                return None;
            }
        };

        let accel = if ACCELERATED_SHAPES.contains(&variant.tag) {
            let mut accel = match variant.take("spatialAccel") {
                Some(CoercedValue::Variant(own)) => *own,
                _ => (*env.accel).clone(),
            };
            for key in merge_kd_fields(&mut variant, &mut accel) {
                self.dispatcher
                    .warn(&path.key(key), format!("ignored for `{}` accelerator", accel.tag));
            }
            Arc::new(accel)
        } else {
            env.accel.clone()
        };

        let name = variant.str("name").map(str::to_owned);
        let children = if variant.tag == "shapeSet" {
            let child_env = InheritedEnv {
                material,
                world: env.world,
                accel: accel.clone(),
            };
            if let Some(name) = &name {
                self.enclosing.push(name.clone());
            }
            let children = self.build_body(entries, Body::ShapeSet, &child_env, path);
            if name.is_some() {
                self.enclosing.pop();
            }
            children
        } else {
            vec![]
        };

        log::debug!("{path}: {} shape{}", variant.tag, name.as_deref().map(|n| format!(" `{n}`")).unwrap_or_default());
        let def = Arc::new(ShapeDef { variant, children });
        if let Some(name) = &name {
            if let Err(err) = self.instances.register(name, InstanceEntry::Shape(def.clone()), path) {
                self.report([err]);
            }
        }

        Some(SceneNode::Shape(ShapeNode {
            name,
            to_world: env.world,
            geometry: Geometry::Defined(def),
            material,
            material_override,
            accel,
            path: path.clone(),
        }))
    }

    fn build_instance(
        &mut self,
        instance: &RawValue,
        entries: &[(String, RawValue)],
        material: MaterialId,
        material_override: Option<MaterialId>,
        env: &InheritedEnv,
        path: &DocPath,
    ) -> Option<SceneNode> {
        let Some(target) = instance.as_str() else {
            self.report([LoadError::mismatch(&path.key("instance"), "shape name", instance.kind())]);
            return None;
        };

        let mut name = None;
        for (key, value) in entries {
            match key.as_str() {
                "instance" | "material" => {}
                "name" => match value.as_str() {
                    Some(n) => name = Some(n.to_owned()),
                    None => {
                        self.report([LoadError::mismatch(&path.key("name"), "string", value.kind())]);
                        return None;
                    }
                },
                other => {
                    if let Err(err) = self.dispatcher.unknown_field(path, other) {
                        self.report([err]);
                    }
                }
            }
        }

        let site = Arc::new(InstanceSite::new(target, path));
        if let Some(name) = &name {
            if let Err(err) = self.instances.register(name, InstanceEntry::Instance(site.clone()), path) {
                self.report([err]);
            }
        }
        self.pending.push(PendingReference {
            site: site.clone(),
            enclosing: self.enclosing.clone(),
            declared_as: name.clone(),
        });
        log::debug!("{path}: instance of `{target}`");

        Some(SceneNode::Shape(ShapeNode {
            name,
            geometry: Geometry::Instance(site),
            material,
            material_override,
            to_world: env.world,
            accel: env.accel.clone(),
            path: path.clone(),
        }))
    }

    /// `Ok(None)` when the shape has no material of its own, `None` if the override is invalid
    fn material_override(&mut self, entries: &[(String, RawValue)], path: &DocPath) -> Option<Option<MaterialId>> {
        let mut overrides = entries.iter().filter(|(key, _)| key == "material");
        let Some((_, raw)) = overrides.next() else {
            return Some(None);
        };
        let override_path = path.key("material");
        if overrides.next().is_some() {
            self.report([LoadError::structural(&override_path, "a shape takes at most one material")]);
            return None;
        }
        let Some(block) = raw.as_mapping() else {
            self.report([LoadError::mismatch(&override_path, "material object", raw.kind())]);
            return None;
        };
        if let Some((key, _)) = block.iter().find(|(key, _)| self.is_node_key(key)) {
            self.report([LoadError::structural(
                &override_path.key(key),
                "a shape's material cannot contain nodes",
            )]);
            return None;
        }
        self.material_block(block, &override_path).map(Some)
    }

    fn build_background(&mut self, raw: &RawValue, path: &DocPath) {
        if self.background.is_some() {
            self.report([LoadError::structural(path, "scene may contain at most one background")]);
            return;
        }
        let Some(entries) = raw.as_mapping() else {
            self.report([LoadError::mismatch(path, "background object", raw.kind())]);
            return;
        };
        let mut emitters = Vec::new();
        for ((key, value), child_path) in entries.iter().zip(child_paths(entries, path)) {
            if key != "emitter" {
                self.report([LoadError::structural(
                    &child_path,
                    "a background contains only its emitter",
                )]);
                continue;
            }
            match self.dispatcher.dispatch(Family::Background, value, None, &child_path) {
                Ok(emitter) => emitters.push(emitter),
                Err(errors) => self.report(errors),
            }
        }
        self.background = Some(Background {
            emitters,
            path: path.clone(),
        });
    }
}

/// Paths of the entries of an object; keys that occur more than once get an occurrence index
fn child_paths(entries: &[(String, RawValue)], path: &DocPath) -> Vec<DocPath> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    entries
        .iter()
        .map(|(key, _)| {
            let total = entries.iter().filter(|(k, _)| k == key).count();
            let occurrence = match seen.iter_mut().find(|(k, _)| k == key) {
                Some((_, n)) => {
                    *n += 1;
                    *n
                }
                None => {
                    seen.push((key, 0));
                    0
                }
            };
            if total > 1 {
                path.key(key).index(occurrence)
            } else {
                path.key(key)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Registry;
    use glam::Vec3;

    #[derive(Debug)]
    struct Built {
        root: SceneNode,
        output: BuildOutput,
    }

    fn build(text: &str) -> Result<Built, Vec<LoadError>> {
        let raw = RawValue::parse(text).unwrap();
        let mut dispatcher = Dispatcher::new(Registry::global(), false);
        let env = InheritedEnv::root(&mut dispatcher)?;
        let mut builder = Builder::new(&mut dispatcher)?;
        let root = builder.build(&raw, &env, &DocPath::root().key("scene"))?;
        Ok(Built {
            root,
            output: builder.finish(),
        })
    }

    fn shapes(root: &SceneNode) -> Vec<&ShapeNode> {
        let mut shapes = Vec::new();
        root.walk(&mut |node| {
            if let Some(shape) = node.as_shape() {
                shapes.push(shape);
            }
        });
        // the root shape set itself
        shapes.remove(0);
        shapes
    }

    #[test]
    fn repeated_material_keys_are_siblings() {
        let built = build(
            r#"{
                "material": {"bsdf": {"type": "diffuse", "kd": 0.1}, "plane": {}, "plane": {}},
                "material": {"bsdf": {"type": "phong"}, "sphere": {}}
            }"#,
        )
        .unwrap();
        let top = built.root.children();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].children().len(), 2);
        let shapes = shapes(&built.root);
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].material, MaterialId(1));
        assert_eq!(shapes[2].material, MaterialId(2));
        assert_eq!(shapes[1].path.to_string(), "scene.material[0].plane[1]");
        assert_eq!(built.output.materials.len(), 3);
    }

    #[test]
    fn shorthand_equals_explicit_type() {
        let short = build(r#"{"sphere": {}}"#).unwrap();
        let long = build(r#"{"shape": {"type": "sphere"}}"#).unwrap();
        let (a, b) = (shapes(&short.root)[0], shapes(&long.root)[0]);
        assert_eq!(a.geometry.definition().unwrap().variant, b.geometry.definition().unwrap().variant);
        assert_eq!(a.to_world, b.to_world);
        assert_eq!(a.material, b.material);
    }

    #[test]
    fn materials_do_not_move_children() {
        let built = build(
            r#"{"transform": {"translate": [1, 0, 0], "material": {"transform": {"translate": [0, 2, 0], "cube": {}}}}}"#,
        )
        .unwrap();
        let cube = shapes(&built.root)[0];
        let p = cube.to_world.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        assert_eq!(cube.material, MaterialId(1));
    }

    #[test]
    fn shape_material_override() {
        let built = build(r#"{"material": {"cube": {"material": {"bsdf": "absorbent"}}, "cone": {}}}"#).unwrap();
        let shapes = shapes(&built.root);
        assert_eq!(shapes[0].material_override, Some(MaterialId(2)));
        assert_eq!(shapes[0].material, MaterialId(2));
        assert_eq!(shapes[1].material_override, None);
        assert_eq!(shapes[1].material, MaterialId(1));
        assert_eq!(built.output.materials.get(MaterialId(2)).unwrap().bsdf.tag, "absorbent");
    }

    #[test]
    fn shape_sets_group_children_and_accelerators() {
        let built = build(
            r#"{"shapeSet": {"name": "pair", "spatialAccel": "naive", "sphere": {}, "cube": {}}}"#,
        )
        .unwrap();
        let shapes = shapes(&built.root);
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].accel.tag, "naive");
        assert_eq!(shapes[1].accel.tag, "naive");
        assert!(built.output.instances.contains("pair"));
    }

    #[test]
    fn shape_sets_hold_material_nodes() {
        let built = build(
            r#"{"shapeSet": {
                "material": {"bsdf": "absorbent", "cube": {}},
                "material": {"sphere": {}},
                "cone": {}
            }}"#,
        )
        .unwrap();
        let set = shapes(&built.root)[0];
        assert_eq!(set.material_override, None);
        let nodes = built.root.children()[0].children();
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[0], SceneNode::Material(_)));
        assert!(matches!(nodes[1], SceneNode::Material(_)));

        let shapes = shapes(&built.root);
        assert_eq!(shapes[1].path.to_string(), "scene.shapeSet.material[0].cube");
        assert_eq!(built.output.materials.get(shapes[1].material).unwrap().bsdf.tag, "absorbent");
        assert_eq!(shapes[2].material, MaterialId(2));
        assert_eq!(shapes[3].material, MaterialId::DEFAULT);
    }

    #[test]
    fn instances_share_primitive_placement() {
        let built = build(
            r#"{"sphere": {"name": "s", "position": [5, 0, 0], "radius": 2},
                "transform": {"translate": [0, 1, 0], "shape": {"instance": "s"}}}"#,
        )
        .unwrap();
        built.output.instances.resolve_all(&built.output.pending).unwrap();

        let shapes = shapes(&built.root);
        let (master, instance) = (shapes[0], shapes[1]);
        assert_eq!(master.to_world, Mat4::IDENTITY);
        let centre = |shape: &ShapeNode| shape.primitive_to_world().unwrap().transform_point3(Vec3::ZERO);
        assert!(centre(master).abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
        assert!(centre(instance).abs_diff_eq(Vec3::new(5.0, 1.0, 0.0), 1e-6));
        let edge = instance.primitive_to_world().unwrap().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(edge.abs_diff_eq(Vec3::new(7.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn inline_kd_fields() {
        let built = build(r#"{"blob": {"metaObjects": ["ball"], "spatialAccel": "kdTree", "kdMaxDepth": 16}}"#).unwrap();
        let blob = shapes(&built.root)[0];
        assert_eq!(blob.accel.uint("kdMaxDepth"), Some(16));
        assert!(blob.geometry.definition().unwrap().variant.get("kdMaxDepth").is_none());
    }

    #[test]
    fn instance_sites_are_recorded() {
        let built = build(r#"{"shape": {"instance": "later"}, "mesh": {"name": "later", "path": "a.obj"}}"#).unwrap();
        assert_eq!(built.output.pending.len(), 1);
        assert_eq!(built.output.pending[0].site.name, "later");
        assert!(built.output.instances.contains("later"));
    }

    #[test]
    fn sibling_errors_are_all_reported() {
        let errors = build(
            r#"{"sphere": {"radius": -1}, "material": {"bsdf": {"type": "velvet"}}, "transform": {"scale": 2}}"#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], LoadError::RangeViolation { .. }));
        assert!(matches!(errors[1], LoadError::UnknownVariant { .. }));
        assert!(matches!(errors[2], LoadError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn backgrounds() {
        let built = build(r#"{"background": {"emitter": {"type": "environment", "path": "sky.hdr"}}}"#).unwrap();
        let background = built.output.background.unwrap();
        assert_eq!(background.emitter().unwrap().str("coords"), Some("spherical"));

        let built = build(r#"{"background": {}}"#).unwrap();
        assert!(built.output.background.unwrap().emitter().is_none());

        let errors = build(r#"{"background": {}, "background": {}}"#).unwrap_err();
        assert!(matches!(&errors[..], [LoadError::StructuralViolation { .. }]));
    }

    #[test]
    fn duplicate_names() {
        let errors = build(r#"{"cube": {"name": "a"}, "cone": {"name": "a"}}"#).unwrap_err();
        assert!(matches!(&errors[..], [LoadError::DuplicateInstanceName { .. }]));
    }
}
