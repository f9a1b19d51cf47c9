use crate::camera::CameraFrame;
use crate::graph::{Background, SceneNode, ShapeNode};
use crate::instance::InstanceTable;
use crate::material::{Material, MaterialId, MaterialTable};
use crate::variant::Variant;

/// A loaded, fully resolved scene
#[derive(Debug)]
pub struct Scene {
    pub version: f64,
    pub renderer: Variant,
    pub camera: Variant,
    pub output: Variant,
    /// Root shape set holding every node of the `scene` object
    pub root: SceneNode,
    pub background: Option<Background>,
    pub materials: MaterialTable,
    pub instances: InstanceTable,
}

impl Scene {
    /// Every shape node of the tree in document order, instance sites included
    pub fn shapes(&self) -> Vec<&ShapeNode> {
        let mut shapes = Vec::new();
        for child in self.root.children() {
            child.walk(&mut |node| {
                if let Some(shape) = node.as_shape() {
                    shapes.push(shape);
                }
            });
        }
        shapes
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn camera_frame(&self) -> Option<CameraFrame> {
        CameraFrame::from_variant(&self.camera)
    }

    /// Output image size in pixels. `size` (or `dimensions`) wins over `width`/`height`.
    pub fn resolution(&self) -> Option<(u64, u64)> {
        if let Some([w, h]) = ["size", "dimensions"]
            .into_iter()
            .find_map(|key| self.output.numbers(key))
            .and_then(|v| <[f64; 2]>::try_from(v).ok())
        {
            return Some((w as u64, h as u64));
        }
        Some((self.output.uint("width")?, self.output.uint("height")?))
    }
}
