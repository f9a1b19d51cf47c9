//! Checks spanning several fields or nodes, run once the scene is fully built.
//!
//! Ranges already enforced while coercing single fields are not checked again.

use crate::camera::CameraFrame;
use crate::error::{DocPath, LoadError};
use crate::graph::SceneNode;
use crate::schema::Range;
use crate::scene::Scene;
use crate::shape::Geometry;
use crate::value::CoercedValue;
use crate::variant::Variant;

/// Allowed values of a blob's iso-surface threshold
pub const BLOB_THRESHOLD: Range = Range::half_open(0.0, 0.2);

/// Validates `scene`, reporting every violation found
pub fn validate(scene: &Scene) -> Result<(), Vec<LoadError>> {
    let mut errors = Vec::new();
    let root = DocPath::root().key("scenefile");

    check_camera(&scene.camera, &root.key("camera"), &mut errors);
    check_output(&scene.output, &root.key("output"), &mut errors);

    if let Some(background) = &scene.background {
        match background.emitters.as_slice() {
            [emitter] => {
                let path = background.path.key("emitter");
                if emitter.tag == "environment" && emitter.str("path").map_or(true, str::is_empty) {
                    errors.push(LoadError::structural(&path.key("path"), "environment map path is empty"));
                }
            }
            emitters => errors.push(LoadError::structural(
                &background.path,
                format!("background must contain exactly one emitter, found {}", emitters.len()),
            )),
        }
    }

    for (_, material) in scene.materials.iter() {
        check_bsdf(&material.bsdf, &material.path.key("bsdf"), &mut errors);
    }

    for child in scene.root.children() {
        child.walk(&mut |node| {
            if let SceneNode::Shape(shape) = node {
                if let Geometry::Defined(def) = &shape.geometry {
                    check_shape(&def.variant, &shape.path, &mut errors);
                }
            }
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_camera(camera: &Variant, path: &DocPath, errors: &mut Vec<LoadError>) {
    let Some(frame) = CameraFrame::from_variant(camera) else {
        return;
    };
    if frame.is_degenerate() {
        errors.push(LoadError::structural(
            &path.key("up"),
            format!("up vector {} is collinear with the viewing direction {}", frame.up, frame.look),
        ));
    }
    if let (Some(near), Some(far)) = (camera.real("near"), camera.real("far")) {
        if near >= far {
            errors.push(LoadError::structural(
                &path.key("near"),
                format!("near plane ({near}) must be closer than far plane ({far})"),
            ));
        }
    }
}

fn check_output(output: &Variant, path: &DocPath, errors: &mut Vec<LoadError>) {
    for key in ["size", "dimensions"] {
        let Some(&[w, h]) = output.numbers(key) else {
            continue;
        };
        for (axis, given) in [("width", w), ("height", h)] {
            if !output.is_explicit(axis) {
                continue;
            }
            if let Some(explicit) = output.uint(axis) {
                if explicit as f64 != given {
                    errors.push(LoadError::structural(
                        &path.key(key),
                        format!("{key} {given} disagrees with {axis} {explicit}"),
                    ));
                }
            }
        }
    }
}

fn check_bsdf(bsdf: &Variant, path: &DocPath, errors: &mut Vec<LoadError>) {
    if bsdf.tag != "aggregate" {
        return;
    }
    let bsdfs = bsdf.list("bsdfs").unwrap_or_default();
    let weights = bsdf.list("weights").unwrap_or_default();
    if bsdfs.is_empty() {
        errors.push(LoadError::structural(&path.key("bsdfs"), "aggregate needs at least one bsdf"));
    }
    if weights.is_empty() {
        errors.push(LoadError::structural(&path.key("weights"), "aggregate needs at least one weight"));
    }
    if bsdfs.len() != weights.len() {
        errors.push(LoadError::structural(
            path,
            format!("aggregate has {} bsdfs but {} weights", bsdfs.len(), weights.len()),
        ));
    }
    for (i, inner) in bsdfs.iter().enumerate() {
        if let Some(inner) = inner.as_variant() {
            check_bsdf(inner, &path.key("bsdfs").index(i), errors);
        }
    }
}

fn check_shape(shape: &Variant, path: &DocPath, errors: &mut Vec<LoadError>) {
    match shape.tag {
        "blob" => {
            if let Some(threshold) = shape.real("threshold") {
                if !BLOB_THRESHOLD.contains(threshold) {
                    errors.push(LoadError::RangeViolation {
                        path: path.key("threshold"),
                        value: threshold,
                        range: BLOB_THRESHOLD,
                    });
                }
            }
            if shape.list("metaObjects").map_or(true, <[CoercedValue]>::is_empty) {
                errors.push(LoadError::structural(&path.key("metaObjects"), "blob has no meta objects"));
            }
        }
        "mesh" => {
            if shape.str("path").map_or(true, str::is_empty) {
                errors.push(LoadError::structural(&path.key("path"), "mesh path is empty"));
            }
        }
        _ => {}
    }
}
