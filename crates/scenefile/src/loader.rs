//! Entry points: text or files in, validated [`Scene`] out.

use std::path::Path;

use anyhow::Context;
use rayon::prelude::*;

use crate::dispatch::Dispatcher;
use crate::document::RawValue;
use crate::error::{Diagnostics, DocPath, LoadError, Warning};
use crate::graph::{Builder, InheritedEnv};
use crate::schema::{Family, FieldSpec, FieldType, Registry};
use crate::scene::Scene;
use crate::utils::timer::PhaseTimings;
use crate::validate::validate;
use crate::variant::Variant;

const VERSION: FieldSpec = FieldSpec::optional("version", FieldType::Real);

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Unknown fields are errors instead of warnings
    pub strict: bool,
    /// Accept comments, trailing commas and `.5`-style numbers
    pub relaxed_syntax: bool,
    /// Renderer used when the document declares none
    pub default_renderer: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: false,
            relaxed_syntax: true,
            default_renderer: "pathTracer".to_owned(),
        }
    }
}

/// A successfully loaded scene and what was noticed on the way
#[derive(Debug)]
pub struct Loaded {
    pub scene: Scene,
    pub warnings: Vec<Warning>,
    pub timings: PhaseTimings,
}

pub struct Loader<'r> {
    registry: &'r Registry,
    options: LoadOptions,
}

impl Default for Loader<'static> {
    fn default() -> Self {
        Self::new(Registry::global(), LoadOptions::default())
    }
}

impl<'r> Loader<'r> {
    pub fn new(registry: &'r Registry, options: LoadOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn load_str(&self, text: &str) -> Result<Loaded, Diagnostics> {
        let mut timings = PhaseTimings::new();
        let raw = timings
            .time("parse", || {
                if self.options.relaxed_syntax {
                    RawValue::parse_relaxed(text)
                } else {
                    RawValue::parse(text)
                }
            })
            .map_err(|err| Diagnostics::new(vec![err], vec![]))?;
        self.load_timed(&raw, timings)
    }

    /// Loads an already parsed document
    pub fn load_value(&self, raw: &RawValue) -> Result<Loaded, Diagnostics> {
        self.load_timed(raw, PhaseTimings::new())
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> anyhow::Result<Loaded> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
        let loaded = self
            .load_str(&text)
            .with_context(|| format!("Could not load scene {}", path.display()))?;
        log::info!("loaded {} ({})", path.display(), loaded.timings);
        Ok(loaded)
    }

    /// Loads independent scene files in parallel. Results keep the order of `paths`.
    pub fn load_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<anyhow::Result<Loaded>> {
        paths.par_iter().map(|path| self.load_file(path)).collect()
    }

    fn load_timed(&self, raw: &RawValue, mut timings: PhaseTimings) -> Result<Loaded, Diagnostics> {
        let mut dispatcher = Dispatcher::new(self.registry, self.options.strict);
        let result = self.assemble(raw, &mut dispatcher, &mut timings);
        let warnings = dispatcher.take_warnings();
        for warning in &warnings {
            log::warn!("{warning}");
        }
        match result {
            Ok(scene) => Ok(Loaded {
                scene,
                warnings,
                timings,
            }),
            Err(errors) => {
                let diagnostics = Diagnostics::new(errors, warnings);
                log::debug!("{diagnostics}");
                Err(diagnostics)
            }
        }
    }

    fn assemble(
        &self,
        raw: &RawValue,
        dispatcher: &mut Dispatcher,
        timings: &mut PhaseTimings,
    ) -> Result<Scene, Vec<LoadError>> {
        let root = DocPath::root();
        let scenefile = match raw.as_mapping() {
            Some([(key, scenefile)]) if key == "scenefile" => scenefile,
            Some(_) => {
                return Err(vec![LoadError::structural(
                    &root,
                    "document must hold exactly one `scenefile` object",
                )])
            }
            None => return Err(vec![LoadError::mismatch(&root, "object", raw.kind())]),
        };
        let path = root.key("scenefile");
        let Some(entries) = scenefile.as_mapping() else {
            return Err(vec![LoadError::mismatch(&path, "scenefile object", scenefile.kind())]);
        };

        let mut errors = Vec::new();
        for (i, (key, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(k, _)| k == key) {
                errors.push(LoadError::structural(
                    &path.key(key),
                    format!("`{key}` is given more than once"),
                ));
            } else if !matches!(key.as_str(), "version" | "renderer" | "camera" | "output" | "scene") {
                if let Err(err) = dispatcher.unknown_field(&path, key) {
                    errors.push(err);
                }
            }
        }

        let version = match scenefile.get("version") {
            Some(raw) => match dispatcher.coerce_field(raw, &VERSION, &path.key("version")) {
                Ok(value) => value.as_f64(),
                Err(errs) => {
                    errors.extend(errs);
                    None
                }
            },
            None => None,
        };

        let mut header = |family: Family, key: &str, default: &str| -> Option<Variant> {
            let field_path = path.key(key);
            let result = match scenefile.get(key) {
                Some(raw) => dispatcher.dispatch(family, raw, None, &field_path),
                None => {
                    dispatcher.warn(&field_path, format!("no {key} given, using `{default}`"));
                    dispatcher.dispatch(family, &RawValue::String(default.to_owned()), None, &field_path)
                }
            };
            result.map_err(|errs| errors.extend(errs)).ok()
        };
        let renderer = header(Family::Renderer, "renderer", &self.options.default_renderer);
        let camera = header(Family::Camera, "camera", "pinhole");
        let output = header(Family::Output, "output", "reconstruction");

        let scene_path = path.key("scene");
        let Some(scene_raw) = scenefile.get("scene") else {
            errors.push(LoadError::missing(&path, "scene"));
            return Err(errors);
        };

        let built = timings.time("build", || {
            let env = InheritedEnv::root(dispatcher)?;
            let mut builder = Builder::new(dispatcher)?;
            let tree = builder.build(scene_raw, &env, &scene_path);
            Ok::<_, Vec<LoadError>>((tree, builder.finish()))
        });
        let (root, output_tables) = match built {
            Ok((Ok(tree), tables)) => (tree, tables),
            Ok((Err(errs), _)) | Err(errs) => {
                errors.extend(errs);
                return Err(errors);
            }
        };

        let (Some(renderer), Some(camera), Some(output)) = (renderer, camera, output) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        timings.time("resolve", || output_tables.instances.resolve_all(&output_tables.pending))?;

        let scene = Scene {
            version: version.unwrap_or(1.0),
            renderer,
            camera,
            output,
            root,
            background: output_tables.background,
            materials: output_tables.materials,
            instances: output_tables.instances,
        };
        timings.time("validate", || validate(&scene))?;
        log::debug!(
            "scene: {} shape(s), {} material(s), {} named",
            scene.shapes().len(),
            scene.materials.len(),
            scene.instances.len()
        );
        Ok(scene)
    }
}

/// Loads a scene from text with the built-in registry and default options
pub fn load_str(text: &str) -> Result<Loaded, Diagnostics> {
    Loader::default().load_str(text)
}

/// Loads a scene file with the built-in registry and default options
pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Loaded> {
    Loader::default().load_file(path)
}
