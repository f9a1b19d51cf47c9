//! Loader for Milton scene files.
//!
//! A scene file is a JSON document describing a renderer, a camera, an output image and a tree
//! of materials, transforms and shapes. Loading parses the document, checks every object against
//! the built-in [`Registry`] of variant types, builds the scene graph, resolves named instances and
//! finally validates cross-field constraints. Either a complete [`Scene`] comes out, or the full
//! list of problems found.
//!
//! ```no_run
//! let loaded = scenefile::load_file("scenes/cornell.js")?;
//! for shape in loaded.scene.shapes() {
//!     println!("{}", shape.path);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod camera;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod graph;
pub mod instance;
pub mod loader;
pub mod material;
pub mod math;
pub mod scene;
pub mod schema;
pub mod shape;
pub mod utils;
pub mod validate;
pub mod value;
pub mod variant;

pub use error::{Diagnostics, DocPath, LoadError, Warning};
pub use loader::{load_file, load_str, LoadOptions, Loaded, Loader};
pub use scene::Scene;
pub use schema::{Family, Registry};
pub use variant::Variant;
