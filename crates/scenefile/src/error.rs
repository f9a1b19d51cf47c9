use std::fmt;

use crate::schema::{Family, Range};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a scene document, e.g. `scenefile.scene.material[1].bsdf.kd`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath(Vec<Segment>);

impl DocPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_owned()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Every way a scene document can be rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{path}: unknown {family} type `{tag}`")]
    UnknownVariant {
        path: DocPath,
        family: Family,
        tag: String,
    },
    #[error("{path}: missing required field `{field}`")]
    MissingRequiredField { path: DocPath, field: String },
    #[error("{path}: expected {expected}, found {found}")]
    FieldTypeMismatch {
        path: DocPath,
        expected: String,
        found: String,
    },
    #[error("{path}: {value} is outside {range}")]
    RangeViolation {
        path: DocPath,
        value: f64,
        range: Range,
    },
    #[error("{path}: shape name `{name}` is already declared at {first}")]
    DuplicateInstanceName {
        path: DocPath,
        name: String,
        first: DocPath,
    },
    #[error("{path}: no shape named `{name}` to instance")]
    UnresolvedReference { path: DocPath, name: String },
    #[error("{path}: {message}")]
    StructuralViolation { path: DocPath, message: String },
    #[error("{path}: unknown field `{field}`")]
    UnknownField { path: DocPath, field: String },
}

impl LoadError {
    pub fn structural(path: &DocPath, message: impl Into<String>) -> Self {
        Self::StructuralViolation {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn missing(path: &DocPath, field: &str) -> Self {
        Self::MissingRequiredField {
            path: path.clone(),
            field: field.to_owned(),
        }
    }

    pub fn mismatch(path: &DocPath, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::FieldTypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Document location the error is attributed to, if any
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            LoadError::Syntax { .. } => None,
            LoadError::UnknownVariant { path, .. }
            | LoadError::MissingRequiredField { path, .. }
            | LoadError::FieldTypeMismatch { path, .. }
            | LoadError::RangeViolation { path, .. }
            | LoadError::DuplicateInstanceName { path, .. }
            | LoadError::UnresolvedReference { path, .. }
            | LoadError::StructuralViolation { path, .. }
            | LoadError::UnknownField { path, .. } => Some(path),
        }
    }
}

/// Non-fatal finding, reported next to a successfully loaded scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: DocPath,
    pub message: String,
}

impl Warning {
    pub fn new(path: &DocPath, message: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Itemized list of everything wrong with a document. Never empty when returned as an error.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub errors: Vec<LoadError>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new(errors: Vec<LoadError>, warnings: Vec<Warning>) -> Self {
        Self { errors, warnings }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene rejected with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        let path = DocPath::root()
            .key("scenefile")
            .key("scene")
            .key("material")
            .index(1)
            .key("bsdf");
        assert_eq!(path.to_string(), "scenefile.scene.material[1].bsdf");
        assert_eq!(DocPath::root().to_string(), "<root>");
    }

    #[test]
    fn diagnostics_lists_every_error() {
        let path = DocPath::root().key("scenefile");
        let diagnostics = Diagnostics::new(
            vec![
                LoadError::missing(&path, "scene"),
                LoadError::structural(&path, "multiple renderer definitions"),
            ],
            vec![],
        );
        let text = diagnostics.to_string();
        assert!(text.starts_with("scene rejected with 2 error(s):"));
        assert!(text.contains("scenefile: missing required field `scene`"));
        assert!(text.contains("scenefile: multiple renderer definitions"));
    }
}
