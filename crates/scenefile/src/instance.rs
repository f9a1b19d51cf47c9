//! Named shapes and the `{"instance": name}` references to them.
//!
//! References are recorded while the scene is built and resolved in one pass once the whole
//! document is known, so a reference may appear before the shape it names.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{DocPath, LoadError};
use crate::shape::{InstanceSite, ShapeHandle};

#[derive(Debug, Clone)]
pub enum InstanceEntry {
    Shape(ShapeHandle),
    /// A named instance site, itself an alias for another name
    Instance(Arc<InstanceSite>),
}

/// A reference waiting for resolution
#[derive(Debug, Clone)]
pub struct PendingReference {
    pub site: Arc<InstanceSite>,
    /// Names of the shape sets the site is nested in, innermost last
    pub enclosing: Vec<String>,
    /// Name the site itself was declared under, if any
    pub declared_as: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceTable {
    entries: HashMap<String, (InstanceEntry, DocPath)>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, entry: InstanceEntry, path: &DocPath) -> Result<(), LoadError> {
        if let Some((_, first)) = self.entries.get(name) {
            return Err(LoadError::DuplicateInstanceName {
                path: path.clone(),
                name: name.to_owned(),
                first: first.clone(),
            });
        }
        log::debug!("{path}: registered shape `{name}`");
        self.entries.insert(name.to_owned(), (entry, path.clone()));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definition registered under `name`, following named instances
    pub fn lookup(&self, name: &str) -> Option<ShapeHandle> {
        let mut visited = HashSet::new();
        let mut current = name;
        loop {
            if !visited.insert(current) {
                return None;
            }
            match &self.entries.get(current)?.0 {
                InstanceEntry::Shape(handle) => return Some(handle.clone()),
                InstanceEntry::Instance(site) => current = &site.name,
            }
        }
    }

    /// Resolves every pending reference, reporting all dangling names and cycles
    pub fn resolve_all(&self, pending: &[PendingReference]) -> Result<(), Vec<LoadError>> {
        // name -> names its subtree refers to
        let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
        for reference in pending {
            let target = reference.site.name.as_str();
            for from in reference.enclosing.iter().chain(&reference.declared_as) {
                edges.entry(from.as_str()).or_default().push(target);
            }
        }

        let mut errors = Vec::new();
        for reference in pending {
            let site = &reference.site;
            if !self.contains(&site.name) {
                errors.push(LoadError::UnresolvedReference {
                    path: site.path.clone(),
                    name: site.name.clone(),
                });
                continue;
            }

            let reachable = reachable_from(&edges, &site.name);
            let cycle = reference
                .enclosing
                .iter()
                .chain(&reference.declared_as)
                .find(|name| reachable.contains(name.as_str()));
            if let Some(name) = cycle {
                errors.push(LoadError::structural(
                    &site.path,
                    format!("instance of `{}` leads back to `{name}`", site.name),
                ));
                continue;
            }

            match self.lookup(&site.name) {
                Some(handle) => site.resolve(handle),
                None => errors.push(LoadError::UnresolvedReference {
                    path: site.path.clone(),
                    name: site.name.clone(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn reachable_from<'a>(edges: &HashMap<&'a str, Vec<&'a str>>, start: &'a str) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(name) = stack.pop() {
        if seen.insert(name) {
            if let Some(next) = edges.get(name) {
                stack.extend(next.iter().copied());
            }
        }
    }
    seen
}
