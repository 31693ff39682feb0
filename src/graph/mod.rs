// Declarative build graph consumed by the multi-release core
// The core never compiles anything; it only declares units, dependency sets, tasks and archive rules

pub mod memory;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use memory::{GraphSnapshot, InMemoryBuildGraph, TaskSnapshot};

/// One entry of a dependency set
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClasspathEntry {
    /// Compiled class output of another compilation unit
    UnitOutput(String),
    /// External library coordinate, e.g. `org.example:lib:1.0`
    Library(String),
}

/// A named, independently compiled body of source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub name: String,
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub compile_task: String,
    pub validation_task: String,
    pub compile_only_set: String,
    pub compile_classpath_set: String,
}

/// A named set of classpath entries that may extend other sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencySet {
    pub name: String,
    pub entries: BTreeSet<ClasspathEntry>,
    pub extends_from: BTreeSet<String>,
}

impl DependencySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Compiles one unit
    Compile,
    /// Per-unit validation owned by an external collaborator (license header check)
    Validation,
    /// Lifecycle task with no action of its own
    Aggregate,
    /// Packages unit outputs into the archive
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub name: String,
    pub kind: TaskKind,
    pub unit: Option<String>,
    /// Release directive, only meaningful for compile tasks
    pub release: Option<u32>,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
            unit: None,
            release: None,
        }
    }

    pub fn for_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Places a unit's compiled output under a path inside the archive
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ArchiveContent {
    pub into: PathBuf,
    pub unit: String,
}

/// Description of the final artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSpec {
    pub task: String,
    pub file_name: String,
    pub manifest: BTreeMap<String, String>,
    pub contents: BTreeSet<ArchiveContent>,
}

impl ArchiveSpec {
    pub fn new(task: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            file_name: file_name.into(),
            manifest: BTreeMap::new(),
            contents: BTreeSet::new(),
        }
    }

    pub fn is_multi_release(&self) -> bool {
        self.manifest
            .get(crate::identifier::MULTI_RELEASE_ATTRIBUTE)
            .is_some_and(|value| value == "true")
    }

    /// Archive paths and the unit placed there, sorted by path
    pub fn layout(&self) -> Vec<(PathBuf, String)> {
        self.contents
            .iter()
            .map(|content| (content.into.clone(), content.unit.clone()))
            .collect()
    }

    /// Paths of every unit placed under the versioned root
    pub fn versioned_paths(&self) -> Vec<PathBuf> {
        self.contents
            .iter()
            .filter(|content| content.into.starts_with(crate::identifier::VERSIONS_ROOT))
            .map(|content| content.into.clone())
            .collect()
    }

    /// Render `META-INF/MANIFEST.MF`
    pub fn manifest_text(&self) -> String {
        let mut text = String::from("Manifest-Version: 1.0\r\n");
        for (key, value) in &self.manifest {
            text.push_str(&format!("{key}: {value}\r\n"));
        }
        text
    }
}

/// Build-graph capabilities the multi-release core relies on.
///
/// The host build owns the graph; the core only declares entities and edges on it.
pub trait BuildGraph {
    /// Create a compilation unit rooted at `source_root`, together with its compile task,
    /// its dependency sets and its per-unit validation task.
    ///
    /// Returns `Ok(false)` when an identical unit already exists and fails when the name is
    /// already bound to a different source root.
    fn create_unit(&mut self, name: &str, source_root: &Path) -> Result<bool>;

    fn unit(&self, name: &str) -> Option<&CompilationUnit>;

    fn dependency_set(&self, name: &str) -> Option<&DependencySet>;

    /// Add an entry visible only while compiling `unit`
    fn add_compile_only(&mut self, unit: &str, entry: ClasspathEntry) -> Result<()>;

    /// Make `unit`'s compile classpath extend the dependency set `parent`
    fn extend_classpath(&mut self, unit: &str, parent: &str) -> Result<()>;

    fn task(&self, name: &str) -> Option<&Task>;

    /// Pin the release level emitted by a compile task
    fn set_release(&mut self, task: &str, release: u32) -> Result<()>;

    /// Declare that `task` cannot run before `prerequisite` has succeeded
    fn add_task_dependency(&mut self, task: &str, prerequisite: &str) -> Result<()>;

    fn set_manifest_attribute(&mut self, key: &str, value: &str);

    /// Place `unit`'s compiled output under `into` inside the archive
    fn add_archive_content(&mut self, unit: &str, into: &Path) -> Result<()>;

    fn archive(&self) -> &ArchiveSpec;
}
