// Project facade: one build invocation's graph plus its multi-release context
use crate::config::BuildDescription;
use crate::error::Result;
use crate::graph::{ArchiveSpec, GraphSnapshot, InMemoryBuildGraph};
use crate::identifier::{LanguageVersion, FIRST_MULTI_RELEASE_VERSION};
use crate::multi_release::MultiReleaseConfig;

/// Baseline shape of a project before any language version is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub name: String,
    pub group: Option<String>,
    /// Release level of the baseline compile task
    pub baseline_release: u32,
    /// Libraries on the baseline compile classpath
    pub dependencies: Vec<String>,
    pub archive_name: String,
    /// Whether packaging waits for the aggregate check
    pub archive_requires_validation: bool,
}

impl ProjectLayout {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            archive_name: format!("{name}.jar"),
            name,
            group: None,
            baseline_release: FIRST_MULTI_RELEASE_VERSION,
            dependencies: Vec::new(),
            archive_requires_validation: true,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_baseline_release(mut self, release: u32) -> Self {
        self.baseline_release = release;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = archive_name.into();
        self
    }

    pub fn with_archive_requires_validation(mut self, requires: bool) -> Self {
        self.archive_requires_validation = requires;
        self
    }
}

/// Owns everything declared during one build invocation
#[derive(Debug, Clone)]
pub struct Project {
    layout: ProjectLayout,
    graph: InMemoryBuildGraph,
    multi_release: MultiReleaseConfig,
}

impl Project {
    pub fn new(layout: ProjectLayout) -> Result<Self> {
        let graph = InMemoryBuildGraph::new(&layout)?;
        let multi_release = MultiReleaseConfig::new(layout.baseline_release);
        Ok(Self {
            layout,
            graph,
            multi_release,
        })
    }

    /// Declare a project from a parsed build description, registering its versions
    pub fn from_description(description: &BuildDescription) -> Result<Self> {
        let _span = crate::logging::utils::project_span(&description.project.name).entered();
        let mut project = Self::new(description.layout())?;
        project.add_language_versions(description.versions())?;
        Ok(project)
    }

    pub fn add_language_version(&mut self, version: i64) -> Result<bool> {
        self.multi_release
            .add_language_version(&mut self.graph, version)
    }

    pub fn add_language_versions<I>(&mut self, versions: I) -> Result<usize>
    where
        I: IntoIterator<Item = i64>,
    {
        self.multi_release
            .add_language_versions(&mut self.graph, versions)
    }

    pub fn registered_versions(&self) -> Vec<LanguageVersion> {
        self.multi_release.registered_versions()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn graph(&self) -> &InMemoryBuildGraph {
        &self.graph
    }

    pub fn archive(&self) -> &ArchiveSpec {
        use crate::graph::BuildGraph;
        self.graph.archive()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Close the declaration phase: verify the task graph can be scheduled
    /// and return its execution levels
    pub fn finalize(&self) -> Result<Vec<Vec<String>>> {
        let levels = self.graph.execution_levels()?;
        tracing::debug!(
            project = %self.layout.name,
            levels = levels.len(),
            versions = self.multi_release.registered_versions().len(),
            "Build graph finalized"
        );
        Ok(levels)
    }
}
