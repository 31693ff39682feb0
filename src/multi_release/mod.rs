// Multi-release archive registration
// Each registered version gets its own compilation unit, classpath wiring,
// release directive, archive location and validation link

pub mod archive;
pub mod binder;
pub mod classpath;
pub mod compiler;
pub mod registry;
pub mod validation;

pub use archive::ArchiveAssembler;
pub use binder::SourceUnitBinder;
pub use classpath::ClasspathLinker;
pub use compiler::CompilerConfigurator;
pub use registry::VersionRegistry;
pub use validation::ValidationHook;

use crate::error::{GraphError, Result};
use crate::graph::BuildGraph;
use crate::identifier::{
    LanguageVersion, UnitIdentifier, CHECK_TASK, FIRST_MULTI_RELEASE_VERSION, MAIN_UNIT,
};
use crate::logging::utils::registration_span;
use std::collections::BTreeSet;

/// Registration context for one build invocation.
///
/// Owns the version registry; the graph it declares into is passed on every call.
#[derive(Debug, Clone)]
pub struct MultiReleaseConfig {
    registry: VersionRegistry,
    baseline_release: u32,
}

impl Default for MultiReleaseConfig {
    fn default() -> Self {
        Self::new(FIRST_MULTI_RELEASE_VERSION)
    }
}

impl MultiReleaseConfig {
    pub fn new(baseline_release: u32) -> Self {
        Self {
            registry: VersionRegistry::new(),
            baseline_release,
        }
    }

    /// Register one language version.
    ///
    /// Returns `Ok(false)` without touching the graph if the version was already registered.
    pub fn add_language_version<G: BuildGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        version: i64,
    ) -> Result<bool> {
        let version = LanguageVersion::new(version)?;
        self.register(graph, version)
    }

    /// Register several versions. Every value is validated and every new version
    /// preflighted before anything is declared, so a rejected batch declares nothing.
    /// Returns the number of versions that were newly registered.
    pub fn add_language_versions<G, I>(&mut self, graph: &mut G, versions: I) -> Result<usize>
    where
        G: BuildGraph + ?Sized,
        I: IntoIterator<Item = i64>,
    {
        let versions = versions
            .into_iter()
            .map(LanguageVersion::new)
            .collect::<Result<Vec<_>>>()?;

        let pending: BTreeSet<LanguageVersion> = versions
            .into_iter()
            .filter(|version| !self.registry.contains(*version))
            .collect();

        // distinct versions never share a unit name, so checking each against the graph is enough
        for &version in &pending {
            self.preflight(graph, &UnitIdentifier::for_version(version))?;
        }

        let mut added = 0;
        for version in pending {
            if self.register(graph, version)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn is_registered(&self, version: LanguageVersion) -> bool {
        self.registry.contains(version)
    }

    pub fn registered_versions(&self) -> Vec<LanguageVersion> {
        self.registry.versions().collect()
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    fn register<G: BuildGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        version: LanguageVersion,
    ) -> Result<bool> {
        if self.registry.contains(version) {
            tracing::debug!(version = %version, "Language version already registered");
            return Ok(false);
        }

        let _span = registration_span(version).entered();
        let id = UnitIdentifier::for_version(version);
        self.preflight(graph, &id)?;
        self.warn_if_ignored(version);

        SourceUnitBinder::bind(graph, &id)?;
        ClasspathLinker::link(graph, &id)?;
        CompilerConfigurator::configure(graph, &id)?;
        ArchiveAssembler::assemble(graph, &id)?;
        ValidationHook::attach(graph, &id)?;

        self.registry.register(version);
        tracing::info!(
            version = %version,
            unit = %id.unit_name(),
            archive_path = %id.archive_path().display(),
            "Registered language version"
        );
        Ok(true)
    }

    // Everything that can fail is checked here so a rejected version leaves no partial graph
    fn preflight<G: BuildGraph + ?Sized>(&self, graph: &G, id: &UnitIdentifier) -> Result<()> {
        if graph.unit(MAIN_UNIT).is_none() {
            return Err(GraphError::UnknownUnit {
                unit: MAIN_UNIT.to_string(),
            }
            .into());
        }

        for task in [CHECK_TASK, graph.archive().task.as_str()] {
            if graph.task(task).is_none() {
                return Err(GraphError::UnknownTask {
                    task: task.to_string(),
                    suggestion: None,
                }
                .into());
            }
        }

        if let Some(existing) = graph.unit(id.unit_name()) {
            let requested_root = id.source_root();
            if existing.source_root != requested_root {
                return Err(GraphError::IdentifierCollision {
                    unit: id.unit_name().to_string(),
                    existing_root: existing.source_root.clone(),
                    requested_root,
                }
                .into());
            }

            let compile_task = id.compile_task();
            if let Some(existing) = graph.task(&compile_task).and_then(|t| t.release) {
                if existing != id.version().get() {
                    return Err(GraphError::DirectiveConflict {
                        task: compile_task,
                        existing,
                        requested: id.version().get(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    fn warn_if_ignored(&self, version: LanguageVersion) {
        if version.get() < FIRST_MULTI_RELEASE_VERSION {
            tracing::warn!(
                version = %version,
                "Versions below {FIRST_MULTI_RELEASE_VERSION} are ignored by the multi-release loader"
            );
        } else if version.get() <= self.baseline_release {
            tracing::warn!(
                version = %version,
                baseline = self.baseline_release,
                "Version does not exceed the baseline release; the baseline classes already apply"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryBuildGraph;
    use crate::project::ProjectLayout;

    fn graph() -> InMemoryBuildGraph {
        InMemoryBuildGraph::new(&ProjectLayout::new("simple")).unwrap()
    }

    #[test]
    fn test_duplicate_registration_is_noop() {
        let mut graph = graph();
        let mut config = MultiReleaseConfig::default();

        assert!(config.add_language_version(&mut graph, 11).unwrap());
        let before = graph.snapshot();
        assert!(!config.add_language_version(&mut graph, 11).unwrap());
        assert_eq!(before, graph.snapshot());
    }

    #[test]
    fn test_invalid_version_in_batch_declares_nothing() {
        let mut graph = graph();
        let before = graph.snapshot();
        let mut config = MultiReleaseConfig::default();

        let err = config
            .add_language_versions(&mut graph, [11, 0, 17])
            .unwrap_err();
        assert!(err.to_string().contains("Invalid language version: 0"));
        assert!(config.registered_versions().is_empty());
        assert_eq!(before, graph.snapshot());
    }

    #[test]
    fn test_collision_in_batch_declares_nothing() {
        let mut graph = graph();
        graph
            .create_unit("java17", std::path::Path::new("src/legacy"))
            .unwrap();
        let before = graph.snapshot();
        let mut config = MultiReleaseConfig::default();

        let err = config
            .add_language_versions(&mut graph, [11, 17])
            .unwrap_err();
        assert!(err.to_string().contains("different source root"));
        assert!(config.registered_versions().is_empty());
        assert!(graph.unit("java11").is_none());
        assert!(!graph.archive().is_multi_release());
        assert_eq!(before, graph.snapshot());
    }

    #[test]
    fn test_batch_skips_registered_versions_before_preflight() {
        let mut graph = graph();
        let mut config = MultiReleaseConfig::default();
        config.add_language_version(&mut graph, 11).unwrap();

        assert_eq!(config.add_language_versions(&mut graph, [11, 17, 17]).unwrap(), 1);
        assert_eq!(
            config
                .registered_versions()
                .into_iter()
                .map(LanguageVersion::get)
                .collect::<Vec<_>>(),
            vec![11, 17]
        );
    }

    #[test]
    fn test_collision_leaves_graph_untouched() {
        let mut graph = graph();
        graph
            .create_unit("java11", std::path::Path::new("src/legacy"))
            .unwrap();
        let before = graph.snapshot();
        let mut config = MultiReleaseConfig::default();

        let err = config.add_language_version(&mut graph, 11).unwrap_err();
        assert!(err.is_configuration_time());
        assert!(!config.is_registered(LanguageVersion::new(11).unwrap()));
        assert_eq!(before, graph.snapshot());
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut graph = graph();
        let dyn_graph: &mut dyn BuildGraph = &mut graph;
        let mut config = MultiReleaseConfig::default();

        assert_eq!(config.add_language_versions(dyn_graph, [17, 11]).unwrap(), 2);
        assert!(graph.archive().is_multi_release());
    }
}
