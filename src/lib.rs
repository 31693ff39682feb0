// mrjar - Library module
// Declares multi-release archive builds on top of a generic build graph

pub mod config;
pub mod error;
pub mod execution;
pub mod graph;
pub mod identifier;
pub mod logging;
pub mod multi_release;
pub mod project;

// Re-export main types for easier access
pub use config::{ArchiveSection, BuildDescription, MultiReleaseSection, ProjectSection};
pub use error::{ConfigError, ExecutionError, GraphError, MrjarError, Result};
pub use execution::{
    DryRunRunner, ExecutionResult, ExecutorConfig, GraphExecutor, TaskExecutionResult,
    TaskOutcome, TaskRunner,
};
pub use graph::{
    ArchiveContent, ArchiveSpec, BuildGraph, ClasspathEntry, CompilationUnit, DependencySet,
    GraphSnapshot, InMemoryBuildGraph, Task, TaskKind, TaskSnapshot,
};
pub use identifier::{LanguageVersion, UnitIdentifier};
pub use logging::{ColorConfig, LogConfig, LogFormat};
pub use multi_release::{MultiReleaseConfig, VersionRegistry};
pub use project::{Project, ProjectLayout};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get formatted version string
pub fn version_info() -> String {
    format!("{NAME} {VERSION}")
}
