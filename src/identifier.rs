// Deterministic naming for versioned compilation units
// Every component derives unit, task and path names from here so they always agree

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Name of the baseline compilation unit
pub const MAIN_UNIT: &str = "main";
/// Compile task of the baseline unit
pub const MAIN_COMPILE_TASK: &str = "compileJava";
/// Full compile classpath of the baseline unit
pub const MAIN_COMPILE_CLASSPATH: &str = "compileClasspath";
/// Per-unit validation task of the baseline unit
pub const MAIN_VALIDATION_TASK: &str = "licenseMain";
/// Project-wide aggregate validation task
pub const CHECK_TASK: &str = "check";
/// Archive packaging task
pub const ARCHIVE_TASK: &str = "jar";
/// Manifest attribute marking an archive as multi-release
pub const MULTI_RELEASE_ATTRIBUTE: &str = "Multi-Release";
/// Root under which the runtime looks up versioned classes
pub const VERSIONS_ROOT: &str = "META-INF/versions";

/// Lowest version the multi-release loader looks at
pub const FIRST_MULTI_RELEASE_VERSION: u32 = 9;

/// A validated language/bytecode version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct LanguageVersion(NonZeroU32);

impl LanguageVersion {
    /// Validate a raw version number. Zero, negative and out-of-range values are rejected.
    pub fn new(value: i64) -> Result<Self> {
        let raw = u32::try_from(value).map_err(|_| GraphError::InvalidVersion {
            value,
            reason: if value < 0 {
                "language versions must be positive".to_string()
            } else {
                format!("language versions must not exceed {}", u32::MAX)
            },
        })?;

        NonZeroU32::new(raw).map(Self).ok_or_else(|| {
            GraphError::InvalidVersion {
                value,
                reason: "language versions must be positive".to_string(),
            }
            .into()
        })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for LanguageVersion {
    type Error = crate::error::MrjarError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LanguageVersion> for u32 {
    fn from(version: LanguageVersion) -> Self {
        version.get()
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All names derived from one language version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIdentifier {
    version: LanguageVersion,
    name: String,
    capitalized: String,
}

impl UnitIdentifier {
    pub fn for_version(version: LanguageVersion) -> Self {
        let name = format!("java{version}");
        Self {
            version,
            capitalized: capitalize(&name),
            name,
        }
    }

    pub fn version(&self) -> LanguageVersion {
        self.version
    }

    /// Unit name, e.g. `java11`
    pub fn unit_name(&self) -> &str {
        &self.name
    }

    /// Source root, e.g. `src/main/java11`
    pub fn source_root(&self) -> PathBuf {
        PathBuf::from("src").join(MAIN_UNIT).join(&self.name)
    }

    pub fn compile_task(&self) -> String {
        compile_task_name(&self.name)
    }

    pub fn validation_task(&self) -> String {
        validation_task_name(&self.name)
    }

    pub fn compile_only_set(&self) -> String {
        compile_only_set_name(&self.name)
    }

    pub fn compile_classpath_set(&self) -> String {
        compile_classpath_set_name(&self.name)
    }

    /// Destination inside the archive, e.g. `META-INF/versions/11`
    pub fn archive_path(&self) -> PathBuf {
        PathBuf::from(VERSIONS_ROOT).join(self.version.to_string())
    }

    /// Capitalized unit name, e.g. `Java11`
    pub fn capitalized(&self) -> &str {
        &self.capitalized
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compile task for a unit: `compileJava` for main, `compileJava11Java` otherwise
pub fn compile_task_name(unit: &str) -> String {
    if unit == MAIN_UNIT {
        MAIN_COMPILE_TASK.to_string()
    } else {
        format!("compile{}Java", capitalize(unit))
    }
}

pub fn validation_task_name(unit: &str) -> String {
    format!("license{}", capitalize(unit))
}

pub fn compile_only_set_name(unit: &str) -> String {
    if unit == MAIN_UNIT {
        "compileOnly".to_string()
    } else {
        format!("{unit}CompileOnly")
    }
}

pub fn compile_classpath_set_name(unit: &str) -> String {
    if unit == MAIN_UNIT {
        MAIN_COMPILE_CLASSPATH.to_string()
    } else {
        format!("{unit}CompileClasspath")
    }
}

/// Compiled class output directory for a unit
pub fn output_dir(unit: &str) -> PathBuf {
    PathBuf::from("build")
        .join("classes")
        .join("java")
        .join(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_rejects_non_positive() {
        assert!(LanguageVersion::new(0).is_err());
        assert!(LanguageVersion::new(-11).is_err());
        assert!(LanguageVersion::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(LanguageVersion::new(17).unwrap().get(), 17);
    }

    #[test]
    fn test_identifier_names() {
        let id = UnitIdentifier::for_version(LanguageVersion::new(11).unwrap());
        assert_eq!(id.unit_name(), "java11");
        assert_eq!(id.capitalized(), "Java11");
        assert_eq!(id.source_root(), PathBuf::from("src/main/java11"));
        assert_eq!(id.compile_task(), "compileJava11Java");
        assert_eq!(id.validation_task(), "licenseJava11");
        assert_eq!(id.compile_only_set(), "java11CompileOnly");
        assert_eq!(id.compile_classpath_set(), "java11CompileClasspath");
        assert_eq!(id.archive_path(), PathBuf::from("META-INF/versions/11"));
    }

    #[test]
    fn test_main_unit_names() {
        assert_eq!(compile_task_name(MAIN_UNIT), "compileJava");
        assert_eq!(validation_task_name(MAIN_UNIT), "licenseMain");
        assert_eq!(compile_only_set_name(MAIN_UNIT), "compileOnly");
        assert_eq!(compile_classpath_set_name(MAIN_UNIT), "compileClasspath");
    }

    #[test]
    fn test_identifier_agrees_with_graph_names() {
        for version in [9, 11, 17, 21] {
            let id = UnitIdentifier::for_version(LanguageVersion::new(version).unwrap());
            assert_eq!(id.compile_task(), compile_task_name(id.unit_name()));
            assert_eq!(id.validation_task(), validation_task_name(id.unit_name()));
            assert_eq!(id.compile_only_set(), compile_only_set_name(id.unit_name()));
            assert_eq!(id.compile_classpath_set(), compile_classpath_set_name(id.unit_name()));
        }
    }

    #[test]
    fn test_version_deserializes_through_validation() {
        let ok: LanguageVersion = serde_yaml::from_str("17").unwrap();
        assert_eq!(ok.get(), 17);
        assert!(serde_yaml::from_str::<LanguageVersion>("-3").is_err());
    }
}
