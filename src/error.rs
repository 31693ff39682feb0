// Error handling framework for mrjar
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MrjarError>;

/// Main error type for mrjar with the full error hierarchy
#[derive(Debug, Error)]
pub enum MrjarError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("Build graph error: {0}")]
    Graph(#[from] Box<GraphError>),

    #[error("Graph execution failed: {0}")]
    Execution(#[from] Box<ExecutionError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

/// Build description errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
        file_path: Option<PathBuf>,
    },

    #[error("Build description not found: {path}")]
    NotFound {
        path: PathBuf,
        suggestion: Option<String>,
    },

    #[error("Invalid configuration value: {message}")]
    InvalidValue {
        message: String,
        field: String,
        value: String,
        expected: String,
        file_path: Option<PathBuf>,
    },

    #[error("Build description validation failed: {message}")]
    ValidationFailed {
        message: String,
        file_path: Option<PathBuf>,
        errors: Vec<String>,
    },
}

/// Structural errors raised while declaring the build graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Invalid language version: {value}")]
    InvalidVersion { value: i64, reason: String },

    #[error("Compilation unit '{unit}' already exists with a different source root")]
    IdentifierCollision {
        unit: String,
        existing_root: PathBuf,
        requested_root: PathBuf,
    },

    #[error("Unknown compilation unit: {unit}")]
    UnknownUnit { unit: String },

    #[error("Unknown task: {task}")]
    UnknownTask {
        task: String,
        suggestion: Option<String>,
    },

    #[error("Unknown dependency set: {name}")]
    UnknownDependencySet { name: String },

    #[error("Conflicting release directive for {task}: already {existing}, requested {requested}")]
    DirectiveConflict {
        task: String,
        existing: u32,
        requested: u32,
    },

    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency {
        cycle: Vec<String>,
        suggested_fix: Option<String>,
    },
}

/// Errors raised by the reference graph executor
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Task runner failed for {task}: {message}")]
    RunnerFailed { task: String, message: String },

    #[error("Build graph cannot be scheduled: {message}")]
    Unschedulable {
        message: String,
        problematic_tasks: Vec<String>,
    },
}

impl From<GraphError> for MrjarError {
    fn from(error: GraphError) -> Self {
        MrjarError::Graph(Box::new(error))
    }
}

impl From<ConfigError> for MrjarError {
    fn from(error: ConfigError) -> Self {
        MrjarError::Config(Box::new(error))
    }
}

impl From<ExecutionError> for MrjarError {
    fn from(error: ExecutionError) -> Self {
        MrjarError::Execution(Box::new(error))
    }
}

/// Format errors with colors and context
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_error(&self, error: &MrjarError) -> String {
        let mut output = if self.use_colors {
            format!("\x1b[31merror\x1b[0m: {error}")
        } else {
            format!("error: {error}")
        };

        match error {
            MrjarError::Config(config_err) => self.add_config_context(&mut output, config_err),
            MrjarError::Graph(graph_err) => self.add_graph_context(&mut output, graph_err),
            MrjarError::Execution(exec_err) => self.add_execution_context(&mut output, exec_err),
            MrjarError::Io(_) | MrjarError::Serialization(_) | MrjarError::Logging(_) => {}
        }

        output
    }

    fn add_config_context(&self, output: &mut String, error: &ConfigError) {
        match error {
            ConfigError::InvalidYaml {
                line: Some(line),
                column,
                file_path,
                ..
            } => {
                if let Some(path) = file_path {
                    output.push_str(&format!("\n  File: {}", path.display()));
                }
                match column {
                    Some(column) => output.push_str(&format!("\n  At: line {line}, column {column}")),
                    None => output.push_str(&format!("\n  At: line {line}")),
                }
            }
            ConfigError::NotFound {
                suggestion: Some(suggestion),
                ..
            } => {
                output.push_str(&format!("\n  Help: {suggestion}"));
            }
            ConfigError::InvalidValue {
                field,
                value,
                expected,
                ..
            } => {
                output.push_str(&format!("\n  Field: {field}"));
                output.push_str(&format!("\n  Value: {value}"));
                output.push_str(&format!("\n  Expected: {expected}"));
            }
            ConfigError::ValidationFailed { errors, .. } => {
                for (i, error) in errors.iter().enumerate() {
                    output.push_str(&format!("\n    {}: {}", i + 1, error));
                }
            }
            _ => {}
        }
    }

    fn add_graph_context(&self, output: &mut String, error: &GraphError) {
        match error {
            GraphError::InvalidVersion { reason, .. } => {
                output.push_str(&format!("\n  Reason: {reason}"));
            }
            GraphError::IdentifierCollision {
                existing_root,
                requested_root,
                ..
            } => {
                output.push_str(&format!("\n  Existing root: {}", existing_root.display()));
                output.push_str(&format!("\n  Requested root: {}", requested_root.display()));
            }
            GraphError::UnknownTask {
                suggestion: Some(suggestion),
                ..
            } => {
                output.push_str(&format!("\n  Help: {suggestion}"));
            }
            GraphError::CircularDependency {
                suggested_fix: Some(fix),
                ..
            } => {
                output.push_str(&format!("\n  Help: {fix}"));
            }
            _ => {}
        }
    }

    fn add_execution_context(&self, output: &mut String, error: &ExecutionError) {
        if let ExecutionError::Unschedulable {
            problematic_tasks, ..
        } = error
        {
            output.push_str(&format!("\n  Tasks: {}", problematic_tasks.join(", ")));
        }
    }
}

impl MrjarError {
    /// Create a user-friendly error message with context
    pub fn user_message(&self, use_colors: bool) -> String {
        let formatter = ErrorFormatter::new(use_colors);
        formatter.format_error(self)
    }

    /// Whether the error was raised while declaring the graph, before any task ran
    pub fn is_configuration_time(&self) -> bool {
        matches!(self, MrjarError::Config(_) | MrjarError::Graph(_))
    }
}

// Conversion from serde_yaml::Error to ConfigError
impl From<serde_yaml::Error> for Box<ConfigError> {
    fn from(error: serde_yaml::Error) -> Self {
        let location = error.location();
        Box::new(ConfigError::InvalidYaml {
            message: error.to_string(),
            line: location.as_ref().map(|l| l.line() as u32),
            column: location.as_ref().map(|l| l.column() as u32),
            file_path: None,
        })
    }
}
