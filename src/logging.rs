// Logging setup for mrjar
use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{MrjarError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Level,
    /// Output format (pretty for terminals, json for build servers)
    pub format: LogFormat,
    /// Color output configuration
    pub color: ColorConfig,
    /// Whether to show targets (module names)
    pub show_targets: bool,
}

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

/// Color output configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ColorConfig {
    /// Automatically detect if colors should be used
    Auto,
    Always,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            color: ColorConfig::Auto,
            show_targets: false,
        }
    }
}

impl LogConfig {
    /// Create logging configuration from the host build's verbosity switches
    pub fn from_verbosity(verbose: bool, quiet: bool, color: Option<&str>) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let color = match color {
            Some("always") => ColorConfig::Always,
            Some("never") => ColorConfig::Never,
            _ => ColorConfig::Auto,
        };

        Self {
            level,
            color,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Check if colors should be used based on configuration and terminal
    pub fn should_use_colors(&self) -> bool {
        match self.color {
            ColorConfig::Always => true,
            ColorConfig::Never => false,
            ColorConfig::Auto => {
                io::stderr().is_terminal()
                    && std::env::var("TERM").map_or(true, |term| term != "dumb")
                    && std::env::var("NO_COLOR").is_err()
            }
        }
    }

    /// `RUST_LOG` wins over the configured level when set
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("mrjar={}", self.level)))
    }
}

/// Initialize the global subscriber. Fails instead of panicking if one is already installed.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = config.env_filter();
    let ansi = config.should_use_colors();

    let installed = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(env_filter)
            .with_target(config.show_targets)
            .with_ansi(ansi)
            .try_init(),
        LogFormat::Json => fmt().with_env_filter(env_filter).json().try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(env_filter)
            .compact()
            .with_target(config.show_targets)
            .with_ansi(ansi)
            .try_init(),
    };

    installed.map_err(|e| MrjarError::Logging(e.to_string()))
}

/// Logging utilities for common operations
pub mod utils {
    use crate::identifier::LanguageVersion;
    use std::time::Duration;
    use tracing::{error, info, span, Level, Span};

    /// Span covering the declaration of one project
    pub fn project_span(name: &str) -> Span {
        span!(Level::DEBUG, "project", name = %name)
    }

    /// Span covering the registration of one language version
    pub fn registration_span(version: LanguageVersion) -> Span {
        span!(Level::DEBUG, "register_version", version = version.get())
    }

    /// Span covering the execution of one task
    pub fn task_execution_span(task: &str, level: usize) -> Span {
        span!(Level::INFO, "task_execution", task = %task, level = level)
    }

    pub fn log_task_completion(task: &str, success: bool, duration: Duration) {
        if success {
            info!(task = %task, duration_ms = duration.as_millis() as u64, "Task completed");
        } else {
            error!(task = %task, duration_ms = duration.as_millis() as u64, "Task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.color, ColorConfig::Auto);
        assert!(!config.show_targets);
    }

    #[test]
    fn test_log_config_from_verbosity() {
        assert_eq!(LogConfig::from_verbosity(true, false, None).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(true, true, None).level, Level::ERROR);
    }

    #[test]
    fn test_init_logging_twice_returns_error() {
        // the first call may lose to another subscriber in this process; the second never wins
        let _ = init_logging(LogConfig::default().with_format(LogFormat::Compact));
        let second = init_logging(LogConfig::default());
        assert!(matches!(second, Err(MrjarError::Logging(_))));
    }

    #[test]
    fn test_log_config_colors() {
        let always = LogConfig::from_verbosity(false, false, Some("always"));
        assert!(always.should_use_colors());
        let never = LogConfig::from_verbosity(false, false, Some("never"));
        assert!(!never.should_use_colors());
    }
}
