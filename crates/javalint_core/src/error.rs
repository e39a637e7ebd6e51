//! Error types for the analysis pipeline.

use thiserror::Error;

/// Errors that abort an analysis run before any tool is started.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Configuration error (e.g. no ruleset for the rule checker).
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while preparing the run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Errors raised by a single external tool.
///
/// These never leave the runner: they are reported as a [`ToolStatus`]
/// and the tool contributes zero diagnostics.
///
/// [`ToolStatus`]: crate::ToolStatus
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was killed by a signal.
    #[error("terminated by signal")]
    Terminated,

    /// The process exited with a code the tool never uses for normal results.
    #[error("exited with unexpected status {code}")]
    UnexpectedExit { code: i32 },

    /// The process did not finish before the configured deadline.
    #[error("timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// I/O error while talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = AnalysisError::config("no ruleset");
        assert_eq!(err.to_string(), "Configuration error: no ruleset");
    }

    #[test]
    fn test_tool_error_messages() {
        let err = ToolError::UnexpectedExit { code: 3 };
        assert_eq!(err.to_string(), "exited with unexpected status 3");

        let err = ToolError::Spawn {
            program: "javac".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("failed to start `javac`"));
    }
}
