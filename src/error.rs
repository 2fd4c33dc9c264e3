//! Error types for the build front end
//!
//! Module boundaries return [`BuilderError`]; the command layer works in
//! `anyhow::Result` and `main` renders whatever reaches it as one line.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading settings or driving the external tool
#[derive(Error, Debug)]
pub enum BuilderError {
    /// A required file or directory does not exist
    #[error("{what} does not exist. '{}'", .path.display())]
    NotFound { what: String, path: PathBuf },

    /// A path points somewhere it must not
    #[error("{what} {reason}: '{}'", .path.display())]
    InvalidPath {
        what: String,
        path: PathBuf,
        reason: String,
    },

    /// The settings file is not valid JSON or is missing a required key
    #[error("Failed to parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// The external tool exited with a non-zero code
    #[error("{step} failed with exit code: {}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ToolFailure { step: String, code: Option<i32> },

    /// The external tool could not be located
    #[error("Missing tool: {tool}")]
    MissingTool { tool: String },

    /// The external tool ran longer than the configured timeout
    #[error("{program} did not finish within {limit:?} and was killed")]
    Timeout { program: String, limit: Duration },

    /// Filesystem or process spawning failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BuilderError {
    /// Create a not-found error for a named resource
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a parse error for the given file
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tool failure error for a lifecycle step
    pub fn tool_failure(step: impl Into<String>, code: Option<i32>) -> Self {
        Self::ToolFailure {
            step: step.into(),
            code,
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Actionable hint for the error, if one applies
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            BuilderError::MissingTool { .. } => Some(hints::cmake()),
            BuilderError::NotFound { what, .. } if what.as_str() == crate::config::SETTINGS_FILE_NAME => {
                Some(hints::settings_not_found())
            }
            BuilderError::Parse { .. } => Some(hints::invalid_settings()),
            _ => None,
        }
    }
}

/// Common error hints
pub mod hints {
    /// Get hint for missing CMake
    pub fn cmake() -> &'static str {
        "Install CMake from https://cmake.org/ or use your package manager:\n\
         • macOS: brew install cmake\n\
         • Ubuntu: sudo apt install cmake\n\
         • Windows: winget install Kitware.CMake\n\
         \n\
         Or point --cmake / CPB_CMAKE at an existing executable."
    }

    /// Get hint for a missing settings file
    pub fn settings_not_found() -> &'static str {
        "Create a settings file with: cpb --create-settings\n\
         Then edit ProjectHome and BuildDirectory to match your project."
    }

    /// Get hint for an invalid settings file
    pub fn invalid_settings() -> &'static str {
        "The settings file must be a JSON object with two non-empty strings:\n\
         {\"ProjectHome\": \".\", \"BuildDirectory\": \"build\"}\n\
         BuildDirectory is relative to ProjectHome and must stay inside it.\n\
         \n\
         Delete it and run cpb --create-settings to start over."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = BuilderError::not_found("ProjectHome", "/no/such/dir");
        assert_eq!(err.to_string(), "ProjectHome does not exist. '/no/such/dir'");
    }

    #[test]
    fn test_tool_failure_message() {
        let err = BuilderError::tool_failure("CMake configure", Some(2));
        assert_eq!(err.to_string(), "CMake configure failed with exit code: 2");

        let err = BuilderError::tool_failure("CMake build", None);
        assert_eq!(err.to_string(), "CMake build failed with exit code: none");
    }

    #[test]
    fn test_hints() {
        assert!(BuilderError::MissingTool { tool: "cmake".into() }.hint().is_some());
        assert!(BuilderError::not_found(crate::config::SETTINGS_FILE_NAME, "x")
            .hint()
            .is_some());
        assert!(BuilderError::not_found("ProjectHome", "x").hint().is_none());
        assert!(BuilderError::parse("x", "bad").hint().is_some());
    }

    #[test]
    fn test_invalid_path_and_timeout_messages() {
        let err = BuilderError::InvalidPath {
            what: "BuildDirectory".into(),
            path: "..".into(),
            reason: "must not leave the project root".into(),
        };
        assert_eq!(err.to_string(), "BuildDirectory must not leave the project root: '..'");

        let err = BuilderError::Timeout {
            program: "cmake".into(),
            limit: Duration::from_secs(1),
        };
        assert_eq!(err.to_string(), "cmake did not finish within 1s and was killed");
    }
}
