//! Error types for data dictionary generation and diffing

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for IG summary operations
#[derive(Debug, Error)]
pub enum IgSummaryError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON or YAML document could not be parsed
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A StructureDefinition could not be found in the primary or dependency definitions
    #[error("Could not find definition for {identifier} ({context})")]
    DefinitionNotFound { identifier: String, context: String },

    /// An element could not be turned into data dictionary rows
    #[error("Could not resolve {element}: {message}")]
    ResolutionError { element: String, message: String },

    /// More than one element matched where exactly one was expected
    #[error("Expected at most one element starting with `{start}` and ending with `{end}`, found {count}")]
    AmbiguousElement {
        start: String,
        end: String,
        count: usize,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Parse,
    Definition,
    Resolution,
    Internal,
}

impl IgSummaryError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IgSummaryError::ConfigError { .. } => ErrorKind::Config,
            IgSummaryError::IoError { .. } => ErrorKind::Io,
            IgSummaryError::ParseError { .. } => ErrorKind::Parse,
            IgSummaryError::DefinitionNotFound { .. } => ErrorKind::Definition,
            IgSummaryError::ResolutionError { .. } => ErrorKind::Resolution,
            IgSummaryError::AmbiguousElement { .. } => ErrorKind::Resolution,
            IgSummaryError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error only concerns a single profile, so the run may skip it
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Definition | ErrorKind::Resolution)
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for a file
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing definition error
    pub fn definition_not_found(identifier: impl Into<String>, context: impl Into<String>) -> Self {
        Self::DefinitionNotFound {
            identifier: identifier.into(),
            context: context.into(),
        }
    }

    /// Create a resolution error for an element id
    pub fn resolution_error(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionError {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for IgSummaryError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for IgSummaryError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for IgSummaryError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ParseError {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(IgSummaryError::config_error("x").kind(), ErrorKind::Config);
        assert_eq!(
            IgSummaryError::AmbiguousElement {
                start: "a".into(),
                end: "b".into(),
                count: 2
            }
            .kind(),
            ErrorKind::Resolution
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(IgSummaryError::definition_not_found("http://x", "profile").is_recoverable());
        assert!(IgSummaryError::resolution_error("Patient.name", "boom").is_recoverable());
        assert!(!IgSummaryError::config_error("bad settings").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = IgSummaryError::definition_not_found("http://example.org/SD/x", "extension");
        assert_eq!(
            err.to_string(),
            "Could not find definition for http://example.org/SD/x (extension)"
        );
    }
}
