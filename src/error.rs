//! Internal error types for the validation pipeline
//!
//! None of these escape the public validation functions: every stage turns a
//! [`PipelineError`] into a result-shaped entry (a syntax error, a synthetic
//! SHACL violation, or a failing consistency check) at its boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for fallible pipeline internals
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Document text was empty or whitespace-only
    #[error("content is empty")]
    EmptyContent,

    /// A graph could not be parsed
    #[error("failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Shape definition is structurally invalid
    #[error("malformed shape {shape}: {reason}")]
    MalformedShape { shape: String, reason: String },

    /// Property shape uses a path form the engine does not evaluate
    #[error("unsupported property path on shape {shape}")]
    UnsupportedPath { shape: String },

    /// sh:pattern could not be compiled
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Blocking validation task did not complete
    #[error("validation task failed: {0}")]
    TaskJoin(String),
}

impl PipelineError {
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn malformed_shape(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedShape {
            shape: shape.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::EmptyContent | PipelineError::Parse { .. } => ErrorCategory::Input,
            PipelineError::MalformedShape { .. }
            | PipelineError::UnsupportedPath { .. }
            | PipelineError::InvalidPattern { .. } => ErrorCategory::Shape,
            PipelineError::TaskJoin(_) => ErrorCategory::Internal,
        }
    }
}

/// Coarse error classification, used as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Input,
    Shape,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Shape => "shape",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
