//! Generator error types.

use cinterop_index::IndexError;
use cinterop_targets::TargetError;

/// Errors that can occur while generating interop glue.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// No mirror rule exists for a native type.
    #[error("unmappable type: {detail}")]
    UnmappableType { detail: String },

    /// Integer or floating type of a width the wire vocabulary lacks.
    #[error("unsupported {kind} width: {size} bytes")]
    UnsupportedWidth { kind: &'static str, size: u64 },

    /// The struct-return classification has no rule for this target.
    #[error("no struct-return rule for target '{target}'")]
    UnsupportedTarget { target: String },

    /// The managed platform cannot express this boundary.
    #[error("unsupported on this platform: {detail}")]
    UnsupportedOnPlatform { detail: String },

    /// The compilability oracle failed or broke its contract.
    #[error("compilability check failed: {detail}")]
    CompileCheck { detail: String },

    /// Invalid interop configuration.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl GenError {
    pub(crate) fn unmappable(detail: impl Into<String>) -> Self {
        GenError::UnmappableType {
            detail: detail.into(),
        }
    }
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GenError>;
