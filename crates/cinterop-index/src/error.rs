//! Index model error types.

/// Errors raised while building or parsing the native model.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Failed to parse a C prototype.
    #[error("invalid C declaration: {detail}")]
    InvalidSignature { detail: String },

    /// A struct definition or container body was attached twice.
    #[error("'{name}' is already defined")]
    AlreadyDefined { name: String },
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
