//! Error types for Provenant

/// Result type alias using Provenant's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Provenant operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Signal extraction errors
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Text model loading or inference errors
    #[error("model error: {0}")]
    Model(String),

    /// An optional capability could not be initialized
    #[error("capability unavailable: {0}")]
    Capability(String),

    /// Image, metadata, or video decoding errors
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem/process IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new capability error
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
