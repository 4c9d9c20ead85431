//! Error types
//!
//! Every fallible operation in the renderer reports a [`RenderError`].

use thiserror::Error;

/// Errors produced while building or rendering a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A matrix could not be inverted or a camera basis collapsed.
    #[error("degenerate transform: {0}")]
    DegenerateTransform(String),

    /// A GPU or CPU resource could not be created, compiled or bound.
    #[error("render resource unavailable: {0}")]
    RenderResource(String),

    /// The depth target was written with one encoding and read with another.
    #[error("depth encoding mismatch: written as {written}, read as {read}")]
    EncodingMismatch {
        written: crate::config::DepthEncoding,
        read: crate::config::DepthEncoding,
    },

    /// The presentation surface was lost or outdated and has been reconfigured.
    #[error("presentation surface lost")]
    SurfaceLost,

    /// A scene configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn degenerate(what: impl Into<String>) -> Self {
        Self::DegenerateTransform(what.into())
    }

    pub(crate) fn resource(what: impl Into<String>) -> Self {
        Self::RenderResource(what.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
