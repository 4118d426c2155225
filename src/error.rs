//! Error type shared by every pipeline stage.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, OceanError>;

/// Errors surfaced by the ocean pipeline.
///
/// All computation is deterministic, so none of these are retryable: each one
/// marks a precondition the caller (or the pipeline itself) violated.
#[derive(Debug, Error)]
pub enum OceanError {
    #[error("resolution must be a power of two >= 2, got {0}")]
    InvalidResolution(usize),

    #[error("parameter `{name}` is out of range: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("pipeline stage {found} cannot follow {expected}")]
    PipelineOrdering {
        expected: &'static str,
        found: &'static str,
    },

    #[error("grid shape mismatch: expected {expected}x{expected}, got {found}x{found}")]
    GridShape { expected: usize, found: usize },

    #[error("pipeline worker has shut down")]
    WorkerClosed,

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for OceanError {
    fn from(err: image::ImageError) -> Self {
        Self::Export(err.to_string())
    }
}
