//! Error types for sandbox operations

use thiserror::Error;

use crate::scene::SceneError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Errors surfaced by spawning, configuration and scene registration.
///
/// Degenerate time deltas, removal of untracked bodies and audio failures are
/// not errors: they are absorbed where they happen.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("invalid {shape} dimensions: {reason}")]
    InvalidShape {
        shape: &'static str,
        reason: String,
    },

    #[error("scene rejected visual proxy: {0}")]
    Scene(#[from] SceneError),

    #[error("invalid settings: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    pub(crate) fn invalid_shape(shape: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape,
            reason: reason.into(),
        }
    }
}
