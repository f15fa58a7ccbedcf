// src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl PhysicsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PhysicsError::InvalidConfiguration(message.into())
    }
}
