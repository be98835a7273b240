use siamese_core::TensorError;
use thiserror::Error;

/// Errors surfaced by the network facade.
#[derive(Debug, Error)]
pub enum SiameseError {
    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SiameseResult<T> = Result<T, SiameseError>;
