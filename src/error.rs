use thiserror::Error;

#[derive(Debug, Error)]
pub enum HerdTrackError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown modality: {0}")]
    UnknownModality(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
