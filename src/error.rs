use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Invalid upstream chunk: {0}")]
    InvalidChunk(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
