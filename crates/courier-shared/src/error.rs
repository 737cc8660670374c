use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("Unknown screen: {0}")]
    UnknownScreen(String),

    #[error("Unknown search filter: {0}")]
    UnknownFilter(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SharedError>;
