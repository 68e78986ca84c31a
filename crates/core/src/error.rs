#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("no quotes available")]
    NotFound,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("failed to create database directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid stored quote: {0}")]
    InvalidRow(String),
}

pub type QuoteResult<T> = std::result::Result<T, QuoteError>;
