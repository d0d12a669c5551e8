use thiserror::Error;

/// Errors that can arise while writing or reading recorder files.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Writer is disabled")]
    Inactive,
}

pub type Result<T> = std::result::Result<T, RecorderError>;
