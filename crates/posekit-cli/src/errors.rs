use posekit_recorder::RecorderError;
use thiserror::Error;

/// Errors surfaced by `posekit` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Pose file not found: {0}")]
    PoseFileNotFound(String),

    #[error("Pose file format error at line {line}: {message}")]
    PoseFormat { line: usize, message: String },

    #[error("No pose samples found in {0}")]
    NoSamples(String),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),
}

pub type Result<T> = std::result::Result<T, CliError>;
