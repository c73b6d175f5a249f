use std::path::PathBuf;

use thiserror::Error;

use crate::estimator::EstimationMode;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("failed to read array {}: {reason}", path.display())]
    Array { path: PathBuf, reason: String },
    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize JSON for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid option {field}: {reason}")]
    InvalidOption { field: &'static str, reason: String },
    #[error("cannot parse artifact name {name:?}: {reason}")]
    FileName { name: String, reason: String },
    #[error("no haze image registered for index key {0:?}")]
    MissingIndexKey(String),
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("image {0} has no pixels")]
    EmptyImage(String),
    #[error("task variant does not match the {0:?} estimator")]
    TaskMismatch(EstimationMode),
    #[error("estimation mode {0:?} is not implemented")]
    NotImplemented(EstimationMode),
    #[error("failed to spawn worker {name}: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
    #[error("worker {0} panicked")]
    WorkerPanicked(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
