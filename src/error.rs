//! Error taxonomy for the triage core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("item {0} not found in catalog")]
    ItemNotFound(i64),

    #[error("triage queue is empty")]
    EmptyQueue,

    #[error("source file missing: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to move {}: {reason}", .path.display())]
    MoveFailed { path: PathBuf, reason: String },

    #[error("invalid folder name: {0:?}")]
    InvalidFolderName(String),

    #[error("store write failed for {key}: {reason}")]
    Store { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
