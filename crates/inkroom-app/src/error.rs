//! Application errors.

use inkroom_core::{SessionError, SyncError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not reach relay: {0}")]
    Connect(#[source] SyncError),

    #[error("Bad seed file {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: SyncError,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
