//! Error taxonomy for the plugin runtime.
//!
//! Nothing here is fatal once the dashboard is running. Each kind has one recovery:
//! - `FetchError`: shown as the plugin status line; the scheduler keeps going.
//! - `ValidationError`: rejected before any state changes.
//! - `PersistenceError`: reported; the in-memory change is kept.
//! - `DisposalError`: logged and skipped; the rest of the batch still runs.

use std::path::PathBuf;

use thiserror::Error;

/// A data source could not produce a snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        FetchError::Request(err.without_url().to_string())
    }
}

/// A mutation was rejected up front; state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("cannot remove the last remaining location")]
    LastItem,

    #[error("index {index} is out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("location cannot be empty")]
    EmptyItem,
}

/// Writing the config file failed. In-memory state keeps the attempted change.
#[derive(Debug, Error)]
#[error("failed to save {}: {source:#}", path.display())]
pub struct PersistenceError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

impl PersistenceError {
    pub fn new(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// A single item could not be dismissed.
#[derive(Debug, Error)]
pub enum DisposalError {
    #[error("item {0} not found")]
    NotFound(u64),

    #[error("failed to dismiss item {id}: {message}")]
    Failed { id: u64, message: String },
}

/// Errors from carousel mutations.
#[derive(Debug, Error)]
pub enum CarouselError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
