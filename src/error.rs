//! Error types for sprite-fetch
//!
//! None of these ever abort a run: source errors are logged and the file is
//! skipped, worker errors become a `Failed` outcome for that one record.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a [`Fetcher`](crate::utils::http::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for URL: {url}")]
    Status { status: u16, url: String },

    /// Connection failure, timeout, or body read failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Error raised while ensuring a single record's image.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking write task panicked or was cancelled
    #[error("write task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WorkerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error raised while reading an input CSV file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
