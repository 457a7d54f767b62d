//! Load generation errors

use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while setting up load generation.
///
/// Individual shots never produce one of these; see `ShotResult`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid request stream: {0}")]
    InvalidStream(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
