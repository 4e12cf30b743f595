//! Error types for getbin-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to build HTTP client")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to create temporary download location: {0}")]
    TempFileError(#[source] io::Error),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn http(url: &str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Http {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}
