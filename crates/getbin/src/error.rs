use std::path::PathBuf;

use getbin_cache::CacheError;
use getbin_fetch::FetchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {reason}")]
    Validation { name: String, reason: String },

    #[error("download failed")]
    Transfer {
        name: String,
        #[source]
        source: FetchError,
    },

    #[error("extraction failed")]
    Extraction {
        name: String,
        #[source]
        source: getbin_archive::Error,
    },

    #[error("failed to install into target directory")]
    Install {
        name: String,
        #[source]
        source: getbin_fs::Error,
    },

    #[error("failed to fingerprint installed binary")]
    Fingerprint {
        name: String,
        #[source]
        source: CacheError,
    },

    #[error("failed to build http client")]
    Client(#[source] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to load manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error("invalid settings")]
    Settings(#[from] Box<figment::Error>),

    #[error("background task failed")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(name: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the request this error belongs to, if any.
    pub fn request_name(&self) -> Option<&str> {
        match self {
            Self::Validation { name, .. }
            | Self::Transfer { name, .. }
            | Self::Extraction { name, .. }
            | Self::Install { name, .. }
            | Self::Fingerprint { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Errors that concern the whole batch rather than one request.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Cache(_))
    }

    /// This error and all of its sources, joined with `": "`.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Settings(Box::new(e))
    }
}
