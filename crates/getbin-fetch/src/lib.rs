//! HTTP downloading into temporary files.
//!
//! [`Fetcher`] streams a response body to disk chunk by chunk and reports
//! progress through an optional callback; it never renders anything itself.
//! The transport is abstracted behind [`HttpClient`] so tests can script
//! responses without a network.

mod error;
mod fetcher;
mod http;
mod options;

pub use error::{FetchError, Result};
pub use fetcher::{Download, Fetcher, file_name_from_url};
pub use http::{BoxStream, HttpBody, HttpClient};
pub use options::{FetchOptions, FetchPhase, Progress};

#[cfg(feature = "reqwest")]
pub use http::{ClientConfig, ReqwestClient};
