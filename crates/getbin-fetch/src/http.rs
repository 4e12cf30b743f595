use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A successful response: the advertised length and the body stream.
pub struct HttpBody<E> {
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects, apply their own timeouts and must map
/// non-success status codes to an error rather than returning the body.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted in-memory clients in tests
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET request and return the response body as a stream.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpBody<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::error::{FetchError, Result};

    /// Settings for [`ReqwestClient`].
    #[derive(Debug, Clone)]
    pub struct ClientConfig {
        pub user_agent: String,
        pub connect_timeout: Duration,
    }

    impl Default for ClientConfig {
        fn default() -> Self {
            Self {
                user_agent: concat!("getbin/", env!("CARGO_PKG_VERSION")).to_string(),
                connect_timeout: Duration::from_secs(30),
            }
        }
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(config: &ClientConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .connect_timeout(config.connect_timeout)
                .build()
                .map_err(|e| FetchError::Client(Box::new(e)))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpBody<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?.error_for_status()?;
            let content_length = response.content_length();
            let stream = response.bytes_stream().boxed();

            Ok(HttpBody {
                content_length,
                stream,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientConfig, ReqwestClient};
