use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

use crate::error::{FetchError, Result};
use crate::http::HttpClient;
use crate::options::{FetchOptions, FetchPhase, Progress};

/// A completed download living in its own temporary directory.
///
/// The directory, and the file in it, are removed when this is dropped.
#[derive(Debug)]
pub struct Download {
    dir: TempDir,
    path: PathBuf,
    pub bytes: u64,
}

impl Download {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Streams HTTP response bodies to disk.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Download `url` into a fresh system temporary directory, keeping the
    /// URL's file name so its extension survives.
    pub async fn fetch_to_temp(&self, url: &str, options: &FetchOptions) -> Result<Download> {
        let file_name = file_name_from_url(url)?;
        let dir = tempfile::Builder::new()
            .prefix("getbin-")
            .tempdir()
            .map_err(FetchError::TempFileError)?;
        let path = dir.path().join(&file_name);
        let bytes = self.fetch(url, &path, options).await?;
        Ok(Download { dir, path, bytes })
    }

    /// Stream `url` into `destination`, returning the number of bytes written.
    ///
    /// A failed transfer may leave a partial file behind; callers download
    /// into scratch locations.
    pub async fn fetch(&self, url: &str, destination: &Path, options: &FetchOptions) -> Result<u64> {
        options.report(Progress {
            phase: FetchPhase::Connecting,
            bytes_downloaded: 0,
            total_bytes: None,
        });

        let body = self
            .client
            .get(url, &options.headers)
            .await
            .map_err(|e| FetchError::http(url, e))?;
        let total_bytes = body.content_length;
        tracing::debug!(url, ?total_bytes, "response received");

        let write_err = |e| FetchError::Write {
            path: destination.to_path_buf(),
            source: e,
        };
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(write_err)?;
        let mut stream = body.stream;
        let mut bytes_downloaded = 0u64;

        options.report(Progress {
            phase: FetchPhase::Downloading,
            bytes_downloaded,
            total_bytes,
        });

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::http(url, e))?;
            file.write_all(&chunk).await.map_err(write_err)?;
            bytes_downloaded += chunk.len() as u64;
            options.report(Progress {
                phase: FetchPhase::Downloading,
                bytes_downloaded,
                total_bytes,
            });
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        options.report(Progress {
            phase: FetchPhase::Completed,
            bytes_downloaded,
            total_bytes,
        });
        tracing::debug!(url, bytes = bytes_downloaded, path = %destination.display(), "download complete");
        Ok(bytes_downloaded)
    }
}

/// The last non-empty path segment of `url`, percent-decoded.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| FetchError::InvalidUrl(format!("{url}: no file name in path")))?;
    let decoded = percent_decode(segment);
    if decoded.is_empty() || decoded == "." || decoded == ".." || decoded.contains(['/', '\\']) {
        return Err(FetchError::InvalidUrl(format!("{url}: unusable file name")));
    }
    Ok(decoded)
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(format!("x={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use futures_util::stream;

    use super::*;
    use crate::http::HttpBody;

    #[derive(Debug, thiserror::Error)]
    #[error("scripted failure")]
    struct ScriptedError;

    struct ScriptedClient {
        chunks: Vec<&'static [u8]>,
        fail_mid_stream: bool,
    }

    impl HttpClient for ScriptedClient {
        type Error = ScriptedError;

        async fn get(
            &self,
            _url: &str,
            _headers: &[(String, String)],
        ) -> std::result::Result<HttpBody<Self::Error>, Self::Error> {
            let total: usize = self.chunks.iter().map(|c| c.len()).sum();
            let mut items: Vec<std::result::Result<Bytes, ScriptedError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect();
            if self.fail_mid_stream {
                items.push(Err(ScriptedError));
            }
            Ok(HttpBody {
                content_length: Some(total as u64),
                stream: Box::pin(stream::iter(items)),
            })
        }
    }

    #[tokio::test]
    async fn fetch_to_temp_keeps_file_name() {
        let fetcher = Fetcher::new(ScriptedClient {
            chunks: vec![b"hello ", b"world"],
            fail_mid_stream: false,
        });
        let download = fetcher
            .fetch_to_temp("https://example.test/dl/tool-1.0.tar.gz", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(download.bytes, 11);
        assert_eq!(download.path().file_name().unwrap(), "tool-1.0.tar.gz");
        assert_eq!(std::fs::read(download.path()).unwrap(), b"hello world");

        let dir = download.dir().to_path_buf();
        drop(download);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn progress_reaches_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = FetchOptions::default().on_progress(move |p| {
            sink.lock().unwrap().push((p.phase, p.fraction()));
        });
        let fetcher = Fetcher::new(ScriptedClient {
            chunks: vec![b"ab", b"cd"],
            fail_mid_stream: false,
        });
        fetcher
            .fetch_to_temp("https://example.test/tool.zip", &options)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().unwrap().0, FetchPhase::Connecting);
        assert!(seen.contains(&(FetchPhase::Downloading, Some(0.5))));
        assert_eq!(*seen.last().unwrap(), (FetchPhase::Completed, Some(1.0)));
    }

    #[tokio::test]
    async fn stream_error_is_http_error() {
        let fetcher = Fetcher::new(ScriptedClient {
            chunks: vec![b"partial"],
            fail_mid_stream: true,
        });
        let err = fetcher
            .fetch_to_temp("https://example.test/tool.zip", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }

    #[test]
    fn file_name_from_url_variants() {
        assert_eq!(
            file_name_from_url("https://example.test/a/b/tool-1.0-linux.zip").unwrap(),
            "tool-1.0-linux.zip"
        );
        assert_eq!(
            file_name_from_url("https://example.test/a/tool.tgz?token=1#frag").unwrap(),
            "tool.tgz"
        );
        assert_eq!(
            file_name_from_url("https://example.test/a/my%20tool.zip").unwrap(),
            "my tool.zip"
        );
        assert_eq!(
            file_name_from_url("https://example.test/a/c++.zip").unwrap(),
            "c++.zip"
        );
        assert_eq!(file_name_from_url("https://example.test/dir/").unwrap(), "dir");
        assert!(matches!(
            file_name_from_url("https://example.test/"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            file_name_from_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
