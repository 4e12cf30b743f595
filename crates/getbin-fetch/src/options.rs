use std::fmt;
use std::sync::Arc;

/// Phases of a download operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Waiting for the response headers.
    #[default]
    Connecting,

    /// Streaming the body to disk.
    Downloading,

    /// The body has been fully written and flushed.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Number of bytes written so far.
    pub bytes_downloaded: u64,

    /// Total expected bytes, if the server sent Content-Length.
    pub total_bytes: Option<u64>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, or `None` when the size is unknown.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.is_completed() { 1.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64).min(1.0)
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }
}

/// Per-download options.
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Custom HTTP headers sent with the request.
    pub headers: Arc<[(String, String)]>,

    /// Invoked on phase transitions and after every chunk written.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("headers", &self.headers)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl FetchOptions {
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = headers.into();
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(callback) = &self.on_progress {
            callback(&progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_known_total() {
        let p = Progress {
            phase: FetchPhase::Downloading,
            bytes_downloaded: 25,
            total_bytes: Some(100),
        };
        assert_eq!(p.fraction(), Some(0.25));
    }

    #[test]
    fn fraction_unknown_total() {
        let p = Progress {
            phase: FetchPhase::Downloading,
            bytes_downloaded: 25,
            total_bytes: None,
        };
        assert_eq!(p.fraction(), None);
    }

    #[test]
    fn fraction_empty_body() {
        let mut p = Progress {
            phase: FetchPhase::Downloading,
            bytes_downloaded: 0,
            total_bytes: Some(0),
        };
        assert_eq!(p.fraction(), Some(0.0));
        p.phase = FetchPhase::Completed;
        assert_eq!(p.fraction(), Some(1.0));
    }

    #[test]
    fn headers_accumulate() {
        let options = FetchOptions::default()
            .header("Accept", "*/*")
            .header("X-Trace", "1");
        assert_eq!(options.headers.len(), 2);
        assert_eq!(options.headers[1].0, "X-Trace");
    }
}
