//! Progress reporting hooks.
//!
//! The library never renders anything; a front end plugs in a
//! [`ProgressReporter`] and receives one callback per download.

use std::sync::Arc;

use getbin_fetch::Progress;

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

pub trait ProgressReporter: Send + Sync {
    /// Called when the download of `name` starts.
    fn begin(&self, name: &str) -> Option<ProgressCallback>;
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn begin(&self, _name: &str) -> Option<ProgressCallback> {
        None
    }
}
