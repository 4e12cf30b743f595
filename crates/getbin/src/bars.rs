use std::sync::Arc;

use getbin::progress::{ProgressCallback, ProgressReporter};
use getbin_fetch::{FetchPhase, Progress};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>12.bold} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

static SPINNER_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(SPINNER_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// One progress bar per download, stacked on stderr.
#[derive(Clone, Default)]
pub struct BarReporter {
    bars: MultiProgress,
}

impl BarReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarReporter {
    fn begin(&self, name: &str) -> Option<ProgressCallback> {
        let pb = self.bars.add(ProgressBar::no_length());
        if let Some(style) = SPINNER_TEMPLATE.as_ref() {
            pb.set_style(style.clone());
        }
        pb.set_prefix(name.to_string());
        let guard = BarGuard(pb);

        Some(Arc::new(move |progress: &Progress| {
            let pb = guard.bar();
            match (progress.phase, progress.total_bytes) {
                (FetchPhase::Connecting, _) => pb.tick(),
                (FetchPhase::Downloading, total) => {
                    if let Some(total) = total {
                        if pb.length() != Some(total) {
                            pb.set_length(total);
                            if let Some(style) = PB_TEMPLATE.as_ref() {
                                pb.set_style(style.clone());
                            }
                        }
                    }
                    pb.set_position(progress.bytes_downloaded);
                }
                (FetchPhase::Completed, _) => {
                    pb.set_position(progress.bytes_downloaded);
                    pb.finish();
                }
            }
        }))
    }
}

/// Abandons its bar if dropped before the download completed, so a failed
/// transfer does not leave a live spinner behind.
struct BarGuard(ProgressBar);

impl BarGuard {
    fn bar(&self) -> &ProgressBar {
        &self.0
    }
}

impl Drop for BarGuard {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            self.0.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_bar_is_abandoned() {
        let pb = ProgressBar::hidden();
        drop(BarGuard(pb.clone()));
        assert!(pb.is_finished());
    }

    #[test]
    fn finished_bar_is_left_alone() {
        let pb = ProgressBar::hidden();
        pb.set_length(10);
        pb.set_position(10);
        pb.finish();
        drop(BarGuard(pb.clone()));
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 10);
    }
}
