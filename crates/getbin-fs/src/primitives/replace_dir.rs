use crate::{Error, Result};
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct ReplaceDirOptions {
    pub retry_count: u32,
    pub retry_delay: std::time::Duration,
}

impl Default for ReplaceDirOptions {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay: std::time::Duration::from_millis(100),
        }
    }
}

impl ReplaceDirOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count.max(1);
        self
    }
    pub fn retry_delay(mut self, delay: std::time::Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Move the directory `src` to `dest`, discarding whatever `dest` held.
///
/// `src` and `dest` must be on the same filesystem. Removal and rename are
/// retried since virus scanners and indexers on Windows hold handles briefly.
pub fn replace_dir(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: ReplaceDirOptions,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut attempts = 0;
    loop {
        let result = remove_existing(dest).and_then(|()| std::fs::rename(src, dest));
        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempts += 1;
                if attempts >= options.retry_count {
                    return Err(Error::ReplaceDir {
                        path: dest.to_path_buf(),
                        source: e,
                    });
                }
                tracing::debug!(path = %dest.display(), attempts, "retrying directory replace: {e}");
                std::thread::sleep(options.retry_delay * attempts);
            }
        }
    }
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_replace_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("file.txt"), "data").unwrap();

        replace_dir(&src, &dest, ReplaceDirOptions::new()).unwrap();
        assert!(!src.exists());
        assert!(dest.join("file.txt").exists());
    }

    #[test]
    fn test_replace_dir_discards_old_contents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(dest.join("stale")).unwrap();
        std::fs::write(dest.join("stale/old.bin"), "old").unwrap();
        std::fs::write(src.join("new.bin"), "new").unwrap();

        replace_dir(&src, &dest, ReplaceDirOptions::new()).unwrap();
        assert!(!dest.join("stale").exists());
        assert_eq!(std::fs::read_to_string(dest.join("new.bin")).unwrap(), "new");
    }

    #[test]
    fn test_replace_dir_missing_source_fails() {
        let dir = tempdir().unwrap();
        let options = ReplaceDirOptions::new()
            .retry_count(1)
            .retry_delay(std::time::Duration::ZERO);
        let err = replace_dir(dir.path().join("nope"), dir.path().join("dest"), options)
            .unwrap_err();
        assert!(matches!(err, Error::ReplaceDir { .. }));
    }
}
