use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    /// fsync the temporary file before it replaces `path`.
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to `path` so that readers see either the old or the new
/// file, never a partial one. Missing parent directories are created.
///
/// The bytes go to a hidden sibling first, which is then renamed over
/// `path`; a failed write leaves `path` untouched.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: AtomicWriteOptions) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::CreateDir {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let write_err = |e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".tmp.")
        .suffix(".getbin")
        .tempfile_in(parent)
        .map_err(write_err)?;
    staged.write_all(content).map_err(write_err)?;
    if options.sync {
        staged.as_file().sync_all().map_err(write_err)?;
    }
    staged.persist(path).map_err(|e| write_err(e.error))?;
    tracing::trace!(path = %path.display(), bytes = content.len(), "atomically written");
    Ok(())
}
