use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, ReplaceDirOptions, Result};

/// A scratch directory that becomes the destination on [`Workspace::commit`]
/// and is deleted otherwise.
///
/// The scratch directory is created next to the destination so the final
/// move is a same-filesystem rename.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn for_destination(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref();
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| Error::CreateDir {
            path: parent.clone(),
            source: e,
        })?;
        let dir = tempfile::Builder::new()
            .prefix(".staging.")
            .tempdir_in(&parent)
            .map_err(|e| Error::CreateDir { path: parent, source: e })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn commit(self, destination: impl AsRef<Path>) -> Result<()> {
        let destination = destination.as_ref();
        crate::replace_dir(self.dir.path(), destination, ReplaceDirOptions::new())?;
        tracing::trace!(path = %destination.display(), "committed workspace");
        // The staging path no longer exists, so dropping the guard is a no-op.
        drop(self.dir);
        Ok(())
    }
}
