use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Make `path` an existing, empty directory.
///
/// A file or symlink sitting at `path` is removed and replaced.
pub fn empty_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if fs::symlink_metadata(path).is_ok_and(|meta| !meta.is_dir()) {
        fs::remove_file(path).map_err(|e| Error::Remove {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                let entry = entry.map_err(|e| Error::Read {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                let child = entry.path();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let removed = if is_dir {
                    fs::remove_dir_all(&child)
                } else {
                    fs::remove_file(&child)
                };
                removed.map_err(|e| Error::Remove {
                    path: child,
                    source: e,
                })?;
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|e| Error::CreateDir {
                path: path.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(Error::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// If `dir` holds exactly one entry and it is a directory, move that
/// directory's children up into `dir` and remove it.
///
/// Returns whether anything was hoisted. A child that shares the wrapper's
/// name is handled by first parking the wrapper under a scratch directory.
pub fn hoist_single_dir(dir: impl AsRef<Path>) -> Result<bool> {
    let dir = dir.as_ref();
    let read_err = |e| Error::Read {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = fs::read_dir(dir).map_err(read_err)?;
    let Some(only) = entries.next().transpose().map_err(read_err)? else {
        return Ok(false);
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    if !only.file_type().map_err(read_err)?.is_dir() {
        return Ok(false);
    }

    let wrapper = only.path();
    let scratch = tempfile::Builder::new()
        .prefix(".hoist.")
        .tempdir_in(dir)
        .map_err(|e| Error::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    let parked = scratch.path().join("wrapper");
    rename(&wrapper, &parked)?;

    for entry in fs::read_dir(&parked).map_err(|e| Error::Read {
        path: parked.clone(),
        source: e,
    })? {
        let entry = entry.map_err(|e| Error::Read {
            path: parked.clone(),
            source: e,
        })?;
        rename(&entry.path(), &dir.join(entry.file_name()))?;
    }

    tracing::debug!(dir = %dir.display(), wrapper = %wrapper.display(), "hoisted single top-level directory");
    scratch.close().map_err(|e| Error::Remove {
        path: parked,
        source: e,
    })?;
    Ok(true)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| Error::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}
