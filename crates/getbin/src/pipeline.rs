//! Download, extract and record one binary.

use std::fs::File;
use std::path::{Path, PathBuf};

use getbin_archive::{ArchiveFormat, detect_from_reader, extract};
use getbin_cache::{CacheEntry, CacheIndex, fingerprint};
use getbin_fetch::{Download, FetchOptions, Fetcher, HttpClient};
use getbin_fs::{Workspace, hoist_single_dir};

use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::request::BinaryRequest;
use crate::resolver::{ResolvedBinary, Source};

pub(crate) struct Pipeline<'a, C: HttpClient> {
    pub fetcher: &'a Fetcher<C>,
    pub index: &'a CacheIndex,
    pub progress: &'a dyn ProgressReporter,
}

impl<C: HttpClient> Pipeline<'_, C> {
    /// Fetch `request` into its target, replacing whatever was there, and
    /// record the result in the cache index.
    pub async fn run(&self, request: &BinaryRequest) -> Result<ResolvedBinary> {
        let name = request.name.as_str();
        let url = request.remote_url.as_str();
        tracing::info!("> Downloading {name} from {url}...");

        let options = FetchOptions {
            on_progress: self.progress.begin(name),
            ..FetchOptions::default()
        };
        let download = self
            .fetcher
            .fetch_to_temp(url, &options)
            .await
            .map_err(|source| Error::Transfer {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!(name, bytes = download.bytes, "download finished");

        let target = request.target.clone();
        let owner = name.to_string();
        tokio::task::spawn_blocking(move || install(&owner, download, &target)).await??;

        let fingerprint = fingerprint(request.target.clone())
            .await
            .map_err(|source| Error::Fingerprint {
                name: name.to_string(),
                source,
            })?;
        self.index
            .put(url, CacheEntry::new(&request.target, fingerprint))
            .await?;

        tracing::info!(name, path = %request.target.display(), "installed");
        Ok(ResolvedBinary::new(request, &request.target, Source::FreshDownload))
    }
}

/// Unpack `download` into a staging directory beside `target`, collapse a
/// single wrapping directory and swap the result into place.
fn install(name: &str, download: Download, target: &Path) -> Result<()> {
    let install_err = |source: getbin_fs::Error| Error::Install {
        name: name.to_string(),
        source,
    };
    let extract_err = |source: getbin_archive::Error| Error::Extraction {
        name: name.to_string(),
        source,
    };

    let workspace = Workspace::for_destination(target).map_err(install_err)?;
    match archive_format(download.path()).map_err(|e| extract_err(e.into()))? {
        Some(format) => {
            extract(download.path(), format, workspace.path()).map_err(extract_err)?;
        }
        None => {
            tracing::debug!(name, "not an archive, installing as is");
            copy_executable(download.path(), workspace.path()).map_err(install_err)?;
        }
    }
    if hoist_single_dir(workspace.path()).map_err(install_err)? {
        tracing::debug!(name, "collapsed single top-level directory");
    }
    workspace.commit(target).map_err(install_err)?;
    Ok(())
}

/// Format from the file name, falling back to the leading bytes.
fn archive_format(path: &Path) -> std::io::Result<Option<ArchiveFormat>> {
    let by_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(ArchiveFormat::from_file_name);
    if by_name.is_some() {
        return Ok(by_name);
    }
    detect_from_reader(&mut File::open(path)?)
}

fn copy_executable(file: &Path, dir: &Path) -> getbin_fs::Result<PathBuf> {
    let name = file.file_name().unwrap_or(file.as_os_str());
    let dest = dir.join(name);
    std::fs::copy(file, &dest).map_err(|e| getbin_fs::Error::Write {
        path: dest.clone(),
        source: e,
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
            getbin_fs::Error::Write {
                path: dest.clone(),
                source: e,
            }
        })?;
    }
    Ok(dest)
}
