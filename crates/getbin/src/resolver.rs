//! Local resolution of a request, before any network access.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use getbin_cache::{CacheIndex, fingerprint};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::BinaryRequest;

/// How a binary was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Found on `PATH` under one of the command names.
    PathLookup,
    /// Reused from an earlier download.
    CacheHit,
    FreshDownload,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PathLookup => "path",
            Self::CacheHit => "cache",
            Self::FreshDownload => "download",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBinary {
    pub name: String,
    pub path: PathBuf,
    pub source: Source,
}

impl ResolvedBinary {
    pub(crate) fn new(request: &BinaryRequest, path: impl Into<PathBuf>, source: Source) -> Self {
        Self {
            name: request.name.clone(),
            path: path.into(),
            source,
        }
    }
}

pub(crate) struct Resolver<'a> {
    pub index: &'a CacheIndex,
    /// Overrides `PATH` for command lookup.
    pub search_path: Option<&'a OsString>,
}

impl Resolver<'_> {
    /// Try to satisfy `request` without downloading.
    ///
    /// Command names are looked up on `PATH` first. Unless `force` is set, a
    /// cache entry for the URL is consulted next; when there is none and the
    /// request names an explicit `dir/name`, an existing file there is
    /// reused. `Ok(None)` means a download is needed.
    pub async fn resolve(&self, request: &BinaryRequest, force: bool) -> Result<Option<ResolvedBinary>> {
        if let Some(path) = self.lookup_commands(&request.local_hints.command_names).await {
            tracing::debug!(name = %request.name, path = %path.display(), "found on PATH");
            return Ok(Some(ResolvedBinary::new(request, path, Source::PathLookup)));
        }
        if force {
            return Ok(None);
        }

        let url = request.remote_url.as_str();
        if let Some(entry) = self.index.get(url).await? {
            if !request.verify {
                tracing::debug!(name = %request.name, "cache entry trusted without verification");
                return Ok(Some(ResolvedBinary::new(request, entry.binary_path, Source::CacheHit)));
            }
            return Ok(match fingerprint(entry.binary_path.clone()).await {
                Ok(current) if entry.matches(&current) => {
                    tracing::debug!(name = %request.name, "cache entry verified");
                    Some(ResolvedBinary::new(request, entry.binary_path, Source::CacheHit))
                }
                Ok(_) => {
                    tracing::info!(name = %request.name, "cached binary changed on disk, fetching again");
                    None
                }
                Err(e) => {
                    tracing::info!(name = %request.name, error = %e, "cached binary unreadable, fetching again");
                    None
                }
            });
        }

        if request.local_hints.explicit_target() && exists(&request.target).await {
            tracing::debug!(name = %request.name, target = %request.target.display(), "target already present");
            return Ok(Some(ResolvedBinary::new(request, &request.target, Source::CacheHit)));
        }
        Ok(None)
    }

    async fn lookup_commands(&self, commands: &[String]) -> Option<PathBuf> {
        if commands.is_empty() {
            return None;
        }
        let commands = commands.to_vec();
        let search_path = self.search_path.cloned();
        tokio::task::spawn_blocking(move || {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            commands.iter().find_map(|command| {
                let found = match &search_path {
                    Some(paths) => which::which_in(command, Some(paths), &cwd),
                    None => which::which(command),
                };
                found
                    .inspect_err(|e| tracing::trace!(command, error = %e, "not on PATH"))
                    .ok()
            })
        })
        .await
        .ok()
        .flatten()
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
