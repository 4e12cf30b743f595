use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::{CacheError, Result};

/// How deep below the root entries are enumerated.
const MAX_DEPTH: usize = 2;
const SEPARATOR: &str = "\n";

/// Structural hash of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub content_hash: String,
    pub total_size: u64,
}

#[derive(Serialize)]
struct Stamps {
    atime: i64,
    mtime: i64,
    ctime: i64,
}

/// Fingerprint `root` on the blocking pool.
pub async fn fingerprint(root: impl Into<PathBuf>) -> Result<Fingerprint> {
    let root = root.into();
    tokio::task::spawn_blocking(move || fingerprint_blocking(&root)).await?
}

/// Fingerprint the entries up to two levels below `root`.
///
/// The hash covers entry paths and their access, modification and change
/// times, so it moves whenever a file is added, removed, renamed, touched or
/// re-extracted. File contents are never read.
pub fn fingerprint_blocking(root: &Path) -> Result<Fingerprint> {
    // Enumerate first, stat afterwards: listing a directory may bump its
    // access time, and the stat must observe that.
    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DEPTH)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CacheError::Walk {
            path: root.to_path_buf(),
            source: e,
        })?;

    let mut paths = Vec::with_capacity(entries.len());
    let mut stamps = Vec::with_capacity(entries.len());
    let mut total_size = 0u64;

    for entry in &entries {
        let path = entry.path();
        let meta = std::fs::symlink_metadata(path).map_err(|e| CacheError::Stat {
            path: path.to_path_buf(),
            source: e,
        })?;
        if meta.is_file() {
            total_size += meta.len();
        }
        paths.push(path.to_string_lossy().into_owned());
        stamps.push(serde_json::to_string(&stamps_of(&meta)).map_err(CacheError::Serialize)?);
    }

    let hash_a = sha256_hex(paths.join(SEPARATOR).as_bytes());
    let hash_b = sha256_hex(stamps.join(SEPARATOR).as_bytes());
    let content_hash = sha256_hex(format!("{hash_a} & {hash_b}").as_bytes());

    tracing::trace!(root = %root.display(), entries = entries.len(), total_size, %content_hash, "fingerprinted");
    Ok(Fingerprint {
        content_hash,
        total_size,
    })
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn stamps_of(meta: &Metadata) -> Stamps {
    Stamps {
        atime: millis(meta.accessed()),
        mtime: millis(meta.modified()),
        ctime: change_millis(meta),
    }
}

fn millis(time: std::io::Result<SystemTime>) -> i64 {
    match time {
        Ok(time) => match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_millis() as i64,
            Err(before) => -(before.duration().as_millis() as i64),
        },
        Err(_) => 0,
    }
}

#[cfg(unix)]
fn change_millis(meta: &Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    meta.ctime() * 1000 + meta.ctime_nsec() / 1_000_000
}

#[cfg(not(unix))]
fn change_millis(meta: &Metadata) -> i64 {
    millis(meta.created())
}
