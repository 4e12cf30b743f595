use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression};
use crate::sanitize::{sanitize_path, sanitize_symlink_target};

const READ_BUFFER: usize = 1024 * 1024;

/// Summary of one extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub entries: usize,
    pub bytes: u64,
}

impl ExtractReport {
    fn record(&mut self, size: u64) {
        self.entries += 1;
        self.bytes += size;
    }
}

/// Extract `archive` into `destination`, creating it if needed.
///
/// A lone compressed file is written under its own name with the compression
/// suffix removed. An entry whose destination already exists with a
/// different kind (a file where a directory is expected or the reverse) is
/// removed and the entry written once more; a second failure is a
/// [`Error::Conflict`].
pub fn extract(
    archive: impl AsRef<Path>,
    format: ArchiveFormat,
    destination: impl AsRef<Path>,
) -> Result<ExtractReport> {
    let archive = archive.as_ref();
    let destination = destination.as_ref();
    create_dir(destination)?;

    tracing::debug!(archive = %archive.display(), %format, "extracting");
    let report = match format {
        ArchiveFormat::Zip => extract_zip(open(archive)?, destination),
        ArchiveFormat::Tar(codec) => extract_tar(codec.decoder(open(archive)?)?, destination),
        ArchiveFormat::SevenZip => extract_7z(archive, destination),
        ArchiveFormat::Rar => Err(Error::UnsupportedFormat("rar")),
        ArchiveFormat::Compressed(codec) => decompress_single(archive, codec, destination),
    }?;
    tracing::debug!(
        destination = %destination.display(),
        entries = report.entries,
        bytes = report.bytes,
        "extracted"
    );
    Ok(report)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::ExtractionFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BufReader::with_capacity(READ_BUFFER, file))
}

fn extract_zip<R: Read + Seek>(reader: R, destination: &Path) -> Result<ExtractReport> {
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| Error::Corrupted(e.to_string()))?;
    let mut report = ExtractReport::default();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::Corrupted(e.to_string()))?;
        let raw_path = file.enclosed_name().ok_or(Error::InvalidPath)?;
        if names_root(&raw_path) {
            continue;
        }
        let target = sanitize_path(&raw_path, destination)?;

        if file.is_dir() {
            prepare_slot(&target, true)?;
            create_dir(&target)?;
        } else if file.is_symlink() {
            let mut link = String::new();
            file.read_to_string(&mut link)
                .map_err(|e| Error::Corrupted(e.to_string()))?;
            sanitize_symlink_target(&link, &target, destination)?;
            create_symlink(Path::new(&link), &target)?;
        } else {
            write_file(&target, &mut file)?;
            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
        report.record(file.size());
    }

    Ok(report)
}

fn extract_tar<R: Read>(reader: R, destination: &Path) -> Result<ExtractReport> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    let mut report = ExtractReport::default();

    for entry in archive
        .entries()
        .map_err(|e| Error::Corrupted(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| Error::Corrupted(e.to_string()))?;
        let raw_path = entry.path().map_err(|_| Error::InvalidPath)?.into_owned();
        let entry_type = entry.header().entry_type();
        let size = entry.size();

        if entry_type.is_pax_global_extensions() || entry_type.is_gnu_longname() || names_root(&raw_path) {
            continue;
        }
        let target = sanitize_path(&raw_path, destination)?;

        if entry_type.is_dir() {
            prepare_slot(&target, true)?;
            create_dir(&target)?;
        } else if entry_type.is_symlink() {
            let link = entry
                .link_name()
                .map_err(|_| Error::InvalidPath)?
                .ok_or(Error::InvalidPath)?
                .into_owned();
            sanitize_symlink_target(&link, &target, destination)?;
            create_symlink(&link, &target)?;
        } else if entry_type.is_hard_link() {
            let link = entry
                .link_name()
                .map_err(|_| Error::InvalidPath)?
                .ok_or(Error::InvalidPath)?
                .into_owned();
            let source = sanitize_path(&link, destination)?;
            ensure_parent(&target)?;
            prepare_slot(&target, false)?;
            fs::hard_link(&source, &target).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
        } else if entry_type.is_file() || entry_type.is_contiguous() || entry_type.is_gnu_sparse() {
            ensure_parent(&target)?;
            prepare_slot(&target, false)?;
            entry.unpack(&target).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
        } else {
            tracing::trace!(path = %raw_path.display(), ?entry_type, "skipping tar entry");
            continue;
        }
        report.record(size);
    }

    Ok(report)
}

fn extract_7z(archive: &Path, destination: &Path) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(|e| Error::ExtractionFailed {
        path: archive.to_path_buf(),
        source: e,
    })?;
    sevenz_rust2::decompress(file, destination).map_err(|e| Error::Corrupted(e.to_string()))?;

    let mut report = ExtractReport::default();
    tally(destination, &mut report)?;
    Ok(report)
}

fn tally(dir: &Path, report: &mut ExtractReport) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            report.record(0);
            tally(&entry.path(), report)?;
        } else {
            report.record(meta.len());
        }
    }
    Ok(())
}

fn decompress_single(
    archive: &Path,
    codec: Compression,
    destination: &Path,
) -> Result<ExtractReport> {
    let file_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(Error::InvalidPath)?;
    let stem = match ArchiveFormat::split_file_name(file_name) {
        (stem, Some(_)) => stem,
        (name, None) => name,
    };
    let target = sanitize_path(stem, destination)?;

    let mut decoder = codec.decoder(open(archive)?)?;
    let size = write_file(&target, &mut decoder)?;

    // A lone compressed download is a bare executable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
    }

    let mut report = ExtractReport::default();
    report.record(size);
    Ok(report)
}

fn write_file(target: &Path, reader: &mut dyn Read) -> Result<u64> {
    ensure_parent(target)?;
    prepare_slot(target, false)?;
    let mut out = File::create(target).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;
    io::copy(reader, &mut out).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })
}

/// Clear whatever occupies `target` unless it already has the wanted kind.
fn prepare_slot(target: &Path, want_dir: bool) -> Result<()> {
    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::Conflict {
                path: target.to_path_buf(),
                source: e,
            });
        }
    };
    if want_dir && meta.is_dir() {
        return Ok(());
    }

    tracing::debug!(path = %target.display(), "removing conflicting entry");
    let removed = if meta.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };
    removed.map_err(|e| Error::Conflict {
        path: target.to_path_buf(),
        source: e,
    })
}

/// Entries such as `./` that stand for the archive root itself.
fn names_root(entry: &Path) -> bool {
    entry
        .components()
        .all(|c| matches!(c, std::path::Component::CurDir))
}

fn ensure_parent(target: &Path) -> Result<()> {
    match target.parent() {
        Some(parent) => create_dir(parent),
        None => Ok(()),
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn create_symlink(link_target: &Path, at: &Path) -> Result<()> {
    ensure_parent(at)?;
    prepare_slot(at, false)?;
    let map = |e| Error::ExtractionFailed {
        path: at.to_path_buf(),
        source: e,
    };
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(link_target, at).map_err(map)
    }
    #[cfg(windows)]
    {
        let resolved: std::path::PathBuf = at
            .parent()
            .map(|p| p.join(link_target))
            .unwrap_or_else(|| link_target.to_path_buf());
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(link_target, at).map_err(map)
        } else {
            std::os::windows::fs::symlink_file(link_target, at).map_err(map)
        }
    }
}
