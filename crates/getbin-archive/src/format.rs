use std::fmt;
use std::io::{BufRead, Read};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
    SevenZip,
    Rar,
    /// A single compressed file such as `tool.gz`.
    Compressed(Compression),
}

/// Compression codec wrapped around a tarball or a single file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

/// Recognised suffixes, longest first so compound extensions win.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::Tar(Compression::Gzip)),
    (".tar.bz2", ArchiveFormat::Tar(Compression::Bzip2)),
    (".tar.xz", ArchiveFormat::Tar(Compression::Xz)),
    (".tar.zst", ArchiveFormat::Tar(Compression::Zstd)),
    (".tgz", ArchiveFormat::Tar(Compression::Gzip)),
    (".tbz2", ArchiveFormat::Tar(Compression::Bzip2)),
    (".tbz", ArchiveFormat::Tar(Compression::Bzip2)),
    (".txz", ArchiveFormat::Tar(Compression::Xz)),
    (".tzst", ArchiveFormat::Tar(Compression::Zstd)),
    (".tar", ArchiveFormat::Tar(Compression::None)),
    (".zip", ArchiveFormat::Zip),
    (".7z", ArchiveFormat::SevenZip),
    (".rar", ArchiveFormat::Rar),
    (".gzip", ArchiveFormat::Compressed(Compression::Gzip)),
    (".gz", ArchiveFormat::Compressed(Compression::Gzip)),
    (".bz2", ArchiveFormat::Compressed(Compression::Bzip2)),
    (".xz", ArchiveFormat::Compressed(Compression::Xz)),
    (".zst", ArchiveFormat::Compressed(Compression::Zstd)),
];

impl ArchiveFormat {
    /// Infer the format from a file name's extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::split_file_name(name).1
    }

    /// Split `name` into its stem and the recognised archive format, if any.
    ///
    /// `tool-1.0-linux.tar.gz` splits into `tool-1.0-linux` and a gzipped
    /// tarball; names without a recognised suffix are returned whole.
    pub fn split_file_name(name: &str) -> (&str, Option<Self>) {
        let lower = name.to_ascii_lowercase();
        for (suffix, format) in SUFFIXES {
            if lower.len() > suffix.len() && lower.ends_with(suffix) {
                return (&name[..name.len() - suffix.len()], Some(*format));
            }
        }
        (name, None)
    }

    /// Canonical file extension, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::SevenZip => ".7z",
            Self::Rar => ".rar",
            Self::Tar(Compression::None) => ".tar",
            Self::Tar(Compression::Gzip) => ".tar.gz",
            Self::Tar(Compression::Bzip2) => ".tar.bz2",
            Self::Tar(Compression::Xz) => ".tar.xz",
            Self::Tar(Compression::Zstd) => ".tar.zst",
            Self::Compressed(Compression::None) => "",
            Self::Compressed(Compression::Gzip) => ".gz",
            Self::Compressed(Compression::Bzip2) => ".bz2",
            Self::Compressed(Compression::Xz) => ".xz",
            Self::Compressed(Compression::Zstd) => ".zst",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compressed(Compression::None) => f.write_str("raw"),
            other => f.write_str(other.extension().trim_start_matches('.')),
        }
    }
}

impl Compression {
    /// Create a decoder for this compression codec.
    pub fn decoder<'a, R: BufRead + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::None => Box::new(reader),
            Self::Gzip => Box::new(flate2::bufread::GzDecoder::new(reader)),
            Self::Bzip2 => Box::new(bzip2::bufread::BzDecoder::new(reader)),
            Self::Xz => Box::new(xz2::bufread::XzDecoder::new(reader)),
            Self::Zstd => Box::new(
                zstd::stream::read::Decoder::with_buffer(reader)
                    .map_err(|e| Error::Corrupted(e.to_string()))?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn infer_compound_extensions() {
        assert_eq!(
            ArchiveFormat::from_file_name("tool-1.0-linux.tar.gz"),
            Some(ArchiveFormat::Tar(Compression::Gzip))
        );
        assert_eq!(
            ArchiveFormat::from_file_name("ffmpeg.tar.xz"),
            Some(ArchiveFormat::Tar(Compression::Xz))
        );
        assert_eq!(
            ArchiveFormat::from_file_name("x.TBZ2"),
            Some(ArchiveFormat::Tar(Compression::Bzip2))
        );
    }

    #[test]
    fn infer_single_extensions() {
        assert_eq!(ArchiveFormat::from_file_name("a.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_file_name("a.7z"), Some(ArchiveFormat::SevenZip));
        assert_eq!(ArchiveFormat::from_file_name("a.rar"), Some(ArchiveFormat::Rar));
        assert_eq!(
            ArchiveFormat::from_file_name("tool.gz"),
            Some(ArchiveFormat::Compressed(Compression::Gzip))
        );
        assert_eq!(
            ArchiveFormat::from_file_name("tool.gzip"),
            Some(ArchiveFormat::Compressed(Compression::Gzip))
        );
    }

    #[test]
    fn unknown_extension() {
        assert_eq!(ArchiveFormat::from_file_name("tool.exe"), None);
        assert_eq!(ArchiveFormat::from_file_name("tool-1.0"), None);
        // A bare suffix is not a file name with an extension.
        assert_eq!(ArchiveFormat::from_file_name(".zip"), None);
    }

    #[test]
    fn split_preserves_case_of_stem() {
        assert_eq!(
            ArchiveFormat::split_file_name("MongoDB-Linux.TAR.GZ"),
            ("MongoDB-Linux", Some(ArchiveFormat::Tar(Compression::Gzip)))
        );
        assert_eq!(ArchiveFormat::split_file_name("tool-1.0"), ("tool-1.0", None));
    }

    #[test]
    fn extension_round_trips_through_inference() {
        for (_, format) in SUFFIXES {
            let name = format!("x{}", format.extension());
            let inferred = ArchiveFormat::from_file_name(&name);
            assert_eq!(inferred, Some(*format), "{name}");
        }
    }

    #[test]
    fn passthrough_decoder() {
        let mut decoder = Compression::None.decoder(Cursor::new(b"hello".to_vec())).unwrap();
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn gzip_decoder() {
        use flate2::{Compression as Level, write::GzEncoder};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Level::default());
        encoder.write_all(b"payload").unwrap();
        let bytes = encoder.finish().unwrap();

        let mut decoder = Compression::Gzip.decoder(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }
}
