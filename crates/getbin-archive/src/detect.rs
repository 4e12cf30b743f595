use std::io::{self, BufReader, Read, Seek};

use crate::format::{ArchiveFormat, Compression};

/// Identify an archive from its leading bytes.
///
/// Compressed streams are reported as tarballs since that is what release
/// artifacts almost always are. [`detect_from_reader`] looks inside them.
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(ArchiveFormat::Zip),
        [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, ..] => Some(ArchiveFormat::SevenZip),
        [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, ..] => Some(ArchiveFormat::Rar),
        [0x1F, 0x8B, ..] => Some(ArchiveFormat::Tar(Compression::Gzip)),
        [0x42, 0x5A, 0x68, ..] => Some(ArchiveFormat::Tar(Compression::Bzip2)),
        [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(ArchiveFormat::Tar(Compression::Zstd)),
        [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Some(ArchiveFormat::Tar(Compression::Xz)),
        _ => {
            if is_tar_header(data) {
                Some(ArchiveFormat::Tar(Compression::None))
            } else {
                None
            }
        }
    }
}

fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= 512 && data[257..262] == *b"ustar"
}

/// Sniff the format of a seekable reader, leaving it rewound.
///
/// A compressed stream whose decoded start is not a tar header is a single
/// compressed file.
pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<Option<ArchiveFormat>> {
    let mut header = Vec::with_capacity(512);
    reader.by_ref().take(512).read_to_end(&mut header)?;
    reader.rewind()?;
    let format = match detect_format(&header) {
        Some(ArchiveFormat::Tar(codec)) if codec != Compression::None => {
            let wraps_tar = decoded_header(reader, codec).is_some_and(|inner| is_tar_header(&inner));
            reader.rewind()?;
            Some(if wraps_tar {
                ArchiveFormat::Tar(codec)
            } else {
                ArchiveFormat::Compressed(codec)
            })
        }
        other => other,
    };
    Ok(format)
}

/// Up to 512 decoded bytes; a truncated or corrupt stream yields what decoded.
fn decoded_header<R: Read>(reader: &mut R, codec: Compression) -> Option<Vec<u8>> {
    let decoder = codec.decoder(BufReader::new(reader)).ok()?;
    let mut inner = Vec::with_capacity(512);
    let _ = decoder.take(512).read_to_end(&mut inner);
    Some(inner)
}
