//! Transparent gzip handling for text inputs.
//!
//! Genomic inputs ship either plain or gzip-compressed (`.gct.gz`,
//! `.gtf.gz`). [`open_text`] sniffs the magic bytes and hands back a
//! buffered line reader either way, so parsers never branch on extension.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::{CoexnetError, Result};

/// Supported compression algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Gzip,
}

/// Detect the compression algorithm from the magic bytes of `data`.
///
/// Returns `None` if the data does not match a known format.
pub fn detect_algorithm(data: &[u8]) -> Option<Algorithm> {
    if data.len() >= 2 && data[..2] == [0x1F, 0x8B] {
        Some(Algorithm::Gzip)
    } else {
        None
    }
}

/// Open `path` for line-oriented reading, decompressing gzip on the fly.
///
/// Multi-member gzip streams (as written by bgzip) are read to the end.
pub fn open_text(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        CoexnetError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;

    let mut magic = [0u8; 2];
    let n = read_prefix(&mut file, &mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    match detect_algorithm(&magic[..n]) {
        Some(Algorithm::Gzip) => Ok(Box::new(BufReader::new(MultiGzDecoder::new(file)))),
        None => Ok(Box::new(BufReader::new(file))),
    }
}

/// Wrap a decoder error with the file it came from.
pub fn compression_error(path: &Path, line_num: usize, e: std::io::Error) -> CoexnetError {
    if e.kind() == std::io::ErrorKind::InvalidInput || e.kind() == std::io::ErrorKind::InvalidData {
        CoexnetError::Compression(format!("{}: line {}: {}", path.display(), line_num, e))
    } else {
        CoexnetError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: line {}: {}", path.display(), line_num, e),
        ))
    }
}

fn read_prefix(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
