//! Content checksums of saved listings.
//!
//! The checksum is the sum of every data byte in the listing, modulo
//! 0x10000, which is what the programmer shows for a device loaded into RAM.

use {
    crate::{
        error::{Error, Result},
        listing::HEX_EXTENSION,
    },
    log::{debug, warn},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Offset of the first data byte in a record line.
const DATA_OFFSET: usize = 9;

/// Characters excluded at the end of each line.
///
/// This spans the trailing record byte and the line feed.
const TRAILER_LEN: usize = 3;

/// Sum the data bytes of a listing.
///
/// Every line starting with `:` contributes the hex byte pairs that begin
/// at offsets 9, 11, 13, ... while the offset is below `len - 3`, where the
/// length includes the line's `\n` when it has one. A `\r\n` ending counts
/// as a single `\n`.
pub fn listing_checksum(text: &str) -> Result<u16> {
    let mut total: u32 = 0;

    for (number, line) in text
        .split_inclusive('\n')
        .enumerate()
    {
        if !line.starts_with(':') {
            continue;
        }
        let bytes = line.as_bytes();
        let len = if line.ends_with("\r\n") {
            bytes.len() - 1
        } else {
            bytes.len()
        };
        let limit = len.saturating_sub(TRAILER_LEN);

        for offset in (DATA_OFFSET..limit).step_by(2) {
            let pair = bytes
                .get(offset..offset + 2)
                .and_then(|p| std::str::from_utf8(p).ok())
                .ok_or_else(|| {
                    Error::MalformedRecord(format!("line {}: truncated byte", number + 1))
                })?;
            let value = u8::from_str_radix(pair, 16).map_err(|_| {
                Error::MalformedRecord(format!(
                    "line {}: {pair:?} at offset {offset} is not a hex byte",
                    number + 1
                ))
            })?;
            total = total.wrapping_add(u32::from(value));
        }
    }

    // Truncation is the modulo
    #[allow(clippy::cast_possible_truncation)]
    let checksum = (total & 0xFFFF) as u16;
    Ok(checksum)
}

/// Checksum one listing file.
///
/// Failures are wrapped in [`Error::ChecksumFile`] naming the file.
pub fn checksum_file(path: &Path) -> Result<u16> {
    let wrap = |source: Error| Error::ChecksumFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    };
    let text = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    let checksum = listing_checksum(&text).map_err(wrap)?;
    debug!("{}: {checksum:04X}", path.display());
    Ok(checksum)
}

/// Outcome of checksumming one file in a batch.
#[derive(Debug)]
pub struct FileChecksum {
    /// File that was checksummed.
    pub path: PathBuf,
    /// Checksum, or why it could not be computed.
    pub result: Result<u16>,
}

/// Listing files (`*.hex`) directly inside `dir`, sorted by name.
pub fn listing_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_listing = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&format!(".{HEX_EXTENSION}")));
        if is_listing && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Checksum every listing file in `dir`.
///
/// Only failing to list the directory is fatal; each file gets its own
/// result, so one unreadable file does not hide the others.
pub fn checksum_dir(dir: &Path) -> Result<Vec<FileChecksum>> {
    let files = listing_files(dir)?;
    Ok(files
        .into_iter()
        .map(|path| {
            let result = checksum_file(&path);
            if let Err(e) = &result {
                warn!("{e}");
            }
            FileChecksum { path, result }
        })
        .collect())
}
