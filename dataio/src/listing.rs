//! Saved listing files.

use {
    crate::error::Result,
    log::info,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Extension of listing files, also used to find them for checksumming.
pub const HEX_EXTENSION: &str = "hex";

/// File name a device listing is saved under.
///
/// Spaces in the display name become underscores and the result is
/// lowercased, so `"27C64 Intel"` is saved as `eprom_code_27c64_intel.hex`.
pub fn listing_file_name(display_name: &str) -> String {
    let stem = display_name
        .replace(' ', "_")
        .to_lowercase();
    format!("eprom_code_{stem}.{HEX_EXTENSION}")
}

/// Write `listing` into `dir` and return the path written.
///
/// An existing file of the same name is replaced. The listing is written
/// as is, without adding a trailing newline.
pub fn save_listing(dir: &Path, display_name: &str, listing: &str) -> Result<PathBuf> {
    let path = dir.join(listing_file_name(display_name));
    fs::write(&path, listing)?;
    info!("Saved {} ({} bytes)", path.display(), listing.len());
    Ok(path)
}
