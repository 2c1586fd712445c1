//! # dataio
//!
//! A library for reading EPROMs through a Data I/O 20B programmer in remote
//! mode.
//!
//! This crate provides the core functionality for driving the programmer
//! over a serial line, including:
//!
//! - Command/response link with per-command timeouts
//! - Block-wise device reads (2048 bytes per load cycle)
//! - Reconstruction of the programmer's hex output into a complete listing
//! - Content checksums of saved listings
//! - The CSV catalog of supported devices
//!
//! ## Features
//!
//! - `native` (default): Native serial port support via the `serialport` crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use dataio::{DeviceCatalog, Programmer, SerialConfig, checksum_dir, save_listing};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = DeviceCatalog::from_path(Path::new("data_io_20b_supported_devices.csv"))?;
//!     let device = catalog.find("27C64")?;
//!
//!     let mut programmer = Programmer::connect(&SerialConfig::new("/dev/ttyUSB0", 9600))?;
//!     let listing = programmer.load_device(device, |_, _| {})?;
//!     save_listing(Path::new("."), &device.display_name, &listing)?;
//!     programmer.close();
//!
//!     for file in checksum_dir(Path::new("."))? {
//!         if let Ok(sum) = file.result {
//!             println!("{}: {sum:04X}", file.path.display());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod checksum;
pub mod error;
pub mod link;
pub mod listing;
pub mod port;
pub mod programmer;
pub mod protocol;
pub mod reader;
pub mod record;

// Native-specific re-exports
#[cfg(feature = "native")]
pub use port::{NativePort, NativePortEnumerator};
pub use {
    catalog::{DEFAULT_CATALOG_FILE, DeviceCatalog, DeviceProfile},
    checksum::{FileChecksum, checksum_dir, checksum_file, listing_checksum, listing_files},
    error::{Error, Result},
    link::Link,
    listing::{HEX_EXTENSION, listing_file_name, save_listing},
    port::{DataBits, Parity, Port, PortEnumerator, PortInfo, SerialConfig, StopBits},
    programmer::Programmer,
    protocol::{BLOCK_SIZE, Command, DEFAULT_BAUD},
    reader::{Block, BlockReader, block_count, blocks},
    record::{END_OF_FILE_LINE, RecordLine, RecordType, reconstruct},
};
