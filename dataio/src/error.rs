//! Error types for dataio.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dataio operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A command was issued without an open connection.
    #[error("Not connected to programmer")]
    NotConnected,

    /// The programmer did not answer the handshake with its prompt.
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// The programmer sent something the link cannot decode.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The device catalog could not be used at all.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A catalog row carries an unusable address bound.
    #[error("Malformed catalog entry '{name}': {field} = {value:?}")]
    MalformedCatalogEntry {
        /// Display name of the offending row.
        name: String,
        /// Column that failed to parse.
        field: &'static str,
        /// Raw column value.
        value: String,
    },

    /// No catalog entry carries the requested display name.
    #[error("Device not found in catalog: {0}")]
    DeviceNotFound(String),

    /// A hex record line does not satisfy the record grammar.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Checksumming a single listing file failed.
    #[error("Checksum error in {}: {source}", path.display())]
    ChecksumFile {
        /// File being checksummed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}
