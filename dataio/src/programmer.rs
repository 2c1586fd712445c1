//! High-level programmer session.
//!
//! [`Programmer`] ties the pieces together: a handshaken [`Link`], the
//! [`BlockReader`] and listing reconstruction.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dataio::{DeviceCatalog, Programmer, SerialConfig, save_listing};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = DeviceCatalog::from_path(Path::new("data_io_20b_supported_devices.csv"))?;
//!     let device = catalog.find("2716")?;
//!
//!     let mut programmer = Programmer::connect(&SerialConfig::new("/dev/ttyUSB0", 9600))?;
//!     let listing = programmer.load_device(device, |block, total| {
//!         println!("Block {}/{}", block.index + 1, total);
//!     })?;
//!     save_listing(Path::new("."), &device.display_name, &listing)?;
//!
//!     Ok(())
//! }
//! ```

use {
    crate::{
        catalog::DeviceProfile,
        error::Result,
        link::Link,
        port::Port,
        protocol::{Command, clean_response},
        reader::{Block, BlockReader},
        record::reconstruct,
    },
    log::info,
};

/// A session with one programmer.
pub struct Programmer<P: Port> {
    link: Link<P>,
}

impl<P: Port> Programmer<P> {
    /// Wrap a link without handshaking.
    ///
    /// Use [`Programmer::open`] unless the handshake has already been done.
    pub fn new(link: Link<P>) -> Self {
        Self { link }
    }

    /// Handshake over `link` and start a session.
    pub fn open(mut link: Link<P>) -> Result<Self> {
        link.handshake()?;
        Ok(Self::new(link))
    }

    /// The underlying link.
    pub fn link(&self) -> &Link<P> {
        &self.link
    }

    /// Mutable access to the underlying link.
    pub fn link_mut(&mut self) -> &mut Link<P> {
        &mut self.link
    }

    /// Ask the programmer for its status line.
    pub fn status(&mut self) -> Result<String> {
        let response = self
            .link
            .send(Command::Status)?;
        Ok(clean_response(&response))
    }

    /// Read the device range and return the raw dump.
    pub fn read_device<F>(&mut self, profile: &DeviceProfile, progress: F) -> Result<String>
    where
        F: FnMut(&Block, u64),
    {
        BlockReader::new(&mut self.link).read_device(profile, progress)
    }

    /// Read the device range and rebuild it into a complete listing.
    pub fn load_device<F>(&mut self, profile: &DeviceProfile, progress: F) -> Result<String>
    where
        F: FnMut(&Block, u64),
    {
        let dump = self.read_device(profile, progress)?;
        let listing = reconstruct(&dump, profile.start_address, profile.end_address)?;
        info!(
            "Loaded {} ({} listing lines)",
            profile.display_name,
            listing
                .lines()
                .count()
        );
        Ok(listing)
    }

    /// End the session and release the port.
    pub fn close(&mut self) {
        self.link
            .close();
    }
}

#[cfg(feature = "native")]
mod native_impl {
    use super::{Link, Programmer, Result};
    use crate::port::{NativePort, SerialConfig};

    impl Programmer<NativePort> {
        /// Open the serial port and handshake with the programmer.
        pub fn connect(config: &SerialConfig) -> Result<Self> {
            Self::open(Link::connect(config)?)
        }
    }
}
