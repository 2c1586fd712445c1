//! Supported device catalog.
//!
//! The catalog is a CSV table with one row per device the programmer can
//! read, keyed by display name:
//!
//! ```text
//! DisplayName,StartHex,EndHex
//! 2716,0000,07FF
//! 2732,0000,0FFF
//! ```
//!
//! Extra columns are ignored. Every row is validated when the catalog is
//! loaded, so a bad row fails the load instead of surfacing mid-read.

use {
    crate::error::{Error, Result},
    log::debug,
    serde::{Deserialize, Serialize},
    std::{fs::File, io::Read, path::Path},
};

/// Default catalog file name.
pub const DEFAULT_CATALOG_FILE: &str = "data_io_20b_supported_devices.csv";

/// Address range of one supported device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    /// Name shown to the user and used as the catalog key.
    pub display_name: String,
    /// First device address.
    pub start_address: u32,
    /// Last device address (inclusive).
    pub end_address: u32,
}

impl DeviceProfile {
    /// Number of bytes in the device range.
    pub fn size(&self) -> u64 {
        u64::from(self.end_address) - u64::from(self.start_address) + 1
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "DisplayName")]
    display_name: String,
    #[serde(rename = "StartHex")]
    start_hex: String,
    #[serde(rename = "EndHex")]
    end_hex: String,
}

impl TryFrom<CatalogRow> for DeviceProfile {
    type Error = Error;

    fn try_from(row: CatalogRow) -> Result<Self> {
        let malformed = |field, value: &str| Error::MalformedCatalogEntry {
            name: row
                .display_name
                .clone(),
            field,
            value: value.to_string(),
        };

        let start_address =
            parse_hex(&row.start_hex).ok_or_else(|| malformed("StartHex", &row.start_hex))?;
        let end_address =
            parse_hex(&row.end_hex).ok_or_else(|| malformed("EndHex", &row.end_hex))?;
        if start_address > end_address {
            return Err(malformed("EndHex", &row.end_hex));
        }

        Ok(Self {
            display_name: row.display_name,
            start_address,
            end_address,
        })
    }
}

/// Parse a hex address, with or without a `0x` prefix.
pub fn parse_hex(value: &str) -> Option<u32> {
    let digits = value.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Device profiles in catalog order.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<DeviceProfile>,
}

impl DeviceCatalog {
    /// Load a catalog file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::Catalog(format!("cannot open {}: {e}", path.display())))?;
        let catalog = Self::from_reader(file)?;
        debug!(
            "Loaded {} devices from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Load a catalog from CSV text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut devices = Vec::new();
        for row in reader.deserialize::<CatalogRow>() {
            let row = row.map_err(|e| Error::Catalog(e.to_string()))?;
            devices.push(DeviceProfile::try_from(row)?);
        }

        if devices.is_empty() {
            return Err(Error::Catalog(
                "catalog is empty or not correctly formatted".to_string(),
            ));
        }

        Ok(Self { devices })
    }

    /// Look up a device by its display name.
    pub fn find(&self, name: &str) -> Result<&DeviceProfile> {
        self.devices
            .iter()
            .find(|d| d.display_name == name)
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    /// Display names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices
            .iter()
            .map(|d| d.display_name.as_str())
    }

    /// All profiles in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceProfile> {
        self.devices
            .iter()
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices
            .len()
    }

    /// Whether the catalog holds no devices.
    pub fn is_empty(&self) -> bool {
        self.devices
            .is_empty()
    }
}

impl<'a> IntoIterator for &'a DeviceCatalog {
    type Item = &'a DeviceProfile;
    type IntoIter = std::slice::Iter<'a, DeviceProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "\
DisplayName,StartHex,EndHex,Notes
2716,0000,07FF,2K x 8
2732,0000,0FFF,
27C64 (8K),0x0000,0x1FFF,CMOS
";

    #[test]
    fn test_load_catalog() {
        let catalog = DeviceCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            ["2716", "2732", "27C64 (8K)"]
        );

        let device = catalog.find("27C64 (8K)").unwrap();
        assert_eq!(device.start_address, 0x0000);
        assert_eq!(device.end_address, 0x1FFF);
        assert_eq!(device.size(), 0x2000);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let csv = "DisplayName , StartHex , EndHex\n 2764 , 0000 , 1fff \n";
        let catalog = DeviceCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.find("2764").unwrap().end_address, 0x1FFF);
    }

    #[test]
    fn test_unknown_device() {
        let catalog = DeviceCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        assert!(matches!(
            catalog.find("27512"),
            Err(Error::DeviceNotFound(name)) if name == "27512"
        ));
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        assert!(matches!(
            DeviceCatalog::from_reader("".as_bytes()),
            Err(Error::Catalog(_))
        ));
        assert!(matches!(
            DeviceCatalog::from_reader("DisplayName,StartHex,EndHex\n".as_bytes()),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "DisplayName,StartHex\n2716,0000\n";
        assert!(matches!(
            DeviceCatalog::from_reader(csv.as_bytes()),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_malformed_address() {
        let csv = "DisplayName,StartHex,EndHex\n2716,0000,07FG\n";
        match DeviceCatalog::from_reader(csv.as_bytes()) {
            Err(Error::MalformedCatalogEntry { name, field, value }) => {
                assert_eq!(name, "2716");
                assert_eq!(field, "EndHex");
                assert_eq!(value, "07FG");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_address_is_malformed() {
        let csv = "DisplayName,StartHex,EndHex\n2716,,07FF\n";
        assert!(matches!(
            DeviceCatalog::from_reader(csv.as_bytes()),
            Err(Error::MalformedCatalogEntry { field: "StartHex", .. })
        ));
    }

    #[test]
    fn test_inverted_range_is_malformed() {
        let csv = "DisplayName,StartHex,EndHex\nodd,0800,07FF\n";
        assert!(matches!(
            DeviceCatalog::from_reader(csv.as_bytes()),
            Err(Error::MalformedCatalogEntry { .. })
        ));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("07FF"), Some(0x07FF));
        assert_eq!(parse_hex("0x7fff"), Some(0x7FFF));
        assert_eq!(parse_hex(" 0XFFFF "), Some(0xFFFF));
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex("1FFFFFFFF"), None);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CATALOG_FILE);
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = DeviceCatalog::from_path(&path).unwrap();
        assert_eq!((&catalog).into_iter().count(), 3);
    }

    #[test]
    fn test_from_missing_path() {
        assert!(matches!(
            DeviceCatalog::from_path(Path::new("/nonexistent/devices.csv")),
            Err(Error::Catalog(_))
        ));
    }
}
