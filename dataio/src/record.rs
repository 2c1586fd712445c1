//! Hex record lines and listing reconstruction.
//!
//! ## Record Format
//!
//! ```text
//! +---+-------+---------+------+----------------------+
//! | : | Count | Address | Type | Data + trailing byte |
//! +---+-------+---------+------+----------------------+
//! | 1 |   2   |    4    |  2   |      variable        |
//! +---+-------+---------+------+----------------------+
//! ```
//!
//! All fields are uppercase hex digits. Type `00` is a data record; every
//! other type is copied through untouched.

use {
    crate::error::{Error, Result},
    log::debug,
    std::fmt,
};

/// Final line of every listing.
pub const END_OF_FILE_LINE: &str = ":00000001FF";

/// Bytes covered by one synthetic filler line.
pub const FILLER_BYTE_COUNT: u8 = 0x10;

/// Length of the `:CCAAAATT` header.
const HEADER_LEN: usize = 9;

/// Record type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Data record (`00`).
    Data,
    /// End-of-file record (`01`).
    EndOfFile,
    /// Any other record type.
    Other(u8),
}

impl From<u8> for RecordType {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Data,
            0x01 => Self::EndOfFile,
            other => Self::Other(other),
        }
    }
}

impl RecordType {
    /// Numeric record type.
    pub fn code(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::EndOfFile => 0x01,
            Self::Other(code) => code,
        }
    }
}

/// A parsed hex record line, borrowing the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLine<'a> {
    /// Number of data bytes declared by the record.
    pub byte_count: u8,
    /// Load address as written in the line, if it is hex.
    ///
    /// Data records get a new address on output, so a garbled field is
    /// carried rather than rejected.
    pub address: Option<u16>,
    /// Record type.
    pub record_type: RecordType,
    /// Data bytes plus the trailing checksum or filler byte, as hex text.
    pub tail: &'a str,
    raw: &'a str,
}

impl<'a> RecordLine<'a> {
    /// Parse one line.
    ///
    /// Only the header is validated; the tail is kept verbatim so lines can
    /// be re-emitted without touching their data.
    pub fn parse(line: &'a str) -> Result<Self> {
        if !line.starts_with(':') {
            return Err(Error::MalformedRecord(format!(
                "{line:?} does not start with ':'"
            )));
        }
        if !line.is_ascii() {
            return Err(Error::MalformedRecord(format!("{line:?} is not ASCII")));
        }
        if line.len() < HEADER_LEN {
            return Err(Error::MalformedRecord(format!(
                "{line:?} is shorter than the {HEADER_LEN} character header"
            )));
        }

        let byte_count = hex_field(line, 1..3, "byte count")?;
        let address = u16::from_str_radix(&line[3..7], 16).ok();
        let record_type = RecordType::from(hex_field(line, 7..9, "record type")?);

        Ok(Self {
            byte_count,
            address,
            record_type,
            tail: &line[HEADER_LEN..],
            raw: line,
        })
    }

    /// The original line.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Re-emit this line with its address field replaced.
    ///
    /// The type field and tail are copied unchanged.
    pub fn with_address(&self, address: u64) -> String {
        format!(
            ":{:02X}{address:04X}{}",
            self.byte_count,
            &self.raw[7..]
        )
    }
}

impl fmt::Display for RecordLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

fn hex_field(line: &str, range: std::ops::Range<usize>, name: &str) -> Result<u8> {
    u8::from_str_radix(&line[range], 16)
        .map_err(|_| Error::MalformedRecord(format!("{line:?} has an invalid {name} field")))
}

/// All-zero data line covering [`FILLER_BYTE_COUNT`] bytes at `address`.
///
/// The trailing byte is a fixed `00` placeholder, not a computed checksum.
pub fn filler_line(address: u64) -> String {
    format!(
        ":{FILLER_BYTE_COUNT:02X}{address:04X}00{}00",
        "00".repeat(usize::from(FILLER_BYTE_COUNT))
    )
}

/// Rebuild a raw device dump into a contiguous listing for `start..=end`.
///
/// Prompts, spaces and carriage returns are removed and the text is split
/// into lines. Blank lines are ignored; the first remaining line sets the
/// expected line length and lines of any other length are dropped as
/// garbled.
///
/// The retained lines are then replayed pass after pass while the address
/// cursor is within range: data records get the cursor written into their
/// address field and advance it by their byte count, other records are
/// copied. A pass that leaves the cursor in range is followed by one
/// filler line. The listing always ends with a single [`END_OF_FILE_LINE`].
pub fn reconstruct(raw: &str, start: u32, end: u32) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '>' | ' ' | '\r'))
        .collect();

    let candidates: Vec<&str> = cleaned
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect();
    let reference_len = candidates
        .first()
        .map_or(0, |line| line.len());

    let records = candidates
        .iter()
        .filter(|line| line.len() == reference_len)
        .map(|line| RecordLine::parse(line))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        "Kept {} of {} dump lines ({} characters each)",
        records.len(),
        candidates.len(),
        reference_len
    );

    let end = u64::from(end);
    let mut cursor = u64::from(start);
    let mut lines = Vec::new();

    while cursor <= end {
        for record in &records {
            if record.record_type == RecordType::Data {
                lines.push(record.with_address(cursor));
                cursor += u64::from(record.byte_count);
            } else {
                lines.push(record.as_str().to_string());
            }
        }

        if cursor <= end {
            lines.push(filler_line(cursor));
            cursor += u64::from(FILLER_BYTE_COUNT);
        }
    }

    if lines
        .last()
        .is_none_or(|line| line != END_OF_FILE_LINE)
    {
        lines.push(END_OF_FILE_LINE.to_string());
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_LINE: &str = ":10123400000102030405060708090A0B0C0D0E0F77";

    #[test]
    fn test_parse_data_line() {
        let record = RecordLine::parse(DATA_LINE).unwrap();
        assert_eq!(record.byte_count, 0x10);
        assert_eq!(record.address, Some(0x1234));
        assert_eq!(record.record_type, RecordType::Data);
        assert_eq!(record.tail, "000102030405060708090A0B0C0D0E0F77");
        assert_eq!(record.to_string(), DATA_LINE);
    }

    #[test]
    fn test_parse_end_of_file_line() {
        let record = RecordLine::parse(END_OF_FILE_LINE).unwrap();
        assert_eq!(record.byte_count, 0);
        assert_eq!(record.record_type, RecordType::EndOfFile);
        assert_eq!(record.tail, "FF");
    }

    #[test]
    fn test_parse_other_record_type() {
        let record = RecordLine::parse(":020000021000EC").unwrap();
        assert_eq!(record.record_type, RecordType::Other(0x02));
        assert_eq!(record.record_type.code(), 0x02);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        for line in [
            "",
            ":",
            ":1000",
            "10000000AA",
            ":G0000000AA",
            ":100000Z0AA",
            ":10000000é",
        ] {
            assert!(
                matches!(RecordLine::parse(line), Err(Error::MalformedRecord(_))),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_garbled_address_is_replaced() {
        let line = ":10XYZ000000102030405060708090A0B0C0D0E0F77";
        let record = RecordLine::parse(line).unwrap();
        assert_eq!(record.address, None);
        assert_eq!(record.record_type, RecordType::Data);

        let listing = reconstruct(line, 0x0040, 0x004F).unwrap();
        assert_eq!(
            listing.lines().next(),
            Some(":10004000000102030405060708090A0B0C0D0E0F77")
        );
    }

    #[test]
    fn test_header_only_line_is_accepted() {
        let record = RecordLine::parse(":00000000").unwrap();
        assert_eq!(record.tail, "");
    }

    #[test]
    fn test_with_address_keeps_tail() {
        let record = RecordLine::parse(DATA_LINE).unwrap();
        assert_eq!(
            record.with_address(0x0020),
            ":10002000000102030405060708090A0B0C0D0E0F77"
        );
        // Addresses beyond 16 bits widen the field
        assert_eq!(
            &record.with_address(0x1_0000)[..9],
            ":10100000"
        );
    }

    #[test]
    fn test_filler_line() {
        assert_eq!(
            filler_line(0x07F0),
            ":1007F0000000000000000000000000000000000000"
        );
        assert_eq!(filler_line(0).len(), DATA_LINE.len());
    }

    #[test]
    fn test_empty_dump_is_all_filler() {
        let listing = reconstruct("", 0x0000, 0x003F).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            [
                filler_line(0x00).as_str(),
                filler_line(0x10).as_str(),
                filler_line(0x20).as_str(),
                filler_line(0x30).as_str(),
                END_OF_FILE_LINE,
            ]
        );
    }

    #[test]
    fn test_inverted_range_is_terminator_only() {
        assert_eq!(reconstruct(":10000000AA", 0x10, 0x0F).unwrap(), END_OF_FILE_LINE);
    }

    #[test]
    fn test_prompts_and_spaces_are_removed() {
        let raw = "> :10000000 000102030405060708090A0B0C0D0E0F77\r\n>";
        let listing = reconstruct(raw, 0, 0x0F).unwrap();
        assert_eq!(
            listing,
            format!(
                ":10000000000102030405060708090A0B0C0D0E0F77\n{END_OF_FILE_LINE}"
            )
        );
    }

    #[test]
    fn test_lines_of_other_length_are_dropped() {
        let raw = format!("{DATA_LINE}\n:10000000AB\n{DATA_LINE}\n{END_OF_FILE_LINE}");
        let listing = reconstruct(&raw, 0, 0x1F).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(":10000000"));
        assert!(lines[1].starts_with(":10001000"));
        assert_eq!(lines[2], END_OF_FILE_LINE);
    }

    #[test]
    fn test_malformed_retained_line_is_an_error() {
        let raw = "XX0000000000\nYY0000000000";
        assert!(matches!(
            reconstruct(raw, 0, 0x0F),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_non_data_records_pass_through() {
        let raw = ":020000021000EC\n:020000000102FB";
        let listing = reconstruct(raw, 0x0000, 0x0001).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            [":020000021000EC", ":020000000102FB", END_OF_FILE_LINE]
        );
    }

    #[test]
    fn test_existing_terminator_is_not_duplicated() {
        let raw = ":01000000AB\n:00000001FF";
        let listing = reconstruct(raw, 0x0000, 0x0000).unwrap();
        assert_eq!(listing, ":01000000AB\n:00000001FF");
        assert_eq!(listing.matches(END_OF_FILE_LINE).count(), 1);
    }

    #[test]
    fn test_reconstructing_a_listing_again_keeps_one_terminator() {
        let first = reconstruct(DATA_LINE, 0, 0x3F).unwrap();
        let second = reconstruct(&first, 0, 0x3F).unwrap();
        assert!(second.ends_with(END_OF_FILE_LINE));
        assert_eq!(second.matches(END_OF_FILE_LINE).count(), 1);
    }

    #[test]
    fn test_short_dump_is_replayed_with_filler() {
        // One data line per pass, each pass followed by a filler line
        let listing = reconstruct(DATA_LINE, 0x0000, 0x003F).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with(":10000000"));
        assert_eq!(lines[1], filler_line(0x10));
        assert!(lines[2].starts_with(":10002000"));
        assert_eq!(lines[3], filler_line(0x30));
        assert_eq!(lines[4], END_OF_FILE_LINE);
    }

    #[test]
    fn test_data_addresses_are_contiguous() {
        let raw: Vec<String> = (0..8)
            .map(|i| format!(":10{:04X}00{}55", i * 0x10, "AA".repeat(16)))
            .collect();
        let listing = reconstruct(&raw.join("\n"), 0x0100, 0x017F).unwrap();

        let mut expected = 0x0100_u64;
        for line in listing.lines() {
            let record = RecordLine::parse(line).unwrap();
            if record.record_type != RecordType::Data {
                continue;
            }
            assert_eq!(record.address.map(u64::from), Some(expected));
            expected += u64::from(record.byte_count);
        }
        assert_eq!(expected, 0x0180);
        assert!(listing.ends_with(END_OF_FILE_LINE));
    }

    #[test]
    fn test_record_type_round_trip() {
        for code in [0x00, 0x01, 0x02, 0x04, 0xFF] {
            assert_eq!(RecordType::from(code).code(), code);
        }
    }
}
