//! Data I/O 20B remote-mode command set.
//!
//! The programmer speaks a line-oriented ASCII protocol. Each command is a
//! short string terminated by a carriage return; the programmer answers with
//! free-form text and falls silent once it is done, so the end of a response
//! is detected by a read timeout rather than by framing.
//!
//! ## Block read sequence
//!
//! ```text
//! +------------+---------+----------------------------------------+
//! |  Command   | Timeout | Meaning                                |
//! +------------+---------+----------------------------------------+
//! | SSSS<      |  0.5 s  | set block start address                |
//! | 0800;      |  0.5 s  | set block length                       |
//! | SSSS:      |  0.5 s  | re-arm start address for the transfer  |
//! | L          |  3.0 s  | load device into programmer RAM        |
//! | O          |  0.5 s  | output RAM as hex records              |
//! +------------+---------+----------------------------------------+
//! ```

use std::time::Duration;

/// Default baud rate of the programmer's remote port.
pub const DEFAULT_BAUD: u32 = 9600;

/// Default read timeout, in effect whenever no command override applies.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for quick commands (address setup, status, output).
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(500);

/// Timeout for the load command, which reads the physical device.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of device bytes fetched per block.
pub const BLOCK_SIZE: u32 = 0x0800;

/// Prompt the programmer prints when it is idle in remote mode.
pub const PROMPT: &str = ">";

/// Line terminator appended to every command.
pub const COMMAND_TERMINATOR: char = '\r';

/// Remote-mode commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Escape sequence that wakes the remote interface (`ESC [ A`).
    Handshake,
    /// Programmer status (`R`).
    Status,
    /// Set the RAM/device start address (`SSSS<`).
    SetStartAddress(u32),
    /// Set the block length (`NNNN;`).
    SetBlockSize(u32),
    /// Re-arm the start address before a transfer (`SSSS:`).
    ArmTransfer(u32),
    /// Load the device contents into programmer RAM (`L`).
    Load,
    /// Output programmer RAM (`O`).
    Output,
}

impl Command {
    /// Command text, without the trailing carriage return.
    pub fn text(&self) -> String {
        match self {
            Self::Handshake => "\x1B[A".to_string(),
            Self::Status => "R".to_string(),
            Self::SetStartAddress(addr) => format!("{addr:04X}<"),
            Self::SetBlockSize(size) => format!("{size:04X};"),
            Self::ArmTransfer(addr) => format!("{addr:04X}:"),
            Self::Load => "L".to_string(),
            Self::Output => "O".to_string(),
        }
    }

    /// How long to wait for the programmer to finish answering.
    pub fn timeout(&self) -> Duration {
        match self {
            Self::Load => LOAD_TIMEOUT,
            _ => SHORT_TIMEOUT,
        }
    }

    /// Commands issued for one block, in order.
    pub fn block_sequence(start: u32) -> [Self; 5] {
        [
            Self::SetStartAddress(start),
            Self::SetBlockSize(BLOCK_SIZE),
            Self::ArmTransfer(start),
            Self::Load,
            Self::Output,
        ]
    }
}

/// Strip NULs and carriage returns from a response, then trim it.
pub fn clean_response(response: &str) -> String {
    response
        .chars()
        .filter(|c| *c != '\0' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_text() {
        assert_eq!(Command::Handshake.text(), "\u{1b}[A");
        assert_eq!(Command::Status.text(), "R");
        assert_eq!(Command::SetStartAddress(0x0800).text(), "0800<");
        assert_eq!(Command::SetBlockSize(BLOCK_SIZE).text(), "0800;");
        assert_eq!(Command::ArmTransfer(0x1000).text(), "1000:");
        assert_eq!(Command::Load.text(), "L");
        assert_eq!(Command::Output.text(), "O");
    }

    #[test]
    fn test_address_is_zero_padded() {
        assert_eq!(Command::SetStartAddress(0).text(), "0000<");
        assert_eq!(Command::ArmTransfer(0x3F).text(), "003F:");
    }

    #[test]
    fn test_address_wider_than_four_digits() {
        assert_eq!(Command::SetStartAddress(0x1_0000).text(), "10000<");
    }

    #[test]
    fn test_command_timeouts() {
        assert_eq!(Command::Load.timeout(), Duration::from_secs(3));
        assert_eq!(Command::Output.timeout(), Duration::from_millis(500));
        assert_eq!(Command::Handshake.timeout(), Duration::from_millis(500));
        assert_eq!(Command::SetBlockSize(BLOCK_SIZE).timeout(), SHORT_TIMEOUT);
    }

    #[test]
    fn test_block_sequence_order() {
        let seq: Vec<String> = Command::block_sequence(0x1800)
            .iter()
            .map(Command::text)
            .collect();
        assert_eq!(seq, ["1800<", "0800;", "1800:", "L", "O"]);
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("\0:10\r\n:20\r\0  "), ":10\n:20");
        assert_eq!(clean_response("\r\r"), "");
        assert_eq!(clean_response(">"), ">");
    }
}
