//! Block-wise device reads.
//!
//! The programmer transfers at most [`BLOCK_SIZE`] bytes per load cycle, so a
//! device range is split into consecutive blocks and each block is driven
//! through the five-command sequence described in [`crate::protocol`].

use {
    crate::{
        catalog::DeviceProfile,
        error::Result,
        link::Link,
        port::Port,
        protocol::{BLOCK_SIZE, Command, clean_response},
    },
    log::{debug, info},
};

/// One fixed-size address window of a device read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Zero-based block number.
    pub index: u32,
    /// First address of the block.
    pub start: u32,
    /// Last address of the block (inclusive).
    pub end: u32,
}

impl Block {
    /// Number of device bytes covered by this block.
    pub fn size(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }
}

/// Number of blocks needed to cover `start..=end`.
///
/// Returns 0 for an inverted range.
pub fn block_count(start: u32, end: u32) -> u64 {
    if start > end {
        return 0;
    }
    let range = u64::from(end) - u64::from(start) + 1;
    range.div_ceil(u64::from(BLOCK_SIZE))
}

/// Iterator over the blocks partitioning an inclusive address range.
#[derive(Debug, Clone)]
pub struct Blocks {
    start: u32,
    end: u32,
    next_index: u64,
    total: u64,
}

impl Iterator for Blocks {
    type Item = Block;

    // All values are bounded by `end`, which is a u32
    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Block> {
        if self.next_index >= self.total {
            return None;
        }
        let block_start = u64::from(self.start) + self.next_index * u64::from(BLOCK_SIZE);
        if block_start > u64::from(self.end) {
            return None;
        }
        let block_end = (block_start + u64::from(BLOCK_SIZE) - 1).min(u64::from(self.end));
        let index = self.next_index;
        self.next_index += 1;

        Some(Block {
            index: index as u32,
            start: block_start as u32,
            end: block_end as u32,
        })
    }
}

/// Split `start..=end` into [`BLOCK_SIZE`] blocks.
pub fn blocks(start: u32, end: u32) -> Blocks {
    Blocks {
        start,
        end,
        next_index: 0,
        total: block_count(start, end),
    }
}

/// Drives a link through the block read sequence.
pub struct BlockReader<'a, P: Port> {
    link: &'a mut Link<P>,
}

impl<'a, P: Port> BlockReader<'a, P> {
    /// Create a reader over a live, handshaken link.
    pub fn new(link: &'a mut Link<P>) -> Self {
        Self { link }
    }

    /// Read the whole device range and return the concatenated dump.
    ///
    /// Only the cleaned answers to the output command are collected; the
    /// other responses are logged. The first failing command aborts the
    /// read and nothing collected so far is returned.
    ///
    /// # Arguments
    ///
    /// * `profile` - Device whose address range is read
    /// * `progress` - Progress callback (block, total_blocks), called before each block
    pub fn read_device<F>(&mut self, profile: &DeviceProfile, mut progress: F) -> Result<String>
    where
        F: FnMut(&Block, u64),
    {
        let total = block_count(profile.start_address, profile.end_address);
        info!(
            "Device {} needs to be read in {total} blocks",
            profile.display_name
        );

        let mut dump = String::new();
        for block in blocks(profile.start_address, profile.end_address) {
            progress(&block, total);
            debug!(
                "Block {}: {:04X} - {:04X}",
                block.index + 1,
                block.start,
                block.end
            );
            dump.push_str(&self.read_block(&block)?);
        }

        Ok(dump)
    }

    /// Run the command sequence for one block and return its cleaned dump.
    pub fn read_block(&mut self, block: &Block) -> Result<String> {
        let mut output = String::new();
        for command in Command::block_sequence(block.start) {
            let response = self
                .link
                .send(command)?;
            let cleaned = clean_response(&response);
            debug!("{} -> {cleaned}", command.text());
            if command == Command::Output {
                output = cleaned;
            }
        }
        Ok(output)
    }
}
