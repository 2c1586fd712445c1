//! Command implementations.
//!
//! Each subcommand is implemented in its own module for clean separation.

pub(crate) mod catalog;
pub(crate) mod checksum;
pub(crate) mod completions;
pub(crate) mod device;
