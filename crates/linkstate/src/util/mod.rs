//! Small shared helpers.

pub mod addr;

pub use addr::{AddrError, MacAddr, format_mac, format_prefix, hex_string, parse_mac};
