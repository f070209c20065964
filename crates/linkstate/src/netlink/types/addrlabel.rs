//! IPv6 address label message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Address label message (struct ifaddrlblmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrLblMsg {
    pub ifal_family: u8,
    pub ifal_reserved: u8,
    /// Prefix length.
    pub ifal_prefixlen: u8,
    pub ifal_flags: u8,
    pub ifal_index: u32,
    /// Sequence number of the label table.
    pub ifal_seq: u32,
}

impl IfAddrLblMsg {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ifal_family = family;
        self
    }

    pub fn with_prefixlen(mut self, prefixlen: u8) -> Self {
        self.ifal_prefixlen = prefixlen;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Address label attributes (IFAL_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum IfalAttr {
    Address = 1,
    Label = 2,
}
