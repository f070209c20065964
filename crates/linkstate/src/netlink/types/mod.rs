//! Fixed family headers and attribute kinds for the rtnetlink messages
//! this crate dumps.

pub mod addr;
pub mod addrlabel;
pub mod link;
pub mod neigh;
pub mod route;

use std::fmt;

/// Address family selector used by dump requests and response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// Any family.
    #[default]
    Unspec,
    Inet,
    Inet6,
}

impl AddressFamily {
    /// The raw AF_* value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Unspec => libc::AF_UNSPEC as u8,
            Self::Inet => libc::AF_INET as u8,
            Self::Inet6 => libc::AF_INET6 as u8,
        }
    }

    /// Map a raw AF_* value; families this crate does not handle yield `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match i32::from(value) {
            libc::AF_UNSPEC => Some(Self::Unspec),
            libc::AF_INET => Some(Self::Inet),
            libc::AF_INET6 => Some(Self::Inet6),
            _ => None,
        }
    }

    /// The family of a concrete address.
    pub fn of(addr: &std::net::IpAddr) -> Self {
        match addr {
            std::net::IpAddr::V4(_) => Self::Inet,
            std::net::IpAddr::V6(_) => Self::Inet6,
        }
    }

    /// Check if a response carrying `family` passes this filter.
    pub fn admits(self, family: Self) -> bool {
        self == Self::Unspec || self == family
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unspec => "unspec",
            Self::Inet => "inet",
            Self::Inet6 => "inet6",
        })
    }
}
