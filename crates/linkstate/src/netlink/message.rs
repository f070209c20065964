//! Netlink message header, response messages and typed attribute access.

use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{AttrIter, get};
use super::error::{Error, Result};
use super::types::AddressFamily;
use crate::util::addr::MacAddr;

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Check if the kernel flagged the dump as interrupted.
    pub fn is_dump_interrupted(&self) -> bool {
        self.nlmsg_flags & NLM_F_DUMP_INTR != 0
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse header from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Standard netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;

    // Link messages
    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_GETLINK: u16 = 18;

    // Address messages
    pub const RTM_NEWADDR: u16 = 20;
    pub const RTM_GETADDR: u16 = 22;

    // Route messages
    pub const RTM_NEWROUTE: u16 = 24;
    pub const RTM_GETROUTE: u16 = 26;

    // Neighbor messages
    pub const RTM_NEWNEIGH: u16 = 28;
    pub const RTM_GETNEIGH: u16 = 30;

    // Address label messages
    pub const RTM_NEWADDRLABEL: u16 = 72;
    pub const RTM_GETADDRLABEL: u16 = 74;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

// Modifiers to GET request
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

/// Iterator over netlink messages in a received datagram.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLMSG_HDRLEN {
            return None;
        }

        let header = match NlMsgHdr::from_bytes(self.data) {
            Ok(h) => h,
            Err(e) => return Some(Err(e)),
        };

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > self.data.len() {
            self.data = &[];
            return Some(Err(Error::MalformedResponse(format!(
                "invalid message length: {}",
                msg_len
            ))));
        }

        let payload = &self.data[NLMSG_HDRLEN..msg_len];
        let aligned_len = nlmsg_align(msg_len);

        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some(Ok((header, payload)))
    }
}

/// Netlink error message payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse error message from payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }

    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }
}

/// One response message of a dump, owned and detached from its datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: NlMsgHdr,
    payload: Vec<u8>,
}

impl Message {
    /// Create a message from a header and its payload.
    pub fn new(header: NlMsgHdr, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    /// Parse a single complete netlink message (header followed by payload).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match MessageIter::new(data).next() {
            Some(result) => {
                let (header, payload) = result?;
                Ok(Self::new(header, payload.to_vec()))
            }
            None => Err(Error::Truncated {
                expected: NLMSG_HDRLEN,
                actual: data.len(),
            }),
        }
    }

    /// The message type tag.
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    /// The netlink header.
    pub fn header(&self) -> &NlMsgHdr {
        &self.header
    }

    /// The raw payload following the netlink header.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The (negative) errno carried by an error reply, if any.
    ///
    /// ACKs and non-error messages return `None`.
    pub fn errno(&self) -> Option<i32> {
        if !self.header.is_error() {
            return None;
        }
        match NlMsgError::from_bytes(&self.payload) {
            Ok(err) if err.is_ack() => None,
            Ok(err) => Some(err.error),
            Err(_) => Some(-libc::EBADMSG),
        }
    }

    /// Interpret the payload as a fixed header `H` followed by attributes.
    pub fn body<H>(&self) -> Result<Body<'_, H>>
    where
        H: FromBytes + KnownLayout + Immutable,
    {
        let size = std::mem::size_of::<H>();
        let header = H::read_from_prefix(&self.payload)
            .map(|(h, _)| h)
            .map_err(|_| Error::Truncated {
                expected: size,
                actual: self.payload.len(),
            })?;

        let offset = nlmsg_align(size).min(self.payload.len());
        Ok(Body {
            header,
            attrs: &self.payload[offset..],
        })
    }
}

/// A typed view of a message: its fixed family header plus attributes.
///
/// Every `read_*` accessor distinguishes an absent attribute (`Ok(None)`)
/// from one whose payload cannot be read (`Err`).
#[derive(Debug, Clone, Copy)]
pub struct Body<'a, H> {
    header: H,
    attrs: &'a [u8],
}

impl<'a, H> Body<'a, H> {
    /// The fixed family header.
    pub fn header(&self) -> &H {
        &self.header
    }

    /// Iterate over all attributes.
    pub fn attrs(&self) -> AttrIter<'a> {
        AttrIter::new(self.attrs)
    }

    /// Raw payload of the first attribute of the given kind.
    pub fn attr(&self, kind: u16) -> Option<&'a [u8]> {
        self.attrs()
            .find(|(attr_kind, _)| *attr_kind == kind)
            .map(|(_, payload)| payload)
    }

    pub fn read_u32(&self, kind: u16) -> Result<Option<u32>> {
        self.attr(kind).map(get::u32_ne).transpose()
    }

    /// Strings never fail to read; invalid UTF-8 is replaced.
    pub fn read_string(&self, kind: u16) -> Result<Option<Cow<'a, str>>> {
        Ok(self.attr(kind).map(get::string))
    }

    pub fn read_hw_addr(&self, kind: u16) -> Result<Option<MacAddr>> {
        self.attr(kind).map(get::mac).transpose()
    }

    pub fn read_in_addr(&self, kind: u16) -> Result<Option<Ipv4Addr>> {
        self.attr(kind).map(get::ipv4).transpose()
    }

    pub fn read_in6_addr(&self, kind: u16) -> Result<Option<Ipv6Addr>> {
        self.attr(kind).map(get::ipv6).transpose()
    }

    /// Read an address attribute whose width is implied by `family`.
    pub fn read_ip(&self, kind: u16, family: AddressFamily) -> Result<Option<IpAddr>> {
        match family {
            AddressFamily::Inet => Ok(self.read_in_addr(kind)?.map(IpAddr::V4)),
            AddressFamily::Inet6 => Ok(self.read_in6_addr(kind)?.map(IpAddr::V6)),
            AddressFamily::Unspec => Err(Error::InvalidAttribute(format!(
                "attribute {} has no address family",
                kind
            ))),
        }
    }
}
