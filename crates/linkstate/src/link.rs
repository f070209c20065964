//! Link table decoding, filtering and enumeration.

use glob::Pattern;

use crate::netlink::message::{Message, NlMsgType};
use crate::netlink::types::link::{IfInfoMsg, IflaAttr, arphrd_name};
use crate::netlink::{DumpRequest, Error, Result, Transport};
use crate::util::addr::MacAddr;

/// MTU of a link with the bounds the driver reports, when it reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mtu {
    pub value: u32,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// One network interface as reported by the kernel link table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Kernel interface index, always positive.
    pub index: u32,
    pub name: String,
    /// Hardware type code (ARPHRD_*).
    pub iftype: u16,
    /// Hardware address; an all-zero address is reported as `None`.
    pub hw_addr: Option<MacAddr>,
    pub mtu: Option<Mtu>,
    pub tx_queues: Option<u32>,
    pub rx_queues: Option<u32>,
}

impl LinkInfo {
    /// Decode one link dump response.
    ///
    /// Returns `Ok(None)` for messages that are not `RTM_NEWLINK`. The
    /// index, name and type are mandatory and fail the decode when they
    /// cannot be read; every other field is read best effort and left
    /// unset on failure.
    pub fn decode(message: &Message) -> Result<Option<Self>> {
        if message.msg_type() != NlMsgType::RTM_NEWLINK {
            return Ok(None);
        }

        let body = message.body::<IfInfoMsg>()?;
        let header = body.header();

        let index = u32::try_from(header.ifi_index)
            .ok()
            .filter(|&index| index > 0)
            .ok_or_else(|| {
                Error::MalformedResponse(format!("invalid link index {}", header.ifi_index))
            })?;

        let name = body
            .read_string(IflaAttr::Ifname as u16)?
            .ok_or_else(|| Error::MalformedResponse(format!("link {} has no name", index)))?
            .into_owned();

        let hw_addr = body
            .read_hw_addr(IflaAttr::Address as u16)
            .ok()
            .flatten()
            .filter(|mac| !mac.is_zero());

        let positive = |kind: IflaAttr| {
            body.read_u32(kind as u16)
                .ok()
                .flatten()
                .filter(|&value| value > 0)
        };

        let mtu = positive(IflaAttr::Mtu).map(|value| Mtu {
            value,
            min: positive(IflaAttr::MinMtu),
            max: positive(IflaAttr::MaxMtu),
        });

        Ok(Some(Self {
            index,
            name,
            iftype: header.ifi_type,
            hw_addr,
            mtu,
            tx_queues: positive(IflaAttr::NumTxQueues),
            rx_queues: positive(IflaAttr::NumRxQueues),
        }))
    }

    /// The lower-case hardware type name, e.g. `ether` or `loopback`.
    pub fn type_name(&self) -> Option<&'static str> {
        arphrd_name(self.iftype)
    }
}

/// Shell-style patterns matched against link index or name.
///
/// An empty filter accepts every link.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    patterns: Vec<Pattern>,
}

impl LinkFilter {
    /// Accept every link.
    pub fn all() -> Self {
        Self::default()
    }

    /// Compile a set of patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| Error::Pattern {
                    pattern: p.to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check if a link with this index and name passes the filter.
    pub fn matches(&self, index: u32, name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let index = index.to_string();
        self.patterns
            .iter()
            .any(|p| p.matches(&index) || p.matches(name))
    }
}

/// Dump the link table and return the links passing `filter`, ordered by
/// index.
pub fn enumerate_links<T: Transport>(transport: &T, filter: &LinkFilter) -> Result<Vec<LinkInfo>> {
    let mut links = Vec::new();

    for message in transport.dump(&DumpRequest::Links)? {
        let message = message?;
        if let Some(errno) = message.errno() {
            return Err(Error::from_errno(errno));
        }

        let Some(link) = LinkInfo::decode(&message)? else {
            continue;
        };
        if filter.matches(link.index, &link.name) {
            links.push(link);
        }
    }

    links.sort_by_key(|link| link.index);
    tracing::debug!(count = links.len(), "enumerated links");

    Ok(links)
}

/// Find a link by name or decimal index.
pub fn find_link<'a>(links: &'a [LinkInfo], name_or_index: &str) -> Option<&'a LinkInfo> {
    match name_or_index.parse::<u32>() {
        Ok(index) => links.iter().find(|link| link.index == index),
        Err(_) => links.iter().find(|link| link.name == name_or_index),
    }
}
