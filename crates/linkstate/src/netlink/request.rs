//! Dump requests understood by a [`Transport`](super::Transport).

use std::fmt;

use super::builder::MessageBuilder;
use super::message::{NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
use super::types::AddressFamily;
use super::types::addr::IfAddrMsg;
use super::types::addrlabel::IfAddrLblMsg;
use super::types::link::IfInfoMsg;
use super::types::neigh::NdMsg;
use super::types::route::RtMsg;

/// The kind of object a dump enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpKind {
    Links,
    Addresses,
    Routes,
    Neighbors,
    AddressLabels,
}

impl fmt::Display for DumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Links => "link",
            Self::Addresses => "address",
            Self::Routes => "route",
            Self::Neighbors => "neighbor",
            Self::AddressLabels => "address label",
        })
    }
}

/// A single dump request with its filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpRequest {
    /// All links.
    Links,
    /// Addresses of the given family (`Unspec` for all).
    Addresses { family: AddressFamily },
    /// Routes of the given family (`Unspec` for all).
    Routes { family: AddressFamily },
    /// Neighbor entries, narrowed by interface and family where the kernel
    /// honours it. Callers must still filter responses.
    Neighbors { ifindex: u32, family: AddressFamily },
    /// Address labels (IPv6 only in practice).
    AddressLabels { family: AddressFamily },
}

impl DumpRequest {
    pub fn kind(&self) -> DumpKind {
        match self {
            Self::Links => DumpKind::Links,
            Self::Addresses { .. } => DumpKind::Addresses,
            Self::Routes { .. } => DumpKind::Routes,
            Self::Neighbors { .. } => DumpKind::Neighbors,
            Self::AddressLabels { .. } => DumpKind::AddressLabels,
        }
    }

    /// The RTM_GET* message type that starts this dump.
    pub fn request_type(&self) -> u16 {
        match self {
            Self::Links => NlMsgType::RTM_GETLINK,
            Self::Addresses { .. } => NlMsgType::RTM_GETADDR,
            Self::Routes { .. } => NlMsgType::RTM_GETROUTE,
            Self::Neighbors { .. } => NlMsgType::RTM_GETNEIGH,
            Self::AddressLabels { .. } => NlMsgType::RTM_GETADDRLABEL,
        }
    }

    /// The RTM_NEW* message type carried by the dump's responses.
    pub fn response_type(&self) -> u16 {
        match self {
            Self::Links => NlMsgType::RTM_NEWLINK,
            Self::Addresses { .. } => NlMsgType::RTM_NEWADDR,
            Self::Routes { .. } => NlMsgType::RTM_NEWROUTE,
            Self::Neighbors { .. } => NlMsgType::RTM_NEWNEIGH,
            Self::AddressLabels { .. } => NlMsgType::RTM_NEWADDRLABEL,
        }
    }

    /// Serialize the request with the given sequence number.
    pub fn build(&self, seq: u32) -> Vec<u8> {
        let mut builder = MessageBuilder::new(self.request_type(), NLM_F_REQUEST | NLM_F_DUMP);
        builder.set_seq(seq);

        match *self {
            Self::Links => builder.append_bytes(IfInfoMsg::new().as_bytes()),
            Self::Addresses { family } => {
                builder.append_bytes(IfAddrMsg::new().with_family(family.as_u8()).as_bytes())
            }
            Self::Routes { family } => {
                builder.append_bytes(RtMsg::new().with_family(family.as_u8()).as_bytes())
            }
            Self::Neighbors { ifindex, family } => builder.append_bytes(
                NdMsg::new()
                    .with_family(family.as_u8())
                    .with_ifindex(ifindex as i32)
                    .as_bytes(),
            ),
            Self::AddressLabels { family } => {
                builder.append_bytes(IfAddrLblMsg::new().with_family(family.as_u8()).as_bytes())
            }
        }

        builder.finish()
    }
}
