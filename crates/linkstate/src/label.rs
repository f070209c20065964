//! IPv6 address label table.

use std::net::Ipv6Addr;

use crate::netlink::message::NlMsgType;
use crate::netlink::types::AddressFamily;
use crate::netlink::types::addrlabel::{IfAddrLblMsg, IfalAttr};
use crate::netlink::{DumpRequest, Error, Result, Transport};

/// One entry of the address label table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLabel {
    pub label: u32,
    pub prefix: Ipv6Addr,
    pub prefix_len: u8,
}

/// Dump the IPv6 address label table in kernel order.
///
/// Entries that cannot be read are skipped; a missing label attribute
/// reads as label 0.
pub fn address_labels<T: Transport>(transport: &T) -> Result<Vec<AddressLabel>> {
    let request = DumpRequest::AddressLabels {
        family: AddressFamily::Inet6,
    };
    let mut labels = Vec::new();

    for message in transport.dump(&request)? {
        let message = message?;

        if let Some(errno) = message.errno() {
            tracing::warn!(error = %Error::from_errno(errno), "address label dump returned an error");
            continue;
        }

        if message.msg_type() != NlMsgType::RTM_NEWADDRLABEL {
            continue;
        }

        let body = match message.body::<IfAddrLblMsg>() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable address label");
                continue;
            }
        };

        let label = match body.read_u32(IfalAttr::Label as u16) {
            Ok(label) => label.unwrap_or(0),
            Err(e) => {
                tracing::warn!(error = %e, "could not read address label, ignoring");
                continue;
            }
        };

        let Ok(Some(prefix)) = body.read_in6_addr(IfalAttr::Address as u16) else {
            continue;
        };

        labels.push(AddressLabel {
            label,
            prefix,
            prefix_len: body.header().ifal_prefixlen,
        });
    }

    Ok(labels)
}
