//! Local address and default gateway enumeration.

use std::net::IpAddr;

use crate::netlink::message::{Message, NlMsgType};
use crate::netlink::types::AddressFamily;
use crate::netlink::types::addr::{IfAddrMsg, IfaAttr, Scope, ifa_flags};
use crate::netlink::types::route::{RT_TABLE_MAIN, RtMsg, RtaAttr};
use crate::netlink::{DumpRequest, Error, Result, Transport};
use crate::util::addr::MacAddr;

const RTN_UNICAST: u8 = 1;

/// An address configured on a local interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAddress {
    pub ifindex: u32,
    pub address: IpAddr,
    pub prefix_len: u8,
    /// Raw RT_SCOPE_* value.
    pub scope: u8,
}

impl LocalAddress {
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
    }
}

/// A default-route gateway and, once resolved, its hardware identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    /// Interface the route leaves through.
    pub ifindex: u32,
    pub address: IpAddr,
    /// Route metric (RTA_PRIORITY), when the kernel reports one.
    pub metric: Option<u32>,
    /// Hardware address found in the neighbor table.
    pub hw_addr: Option<MacAddr>,
    /// Vendor of `hw_addr`, when the vendor database knows it.
    pub vendor: Option<String>,
}

impl Gateway {
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
    }
}

/// Narrow an interface filter: `None` and `Some(0)` both mean every interface.
fn interface_filter(ifindex: Option<u32>) -> Option<u32> {
    ifindex.filter(|&index| index > 0)
}

fn check_errno(message: &Message) -> Result<()> {
    match message.errno() {
        Some(errno) => Err(Error::from_errno(errno)),
        None => Ok(()),
    }
}

/// Enumerate local addresses in dump order.
///
/// Deprecated addresses are skipped. When listing every interface, host
/// and nowhere scoped addresses are skipped too.
pub fn local_addresses<T: Transport>(
    transport: &T,
    ifindex: Option<u32>,
    family: AddressFamily,
) -> Result<Vec<LocalAddress>> {
    let ifindex = interface_filter(ifindex);
    let mut addresses = Vec::new();

    for message in transport.dump(&DumpRequest::Addresses { family })? {
        let message = message?;
        check_errno(&message)?;

        if message.msg_type() != NlMsgType::RTM_NEWADDR {
            continue;
        }

        let body = message.body::<IfAddrMsg>()?;
        let header = *body.header();

        let Some(msg_family) = AddressFamily::from_u8(header.ifa_family) else {
            continue;
        };
        if msg_family == AddressFamily::Unspec || !family.admits(msg_family) {
            continue;
        }

        if ifindex.is_some_and(|index| index != header.ifa_index) {
            continue;
        }

        let flags = u32::from(header.ifa_flags)
            | body.read_u32(IfaAttr::Flags as u16).ok().flatten().unwrap_or(0);
        if flags & ifa_flags::DEPRECATED != 0 {
            continue;
        }

        if ifindex.is_none() && Scope::is_local_only(header.ifa_scope) {
            continue;
        }

        let address = body
            .read_ip(IfaAttr::Local as u16, msg_family)
            .ok()
            .flatten()
            .or_else(|| body.read_ip(IfaAttr::Address as u16, msg_family).ok().flatten());
        let Some(address) = address else {
            continue;
        };

        addresses.push(LocalAddress {
            ifindex: header.ifa_index,
            address,
            prefix_len: header.ifa_prefixlen,
            scope: header.ifa_scope,
        });
    }

    Ok(addresses)
}

/// Enumerate default-route gateways of the main table in dump order.
pub fn local_gateways<T: Transport>(
    transport: &T,
    ifindex: Option<u32>,
    family: AddressFamily,
) -> Result<Vec<Gateway>> {
    let ifindex = interface_filter(ifindex);
    let mut gateways = Vec::new();

    for message in transport.dump(&DumpRequest::Routes { family })? {
        let message = message?;
        check_errno(&message)?;

        if message.msg_type() != NlMsgType::RTM_NEWROUTE {
            continue;
        }

        let body = message.body::<RtMsg>()?;
        let header = *body.header();

        let Some(msg_family) = AddressFamily::from_u8(header.rtm_family) else {
            continue;
        };
        if msg_family == AddressFamily::Unspec || !family.admits(msg_family) {
            continue;
        }

        if !header.is_default() || header.rtm_type != RTN_UNICAST {
            continue;
        }

        let table = body
            .read_u32(RtaAttr::Table as u16)?
            .unwrap_or(u32::from(header.rtm_table));
        if table != RT_TABLE_MAIN {
            continue;
        }

        let metric = body.read_u32(RtaAttr::Priority as u16)?;

        let Some(oif) = body.read_u32(RtaAttr::Oif as u16)? else {
            continue;
        };
        if oif == 0 {
            return Err(Error::MalformedResponse(
                "default route with output interface 0".into(),
            ));
        }
        if ifindex.is_some_and(|index| index != oif) {
            continue;
        }

        let Some(address) = body.read_ip(RtaAttr::Gateway as u16, msg_family)? else {
            continue;
        };

        gateways.push(Gateway {
            ifindex: oif,
            address,
            metric,
            hw_addr: None,
            vendor: None,
        });
    }

    Ok(gateways)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::DumpKind;
    use crate::netlink::fixtures::{self, FixtureTransport};

    fn addresses() -> FixtureTransport {
        FixtureTransport::new().with(
            DumpKind::Addresses,
            vec![
                fixtures::addr_loopback_v4(),
                fixtures::addr_ethernet_v4(),
                fixtures::addr_deprecated_v6(),
                fixtures::addr_ethernet_v6_link(),
                fixtures::link_ethernet(),
            ],
        )
    }

    #[test]
    fn test_all_interfaces_skips_host_scope() {
        let found = local_addresses(&addresses(), None, AddressFamily::Unspec).unwrap();
        let rendered: Vec<_> = found.iter().map(|a| a.address.to_string()).collect();

        assert_eq!(rendered, ["192.168.1.10", "fe80::21a:2bff:fe3c:4d5e"]);
        assert_eq!(found[0].prefix_len, 24);
        assert_eq!(found[1].scope, Scope::Link as u8);
        assert_eq!(found[1].family(), AddressFamily::Inet6);
    }

    #[test]
    fn test_single_interface_keeps_host_scope() {
        let found = local_addresses(&addresses(), Some(1), AddressFamily::Unspec).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, "127.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_zero_index_means_all() {
        let all = local_addresses(&addresses(), None, AddressFamily::Unspec).unwrap();
        let zero = local_addresses(&addresses(), Some(0), AddressFamily::Unspec).unwrap();

        assert_eq!(all, zero);
    }

    #[test]
    fn test_family_filter() {
        let transport = addresses();
        let found = local_addresses(&transport, None, AddressFamily::Inet).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            transport.requests(),
            [DumpRequest::Addresses {
                family: AddressFamily::Inet
            }]
        );
    }

    #[test]
    fn test_header_deprecated_flag() {
        let mut builder = crate::netlink::builder::MessageBuilder::new(NlMsgType::RTM_NEWADDR, 0);
        let mut header = IfAddrMsg::new().with_family(libc::AF_INET as u8).with_index(2);
        header.ifa_flags = ifa_flags::DEPRECATED as u8;
        builder.append_bytes(header.as_bytes());
        builder.append_attr(IfaAttr::Local as u16, &[10, 0, 0, 1]);
        let transport =
            FixtureTransport::new().with(DumpKind::Addresses, vec![fixtures::finish(builder)]);

        assert!(
            local_addresses(&transport, None, AddressFamily::Unspec)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_address_error_reply() {
        let transport = FixtureTransport::new()
            .with(DumpKind::Addresses, vec![fixtures::error_reply(libc::EACCES)]);
        let err = local_addresses(&transport, None, AddressFamily::Unspec).unwrap_err();

        assert!(err.is_permission_denied());
    }

    fn routes(extra: Vec<Message>) -> FixtureTransport {
        let mut messages = vec![fixtures::route_default_v4(), fixtures::route_default_v6()];
        messages.extend(extra);
        FixtureTransport::new().with(DumpKind::Routes, messages)
    }

    #[test]
    fn test_gateways() {
        let found = local_gateways(&routes(vec![]), None, AddressFamily::Unspec).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].ifindex, 2);
        assert_eq!(found[0].address, "192.168.1.1".parse::<IpAddr>().unwrap());
        assert_eq!(found[0].metric, Some(100));
        assert_eq!(found[0].hw_addr, None);
        assert_eq!(found[1].address, "fe80::1".parse::<IpAddr>().unwrap());
        assert_eq!(found[1].metric, Some(1024));
        assert_eq!(found[1].family(), AddressFamily::Inet6);
    }

    #[test]
    fn test_gateways_skip_non_default_and_other_tables() {
        let mut subnet = RtMsg::new().with_family(libc::AF_INET as u8).with_table(254);
        subnet.rtm_dst_len = 24;
        subnet.rtm_type = RTN_UNICAST;
        let mut subnet = fixtures::route(subnet);
        subnet.append_attr_u32(RtaAttr::Oif as u16, 2);
        subnet.append_attr(RtaAttr::Gateway as u16, &[192, 168, 1, 254]);

        let mut other = RtMsg::new().with_family(libc::AF_INET as u8).with_table(252);
        other.rtm_type = RTN_UNICAST;
        let mut other = fixtures::route(other);
        other.append_attr_u32(RtaAttr::Table as u16, 100);
        other.append_attr_u32(RtaAttr::Oif as u16, 2);
        other.append_attr(RtaAttr::Gateway as u16, &[10, 0, 0, 1]);

        let mut direct = RtMsg::new().with_family(libc::AF_INET as u8).with_table(254);
        direct.rtm_type = RTN_UNICAST;
        let mut direct = fixtures::route(direct);
        direct.append_attr_u32(RtaAttr::Oif as u16, 3);

        let transport = routes(vec![
            fixtures::finish(subnet),
            fixtures::finish(other),
            fixtures::finish(direct),
        ]);
        let found = local_gateways(&transport, None, AddressFamily::Unspec).unwrap();

        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_gateways_interface_filter() {
        let transport = routes(vec![]);
        assert_eq!(local_gateways(&transport, Some(2), AddressFamily::Unspec).unwrap().len(), 2);
        assert!(local_gateways(&transport, Some(3), AddressFamily::Unspec).unwrap().is_empty());
    }

    #[test]
    fn test_gateway_zero_oif_is_malformed() {
        let mut header = RtMsg::new().with_family(libc::AF_INET as u8).with_table(254);
        header.rtm_type = RTN_UNICAST;
        let mut builder = fixtures::route(header);
        builder.append_attr_u32(RtaAttr::Oif as u16, 0);
        builder.append_attr(RtaAttr::Gateway as u16, &[10, 0, 0, 1]);

        let err = local_gateways(&routes(vec![fixtures::finish(builder)]), None, AddressFamily::Unspec)
            .unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[test]
    fn test_gateway_transport_failure() {
        let transport = FixtureTransport::new().unavailable(DumpKind::Routes);
        assert!(
            local_gateways(&transport, None, AddressFamily::Unspec)
                .unwrap_err()
                .is_transport()
        );
    }
}
