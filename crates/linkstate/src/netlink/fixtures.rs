//! Netlink message fixtures for testing.
//!
//! Payloads are hand-annotated little-endian captures of what the kernel
//! sends for a small host: loopback plus one Ethernet link (`eth0`,
//! index 2) with a default IPv4 and IPv6 gateway. [`FixtureTransport`]
//! replays them per dump kind.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{Message, NLM_F_MULTI, NlMsgHdr, NlMsgType};
use super::request::{DumpKind, DumpRequest};
use super::transport::Transport;
use super::types::addrlabel::IfAddrLblMsg;
use super::types::link::IfInfoMsg;
use super::types::neigh::NdMsg;
use super::types::route::RtMsg;

/// Wrap a payload in a netlink header.
pub fn message(msg_type: u16, payload: Vec<u8>) -> Message {
    let mut header = NlMsgHdr::new(msg_type, NLM_F_MULTI);
    header.nlmsg_len += payload.len() as u32;
    Message::new(header, payload)
}

/// An NLMSG_ERROR reply carrying a negative errno.
pub fn error_reply(errno: i32) -> Message {
    let mut payload = (-errno).to_ne_bytes().to_vec();
    payload.extend_from_slice(NlMsgHdr::new(NlMsgType::RTM_GETLINK, 0).as_bytes());
    message(NlMsgType::ERROR, payload)
}

/// Loopback link. Captured from: ip link show lo
pub fn link_loopback() -> Message {
    message(
        NlMsgType::RTM_NEWLINK,
        vec![
            // ifinfomsg: family=0, type=772 (ARPHRD_LOOPBACK), index=1, flags=UP|LOOPBACK|RUNNING
            0x00, 0x00, // family, pad
            0x04, 0x03, // type = 772
            0x01, 0x00, 0x00, 0x00, // index = 1
            0x49, 0x00, 0x00, 0x00, // flags
            0x00, 0x00, 0x00, 0x00, // change = 0
            // IFLA_IFNAME = "lo"
            0x07, 0x00, 0x03, 0x00, //
            b'l', b'o', 0x00, 0x00, // "lo\0" + padding
            // IFLA_MTU = 65536
            0x08, 0x00, 0x04, 0x00, //
            0x00, 0x00, 0x01, 0x00, //
            // IFLA_ADDRESS = 00:00:00:00:00:00
            0x0a, 0x00, 0x01, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // + padding
            // IFLA_NUM_TX_QUEUES = 1
            0x08, 0x00, 0x1f, 0x00, //
            0x01, 0x00, 0x00, 0x00, //
            // IFLA_NUM_RX_QUEUES = 1
            0x08, 0x00, 0x20, 0x00, //
            0x01, 0x00, 0x00, 0x00, //
        ],
    )
}

/// Ethernet link eth0 with a full MTU range and multiple queues.
pub fn link_ethernet() -> Message {
    message(
        NlMsgType::RTM_NEWLINK,
        vec![
            // ifinfomsg: family=0, type=1 (ARPHRD_ETHER), index=2, flags=UP|BROADCAST|RUNNING|MULTICAST
            0x00, 0x00, // family, pad
            0x01, 0x00, // type = 1
            0x02, 0x00, 0x00, 0x00, // index = 2
            0x43, 0x10, 0x00, 0x00, // flags = 0x1043
            0x00, 0x00, 0x00, 0x00, // change = 0
            // IFLA_IFNAME = "eth0"
            0x09, 0x00, 0x03, 0x00, //
            b'e', b't', b'h', b'0', 0x00, 0x00, 0x00, 0x00, // "eth0\0" + padding
            // IFLA_MTU = 1500
            0x08, 0x00, 0x04, 0x00, //
            0xdc, 0x05, 0x00, 0x00, //
            // IFLA_ADDRESS = 00:1a:2b:3c:4d:5e
            0x0a, 0x00, 0x01, 0x00, //
            0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x00, 0x00, // + padding
            // IFLA_MIN_MTU = 68
            0x08, 0x00, 0x32, 0x00, //
            0x44, 0x00, 0x00, 0x00, //
            // IFLA_MAX_MTU = 9000
            0x08, 0x00, 0x33, 0x00, //
            0x28, 0x23, 0x00, 0x00, //
            // IFLA_NUM_TX_QUEUES = 4
            0x08, 0x00, 0x1f, 0x00, //
            0x04, 0x00, 0x00, 0x00, //
            // IFLA_NUM_RX_QUEUES = 4
            0x08, 0x00, 0x20, 0x00, //
            0x04, 0x00, 0x00, 0x00, //
        ],
    )
}

/// A minimal link message: header, name and optional extra attributes.
pub fn link(index: i32, ifi_type: u16, name: &str) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_MULTI);
    builder.append_bytes(IfInfoMsg::new().with_index(index).with_type(ifi_type).as_bytes());
    builder.append_attr_str(3, name);
    builder
}

/// IPv4 loopback address 127.0.0.1/8, host scope.
pub fn addr_loopback_v4() -> Message {
    message(
        NlMsgType::RTM_NEWADDR,
        vec![
            // ifaddrmsg: family=AF_INET, prefixlen=8, flags=IFA_F_PERMANENT, scope=RT_SCOPE_HOST, index=1
            0x02, 0x08, 0x80, 0xfe, //
            0x01, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS = 127.0.0.1
            0x08, 0x00, 0x01, 0x00, //
            0x7f, 0x00, 0x00, 0x01, //
            // IFA_LOCAL = 127.0.0.1
            0x08, 0x00, 0x02, 0x00, //
            0x7f, 0x00, 0x00, 0x01, //
            // IFA_LABEL = "lo"
            0x07, 0x00, 0x03, 0x00, //
            b'l', b'o', 0x00, 0x00, //
        ],
    )
}

/// 192.168.1.10/24 on eth0, universe scope.
pub fn addr_ethernet_v4() -> Message {
    message(
        NlMsgType::RTM_NEWADDR,
        vec![
            // ifaddrmsg: family=AF_INET, prefixlen=24, flags=0, scope=0, index=2
            0x02, 0x18, 0x00, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS = 192.168.1.10
            0x08, 0x00, 0x01, 0x00, //
            0xc0, 0xa8, 0x01, 0x0a, //
            // IFA_LOCAL = 192.168.1.10
            0x08, 0x00, 0x02, 0x00, //
            0xc0, 0xa8, 0x01, 0x0a, //
        ],
    )
}

/// fe80::21a:2bff:fe3c:4d5e/64 on eth0, link scope. No IFA_LOCAL.
pub fn addr_ethernet_v6_link() -> Message {
    message(
        NlMsgType::RTM_NEWADDR,
        vec![
            // ifaddrmsg: family=AF_INET6, prefixlen=64, flags=IFA_F_PERMANENT, scope=RT_SCOPE_LINK, index=2
            0x0a, 0x40, 0x80, 0xfd, //
            0x02, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS
            0x14, 0x00, 0x01, 0x00, //
            0xfe, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x02, 0x1a, 0x2b, 0xff, 0xfe, 0x3c, 0x4d, 0x5e, //
            // IFA_FLAGS = IFA_F_PERMANENT
            0x08, 0x00, 0x08, 0x00, //
            0x80, 0x00, 0x00, 0x00, //
        ],
    )
}

/// 2001:db8::10/64 on eth0, deprecated through IFA_FLAGS only.
pub fn addr_deprecated_v6() -> Message {
    message(
        NlMsgType::RTM_NEWADDR,
        vec![
            // ifaddrmsg: family=AF_INET6, prefixlen=64, flags=0, scope=0, index=2
            0x0a, 0x40, 0x00, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS = 2001:db8::10
            0x14, 0x00, 0x01, 0x00, //
            0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, //
            // IFA_FLAGS = IFA_F_DEPRECATED
            0x08, 0x00, 0x08, 0x00, //
            0x20, 0x00, 0x00, 0x00, //
        ],
    )
}

/// Default IPv4 route via 192.168.1.1 on eth0, metric 100.
pub fn route_default_v4() -> Message {
    message(
        NlMsgType::RTM_NEWROUTE,
        vec![
            // rtmsg: family=AF_INET, dst_len=0, src_len=0, tos=0, table=RT_TABLE_MAIN,
            // protocol=RTPROT_DHCP, scope=RT_SCOPE_UNIVERSE, type=RTN_UNICAST
            0x02, 0x00, 0x00, 0x00, //
            0xfe, 0x10, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x00, // flags = 0
            // RTA_TABLE = 254
            0x08, 0x00, 0x0f, 0x00, //
            0xfe, 0x00, 0x00, 0x00, //
            // RTA_PRIORITY = 100
            0x08, 0x00, 0x06, 0x00, //
            0x64, 0x00, 0x00, 0x00, //
            // RTA_GATEWAY = 192.168.1.1
            0x08, 0x00, 0x05, 0x00, //
            0xc0, 0xa8, 0x01, 0x01, //
            // RTA_OIF = 2
            0x08, 0x00, 0x04, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
        ],
    )
}

/// Default IPv6 route via fe80::1 on eth0, metric 1024.
pub fn route_default_v6() -> Message {
    message(
        NlMsgType::RTM_NEWROUTE,
        vec![
            // rtmsg: family=AF_INET6, dst_len=0, src_len=0, table=RT_TABLE_MAIN, protocol=RTPROT_RA
            0x0a, 0x00, 0x00, 0x00, //
            0xfe, 0x09, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x00, //
            // RTA_TABLE = 254
            0x08, 0x00, 0x0f, 0x00, //
            0xfe, 0x00, 0x00, 0x00, //
            // RTA_PRIORITY = 1024
            0x08, 0x00, 0x06, 0x00, //
            0x00, 0x04, 0x00, 0x00, //
            // RTA_GATEWAY = fe80::1
            0x14, 0x00, 0x05, 0x00, //
            0xfe, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, //
            // RTA_OIF = 2
            0x08, 0x00, 0x04, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
        ],
    )
}

/// A route message built from a header and optional attributes.
pub fn route(header: RtMsg) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWROUTE, NLM_F_MULTI);
    builder.append_bytes(header.as_bytes());
    builder
}

/// ARP entry for the IPv4 gateway: 192.168.1.1 is 00:11:22:33:44:55 on eth0.
pub fn neigh_gateway_v4() -> Message {
    message(
        NlMsgType::RTM_NEWNEIGH,
        vec![
            // ndmsg: family=AF_INET, ifindex=2, state=NUD_REACHABLE, flags=0, type=RTN_UNICAST
            0x02, 0x00, 0x00, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
            0x02, 0x00, 0x00, 0x01, //
            // NDA_DST = 192.168.1.1
            0x08, 0x00, 0x01, 0x00, //
            0xc0, 0xa8, 0x01, 0x01, //
            // NDA_LLADDR = 00:11:22:33:44:55
            0x0a, 0x00, 0x02, 0x00, //
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x00, 0x00, // + padding
        ],
    )
}

/// A neighbor message built from a header and optional attributes.
pub fn neigh(header: NdMsg) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWNEIGH, NLM_F_MULTI);
    builder.append_bytes(header.as_bytes());
    builder
}

/// Default label table entry: ::1/128 has label 0.
pub fn addrlabel_loopback() -> Message {
    message(
        NlMsgType::RTM_NEWADDRLABEL,
        vec![
            // ifaddrlblmsg: family=AF_INET6, reserved=0, prefixlen=128, flags=0, index=0, seq=0
            0x0a, 0x00, 0x80, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
            // IFAL_ADDRESS = ::1
            0x14, 0x00, 0x01, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, //
            // IFAL_LABEL = 0
            0x08, 0x00, 0x02, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
        ],
    )
}

/// Default label table entry: ::ffff:0.0.0.0/96 has label 4.
pub fn addrlabel_v4_mapped() -> Message {
    message(
        NlMsgType::RTM_NEWADDRLABEL,
        vec![
            // ifaddrlblmsg: family=AF_INET6, prefixlen=96
            0x0a, 0x00, 0x60, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
            // IFAL_ADDRESS = ::ffff:0.0.0.0
            0x14, 0x00, 0x01, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, //
            // IFAL_LABEL = 4
            0x08, 0x00, 0x02, 0x00, //
            0x04, 0x00, 0x00, 0x00, //
        ],
    )
}

/// An address label message built from a header and optional attributes.
pub fn addrlabel(header: IfAddrLblMsg) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWADDRLABEL, NLM_F_MULTI);
    builder.append_bytes(header.as_bytes());
    builder
}

/// Finish a fixture builder into a message.
pub fn finish(builder: MessageBuilder) -> Message {
    Message::from_bytes(&builder.finish()).expect("fixture builder produced a bad message")
}

/// Replays canned responses per dump kind and records every request.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    dumps: HashMap<DumpKind, Vec<Message>>,
    unavailable: HashSet<DumpKind>,
    broken: HashSet<DumpKind>,
    requests: RefCell<Vec<DumpRequest>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses served for dumps of `kind`.
    pub fn with(mut self, kind: DumpKind, messages: Vec<Message>) -> Self {
        self.dumps.insert(kind, messages);
        self
    }

    /// Make dumps of `kind` fail before any response.
    pub fn unavailable(mut self, kind: DumpKind) -> Self {
        self.unavailable.insert(kind);
        self
    }

    /// Make dumps of `kind` fail after their canned responses.
    pub fn broken(mut self, kind: DumpKind) -> Self {
        self.broken.insert(kind);
        self
    }

    /// Every request issued so far.
    pub fn requests(&self) -> Vec<DumpRequest> {
        self.requests.borrow().clone()
    }
}

fn transport_failure() -> Error {
    Error::Transport(io::Error::new(io::ErrorKind::ConnectionReset, "fixture failure"))
}

impl Transport for FixtureTransport {
    type Dump<'a> = std::vec::IntoIter<Result<Message>>;

    fn dump(&self, request: &DumpRequest) -> Result<Self::Dump<'_>> {
        self.requests.borrow_mut().push(*request);

        let kind = request.kind();
        if self.unavailable.contains(&kind) {
            return Err(transport_failure());
        }

        let mut responses: Vec<Result<Message>> = self
            .dumps
            .get(&kind)
            .map(|messages| messages.iter().cloned().map(Ok).collect())
            .unwrap_or_default();
        if self.broken.contains(&kind) {
            responses.push(Err(transport_failure()));
        }

        Ok(responses.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::types::addr::IfAddrMsg;

    #[test]
    fn test_fixture_lengths() {
        for msg in [
            link_loopback(),
            link_ethernet(),
            addr_loopback_v4(),
            addr_ethernet_v4(),
            addr_ethernet_v6_link(),
            addr_deprecated_v6(),
            route_default_v4(),
            route_default_v6(),
            neigh_gateway_v4(),
            addrlabel_loopback(),
            addrlabel_v4_mapped(),
        ] {
            assert_eq!(msg.payload().len() % 4, 0);
            assert_eq!(msg.header().nlmsg_len as usize, 16 + msg.payload().len());
        }
    }

    #[test]
    fn test_address_fixture_body() {
        let msg = addr_ethernet_v4();
        let body = msg.body::<IfAddrMsg>().unwrap();
        assert_eq!(body.header().ifa_index, 2);
        assert_eq!(body.header().ifa_prefixlen, 24);
        assert_eq!(
            body.read_in_addr(2).unwrap(),
            Some("192.168.1.10".parse().unwrap())
        );
    }

    #[test]
    fn test_transport_records_requests() {
        let transport = FixtureTransport::new()
            .with(DumpKind::Links, vec![link_loopback()])
            .unavailable(DumpKind::Routes);

        assert_eq!(transport.dump(&DumpRequest::Links).unwrap().count(), 1);
        assert!(
            transport
                .dump(&DumpRequest::Routes {
                    family: Default::default()
                })
                .is_err()
        );
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_error_reply() {
        assert_eq!(error_reply(libc::EPERM).errno(), Some(-libc::EPERM));
    }
}
