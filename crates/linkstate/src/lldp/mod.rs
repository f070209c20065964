//! LLDP neighbor records and the frame decoder that produces them.
//!
//! A stored frame is a complete Ethernet frame: a 14 byte header followed
//! by a sequence of TLVs, each with a 7 bit type and a 9 bit length packed
//! big-endian into two bytes.

pub mod store;

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use winnow::binary::be_u16;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::netlink::{Error, Result};
use crate::util::addr::{MacAddr, format_mac, hex_string};

pub use store::{LinkNeighbors, NeighborData, NeighborStore, neighbors_for_links, read_neighbors, write_record};

/// Result type for winnow parsers.
type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// EtherType of LLDP frames.
pub const ETHERTYPE_LLDP: u16 = 0x88cc;

/// Destination addresses an LLDP frame may be sent to.
pub const LLDP_MULTICAST_ADDRS: [MacAddr; 3] = [
    // nearest bridge
    MacAddr::new([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]),
    // nearest non-TPMR bridge
    MacAddr::new([0x01, 0x80, 0xc2, 0x00, 0x00, 0x03]),
    // nearest customer bridge
    MacAddr::new([0x01, 0x80, 0xc2, 0x00, 0x00, 0x00]),
];

const ETHER_HEADER_LEN: usize = 14;

/// TLV types.
mod tlv {
    pub const END: u8 = 0;
    pub const CHASSIS_ID: u8 = 1;
    pub const PORT_ID: u8 = 2;
    pub const TTL: u8 = 3;
    pub const PORT_DESCRIPTION: u8 = 4;
    pub const SYSTEM_NAME: u8 = 5;
    pub const SYSTEM_DESCRIPTION: u8 = 6;
    pub const SYSTEM_CAPABILITIES: u8 = 7;
    pub const PRIVATE: u8 = 127;
}

mod chassis_subtype {
    pub const CHASSIS_COMPONENT: u8 = 1;
    pub const INTERFACE_ALIAS: u8 = 2;
    pub const PORT_COMPONENT: u8 = 3;
    pub const MAC_ADDRESS: u8 = 4;
    pub const NETWORK_ADDRESS: u8 = 5;
    pub const INTERFACE_NAME: u8 = 6;
    pub const LOCALLY_ASSIGNED: u8 = 7;
}

mod port_subtype {
    pub const INTERFACE_ALIAS: u8 = 1;
    pub const PORT_COMPONENT: u8 = 2;
    pub const MAC_ADDRESS: u8 = 3;
    pub const INTERFACE_NAME: u8 = 5;
    pub const LOCALLY_ASSIGNED: u8 = 7;
}

/// LLDP system capabilities, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Capability {
    Other = 1 << 0,
    Repeater = 1 << 1,
    Bridge = 1 << 2,
    WlanAccessPoint = 1 << 3,
    Router = 1 << 4,
    Telephone = 1 << 5,
    DocsisCableDevice = 1 << 6,
    Station = 1 << 7,
    CustomerVlan = 1 << 8,
    ServiceVlan = 1 << 9,
    TwoPortMacRelay = 1 << 10,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Self::Other,
        Self::Repeater,
        Self::Bridge,
        Self::WlanAccessPoint,
        Self::Router,
        Self::Telephone,
        Self::DocsisCableDevice,
        Self::Station,
        Self::CustomerVlan,
        Self::ServiceVlan,
        Self::TwoPortMacRelay,
    ];

    /// Single-letter abbreviation used in capability strings.
    pub fn letter(self) -> char {
        match self {
            Self::Other => 'o',
            Self::Repeater => 'p',
            Self::Bridge => 'b',
            Self::WlanAccessPoint => 'w',
            Self::Router => 'r',
            Self::Telephone => 't',
            Self::DocsisCableDevice => 'd',
            Self::Station => 'a',
            Self::CustomerVlan => 'c',
            Self::ServiceVlan => 's',
            Self::TwoPortMacRelay => 'm',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Repeater => "repeater",
            Self::Bridge => "bridge",
            Self::WlanAccessPoint => "WLAN Access Point",
            Self::Router => "router",
            Self::Telephone => "telephone",
            Self::DocsisCableDevice => "DOCSIS cable device",
            Self::Station => "station",
            Self::CustomerVlan => "customer VLAN",
            Self::ServiceVlan => "service VLAN",
            Self::TwoPortMacRelay => "two-port MAC Relay (TPMR)",
        }
    }

    pub fn is_set(self, mask: u16) -> bool {
        mask & self as u16 != 0
    }

    /// Capabilities present in `mask`.
    pub fn from_mask(mask: u16) -> Vec<Capability> {
        Self::ALL.into_iter().filter(|c| c.is_set(mask)).collect()
    }
}

/// Render a capability mask as `opbwrtdacsm`, with `.` for unset bits.
pub fn capabilities_to_string(mask: u16) -> String {
    Capability::ALL
        .iter()
        .map(|c| if c.is_set(mask) { c.letter() } else { '.' })
        .collect()
}

/// Union of the capabilities enabled on `records`.
pub fn enabled_capability_mask<'a, I>(records: I) -> u16
where
    I: IntoIterator<Item = &'a NeighborRecord>,
{
    records
        .into_iter()
        .filter_map(NeighborRecord::enabled_capabilities)
        .fold(0, |mask, enabled| mask | enabled)
}

/// System capabilities TLV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Capabilities the system supports.
    pub system: u16,
    /// Capabilities currently enabled.
    pub enabled: u16,
}

/// A raw identifier TLV: subtype byte followed by the value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identifier(Vec<u8>);

impl Identifier {
    fn subtype(&self) -> u8 {
        self.0[0]
    }

    fn value(&self) -> &[u8] {
        &self.0[1..]
    }

    fn hex(&self) -> String {
        hex_string(&self.0)
    }

    fn chassis_string(&self) -> String {
        use chassis_subtype::*;

        match self.subtype() {
            CHASSIS_COMPONENT | INTERFACE_ALIAS | PORT_COMPONENT | INTERFACE_NAME
            | LOCALLY_ASSIGNED => escape(self.value()),
            MAC_ADDRESS if self.value().len() == 6 => format_mac(self.value()),
            NETWORK_ADDRESS => format_network_address(self.value()).unwrap_or_else(|| self.hex()),
            _ => self.hex(),
        }
    }

    fn port_string(&self) -> String {
        use port_subtype::*;

        match self.subtype() {
            INTERFACE_ALIAS | PORT_COMPONENT | INTERFACE_NAME | LOCALLY_ASSIGNED => {
                escape(self.value())
            }
            MAC_ADDRESS if self.value().len() == 6 => format_mac(self.value()),
            _ => self.hex(),
        }
    }
}

/// IANA address family number followed by the address.
fn format_network_address(value: &[u8]) -> Option<String> {
    let (&family, addr) = value.split_first()?;
    match family {
        1 => {
            let octets: [u8; 4] = addr.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        2 => {
            let octets: [u8; 16] = addr.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

fn escape(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

/// One neighbor learned via LLDP.
///
/// Chassis and port identifiers are always present in a decoded frame;
/// every other field is only set when the neighbor advertised it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborRecord {
    pub source: MacAddr,
    pub destination: MacAddr,
    pub chassis_id: Option<String>,
    pub port_id: Option<String>,
    /// Time to live in seconds.
    pub ttl: u16,
    pub port_description: Option<String>,
    pub system_name: Option<String>,
    pub system_description: Option<String>,
    pub capabilities: Option<Capabilities>,
}

impl NeighborRecord {
    /// Decode one stored frame.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let mut input = frame;
        let (destination, source) = parse_ether_header(&mut input)
            .map_err(|_| Error::Frame(format!("frame of {} bytes lacks an Ethernet header", frame.len())))?;

        if !LLDP_MULTICAST_ADDRS.contains(&destination) {
            return Err(Error::Frame(format!("unexpected destination address {}", destination)));
        }

        let mut record = Self {
            source,
            destination,
            ..Self::default()
        };
        let mut chassis: Option<Identifier> = None;
        let mut port: Option<Identifier> = None;
        let mut ttl: Option<u16> = None;

        loop {
            let (kind, value) = parse_tlv(&mut input)
                .map_err(|_| Error::Frame("truncated TLV".into()))?;

            match kind {
                tlv::END => {
                    if !value.is_empty() {
                        return Err(Error::Frame("end TLV has a payload".into()));
                    }
                    // trailing bytes are padding
                    break;
                }
                tlv::CHASSIS_ID => set_identifier(&mut chassis, value, "chassis ID")?,
                tlv::PORT_ID => set_identifier(&mut port, value, "port ID")?,
                tlv::TTL => {
                    let [hi, lo] = value else {
                        return Err(Error::Frame(format!("TTL TLV of {} bytes", value.len())));
                    };
                    if ttl.is_some() {
                        return Err(Error::Frame("duplicate TTL TLV".into()));
                    }
                    ttl = Some(u16::from_be_bytes([*hi, *lo]));
                }
                tlv::PORT_DESCRIPTION => set_string(&mut record.port_description, value),
                tlv::SYSTEM_NAME => set_string(&mut record.system_name, value),
                tlv::SYSTEM_DESCRIPTION => set_string(&mut record.system_description, value),
                tlv::SYSTEM_CAPABILITIES => {
                    let [a, b, c, d] = value else {
                        return Err(Error::Frame(format!(
                            "capabilities TLV of {} bytes",
                            value.len()
                        )));
                    };
                    record.capabilities = Some(Capabilities {
                        system: u16::from_be_bytes([*a, *b]),
                        enabled: u16::from_be_bytes([*c, *d]),
                    });
                }
                tlv::PRIVATE if value.len() < 4 => {
                    return Err(Error::Frame("organization specific TLV too short".into()));
                }
                _ => {}
            }
        }

        let (Some(chassis), Some(port), Some(ttl)) = (chassis, port, ttl) else {
            return Err(Error::Frame("missing chassis ID, port ID or TTL".into()));
        };
        record.chassis_id = Some(chassis.chassis_string());
        record.port_id = Some(port.port_string());
        record.ttl = ttl;

        Ok(record)
    }

    /// Capabilities the neighbor has enabled, when it advertised any.
    pub fn enabled_capabilities(&self) -> Option<u16> {
        self.capabilities.map(|c| c.enabled)
    }
}

impl fmt::Display for NeighborRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on port {}",
            self.system_name
                .as_deref()
                .or(self.chassis_id.as_deref())
                .unwrap_or("n/a"),
            self.port_id.as_deref().unwrap_or("n/a")
        )
    }
}

fn set_identifier(slot: &mut Option<Identifier>, value: &[u8], what: &str) -> Result<()> {
    if !(2..=256).contains(&value.len()) {
        return Err(Error::Frame(format!("{} TLV of {} bytes", what, value.len())));
    }
    if slot.is_some() {
        return Err(Error::Frame(format!("duplicate {} TLV", what)));
    }
    *slot = Some(Identifier(value.to_vec()));
    Ok(())
}

/// Store a string TLV. Empty, NUL-containing and repeated strings are ignored.
///
/// Text is kept as sent; only invalid UTF-8 is replaced.
fn set_string(slot: &mut Option<String>, value: &[u8]) {
    let end = value.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let value = &value[..end];

    if value.is_empty() || value.contains(&0) || slot.is_some() {
        tracing::debug!("ignoring unusable string TLV");
        return;
    }
    *slot = Some(String::from_utf8_lossy(value).into_owned());
}

fn parse_ether_header(input: &mut &[u8]) -> PResult<(MacAddr, MacAddr)> {
    let header: &[u8] = take(ETHER_HEADER_LEN).parse_next(input)?;
    let ethertype = u16::from_be_bytes([header[12], header[13]]);
    if ethertype != ETHERTYPE_LLDP {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    let destination = MacAddr::from_slice(&header[0..6]).ok_or(ErrMode::Cut(ContextError::new()))?;
    let source = MacAddr::from_slice(&header[6..12]).ok_or(ErrMode::Cut(ContextError::new()))?;
    Ok((destination, source))
}

/// Parse one TLV and return (type, value).
fn parse_tlv<'a>(input: &mut &'a [u8]) -> PResult<(u8, &'a [u8])> {
    let header = be_u16.parse_next(input)?;
    let kind = (header >> 9) as u8;
    let len = (header & 0x01ff) as usize;
    let value: &[u8] = take(len).parse_next(input)?;
    Ok((kind, value))
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn with_tlvs(tlvs: &[Vec<u8>]) -> Vec<u8> {
        let mut out = ether_header(LLDP_MULTICAST_ADDRS[0]);
        for t in tlvs {
            out.extend_from_slice(t);
        }
        out
    }

    fn mandatory() -> Vec<Vec<u8>> {
        vec![
            tlv(tlv::CHASSIS_ID, b"\x07switch-1"),
            tlv(tlv::PORT_ID, b"\x07port-1"),
            tlv(tlv::TTL, &[0, 120]),
        ]
    }

    #[test]
    fn test_decode_full_frame() {
        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::PORT_DESCRIPTION, b"uplink\0\0"));
        tlvs.push(tlv(tlv::SYSTEM_NAME, b"core-sw"));
        tlvs.push(tlv(tlv::SYSTEM_DESCRIPTION, b"Example OS 1.2"));
        tlvs.push(tlv(tlv::SYSTEM_CAPABILITIES, &[0x00, 0x14, 0x00, 0x04]));
        tlvs.push(tlv(tlv::PRIVATE, &[0x00, 0x12, 0x0f, 0x01, 0x03]));
        tlvs.push(tlv(tlv::END, &[]));

        let record = NeighborRecord::decode(&with_tlvs(&tlvs)).unwrap();

        assert_eq!(record.chassis_id.as_deref(), Some("switch-1"));
        assert_eq!(record.port_id.as_deref(), Some("port-1"));
        assert_eq!(record.ttl, 120);
        assert_eq!(record.port_description.as_deref(), Some("uplink"));
        assert_eq!(record.system_name.as_deref(), Some("core-sw"));
        assert_eq!(record.system_description.as_deref(), Some("Example OS 1.2"));
        assert_eq!(
            record.capabilities,
            Some(Capabilities {
                system: 0x14,
                enabled: 0x04
            })
        );
        assert_eq!(record.enabled_capabilities(), Some(0x04));
        assert_eq!(record.to_string(), "core-sw on port port-1");
    }

    #[test]
    fn test_decode_minimal_frame() {
        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::END, &[]));
        tlvs.push(vec![0; 6]); // padding

        let record = NeighborRecord::decode(&with_tlvs(&tlvs)).unwrap();
        assert_eq!(record.system_name, None);
        assert_eq!(record.capabilities, None);
        assert_eq!(record.enabled_capabilities(), None);
    }

    #[test]
    fn test_identifier_rendering() {
        let frame = frame("sw");
        let record = NeighborRecord::decode(&frame).unwrap();
        assert_eq!(record.chassis_id.as_deref(), Some("00:1a:2b:3c:4d:5e"));
        assert_eq!(record.port_id.as_deref(), Some("gi0/1"));

        let chassis = Identifier(vec![5, 1, 192, 0, 2, 1]);
        assert_eq!(chassis.chassis_string(), "192.0.2.1");

        let mut v6 = vec![5, 2];
        v6.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        assert_eq!(Identifier(v6).chassis_string(), "::1");

        // MAC subtype with a wrong length falls back to hex
        assert_eq!(Identifier(vec![4, 0xaa, 0xbb]).chassis_string(), "04aabb");
        assert_eq!(Identifier(vec![5, 9, 1, 2]).chassis_string(), "05090102");
        assert_eq!(Identifier(vec![3, 2, 0, 0, 0, 0, 1]).port_string(), "02:00:00:00:00:01");
        assert_eq!(Identifier(vec![4, 1, 2]).port_string(), "040102");
        assert_eq!(Identifier(vec![1, b'a', b'\n']).port_string(), "a\\n");
    }

    #[test]
    fn test_strings_kept_as_text() {
        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::SYSTEM_NAME, "B\u{fc}ro-sw1".as_bytes()));
        tlvs.push(tlv(tlv::PORT_DESCRIPTION, b"to\tcore"));
        tlvs.push(tlv(tlv::SYSTEM_DESCRIPTION, b"bad\xff"));
        tlvs.push(tlv(tlv::END, &[]));

        let record = NeighborRecord::decode(&with_tlvs(&tlvs)).unwrap();
        assert_eq!(record.system_name.as_deref(), Some("B\u{fc}ro-sw1"));
        assert_eq!(record.port_description.as_deref(), Some("to\tcore"));
        assert_eq!(record.system_description.as_deref(), Some("bad\u{fffd}"));
    }

    #[test]
    fn test_enabled_capability_mask() {
        let router = NeighborRecord {
            capabilities: Some(Capabilities {
                system: 0x14,
                enabled: 0x10,
            }),
            ..Default::default()
        };
        let bridge = NeighborRecord {
            capabilities: Some(Capabilities {
                system: 0x04,
                enabled: 0x04,
            }),
            ..Default::default()
        };
        let silent = NeighborRecord::default();

        assert_eq!(enabled_capability_mask([&router, &bridge, &silent]), 0x14);
        assert_eq!(
            Capability::from_mask(enabled_capability_mask([&router, &bridge])),
            [Capability::Bridge, Capability::Router]
        );
        assert_eq!(enabled_capability_mask([&silent]), 0);
    }

    #[test]
    fn test_strings_ignored_when_unusable() {
        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::SYSTEM_NAME, b"\0\0"));
        tlvs.push(tlv(tlv::PORT_DESCRIPTION, b"a\0b"));
        tlvs.push(tlv(tlv::SYSTEM_DESCRIPTION, b"first"));
        tlvs.push(tlv(tlv::SYSTEM_DESCRIPTION, b"second"));
        tlvs.push(tlv(tlv::END, &[]));

        let record = NeighborRecord::decode(&with_tlvs(&tlvs)).unwrap();
        assert_eq!(record.system_name, None);
        assert_eq!(record.port_description, None);
        assert_eq!(record.system_description.as_deref(), Some("first"));
    }

    #[test]
    fn test_missing_mandatory() {
        let tlvs = vec![
            tlv(tlv::CHASSIS_ID, b"\x07switch-1"),
            tlv(tlv::TTL, &[0, 120]),
            tlv(tlv::END, &[]),
        ];
        assert!(matches!(
            NeighborRecord::decode(&with_tlvs(&tlvs)),
            Err(Error::Frame(_))
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::TTL, &[0, 30]));
        tlvs.push(tlv(tlv::END, &[]));
        assert!(NeighborRecord::decode(&with_tlvs(&tlvs)).is_err());

        let mut tlvs = mandatory();
        tlvs.push(tlv(tlv::PORT_ID, b"\x07port-2"));
        tlvs.push(tlv(tlv::END, &[]));
        assert!(NeighborRecord::decode(&with_tlvs(&tlvs)).is_err());
    }

    #[test]
    fn test_bad_lengths_rejected() {
        for bad in [
            tlv(tlv::CHASSIS_ID, &[7]),
            tlv(tlv::TTL, &[0, 0, 120]),
            tlv(tlv::SYSTEM_CAPABILITIES, &[0, 4]),
            tlv(tlv::PRIVATE, &[0, 0x12, 0x0f]),
            tlv(tlv::END, &[0]),
        ] {
            let mut tlvs = vec![bad];
            tlvs.extend(mandatory());
            tlvs.push(tlv(tlv::END, &[]));
            assert!(NeighborRecord::decode(&with_tlvs(&tlvs)).is_err());
        }
    }

    #[test]
    fn test_missing_end_rejected() {
        assert!(NeighborRecord::decode(&with_tlvs(&mandatory())).is_err());
    }

    #[test]
    fn test_truncated_tlv() {
        let mut frame = with_tlvs(&mandatory());
        frame.extend_from_slice(&[0x0a, 0x10, b'x']);
        assert!(NeighborRecord::decode(&frame).is_err());
    }

    #[test]
    fn test_ether_header_checks() {
        let mut frame = frame("sw");
        frame[12] = 0x08;
        frame[13] = 0x00;
        assert!(NeighborRecord::decode(&frame).is_err());

        let mut frame = with_tlvs(&mandatory());
        frame[5] = 0x01;
        assert!(NeighborRecord::decode(&frame).is_err());

        assert!(NeighborRecord::decode(&[0x01, 0x80]).is_err());
    }

    #[test]
    fn test_capability_strings() {
        assert_eq!(capabilities_to_string(0), "...........");
        assert_eq!(capabilities_to_string(0x0014), "..b.r......");
        assert_eq!(capabilities_to_string(0x07ff), "opbwrtdacsm");
        assert_eq!(
            Capability::from_mask(0x0014),
            [Capability::Bridge, Capability::Router]
        );
        assert_eq!(Capability::Station.description(), "station");
    }
}
