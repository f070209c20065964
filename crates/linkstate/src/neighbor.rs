//! Gateway identity from the neighbor (ARP/NDP) table.

use std::net::IpAddr;

use crate::address::{Gateway, local_gateways};
use crate::netlink::message::NlMsgType;
use crate::netlink::types::AddressFamily;
use crate::netlink::types::neigh::{NdMsg, NdaAttr};
use crate::netlink::{DumpRequest, Error, Result, Transport};
use crate::util::addr::MacAddr;
use crate::vendor::{VendorDatabase, oui_description};

/// Hardware identity of a neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIdentity {
    pub hw_addr: MacAddr,
    pub vendor: Option<String>,
}

/// Look up the hardware address the neighbor table holds for `address`.
///
/// `ifindex` 0 searches every interface. The first entry in dump order
/// whose family and destination match and that carries a hardware address
/// wins. Malformed candidates are logged and skipped; only a transport
/// failure is an error.
pub fn resolve_hw_addr<T: Transport>(
    transport: &T,
    ifindex: u32,
    address: &IpAddr,
) -> Result<Option<MacAddr>> {
    let family = AddressFamily::of(address);
    let request = DumpRequest::Neighbors { ifindex, family };

    for message in transport.dump(&request)? {
        let message = message?;

        if let Some(errno) = message.errno() {
            tracing::warn!(error = %Error::from_errno(errno), "neighbor dump returned an error");
            continue;
        }

        if message.msg_type() != NlMsgType::RTM_NEWNEIGH {
            tracing::debug!(msg_type = message.msg_type(), "skipping non-neighbor message");
            continue;
        }

        let body = match message.body::<NdMsg>() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable neighbor entry");
                continue;
            }
        };
        let header = body.header();

        if AddressFamily::from_u8(header.ndm_family) != Some(family) {
            tracing::debug!(family = header.ndm_family, "skipping neighbor of another family");
            continue;
        }

        if ifindex > 0 && header.ndm_ifindex != ifindex as i32 {
            continue;
        }

        let Ok(Some(destination)) = body.read_ip(NdaAttr::Dst as u16, family) else {
            continue;
        };
        if destination != *address {
            continue;
        }

        let Ok(Some(hw_addr)) = body.read_hw_addr(NdaAttr::Lladdr as u16) else {
            continue;
        };

        return Ok(Some(hw_addr));
    }

    Ok(None)
}

/// Resolve the hardware address of `address` and describe its vendor.
///
/// `Ok(None)` when the neighbor table has no usable entry.
pub fn resolve_gateway_identity<T, V>(
    transport: &T,
    vendors: &V,
    ifindex: u32,
    address: &IpAddr,
) -> Result<Option<GatewayIdentity>>
where
    T: Transport,
    V: VendorDatabase + ?Sized,
{
    let identity = resolve_hw_addr(transport, ifindex, address)?.map(|hw_addr| GatewayIdentity {
        vendor: oui_description(vendors, &hw_addr),
        hw_addr,
    });
    Ok(identity)
}

/// Default gateways with whatever hardware identity can be found.
///
/// Identity failures degrade the gateway to address only.
pub fn describe_gateways<T, V>(
    transport: &T,
    vendors: &V,
    ifindex: Option<u32>,
) -> Result<Vec<Gateway>>
where
    T: Transport,
    V: VendorDatabase + ?Sized,
{
    let mut gateways = local_gateways(transport, ifindex, AddressFamily::Unspec)?;

    for gateway in &mut gateways {
        match resolve_gateway_identity(transport, vendors, gateway.ifindex, &gateway.address) {
            Ok(Some(identity)) => {
                gateway.hw_addr = Some(identity.hw_addr);
                gateway.vendor = identity.vendor;
            }
            Ok(None) => {
                tracing::debug!(gateway = %gateway.address, "no neighbor entry for gateway");
            }
            Err(e) => {
                tracing::debug!(gateway = %gateway.address, error = %e, "could not describe gateway");
            }
        }
    }

    Ok(gateways)
}
