//! Per-link and system-wide status snapshots.
//!
//! Each part of a snapshot is gathered on its own. Runtime state and device
//! properties are optional extras: failing to read them leaves the part
//! empty. Kernel queries are not: a transport failure aborts the snapshot.

use crate::address::{Gateway, LocalAddress, local_addresses};
use crate::config::Paths;
use crate::device::{DeviceProperties, link_type_string};
use crate::link::LinkInfo;
use crate::lldp::{NeighborData, read_neighbors};
use crate::neighbor::describe_gateways;
use crate::netlink::types::AddressFamily;
use crate::netlink::{Result, Transport};
use crate::state::{LinkState, SystemState, oper_state, setup_state_or_unmanaged};
use crate::vendor::{VendorDatabase, oui_description};

/// One line of a link listing.
#[derive(Debug, Clone)]
pub struct LinkSummary {
    pub link: LinkInfo,
    pub type_string: Option<String>,
    pub oper_state: Option<String>,
    pub setup_state: String,
}

/// Summarize links for a listing, in the order given.
pub fn link_summaries(paths: &Paths, links: &[LinkInfo]) -> Vec<LinkSummary> {
    links
        .iter()
        .map(|link| {
            let state = load_state(paths, link);
            let device = DeviceProperties::load(paths, link);
            LinkSummary {
                type_string: link_type_string(link.iftype, device.as_ref()),
                oper_state: oper_state(state.as_ref()).map(str::to_string),
                setup_state: setup_state_or_unmanaged(state.as_ref()).to_string(),
                link: link.clone(),
            }
        })
        .collect()
}

fn load_state(paths: &Paths, link: &LinkInfo) -> Option<LinkState> {
    LinkState::load(paths, link.index).unwrap_or_else(|e| {
        tracing::debug!(link = %link.name, error = %e, "could not read link state");
        None
    })
}

/// Everything known about one link.
#[derive(Debug)]
pub struct LinkStatus {
    pub link: LinkInfo,
    pub state: Option<LinkState>,
    pub device: Option<DeviceProperties>,
    pub type_string: Option<String>,
    /// Vendor of the link's own hardware address.
    pub hw_vendor: Option<String>,
    pub addresses: Vec<LocalAddress>,
    pub gateways: Vec<Gateway>,
    pub neighbors: Result<NeighborData>,
}

impl LinkStatus {
    pub fn setup_state(&self) -> &str {
        setup_state_or_unmanaged(self.state.as_ref())
    }

    pub fn oper_state(&self) -> Option<&str> {
        oper_state(self.state.as_ref())
    }
}

/// Gather the status of `link`.
pub fn link_status<T, V>(
    transport: &T,
    vendors: &V,
    paths: &Paths,
    link: &LinkInfo,
) -> Result<LinkStatus>
where
    T: Transport,
    V: VendorDatabase + ?Sized,
{
    let addresses = local_addresses(transport, Some(link.index), AddressFamily::Unspec)?;
    let gateways = describe_gateways(transport, vendors, Some(link.index))?;

    let state = load_state(paths, link);
    let device = DeviceProperties::load(paths, link);
    let type_string = link_type_string(link.iftype, device.as_ref());
    let hw_vendor = link
        .hw_addr
        .as_ref()
        .filter(|mac| !mac.is_zero())
        .and_then(|mac| oui_description(vendors, mac));

    Ok(LinkStatus {
        link: link.clone(),
        state,
        device,
        type_string,
        hw_vendor,
        addresses,
        gateways,
        neighbors: read_neighbors(&paths.lldp_dir, link.index),
    })
}

/// Host-wide status.
#[derive(Debug)]
pub struct SystemStatus {
    pub state: Option<SystemState>,
    pub addresses: Vec<LocalAddress>,
    pub gateways: Vec<Gateway>,
}

/// Gather global state with the addresses and gateways of all interfaces.
pub fn system_status<T, V>(transport: &T, vendors: &V, paths: &Paths) -> Result<SystemStatus>
where
    T: Transport,
    V: VendorDatabase + ?Sized,
{
    let addresses = local_addresses(transport, None, AddressFamily::Unspec)?;
    let gateways = describe_gateways(transport, vendors, None)?;
    let state = SystemState::load(paths).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "could not read system state");
        None
    });

    Ok(SystemStatus {
        state,
        addresses,
        gateways,
    })
}
