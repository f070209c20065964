//! Read-only snapshots of Linux network state.
//!
//! This crate collects links, local addresses, default gateways (with the
//! gateway's hardware address and vendor), IPv6 address labels and LLDP
//! neighbors. Kernel tables are dumped over rtnetlink through the
//! [`Transport`] trait, so everything above the socket can be driven by
//! canned responses. LLDP neighbors and runtime state are read from files
//! maintained by the network and device managers.
//!
//! # Example
//!
//! ```ignore
//! use linkstate::{LinkFilter, Paths, RouteSocket, enumerate_links, link_status};
//! use linkstate::vendor::HwdbFile;
//!
//! fn main() -> linkstate::Result<()> {
//!     let socket = RouteSocket::new()?;
//!     let paths = Paths::default();
//!     let vendors = HwdbFile::load(&paths.hwdb).ok();
//!
//!     for link in enumerate_links(&socket, &LinkFilter::all())? {
//!         let status = link_status(&socket, &vendors, &paths, &link)?;
//!         println!("{}: {} ({})", link.index, link.name, status.setup_state());
//!         for gateway in &status.gateways {
//!             println!("  via {} {:?}", gateway.address, gateway.vendor);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod config;
pub mod device;
pub mod label;
pub mod link;
pub mod lldp;
pub mod neighbor;
pub mod netlink;
pub mod state;
pub mod status;
pub mod util;
pub mod vendor;

pub use address::{Gateway, LocalAddress, local_addresses, local_gateways};
pub use config::Paths;
pub use label::{AddressLabel, address_labels};
pub use link::{LinkFilter, LinkInfo, enumerate_links, find_link};
pub use lldp::{NeighborData, NeighborRecord};
pub use neighbor::{GatewayIdentity, describe_gateways, resolve_gateway_identity, resolve_hw_addr};
pub use netlink::{AddressFamily, Error, Result, RouteSocket, Transport};
pub use status::{LinkStatus, LinkSummary, SystemStatus, link_status, link_summaries, system_status};
pub use util::MacAddr;
