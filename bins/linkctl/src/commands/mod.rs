//! linkctl command implementations.

pub mod label;
pub mod list;
pub mod lldp;
pub mod status;
