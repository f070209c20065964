//! Netlink wire layer: message framing, attributes, dump requests and the
//! transport that carries them.

pub mod attr;
pub mod builder;
pub mod error;
pub mod message;
pub mod request;
pub mod socket;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{Error, Result};
pub use message::{Body, Message, NlMsgHdr, NlMsgType};
pub use request::{DumpKind, DumpRequest};
pub use socket::{DumpResponses, RouteSocket};
pub use transport::Transport;
pub use types::AddressFamily;
