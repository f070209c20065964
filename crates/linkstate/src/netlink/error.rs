//! Error types for link-state collection.

use std::io;

/// Result type for link-state operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting link state.
///
/// Expected-absent conditions (an unmanaged interface, a missing neighbor
/// store, a gateway without a neighbor entry, an unknown vendor) are not
/// errors; they surface as `None` or as [`NeighborData::NoData`].
///
/// [`NeighborData::NoData`]: crate::lldp::NeighborData::NoData
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dump transport could not be opened or used.
    #[error("transport unavailable: {0}")]
    Transport(#[source] io::Error),

    /// I/O error reading a local state or store file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// A required field is missing from a type-matching response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Corrupt framing in a neighbor record store.
    #[error("malformed neighbor store: {0}")]
    MalformedStore(String),

    /// A stored neighbor-discovery frame could not be decoded.
    #[error("invalid neighbor frame: {0}")]
    Frame(String),

    /// A link filter pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },
}

impl Error {
    /// Create a kernel error from a (negative) errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if the enclosing dump could not be issued or read.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Kernel { .. })
    }

    /// Check if this is a per-message decoding failure.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_) | Self::InvalidAttribute(_) | Self::Truncated { .. }
        )
    }

    /// Check if this is corrupt neighbor store framing.
    pub fn is_malformed_store(&self) -> bool {
        matches!(self, Self::MalformedStore(_))
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } => matches!(*errno, 1 | 13),
            Self::Transport(e) | Self::Io(e) => e.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
