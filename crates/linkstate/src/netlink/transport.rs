//! The seam between decoding logic and whatever delivers dump responses.

use super::error::Result;
use super::message::Message;
use super::request::DumpRequest;

/// Issues dump requests and yields their response messages in order.
///
/// A transport yields every message of the dump except the terminating
/// DONE marker. Error replies are passed through as messages so callers
/// can decide whether an errno is fatal. A failure to issue or read the
/// dump is reported as [`Error::Transport`](super::Error::Transport),
/// either from `dump` itself or as an item of the iterator.
pub trait Transport {
    /// Iterator over one dump's responses.
    type Dump<'a>: Iterator<Item = Result<Message>>
    where
        Self: 'a;

    /// Start a dump.
    fn dump(&self, request: &DumpRequest) -> Result<Self::Dump<'_>>;
}
