//! Blocking NETLINK_ROUTE socket that serves dump requests.

use std::collections::VecDeque;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};

use super::error::{Error, Result};
use super::message::{Message, MessageIter, NlMsgHdr};
use super::request::DumpRequest;
use super::transport::Transport;

const RECV_BUF_SIZE: usize = 32768;

/// Blocking rtnetlink socket.
pub struct RouteSocket {
    socket: Socket,
    /// Sequence number counter.
    seq: AtomicU32,
}

impl RouteSocket {
    /// Open and bind a new route socket.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE).map_err(Error::Transport)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr).map_err(Error::Transport)?;
        socket.get_address(&mut addr).map_err(Error::Transport)?;
        let pid = addr.port_number();

        // Extended ACK is optional
        socket.set_ext_ack(true).ok();

        tracing::debug!(pid, "opened route socket");

        Ok(Self {
            socket,
            seq: AtomicU32::new(1),
        })
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, msg: &[u8]) -> Result<()> {
        self.socket.send(msg, 0).map_err(Error::Transport)?;
        Ok(())
    }

    fn recv(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);
        loop {
            match self.socket.recv(&mut buf, 0) {
                Ok(_) => return Ok(buf.to_vec()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Transport(e)),
            }
        }
    }
}

impl AsRawFd for RouteSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl Transport for RouteSocket {
    type Dump<'a> = DumpResponses<'a>;

    fn dump(&self, request: &DumpRequest) -> Result<DumpResponses<'_>> {
        let seq = self.next_seq();
        self.send(&request.build(seq))?;
        tracing::trace!(seq, kind = %request.kind(), "dump requested");

        Ok(DumpResponses {
            socket: self,
            seq,
            pending: VecDeque::new(),
            done: false,
        })
    }
}

/// Responses of one in-flight dump.
///
/// Dropping the iterator before the dump ends drains the remaining
/// datagrams so the next request on the socket starts clean.
pub struct DumpResponses<'a> {
    socket: &'a RouteSocket,
    seq: u32,
    pending: VecDeque<Message>,
    done: bool,
}

impl DumpResponses<'_> {
    /// Receive one datagram and queue the messages belonging to this dump.
    fn fill(&mut self) -> Result<()> {
        let data = self.socket.recv()?;

        for result in MessageIter::new(&data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != self.seq {
                tracing::trace!(
                    seq = header.nlmsg_seq,
                    expected = self.seq,
                    "skipping foreign message"
                );
                continue;
            }

            if header.is_done() {
                self.done = true;
                break;
            }

            if header.is_dump_interrupted() {
                tracing::warn!(seq = self.seq, "dump was interrupted, results may be inconsistent");
            }

            let message = Message::new(header, payload.to_vec());
            let terminal = terminates_dump(&header, &message);
            self.pending.push_back(message);

            if terminal {
                self.done = true;
                break;
            }
        }

        Ok(())
    }
}

/// An error reply ends the dump; no DONE follows it.
fn terminates_dump(header: &NlMsgHdr, message: &Message) -> bool {
    header.is_error() && message.errno().is_some()
}

impl Iterator for DumpResponses<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(Ok(message));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl Drop for DumpResponses<'_> {
    fn drop(&mut self) {
        while !self.done {
            if let Err(e) = self.fill() {
                tracing::debug!(error = %e, "failed to drain dump");
                break;
            }
        }
    }
}
