//! Per-link LLDP neighbor store.
//!
//! One file per interface, named by its index, holding a sequence of
//! `[u64 little-endian length][frame]` records. Lengths of 4096 or more are
//! invalid and the file must end exactly at a record boundary.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use super::NeighborRecord;
use crate::config::Paths;
use crate::link::LinkInfo;
use crate::netlink::{Error, Result};

/// Upper bound (exclusive) on a stored frame length.
pub const MAX_FRAME_LEN: u64 = 4096;

const PREFIX_LEN: usize = 8;

/// Path of the store file for `ifindex` inside `dir`.
pub fn store_path(dir: &Path, ifindex: u32) -> PathBuf {
    dir.join(ifindex.to_string())
}

/// Sequential reader of neighbor records.
///
/// After a framing error the store yields nothing more: there is no way to
/// find the next record boundary.
#[derive(Debug)]
pub struct NeighborStore<R> {
    reader: R,
    broken: bool,
}

impl NeighborStore<BufReader<File>> {
    /// Open the store of `ifindex`, or `None` when the link has no store.
    pub fn open(dir: &Path, ifindex: u32) -> Result<Option<Self>> {
        let path = store_path(dir, ifindex);
        match File::open(&path) {
            Ok(file) => Ok(Some(Self::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read> NeighborStore<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            broken: false,
        }
    }

    /// Read the next raw frame. `Ok(None)` at a clean end of the store.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.broken {
            return Ok(None);
        }

        let result = self.read_frame();
        if matches!(result, Err(Error::MalformedStore(_))) {
            self.broken = true;
        }
        result
    }

    /// Read and decode the next record. `Ok(None)` at a clean end of the
    /// store.
    ///
    /// A frame that fails to decode is reported as an error without
    /// breaking the store; the following record can still be read.
    pub fn next_record(&mut self) -> Result<Option<NeighborRecord>> {
        match self.next_frame()? {
            Some(frame) => NeighborRecord::decode(&frame).map(Some),
            None => Ok(None),
        }
    }

    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; PREFIX_LEN];
        match read_full(&mut self.reader, &mut prefix)? {
            0 => return Ok(None),
            PREFIX_LEN => {}
            n => {
                return Err(Error::MalformedStore(format!(
                    "truncated length prefix ({} of {} bytes)",
                    n, PREFIX_LEN
                )));
            }
        }

        let len = u64::from_le_bytes(prefix);
        if len >= MAX_FRAME_LEN {
            return Err(Error::MalformedStore(format!(
                "record length {} exceeds {}",
                len,
                MAX_FRAME_LEN - 1
            )));
        }

        let mut frame = vec![0u8; len as usize];
        let n = read_full(&mut self.reader, &mut frame)?;
        if n != frame.len() {
            return Err(Error::MalformedStore(format!(
                "truncated record ({} of {} bytes)",
                n, len
            )));
        }

        Ok(Some(frame))
    }
}

/// Yields records until the end of the store or the first error.
impl<R: Read> Iterator for NeighborStore<R> {
    type Item = Result<NeighborRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.broken = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the reader allows and return the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Append one frame to a store.
pub fn write_record<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    if frame.len() as u64 >= MAX_FRAME_LEN {
        return Err(Error::MalformedStore(format!(
            "frame of {} bytes is too large to store",
            frame.len()
        )));
    }
    writer.write_all(&(frame.len() as u64).to_le_bytes())?;
    writer.write_all(frame)?;
    Ok(())
}

/// What a link's store holds.
#[derive(Debug)]
pub enum NeighborData {
    /// The link has no store.
    NoData,
    /// Every record decoded.
    Complete(Vec<NeighborRecord>),
    /// Reading stopped at `error` after `records`.
    Partial {
        records: Vec<NeighborRecord>,
        error: Error,
    },
}

impl NeighborData {
    /// The records read, whether or not reading completed.
    pub fn records(&self) -> &[NeighborRecord] {
        match self {
            Self::NoData => &[],
            Self::Complete(records) | Self::Partial { records, .. } => records,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Partial { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Read every record stored for `ifindex`.
///
/// Only a failure to open an existing store is an error; corruption inside
/// the store is reported as [`NeighborData::Partial`].
pub fn read_neighbors(dir: &Path, ifindex: u32) -> Result<NeighborData> {
    let Some(store) = NeighborStore::open(dir, ifindex)? else {
        return Ok(NeighborData::NoData);
    };

    let mut records = Vec::new();
    for record in store {
        match record {
            Ok(record) => records.push(record),
            Err(error) => return Ok(NeighborData::Partial { records, error }),
        }
    }

    Ok(NeighborData::Complete(records))
}

/// Neighbors stored for one link.
#[derive(Debug)]
pub struct LinkNeighbors {
    pub ifindex: u32,
    pub name: String,
    pub data: Result<NeighborData>,
}

/// Read the neighbor store of every link. A broken store only affects its
/// own link.
pub fn neighbors_for_links(paths: &Paths, links: &[LinkInfo]) -> Vec<LinkNeighbors> {
    links
        .iter()
        .map(|link| {
            let data = read_neighbors(&paths.lldp_dir, link.index);
            match &data {
                Ok(NeighborData::Partial { error, .. }) => {
                    tracing::warn!(link = %link.name, error = %error, "failed to read LLDP neighbors");
                }
                Err(e) => {
                    tracing::warn!(link = %link.name, error = %e, "failed to open LLDP neighbors");
                }
                _ => {}
            }
            LinkNeighbors {
                ifindex: link.index,
                name: link.name.clone(),
                data,
            }
        })
        .collect()
}
