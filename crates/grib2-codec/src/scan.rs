//! Locates GRIB message boundaries inside a seekable byte source.
//!
//! Works on arbitrarily large files without parsing them: chunks are read
//! at the configured size, candidate start markers are checked against the
//! edition byte, and a candidate only counts as a message once the declared
//! length lands exactly on a `7777` end marker. Both GRIB editions 1 and 2
//! are recognized (their length fields sit at different offsets).

use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::builder::{END_MARKER, START_MARKER};
use crate::error::{Grib2Error, Grib2Result};

/// A verified message located by [`MessageScanner::seek_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundMessage {
    /// Byte offset of the start marker from the beginning of the source.
    pub offset: u64,
    /// Declared total message length in octets.
    pub length: u64,
}

/// Default chunk size for scanning, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

// Candidate checks look up to 16 bytes past the marker (edition 2 keeps its
// length field at octets 13-16), so chunks overlap by this much.
const CANDIDATE_SPAN: usize = 16;

/// Scans a byte source for the next GRIB message.
#[derive(Debug, Clone)]
pub struct MessageScanner {
    chunk_size: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for MessageScanner {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl MessageScanner {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(CANDIDATE_SPAN * 2),
            cancel: None,
        }
    }

    /// Attach a cooperative cancellation token. The flag is checked between
    /// chunk reads; a long scan over a large source stops at the next chunk
    /// boundary after the flag is raised.
    pub fn with_cancel(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Search `src` for the next GRIB message, starting `start_offset`
    /// bytes into the source.
    ///
    /// Returns `Ok(None)` when the end of the source is reached without a
    /// verified message; that is a defined outcome, not an error. A start
    /// marker whose declared length does not land on an end marker is a
    /// false positive and the scan continues from the next byte.
    pub fn seek_message<R: Read + Seek>(
        &self,
        src: &mut R,
        start_offset: u64,
    ) -> Grib2Result<Option<FoundMessage>> {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut pos = start_offset;

        loop {
            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::Relaxed) {
                    return Err(Grib2Error::Cancelled);
                }
            }

            src.seek(SeekFrom::Start(pos))?;
            let nread = read_full(src, &mut chunk)?;
            trace!(pos, nread, "scanning chunk");

            let lim = nread.saturating_sub(CANDIDATE_SPAN);
            for k in 0..lim {
                if chunk[k..k + 4] != START_MARKER {
                    continue;
                }
                let edition = chunk[k + 7];
                let length = match edition {
                    // Edition 1: 3-octet length at octets 5-7.
                    1 => u64::from(u32::from_be_bytes([
                        0,
                        chunk[k + 4],
                        chunk[k + 5],
                        chunk[k + 6],
                    ])),
                    // Edition 2: 8-octet length at octets 9-16; the low 32
                    // bits carry any length this scanner can verify.
                    2 => u64::from(u32::from_be_bytes([
                        chunk[k + 12],
                        chunk[k + 13],
                        chunk[k + 14],
                        chunk[k + 15],
                    ])),
                    _ => continue,
                };
                if length < 8 {
                    continue;
                }

                if self.end_marker_at(src, pos + k as u64 + length - 4)? {
                    let offset = pos + k as u64;
                    debug!(offset, length, edition, "found GRIB message");
                    return Ok(Some(FoundMessage { offset, length }));
                }
            }

            if nread < self.chunk_size {
                // End of source with no verified message.
                return Ok(None);
            }
            pos += lim as u64;
        }
    }

    fn end_marker_at<R: Read + Seek>(&self, src: &mut R, offset: u64) -> Grib2Result<bool> {
        src.seek(SeekFrom::Start(offset))?;
        let mut end = [0u8; 4];
        if read_full(src, &mut end)? < 4 {
            return Ok(false);
        }
        Ok(end == END_MARKER)
    }
}

/// Read until `buf` is full or the source is exhausted; returns the number
/// of bytes read.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
