//! Shared networking constants and newline-delimited JSON framing.
//!
//! Both services speak the same transport: a plain TCP stream carrying one JSON document
//! per line. `write_line` appends the delimiter and flushes; `FrameReader` splits the
//! inbound byte stream back into lines and tolerates socket read timeouts without losing
//! partially received data.
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};

use crate::error::FeedError;
use crate::result::Result;

/// TCP port of the broadcaster feed (broadcaster -> consumer).
pub const FEED_PORT: u16 = 8001;
/// TCP port of the consumer's enriched feed (consumer -> its subscribers).
pub const ANALYTICS_PORT: u16 = 8002;
/// TCP port of the consumer's query surface.
pub const QUERY_PORT: u16 = 8003;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// Write one frame: the payload followed by `\n`, then flush.
pub fn write_line<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(payload)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Outcome of a single read attempt on a framed stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without the trailing delimiter.
    Line(Vec<u8>),
    /// The read timed out or produced only a blank line.
    Idle,
}

/// Splits a byte stream into newline-delimited frames.
///
/// Bytes received before a read timeout are kept in an internal buffer and completed by
/// the next call, so a timeout in the middle of a line never corrupts it.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    peer: String,
}

impl<R: Read> FrameReader<R> {
    /// Wrap `reader`; `peer` names the remote side in errors.
    pub fn new(reader: R, peer: &str) -> Self {
        Self {
            inner: BufReader::new(reader),
            pending: Vec::new(),
            peer: peer.to_string(),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `FeedError::ConnectionClosed` once the peer has closed the stream and no
    /// buffered bytes remain.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match self.inner.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Err(FeedError::ConnectionClosed(self.peer.clone())),
            Ok(_) => {
                let mut line = std::mem::take(&mut self.pending);
                while matches!(line.last(), Some(b'\n' | b'\r')) {
                    line.pop();
                }
                if line.iter().all(u8::is_ascii_whitespace) {
                    Ok(Frame::Idle)
                } else {
                    Ok(Frame::Line(line))
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(Frame::Idle)
            }
            Err(e) => Err(FeedError::Io(e)),
        }
    }
}
