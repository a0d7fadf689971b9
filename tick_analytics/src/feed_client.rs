//! Resilient inbound connection to the broadcaster feed.
//!
//! `FeedClient` drives an explicit connection state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected --(transport error / EOF)--> Disconnected
//!      ^              |                                                    |
//!      |              +--(connect error)--> Disconnected                   |
//!      +---------------------------- fixed backoff ------------------------+
//! ```
//!
//! Every failure is followed by exactly one backoff wait before the next connection
//! attempt. The loop has no exit of its own; it stops only when the shared shutdown flag
//! is raised. The transport and the wait are behind the `FeedConnector` and `Backoff`
//! traits.
use std::io::{self, ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tick_common::Result;
use tick_common::net::{Frame, FrameReader};

/// Default wait between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Read timeout used to poll the shutdown flag while connected.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Upper bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Connection lifecycle of the feed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; waiting to retry.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Receiving messages.
    Connected,
}

/// Opens a byte stream to the feed.
pub trait FeedConnector {
    /// Stream type produced on success.
    type Stream: Read;

    /// Open a connection; returns the stream and a printable peer name.
    fn connect(&mut self) -> Result<(Self::Stream, String)>;
}

/// Wait applied after every connection failure.
pub trait Backoff {
    /// Block for the backoff delay, returning early once `shutdown` is raised.
    fn wait(&mut self, shutdown: &AtomicBool);

    /// Length of the delay, for logging.
    fn delay(&self) -> Duration;
}

/// TCP connector with a read timeout so the client can observe shutdown.
pub struct TcpConnector {
    address: String,
    read_timeout: Duration,
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Connect to `address` ("host:port").
    pub fn new(address: &str, read_timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            read_timeout,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bound each connection attempt by `timeout` instead of the default.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn open(&self) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in self.address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(ErrorKind::InvalidInput, format!("{} resolved to no address", self.address))
        }))
    }
}

impl FeedConnector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self) -> Result<(TcpStream, String)> {
        let stream = self.open()?;
        stream.set_read_timeout(Some(self.read_timeout))?;
        Ok((stream, self.address.clone()))
    }
}

/// Constant delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    /// Wait `delay` after each failure.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedBackoff {
    fn wait(&mut self, shutdown: &AtomicBool) {
        let mut remaining = self.delay;
        while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
            let step = remaining.min(SHUTDOWN_POLL);
            thread::sleep(step);
            remaining -= step;
        }
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}

/// Feed subscriber that reconnects forever.
pub struct FeedClient<C, B> {
    connector: C,
    backoff: B,
    state: ConnectionState,
    shutdown: Arc<AtomicBool>,
}

impl<C: FeedConnector, B: Backoff> FeedClient<C, B> {
    /// Create a disconnected client.
    pub fn new(connector: C, backoff: B, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            connector,
            backoff,
            state: ConnectionState::Disconnected,
            shutdown,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!("Feed connection {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Receive feed lines and hand each one to `on_line` until shutdown.
    pub fn run<F: FnMut(&[u8])>(&mut self, mut on_line: F) {
        while !self.is_shutdown() {
            self.transition(ConnectionState::Connecting);
            match self.connector.connect() {
                Ok((stream, peer)) => {
                    self.transition(ConnectionState::Connected);
                    info!("Connected to feed at {}", peer);
                    match self.receive(stream, &peer, &mut on_line) {
                        Ok(()) => break,
                        Err(e) => warn!("Feed connection to {} lost: {}", peer, e),
                    }
                }
                Err(e) => warn!("Failed to connect to feed: {}", e),
            }
            self.transition(ConnectionState::Disconnected);
            if self.is_shutdown() {
                break;
            }
            info!("Reconnecting to feed in {:?}", self.backoff.delay());
            self.backoff.wait(&self.shutdown);
        }
        self.transition(ConnectionState::Disconnected);
        info!("Feed client stopped");
    }

    /// Read frames until the connection fails (`Err`) or shutdown is requested (`Ok`).
    fn receive<F: FnMut(&[u8])>(&self, stream: C::Stream, peer: &str, on_line: &mut F) -> Result<()> {
        let mut reader = FrameReader::new(stream, peer);
        while !self.is_shutdown() {
            match reader.next_frame()? {
                Frame::Line(line) => on_line(&line),
                Frame::Idle => {}
            }
        }
        Ok(())
    }
}
