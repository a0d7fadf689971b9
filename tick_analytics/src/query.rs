//! TCP query port.
//!
//! Each connection may send any number of `Query` lines; each gets exactly one
//! `QueryResponse` line computed from the latest snapshot.
use std::net::{TcpListener, TcpStream};
use std::thread;

use log::{debug, error, info, warn};
use tick_common::net::{Frame, FrameReader, write_line};
use tick_common::query::{Query, QueryResponse};
use tick_common::{FeedError, Result};

use crate::snapshot::SnapshotStore;

/// Accept loop: serve every query connection on its own thread.
pub fn serve_queries(listener: TcpListener, store: SnapshotStore) {
    match listener.local_addr() {
        Ok(local) => info!("Query server is started on {}", local),
        Err(e) => warn!("Query server started on an unknown address: {}", e),
    }
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let store = store.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_query_connection(stream, &store) {
                        debug!("Query connection ended: {}", e);
                    }
                });
            }
            Err(e) => error!("TCP connection error: {}", e),
        }
    }
}

/// Answer queries on one connection until the client closes it.
pub fn handle_query_connection(stream: TcpStream, store: &SnapshotStore) -> Result<()> {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut writer = stream.try_clone()?;
    let mut reader = FrameReader::new(stream, &peer);
    loop {
        let line = match reader.next_frame() {
            Ok(Frame::Line(line)) => line,
            Ok(Frame::Idle) => continue,
            Err(FeedError::ConnectionClosed(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = match serde_json::from_slice::<Query>(&line) {
            Ok(query) => {
                debug!("Query from {}: {:?}", peer, query);
                store.answer(&query)
            }
            Err(e) => {
                warn!("Invalid query from {}: {}", peer, e);
                QueryResponse::Error(e.to_string())
            }
        };
        write_line(&mut writer, serde_json::to_string(&response)?.as_bytes())?;
    }
}
