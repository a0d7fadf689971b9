use std::cell::RefCell;
use std::io::{self, Cursor, ErrorKind};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tick_analytics::feed_client::{Backoff, ConnectionState, FeedClient, FeedConnector};
use tick_common::{FeedError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Connect,
    Wait,
}

type Log = Rc<RefCell<Vec<Event>>>;

/// Serves the scripted streams in order, then refuses every further attempt.
struct ScriptedConnector {
    log: Log,
    streams: Vec<&'static str>,
}

impl FeedConnector for ScriptedConnector {
    type Stream = Cursor<Vec<u8>>;

    fn connect(&mut self) -> Result<(Self::Stream, String)> {
        self.log.borrow_mut().push(Event::Connect);
        if self.streams.is_empty() {
            return Err(FeedError::Io(io::Error::new(ErrorKind::ConnectionRefused, "refused")));
        }
        let content = self.streams.remove(0);
        Ok((Cursor::new(content.as_bytes().to_vec()), "scripted".to_string()))
    }
}

/// Records each wait and raises shutdown after `stop_after` of them.
struct CountingBackoff {
    log: Log,
    waits: usize,
    stop_after: usize,
}

impl Backoff for CountingBackoff {
    fn wait(&mut self, shutdown: &AtomicBool) {
        self.log.borrow_mut().push(Event::Wait);
        self.waits += 1;
        if self.waits == self.stop_after {
            shutdown.store(true, Ordering::SeqCst);
        }
    }

    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}

fn client(
    streams: Vec<&'static str>,
    stop_after: usize,
) -> (FeedClient<ScriptedConnector, CountingBackoff>, Log, Arc<AtomicBool>) {
    let log = Log::default();
    let shutdown = Arc::new(AtomicBool::new(false));
    let client = FeedClient::new(
        ScriptedConnector {
            log: log.clone(),
            streams,
        },
        CountingBackoff {
            log: log.clone(),
            waits: 0,
            stop_after,
        },
        shutdown.clone(),
    );
    (client, log, shutdown)
}

#[test]
fn every_failure_is_followed_by_exactly_one_wait() {
    let (mut client, log, _) = client(Vec::new(), 6);
    client.run(|_| panic!("no data expected"));

    let expected: Vec<Event> = std::iter::repeat_n([Event::Connect, Event::Wait], 6)
        .flatten()
        .collect();
    assert_eq!(*log.borrow(), expected);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[test]
fn dropped_connections_are_reestablished() {
    let (mut client, log, _) = client(vec!["{\"a\":1}\n", "{\"b\":2}\n{\"c\":3}"], 3);
    let mut lines = Vec::new();
    client.run(|line| lines.push(String::from_utf8_lossy(line).into_owned()));

    assert_eq!(lines, ["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
    assert_eq!(
        *log.borrow(),
        [
            Event::Connect,
            Event::Wait,
            Event::Connect,
            Event::Wait,
            Event::Connect,
            Event::Wait
        ]
    );
}

#[test]
fn shutdown_while_connected_skips_backoff() {
    let (mut client, log, shutdown) = client(vec!["one\ntwo\n"], usize::MAX);
    let mut seen = 0;
    client.run(|_| {
        seen += 1;
        shutdown.store(true, Ordering::SeqCst);
    });

    assert_eq!(seen, 1);
    assert_eq!(*log.borrow(), [Event::Connect]);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
