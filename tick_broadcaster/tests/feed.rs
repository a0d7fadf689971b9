use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use tick_broadcaster::broadcaster::{BatchSource, Broadcaster, BroadcasterConfig};
use tick_common::feed::{Batch, FeedMessage};
use tick_common::hub::accept_subscribers;
use tick_common::{FeedError, Result, SubscriberHub};

/// Numbered batches; fails on the listed calls.
struct ScriptedSource {
    calls: usize,
    fail_on: Vec<usize>,
}

impl BatchSource for ScriptedSource {
    fn next_batch(&mut self) -> Result<Batch> {
        self.calls += 1;
        if self.fail_on.contains(&self.calls) {
            return Err(FeedError::Format(format!("round {} failed", self.calls)));
        }
        Ok(Batch {
            trading_time: self.calls.to_string(),
            trading_date: "08-11-2021".to_string(),
            stocks: Default::default(),
        })
    }
}

fn config() -> BroadcasterConfig {
    BroadcasterConfig {
        interval: Duration::from_millis(10),
        error_delay: Duration::from_millis(20),
    }
}

#[test]
fn failed_round_does_not_stop_the_loop() {
    let hub = SubscriberHub::new(64);
    let (_, rx) = hub.subscribe("test");
    let source = ScriptedSource {
        calls: 0,
        fail_on: vec![2, 3],
    };
    let (shutdown_tx, shutdown_rx) = bounded(1);
    let handle = thread::spawn(move || Broadcaster::new(source, hub, config()).run(shutdown_rx));

    let mut times = Vec::new();
    for _ in 0..3 {
        let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        times.push(FeedMessage::from_json(line.as_bytes()).unwrap().data.trading_time);
    }
    shutdown_tx.send(()).unwrap();
    handle.join().unwrap();

    assert_eq!(times, ["1", "4", "5"]);
}

#[test]
fn closed_subscriber_does_not_interrupt_tcp_delivery() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let hub = SubscriberHub::new(64);
    let accept_hub = hub.clone();
    thread::spawn(move || accept_subscribers(listener, accept_hub, Duration::from_secs(1)));

    let keep = TcpStream::connect(address).unwrap();
    let gone = TcpStream::connect(address).unwrap();
    for _ in 0..500 {
        if hub.len() == 2 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(hub.len(), 2);
    drop(gone);

    let source = ScriptedSource {
        calls: 0,
        fail_on: Vec::new(),
    };
    let (shutdown_tx, shutdown_rx) = bounded(1);
    let handle = thread::spawn(move || Broadcaster::new(source, hub, config()).run(shutdown_rx));

    keep.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut reader = BufReader::new(keep);
    let mut previous = 0usize;
    for _ in 0..20 {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let message = FeedMessage::from_json(line.trim().as_bytes()).unwrap();
        let round: usize = message.data.trading_time.parse().unwrap();
        assert!(round > previous, "rounds must arrive in order");
        previous = round;
    }
    shutdown_tx.send(()).unwrap();
    handle.join().unwrap();
}

#[test]
fn new_subscriber_gets_current_batch_immediately() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let hub = SubscriberHub::new(64);
    let accept_hub = hub.clone();
    thread::spawn(move || accept_subscribers(listener, accept_hub, Duration::from_secs(1)));

    let source = ScriptedSource {
        calls: 0,
        fail_on: Vec::new(),
    };
    let mut broadcaster = Broadcaster::new(source, hub, config());
    broadcaster.round().unwrap();

    let stream = TcpStream::connect(address).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).unwrap();
    let message = FeedMessage::from_json(line.trim().as_bytes()).unwrap();
    assert_eq!(message.data.trading_time, "1");
}
