use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tick_analytics::feed_client::{FeedClient, FixedBackoff, TcpConnector};
use tick_analytics::indicator::{IndicatorConfig, IndicatorEngine};
use tick_analytics::processor::BatchProcessor;
use tick_analytics::query::serve_queries;
use tick_analytics::snapshot::SnapshotStore;
use tick_common::SubscriberHub;
use tick_common::analytics::AnalyticsMessage;
use tick_common::feed::{Batch, FeedMessage, PriceType, SecurityType, StockQuote};
use tick_common::net::write_line;
use tick_common::query::QueryResponse;

fn feed(time: &str, prices: &[(&str, Option<f64>)]) -> FeedMessage {
    let stocks: BTreeMap<String, StockQuote> = prices
        .iter()
        .map(|(symbol, price)| {
            (
                symbol.to_string(),
                StockQuote {
                    price: *price,
                    sec_type: SecurityType::Equity,
                    price_type: PriceType::Current,
                },
            )
        })
        .collect();
    FeedMessage::new(Batch {
        trading_time: time.to_string(),
        trading_date: "08-11-2021".to_string(),
        stocks,
    })
}

fn processor() -> (BatchProcessor, SnapshotStore, SubscriberHub) {
    let store = SnapshotStore::new();
    let hub = SubscriberHub::new(16);
    let processor = BatchProcessor::new(
        IndicatorEngine::new(IndicatorConfig::default()),
        store.clone(),
        hub.clone(),
    );
    (processor, store, hub)
}

#[test]
fn batch_updates_snapshot_and_fans_out() {
    let (mut processor, store, hub) = processor();
    let (_, rx) = hub.subscribe("test");

    for (time, price) in [("08:00:00", 10.0), ("08:00:01", 12.0), ("08:00:02", 11.0)] {
        processor
            .process(feed(time, &[("X", Some(price)), ("Y", None)]))
            .unwrap();
    }

    let x = store.symbol("X").unwrap();
    assert_eq!(x.ema38, Some(10.1486));
    assert_eq!(x.current_price, Some(11.0));
    assert_eq!(x.samples_collected, 3);
    assert_eq!(x.trading_time, "08:00:02");
    let y = store.symbol("Y").unwrap();
    assert_eq!(y.current_price, None);
    assert_eq!(y.ema38, None);
    assert_eq!(y.samples_collected, 0);

    let mut last = None;
    while let Ok(payload) = rx.try_recv() {
        last = Some(payload);
    }
    let payload = last.expect("three messages were published");
    let message: AnalyticsMessage = serde_json::from_str(&payload).unwrap();
    assert_eq!(message.stocks.len(), 2);
    assert_eq!(message.stocks[0].stock_id, "X");

    let raw: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert!(raw["stocks"][1]["ema100"].is_null());
    assert_eq!(raw["stocks"][1]["stock_id"], "Y");
}

#[test]
fn malformed_line_is_skipped() {
    let (mut processor, store, hub) = processor();
    let (_, rx) = hub.subscribe("test");

    processor.handle_line(b"{not json");
    assert!(store.latest().stocks.is_empty());
    assert!(rx.try_recv().is_err());

    let line = feed("08:00:00", &[("X", Some(1.0))]).to_json().unwrap();
    processor.handle_line(line.as_bytes());
    assert_eq!(store.symbol("X").unwrap().samples_collected, 1);
    assert!(rx.try_recv().is_ok());
}

#[test]
fn tcp_feed_survives_a_dropped_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let server = thread::spawn(move || {
        for group in [vec![10.0, 12.0], vec![11.0]] {
            let (mut stream, _) = listener.accept().unwrap();
            for price in group {
                let line = feed("08:00:00", &[("X", Some(price))]).to_json().unwrap();
                write_line(&mut stream, line.as_bytes()).unwrap();
            }
        }
    });

    let (mut processor, store, _hub) = processor();
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut client = FeedClient::new(
        TcpConnector::new(&address, Duration::from_millis(100)),
        FixedBackoff::new(Duration::from_millis(50)),
        shutdown.clone(),
    );
    let mut received = 0;
    client.run(|line| {
        processor.handle_line(line);
        received += 1;
        if received == 3 {
            shutdown.store(true, Ordering::SeqCst);
        }
    });
    server.join().unwrap();

    let x = store.symbol("X").unwrap();
    assert_eq!(x.samples_collected, 3);
    assert_eq!(x.ema38, Some(10.1486));
}

#[test]
fn query_port_answers_from_latest_snapshot() {
    let (mut processor, store, _hub) = processor();
    processor
        .process(feed("08:00:00", &[("X", Some(10.0)), ("Y", Some(5.0))]))
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    thread::spawn(move || serve_queries(listener, store));

    let mut stream = TcpStream::connect(address).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut ask = |query: &str| -> QueryResponse {
        write_line(&mut stream, query.as_bytes()).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    };

    match ask(r#"{"query":"symbol","symbol":"Y"}"#) {
        QueryResponse::Stock(stock) => assert_eq!(stock.current_price, Some(5.0)),
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(
        ask(r#"{"query":"symbol","symbol":"Z"}"#),
        QueryResponse::NotFound("Z".to_string())
    );
    assert_eq!(ask(r#"{"query":"breakouts"}"#), QueryResponse::Breakouts(Vec::new()));
    match ask(r#"{"query":"snapshot"}"#) {
        QueryResponse::Snapshot(snapshot) => assert_eq!(snapshot.stocks.len(), 2),
        other => panic!("unexpected response: {:?}", other),
    }
    assert!(matches!(ask("not a query"), QueryResponse::Error(_)));
}
