mod common;

use std::sync::Arc;
use std::time::Duration;

use poolwire_core::{ChainId, ClientConfig, Frame, StreamError, U256};
use poolwire_stream::{BidReceipt, Client};
use tokio::sync::mpsc::error::TryRecvError;

use common::{auction_json, binary_frame, config, signed_transaction, Dial, ScriptedConnector, Step};

const WAIT: Duration = Duration::from_secs(5);

fn client(config: ClientConfig, connector: &Arc<ScriptedConnector>) -> Client {
    Client::with_connector(config, Arc::clone(connector) as _).unwrap()
}

#[tokio::test]
async fn dial_failures_below_the_bound_recover() {
    let tx = signed_transaction(1);
    let connector = ScriptedConnector::new(vec![
        Dial::Fail,
        Dial::Fail,
        Dial::Accept(vec![Step::Frame(binary_frame(&tx))]),
    ]);
    let mut sub = client(config(), &connector).transactions().open(ChainId::POLYGON);

    let got = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(got.hash, *tx.hash());
    assert!(matches!(sub.errors().try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(connector.dials(), 3);
    assert_eq!(sub.metrics().dial_attempts, 3);
    sub.shutdown().await;
}

#[tokio::test]
async fn dial_failures_at_the_bound_push_exactly_one_error() {
    let connector = ScriptedConnector::new(vec![Dial::Fail, Dial::Fail, Dial::Fail, Dial::Fail]);
    let mut sub = client(config(), &connector).transactions().open(ChainId::ETHEREUM);

    let first = tokio::time::timeout(WAIT, sub.next()).await.unwrap();
    match first {
        Some(Err(StreamError::RetriesExhausted { attempts, last })) => {
            assert_eq!(attempts, 3);
            assert!(!last.to_string().contains("test-key"));
        }
        other => panic!("expected one fatal error, got {other:?}"),
    }
    assert!(tokio::time::timeout(WAIT, sub.next()).await.unwrap().is_none());
    assert_eq!(connector.dials(), 3);
}

#[tokio::test]
async fn stalled_connection_is_redialed() {
    let tx = signed_transaction(2);
    let connector = ScriptedConnector::new(vec![
        Dial::Accept(vec![Step::Stall]),
        Dial::Accept(vec![Step::Frame(binary_frame(&tx))]),
    ]);
    let mut sub = client(config(), &connector).transactions().open(ChainId::POLYGON);

    let got = tokio::time::timeout(WAIT, sub.next_event()).await.unwrap().unwrap();
    assert_eq!(got.nonce, 2);
    assert_eq!(connector.dials(), 2);
    assert_eq!(sub.metrics().reconnections, 1);
}

#[tokio::test]
async fn remote_close_is_redialed_without_counting_against_the_bound() {
    let tx = signed_transaction(3);
    // more drops than the dial bound; none of them is a dial failure
    let connector = ScriptedConnector::new(vec![
        Dial::Accept(vec![Step::Close]),
        Dial::Accept(vec![Step::Close]),
        Dial::Accept(vec![Step::Close]),
        Dial::Accept(vec![Step::Close]),
        Dial::Accept(vec![Step::Frame(binary_frame(&tx))]),
    ]);
    let mut sub = client(config(), &connector).transactions().open(ChainId::POLYGON);

    let got = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(got.nonce, 3);
    assert_eq!(connector.dials(), 5);
}

#[tokio::test]
async fn malformed_transactions_are_dropped_and_counted() {
    let tx = signed_transaction(4);
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![
        Step::Frame(Frame::Binary(vec![0x02, 0xff, 0x00])),
        Step::Frame(Frame::Text("not hex".into())),
        Step::Frame(Frame::Text(hex::encode(alloy::eips::Encodable2718::encoded_2718(&tx)))),
    ])]);
    let mut sub = client(config(), &connector).transactions().open(ChainId::POLYGON);

    let got = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(got.hash, *tx.hash());
    let metrics = sub.metrics();
    assert_eq!(metrics.dropped_messages, 2);
    assert_eq!(metrics.events_delivered, 1);
    assert!(matches!(sub.errors().try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn missing_credential_is_reported_once_without_dialing() {
    let connector = ScriptedConnector::new(vec![]);
    let mut config = config();
    config.api_key = String::new();
    let client = client(config, &connector);

    let mut txs = client.transactions().open(ChainId::ETHEREUM);
    assert!(matches!(txs.next().await, Some(Err(StreamError::MissingCredential))));
    assert!(txs.next().await.is_none());

    let mut auctions = client.auctions().open();
    assert!(matches!(auctions.next().await, Some(Err(StreamError::MissingCredential))));
    assert!(auctions.next().await.is_none());

    assert_eq!(connector.dials(), 0);
}

#[tokio::test]
async fn auction_split_across_frames_is_delivered_once() {
    let json = auction_json("a1");
    let (head, tail) = json.split_at(57);
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![
        Step::Frame(Frame::Text(head.to_string())),
        Step::Frame(Frame::Text(tail.to_string())),
    ])]);
    let mut sub = client(config(), &connector).auctions().open();

    let auction = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(auction.id, "a1");
    assert_eq!(auction.closes_at.timestamp(), 1000);
    assert_eq!(auction.created_at.timestamp(), 900);
    assert_eq!(auction.fee_recipient, "0xAB");
    assert_eq!(auction.chain_id, ChainId::ETHEREUM);
    assert_eq!(auction.transaction.value, U256::from(16u64));
    assert_eq!(auction.transaction.gas, 21_000);
    assert!(auction.has_live_connection());
    assert_eq!(sub.metrics().events_delivered, 1);
}

#[tokio::test]
async fn reassembly_overflow_forces_a_reconnect() {
    let mut config = config();
    config.reassembly.max_frames = 2;
    let connector = ScriptedConnector::new(vec![
        Dial::Accept(vec![
            Step::Frame(Frame::Text("{\"id\":".into())),
            Step::Frame(Frame::Text("\"broken".into())),
        ]),
        Dial::Accept(vec![Step::Frame(Frame::Text(auction_json("a2")))]),
    ]);
    let mut sub = client(config, &connector).auctions().open();

    let auction = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(auction.id, "a2");
    assert_eq!(connector.dials(), 2);
    assert_eq!(sub.metrics().protocol_errors, 1);
}

#[tokio::test]
async fn invalid_auction_notice_is_dropped_without_reconnecting() {
    let bad = auction_json("bad").replace(r#""value":"0x10""#, r#""value":"sixteen""#);
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![
        Step::Frame(Frame::Text(bad)),
        Step::Frame(Frame::Text(auction_json("good"))),
    ])]);
    let mut sub = client(config(), &connector).auctions().open();

    let auction = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(auction.id, "good");
    assert_eq!(connector.dials(), 1);
    let metrics = sub.metrics();
    assert_eq!(metrics.protocol_errors, 1);
    assert_eq!(metrics.reconnections, 0);
}

#[tokio::test]
async fn bid_goes_out_on_the_auction_connection() {
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![Step::Frame(Frame::Text(
        auction_json("a1"),
    ))])]);
    let client = client(config(), &connector);
    let mut sub = client.auctions().open();
    let auction = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();

    let tx = signed_transaction(9);
    let receipt = client.bids().submit_bid(&auction, &[tx.clone()]).await.unwrap();
    assert_eq!(receipt, BidReceipt::Sent { generation: 1 });

    let written = connector.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0, 1);
    let bid: serde_json::Value = serde_json::from_str(&written[0].1).unwrap();
    assert_eq!(bid["method"], "eth_sendBundle");
    assert_eq!(bid["params"][0]["txs"][0], poolwire_stream::bid::encode_signed(&tx));
}

#[tokio::test]
async fn bid_after_reconnect_fails_as_expired() {
    let connector = ScriptedConnector::new(vec![
        Dial::Accept(vec![Step::Frame(Frame::Text(auction_json("old"))), Step::Close]),
        Dial::Accept(vec![Step::Frame(Frame::Text(auction_json("new")))]),
    ]);
    let client = client(config(), &connector);
    let mut sub = client.auctions().open();

    let old = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    let new = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(old.id, "old");
    assert_eq!(new.id, "new");
    assert!(!old.has_live_connection());

    let err = client.bids().submit_raw_bid(&old, vec!["02".into()]).await.unwrap_err();
    assert!(err.is_expired());

    let receipt = client.bids().submit_raw_bid(&new, vec!["02".into()]).await.unwrap();
    assert_eq!(receipt, BidReceipt::Sent { generation: 2 });
    let written = connector.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0, 2);
}

#[tokio::test]
async fn bid_after_shutdown_fails_as_expired() {
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![Step::Frame(Frame::Text(
        auction_json("a1"),
    ))])]);
    let client = client(config(), &connector);
    let mut sub = client.auctions().open();
    let auction = tokio::time::timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();

    tokio::time::timeout(WAIT, sub.shutdown()).await.unwrap();

    let err = client.bids().submit_raw_bid(&auction, vec!["02".into()]).await.unwrap_err();
    assert!(err.is_expired());
    assert!(connector.written().is_empty());
}

#[tokio::test]
async fn shutdown_stops_a_silent_session() {
    let connector = ScriptedConnector::new(vec![Dial::Accept(vec![Step::Stall])]);
    let mut config = config();
    config.stream.read_timeout_ms = 60_000;
    let sub = client(config, &connector).transactions().open(ChainId::BSC);

    tokio::time::sleep(Duration::from_millis(50)).await;
    tokio::time::timeout(WAIT, sub.shutdown()).await.unwrap();
    assert_eq!(connector.dials(), 1);
}

#[tokio::test]
async fn dropping_the_subscription_ends_the_session() {
    let connector = ScriptedConnector::new(vec![]);
    let sub = client(config(), &connector).auctions().open();
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(sub);

    // let the cancelled loops wind down, then make sure nobody dials again
    tokio::time::sleep(Duration::from_millis(50)).await;
    let dials = connector.dials();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(connector.dials(), dials);
}
