//! In-memory scripted transport for session tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::Encodable2718;
use alloy::primitives::{address, b256, Bytes, TxKind, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use async_trait::async_trait;

use poolwire_core::{ClientConfig, Connection, Connector, Frame, FrameSink, FrameSource, TransportError};

/// What one read on a scripted connection does.
pub enum Step {
    Frame(Frame),
    /// Never produce anything; only the read deadline ends this.
    Stall,
    /// Remote closes the connection.
    Close,
}

/// Outcome of one dial.
pub enum Dial {
    Fail,
    Accept(Vec<Step>),
}

/// Connector replaying a script of dials. Once the script is used up every
/// dial succeeds with a connection that stays silent.
#[derive(Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Dial>>,
    dials: AtomicUsize,
    /// `(dial number, text)` of every write, dial numbers starting at 1.
    pub written: Arc<Mutex<Vec<(usize, String)>>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Dial>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<(usize, String)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Connection, TransportError> {
        let dial = self.dials.fetch_add(1, Ordering::SeqCst) + 1;
        let next = self.script.lock().unwrap().pop_front();
        let steps = match next {
            Some(Dial::Fail) => {
                return Err(TransportError::Connect {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                })
            }
            Some(Dial::Accept(steps)) => steps,
            None => vec![Step::Stall],
        };
        Ok(Connection {
            source: Box::new(ScriptedSource { steps: steps.into() }),
            sink: Box::new(RecordingSink {
                dial,
                written: Arc::clone(&self.written),
            }),
        })
    }
}

struct ScriptedSource {
    steps: VecDeque<Step>,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        match self.steps.pop_front() {
            Some(Step::Frame(frame)) => Some(Ok(frame)),
            Some(Step::Close) => None,
            Some(Step::Stall) | None => std::future::pending().await,
        }
    }
}

struct RecordingSink {
    dial: usize,
    written: Arc<Mutex<Vec<(usize, String)>>>,
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.written.lock().unwrap().push((self.dial, text));
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Short deadlines so reconnects happen within a test's lifetime.
pub fn config() -> ClientConfig {
    let mut config = ClientConfig::with_api_key("test-key");
    config.endpoints.transactions_ws = "ws://pool.test/ws".into();
    config.endpoints.auctions_ws = "ws://pool.test/auctions".into();
    config.endpoints.relay_url = "http://127.0.0.1:9/relay".into();
    config.stream.read_timeout_ms = 200;
    config.stream.reconnect_delay_ms = 10;
    config.stream.max_dial_attempts = Some(3);
    config
}

pub fn signed_transaction(nonce: u64) -> TxEnvelope {
    let signer = PrivateKeySigner::from_bytes(&b256!(
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
    ))
    .unwrap();
    let tx = TxEip1559 {
        chain_id: 137,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: 30_000_000_000,
        max_priority_fee_per_gas: 1_000_000_000,
        to: TxKind::Call(address!("00000000000000000000000000000000000000aa")),
        value: U256::from(1_000u64),
        access_list: Default::default(),
        input: Bytes::new(),
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    tx.into_signed(signature).into()
}

pub fn binary_frame(tx: &TxEnvelope) -> Frame {
    Frame::Binary(tx.encoded_2718())
}

pub fn auction_json(id: &str) -> String {
    format!(
        r#"{{"id":"{id}","fee_recipient":"0xAB","closes_at_unix":1000,"created_at_unix":900,"chain_id":1,"transaction":{{"hash":"0x01","from":"0x02","to":"0x03","value":"0x10","data":"","gas":21000}}}}"#
    )
}
