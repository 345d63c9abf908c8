//! poolwire CLI: watch the private pool from the terminal.
//!
//! Usage:
//! ```bash
//! export POOLWIRE_API_KEY=sk_...
//!
//! # Print auctions as they open
//! poolwire auctions
//!
//! # Print pending Polygon transactions, stop after 20
//! poolwire transactions --chain polygon --limit 20
//!
//! # Show where a transaction was seen first
//! poolwire trace 0x5f3c...
//! ```

use std::env;
use std::process;

use chrono::Utc;
use poolwire_core::{ChainId, ClientConfig, B256};
use poolwire_observability::{init_tracing, LogConfig};
use poolwire_stream::{Client, Subscription};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    if let Err(e) = init_tracing(&LogConfig::from_env()) {
        eprintln!("Warning: logging not initialised: {e}");
    }

    let result = match args[1].as_str() {
        "auctions" => cmd_auctions(&args[2..]).await,
        "transactions" | "txs" => cmd_transactions(&args[2..]).await,
        "trace" => cmd_trace(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("poolwire {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("poolwire {}", env!("CARGO_PKG_VERSION"));
    println!("Watch a private transaction pool's streams\n");
    println!("USAGE:");
    println!("    poolwire <COMMAND>\n");
    println!("COMMANDS:");
    println!("    auctions      Print auctions as they open");
    println!("    transactions  Print pending transactions of one chain");
    println!("    trace <HASH>  Print where and when a transaction was seen");
    println!("    version       Print version");
    println!("    help          Print this help\n");
    println!("FLAGS:");
    println!("    --chain <NAME|ID>  Chain for `transactions` (default: ethereum)");
    println!("    --limit <N>        Stop after N events\n");
    println!("ENVIRONMENT:");
    println!("    POOLWIRE_API_KEY   API key  [required]");
    println!("    POOLWIRE_*_URL     Endpoint overrides");
    println!("    POOLWIRE_LOG       Log filter (default: info)");
    println!("    POOLWIRE_LOG_JSON  1 for JSON logs");
}

fn client() -> Result<Client, String> {
    Client::new(ClientConfig::from_env()).map_err(|e| e.to_string())
}

fn parse_limit(args: &[String]) -> Result<Option<usize>, String> {
    parse_flag(args, "--limit")
        .map(|n| n.parse().map_err(|_| format!("invalid --limit: {n}")))
        .transpose()
}

/// Print every event until the limit, Ctrl-C, or the session's error.
async fn drain<T>(
    mut sub: Subscription<T>,
    limit: Option<usize>,
    mut print: impl FnMut(&T),
) -> Result<(), String> {
    let mut seen = 0usize;
    let outcome = loop {
        if limit.is_some_and(|l| seen >= l) {
            break Ok(());
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            item = sub.next() => match item {
                Some(Ok(event)) => {
                    print(&event);
                    seen += 1;
                }
                Some(Err(e)) => break Err(e.to_string()),
                None => break Ok(()),
            },
        }
    };
    let metrics = sub.metrics();
    sub.shutdown().await;
    tracing::info!(
        events = metrics.events_delivered,
        dropped = metrics.dropped_messages,
        reconnections = metrics.reconnections,
        "stream closed"
    );
    outcome
}

async fn cmd_auctions(args: &[String]) -> Result<(), String> {
    let limit = parse_limit(args)?;
    let client = client()?;
    let sub = client.auctions().open();
    drain(sub, limit, |a| {
        let state = if a.is_closed_at(Utc::now()) { "closed" } else { "open" };
        println!(
            "{}  {state}  chain={}  tx={}  value={}  closes_at={}  fee_recipient={}",
            a.id, a.chain_id, a.transaction.hash, a.transaction.value, a.closes_at, a.fee_recipient
        );
    })
    .await
}

async fn cmd_transactions(args: &[String]) -> Result<(), String> {
    let chain: ChainId = match parse_flag(args, "--chain") {
        Some(c) => c.parse().map_err(|e| format!("{e}"))?,
        None => ChainId::ETHEREUM,
    };
    let limit = parse_limit(args)?;
    let client = client()?;
    let sub = client.transactions().open(chain);
    drain(sub, limit, |tx| {
        let to = tx.to.map(|a| a.to_string()).unwrap_or_else(|| "(create)".into());
        println!(
            "{}  from={}  to={}  value={}  nonce={}  gas={}",
            tx.hash, tx.from, to, tx.value, tx.nonce, tx.gas_limit
        );
    })
    .await
}

async fn cmd_trace(args: &[String]) -> Result<(), String> {
    let raw = args.first().ok_or("transaction hash is required")?;
    let hash: B256 = raw.parse().map_err(|_| format!("invalid transaction hash: {raw}"))?;
    let client = client()?;
    match client.api().trace(hash).await.map_err(|e| e.to_string())? {
        Some(trace) => {
            println!("Hash:          {}", trace.hash);
            println!("Chain:         {}", trace.chain_id);
            println!("First seen at: {}", trace.first_seen_at);
            for entry in &trace.trace {
                println!("  {}  {}", entry.time, entry.origin);
            }
            Ok(())
        }
        None => Err(format!("{hash} was never seen by the pool")),
    }
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
