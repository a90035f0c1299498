//! Integration tests for the feed client over a real TCP gateway bridge.
//!
//! Each test spawns a scripted gateway on a loopback port: it answers the
//! hello handshake, then replays canned frame scripts for each request it
//! receives.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use barvault_core::domain::{ContractKind, ResolvedContract};
use barvault_core::feed::{FeedClient, FeedError, TcpTransport};
use barvault_core::session::DurationToken;
use serde_json::Value;

/// Spawn a gateway that rejects client identities below `accept_from` and
/// answers each subsequent request with the next script entry (one frame per
/// line; `{req_id}` is substituted).
fn spawn_gateway(accept_from: u32, scripts: Vec<&'static str>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            handle_connection(stream, accept_from, &scripts);
        }
    });
    port
}

fn handle_connection(stream: TcpStream, accept_from: u32, scripts: &[&str]) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut out = stream;

    let mut line = String::new();
    if reader.read_line(&mut line).unwrap_or(0) == 0 {
        return;
    }
    let hello: Value = serde_json::from_str(line.trim()).unwrap();
    let client_id = hello["client_id"].as_u64().unwrap() as u32;

    if client_id < accept_from {
        writeln!(out, r#"{{"type":"rejected","reason":"identity in use"}}"#).unwrap();
        return;
    }
    writeln!(out, r#"{{"type":"accepted"}}"#).unwrap();

    for script in scripts {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let request: Value = serde_json::from_str(line.trim()).unwrap();
        let req_id = request["req_id"].as_i64().unwrap().to_string();
        for frame in script.lines() {
            writeln!(out, "{}", frame.replace("{req_id}", &req_id)).unwrap();
        }
    }
}

fn equity(symbol: &str) -> ResolvedContract {
    ResolvedContract {
        symbol: symbol.to_string(),
        kind: ContractKind::Equity,
        venue: "SMART".to_string(),
        currency: "USD".to_string(),
        expiry: None,
        include_expired: false,
    }
}

const TWO_BAR_SCRIPT: &str = r#"{"type":"bar","req_id":{req_id},"bar":{"timestamp":1704207600,"open":100.0,"high":101.0,"low":99.0,"close":100.5,"volume":1000.0}}
{"type":"bar","req_id":{req_id},"bar":{"timestamp":1704207605,"open":100.5,"high":101.0,"low":99.5,"close":100.7,"volume":900.0}}
{"type":"bars_end","req_id":{req_id}}"#;

#[test]
fn fetch_bars_over_tcp() {
    let port = spawn_gateway(1, vec![TWO_BAR_SCRIPT]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    let bars = client
        .fetch_bars(&equity("SPY"), "20240102-21:00:00", DurationToken::OneDay)
        .unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].timestamp, 1704207600);
    assert_eq!(bars[1].close, 100.7);
    client.disconnect();
}

#[test]
fn identity_ladder_walks_past_rejections() {
    let port = spawn_gateway(3, vec![TWO_BAR_SCRIPT]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    // The third identity was accepted; the session works normally.
    let bars = client
        .fetch_bars(&equity("SPY"), "20240102-21:00:00", DurationToken::OneDay)
        .unwrap();
    assert_eq!(bars.len(), 2);
    client.disconnect();
}

#[test]
fn all_identities_rejected_is_connection_unavailable() {
    let port = spawn_gateway(100, vec![]);
    let err = FeedClient::connect(&TcpTransport, "127.0.0.1", port).unwrap_err();
    assert!(matches!(err, FeedError::ConnectionUnavailable { .. }));
}

#[test]
fn provider_error_frame_fails_the_request() {
    let script = r#"{"type":"error","req_id":{req_id},"code":162,"message":"historical data service error"}"#;
    let port = spawn_gateway(1, vec![script]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    let err = client
        .fetch_bars(&equity("SPY"), "20240102-21:00:00", DurationToken::OneDay)
        .unwrap_err();
    assert!(matches!(err, FeedError::Provider { code: 162, .. }));
    client.disconnect();
}

#[test]
fn informational_status_does_not_fail_the_request() {
    let script = r#"{"type":"status","code":2104,"message":"market data farm connection is OK"}
{"type":"bar","req_id":{req_id},"bar":{"timestamp":1704207600,"open":100.0,"high":101.0,"low":99.0,"close":100.5,"volume":1000.0}}
{"type":"bars_end","req_id":{req_id}}"#;
    let port = spawn_gateway(1, vec![script]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    let bars = client
        .fetch_bars(&equity("SPY"), "20240102-21:00:00", DurationToken::OneDay)
        .unwrap();
    assert_eq!(bars.len(), 1);
    client.disconnect();
}

#[test]
fn empty_window_yields_empty_series() {
    let script = r#"{"type":"bars_end","req_id":{req_id}}"#;
    let port = spawn_gateway(1, vec![script]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    let bars = client
        .fetch_bars(&equity("SPY"), "20240102-21:00:00", DurationToken::OneDay)
        .unwrap();
    assert!(bars.is_empty());
    client.disconnect();
}

#[test]
fn contract_lookup_over_tcp() {
    let script = r#"{"type":"contract_match","req_id":{req_id},"contract_id":756733}
{"type":"contracts_end","req_id":{req_id}}"#;
    let port = spawn_gateway(1, vec![script]);
    let mut client = FeedClient::connect(&TcpTransport, "127.0.0.1", port)
        .unwrap()
        .with_pacing(Duration::ZERO);

    assert_eq!(client.resolve_identifier(&equity("SPY")).unwrap(), 756733);
    client.disconnect();
}
