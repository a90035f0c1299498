//! TCP transport to the local gateway bridge.
//!
//! Frames are newline-delimited JSON. The session opens with a hello frame
//! carrying the client identity; the bridge answers accepted or rejected.
//! After the handshake a daemon listener thread decodes gateway events into
//! the shared inbox while the wire half only sends.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, ResolvedContract};
use crate::feed::inbox::FeedInbox;
use crate::feed::transport::{BarRequest, FeedError, FeedTransport, FeedWire};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Synthetic code for a dropped connection; fails any pending request.
const CONNECTION_CLOSED_CODE: i32 = -1;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    Hello { client_id: u32 },
    Bars { req_id: i64, request: &'a BarRequest },
    Contract {
        req_id: i64,
        contract: &'a ResolvedContract,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum GatewayFrame {
    Accepted,
    Rejected { reason: String },
    Bar { req_id: i64, bar: Bar },
    BarsEnd { req_id: i64 },
    ContractMatch { req_id: i64, contract_id: i64 },
    ContractsEnd { req_id: i64 },
    Status { code: i32, message: String },
    Error { req_id: i64, code: i32, message: String },
}

/// Gateway bridge transport.
pub struct TcpTransport;

impl FeedTransport for TcpTransport {
    fn open(
        &self,
        host: &str,
        port: u16,
        client_id: u32,
        inbox: Arc<FeedInbox>,
    ) -> Result<Box<dyn FeedWire>, FeedError> {
        let stream = TcpStream::connect((host, port)).map_err(transport_err)?;
        stream.set_nodelay(true).ok();
        stream
            .set_read_timeout(Some(HANDSHAKE_TIMEOUT))
            .map_err(transport_err)?;

        let mut wire = TcpWire {
            stream: stream.try_clone().map_err(transport_err)?,
        };
        wire.send(&ClientFrame::Hello { client_id })?;

        let mut reader = BufReader::new(stream.try_clone().map_err(transport_err)?);
        let mut line = String::new();
        reader.read_line(&mut line).map_err(transport_err)?;
        match serde_json::from_str::<GatewayFrame>(line.trim()) {
            Ok(GatewayFrame::Accepted) => {}
            Ok(GatewayFrame::Rejected { reason }) => {
                return Err(FeedError::Transport(format!(
                    "client identity {client_id} rejected: {reason}"
                )));
            }
            Ok(other) => {
                return Err(FeedError::Transport(format!(
                    "unexpected handshake reply: {other:?}"
                )));
            }
            Err(e) => return Err(FeedError::Transport(format!("handshake decode: {e}"))),
        }

        stream.set_read_timeout(None).map_err(transport_err)?;
        thread::spawn(move || listen(reader, inbox));

        Ok(Box::new(wire))
    }
}

/// Decode gateway events into the inbox until the connection drops.
fn listen(reader: BufReader<TcpStream>, inbox: Arc<FeedInbox>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        // Unknown frames are skipped so bridge upgrades don't kill the run.
        let Ok(frame) = serde_json::from_str::<GatewayFrame>(line.trim()) else {
            continue;
        };
        match frame {
            GatewayFrame::Bar { bar, .. } => inbox.push_bar(bar),
            GatewayFrame::BarsEnd { .. } => inbox.finish_bars(),
            GatewayFrame::ContractMatch { contract_id, .. } => inbox.push_contract_id(contract_id),
            GatewayFrame::ContractsEnd { .. } => inbox.finish_contracts(),
            GatewayFrame::Status { code, message } | GatewayFrame::Error { code, message, .. } => {
                inbox.fail(code, message)
            }
            GatewayFrame::Accepted | GatewayFrame::Rejected { .. } => {}
        }
    }
    inbox.fail(CONNECTION_CLOSED_CODE, "gateway connection closed");
}

struct TcpWire {
    stream: TcpStream,
}

impl TcpWire {
    fn send(&mut self, frame: &ClientFrame<'_>) -> Result<(), FeedError> {
        let mut line =
            serde_json::to_string(frame).map_err(|e| FeedError::Transport(e.to_string()))?;
        line.push('\n');
        self.stream.write_all(line.as_bytes()).map_err(transport_err)
    }
}

impl FeedWire for TcpWire {
    fn send_bar_request(&mut self, req_id: i64, request: &BarRequest) -> Result<(), FeedError> {
        self.send(&ClientFrame::Bars { req_id, request })
    }

    fn send_contract_request(
        &mut self,
        req_id: i64,
        contract: &ResolvedContract,
    ) -> Result<(), FeedError> {
        self.send(&ClientFrame::Contract { req_id, contract })
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn transport_err(e: std::io::Error) -> FeedError {
    FeedError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContractKind;

    #[test]
    fn hello_frame_shape() {
        let json = serde_json::to_string(&ClientFrame::Hello { client_id: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"hello","client_id":3}"#);
    }

    #[test]
    fn bar_request_frame_carries_contract() {
        let request = BarRequest {
            contract: ResolvedContract {
                symbol: "SPY".into(),
                kind: ContractKind::Equity,
                venue: "SMART".into(),
                currency: "USD".into(),
                expiry: None,
                include_expired: false,
            },
            end_boundary: "20240102-21:00:00".into(),
            duration: "1 D".into(),
            granularity: "5 secs".into(),
            what_to_show: "TRADES".into(),
            extended_hours: true,
        };
        let json = serde_json::to_string(&ClientFrame::Bars {
            req_id: 1,
            request: &request,
        })
        .unwrap();
        assert!(json.starts_with(r#"{"type":"bars","req_id":1,"#));
        assert!(json.contains(r#""symbol":"SPY""#));
        assert!(json.contains(r#""end_boundary":"20240102-21:00:00""#));
    }

    #[test]
    fn gateway_frames_decode() {
        let frame: GatewayFrame = serde_json::from_str(
            r#"{"type":"bar","req_id":1,"bar":{"timestamp":1704207600,"open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":10.0}}"#,
        )
        .unwrap();
        assert!(matches!(frame, GatewayFrame::Bar { bar, .. } if bar.timestamp == 1704207600));

        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"rejected","reason":"in use"}"#).unwrap();
        assert!(matches!(frame, GatewayFrame::Rejected { .. }));

        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"status","code":2104,"message":"farm OK"}"#).unwrap();
        assert!(matches!(frame, GatewayFrame::Status { code: 2104, .. }));
    }
}
