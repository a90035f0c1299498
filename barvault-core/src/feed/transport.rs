//! The opaque upstream boundary: wire + transport traits and request types.
//!
//! The gateway protocol is callback-driven — requests go out on the wire and
//! responses arrive on a listener thread that fills the shared `FeedInbox`.
//! `FeedClient` is the blocking facade over the two.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ResolvedContract;
use crate::feed::inbox::FeedInbox;

/// Structured error types for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not connect to gateway at {host}:{port} with any client identity")]
    ConnectionUnavailable { host: String, port: u16 },

    #[error("request for {symbol} timed out after {seconds}s")]
    Timeout { symbol: String, seconds: u64 },

    #[error("provider error {code} for {symbol}: {message}")]
    Provider {
        code: i32,
        symbol: String,
        message: String,
    },

    #[error("contract lookup for {symbol} returned {count} matches")]
    AmbiguousInstrument { symbol: String, count: usize },

    #[error("no contract matched {symbol}")]
    NoContract { symbol: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Parameters of one historical-bars request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarRequest {
    pub contract: ResolvedContract,
    /// Session close boundary, `%Y%m%d-%H:%M:%S` UTC.
    pub end_boundary: String,
    /// Provider duration string, e.g. `1 D` or `24000 S`.
    pub duration: String,
    /// Bar granularity, e.g. `5 secs`.
    pub granularity: String,
    /// What the bars aggregate, e.g. `TRADES`.
    pub what_to_show: String,
    pub extended_hours: bool,
}

/// Outbound half of an open gateway session.
///
/// Implementations only send; responses arrive through the `FeedInbox` the
/// transport was opened with.
pub trait FeedWire: Send {
    fn send_bar_request(&mut self, req_id: i64, request: &BarRequest) -> Result<(), FeedError>;

    fn send_contract_request(
        &mut self,
        req_id: i64,
        contract: &ResolvedContract,
    ) -> Result<(), FeedError>;

    fn close(&mut self);
}

/// Opens gateway sessions under a given client identity.
pub trait FeedTransport {
    /// Open a session; the transport's listener must feed `inbox`.
    ///
    /// A rejection of this client identity is an `Err`; the caller tries the
    /// next identity in its ladder.
    fn open(
        &self,
        host: &str,
        port: u16,
        client_id: u32,
        inbox: Arc<FeedInbox>,
    ) -> Result<Box<dyn FeedWire>, FeedError>;
}
