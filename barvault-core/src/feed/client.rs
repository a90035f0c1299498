//! Blocking feed client: connection ladder, request pacing, timeouts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::{Bar, ResolvedContract};
use crate::feed::inbox::{FeedInbox, WaitError};
use crate::feed::transport::{BarRequest, FeedError, FeedTransport, FeedWire};
use crate::session::DurationToken;

/// Minimum spacing between remote calls, to stay under the provider's
/// rolling rate quota.
pub const PACING_DELAY: Duration = Duration::from_secs(2);

/// Standard per-request timeout.
pub const STANDARD_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for wide full-index-session requests, which stream a lot more data.
pub const WIDE_TIMEOUT: Duration = Duration::from_secs(600);

/// Client identities to try, in order, when connecting.
pub const CLIENT_IDS: [u32; 5] = [1, 2, 3, 4, 5];

const BAR_GRANULARITY: &str = "5 secs";
const WHAT_TO_SHOW: &str = "TRADES";

/// The one stateful handle on the provider connection.
///
/// Owns the pacing state (`last_call`); every remote call waits out the
/// remainder of the pacing delay since the previous call before sending,
/// whatever that call's outcome was. Owned by the orchestrator's single
/// thread for the duration of a run — nothing else talks to the wire.
pub struct FeedClient {
    wire: Box<dyn FeedWire>,
    inbox: Arc<FeedInbox>,
    next_req_id: i64,
    last_call: Option<Instant>,
    pacing: Duration,
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("next_req_id", &self.next_req_id)
            .field("last_call", &self.last_call)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl FeedClient {
    /// Connect, trying each client identity in order.
    ///
    /// Fails with `ConnectionUnavailable` only when every identity is
    /// rejected.
    pub fn connect(
        transport: &dyn FeedTransport,
        host: &str,
        port: u16,
    ) -> Result<Self, FeedError> {
        for client_id in CLIENT_IDS {
            let inbox = Arc::new(FeedInbox::new());
            match transport.open(host, port, client_id, Arc::clone(&inbox)) {
                Ok(wire) => {
                    return Ok(Self {
                        wire,
                        inbox,
                        next_req_id: 0,
                        last_call: None,
                        pacing: PACING_DELAY,
                    })
                }
                Err(_) => continue,
            }
        }
        Err(FeedError::ConnectionUnavailable {
            host: host.to_string(),
            port,
        })
    }

    /// Override the pacing delay. Tests run with `Duration::ZERO`.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Fetch one day's bars for a resolved contract. Blocks until the
    /// provider signals end-of-data or the timeout elapses.
    ///
    /// An empty result means the provider has no data for the window; that
    /// is not an error.
    pub fn fetch_bars(
        &mut self,
        contract: &ResolvedContract,
        end_boundary: &str,
        duration: DurationToken,
    ) -> Result<Vec<Bar>, FeedError> {
        let timeout = if duration.is_wide() {
            WIDE_TIMEOUT
        } else {
            STANDARD_TIMEOUT
        };

        self.pace();
        self.inbox.begin_request();

        let request = BarRequest {
            contract: contract.clone(),
            end_boundary: end_boundary.to_string(),
            duration: duration.wire_str().to_string(),
            granularity: BAR_GRANULARITY.to_string(),
            what_to_show: WHAT_TO_SHOW.to_string(),
            extended_hours: true,
        };
        let req_id = self.take_req_id();
        self.wire.send_bar_request(req_id, &request)?;

        self.inbox
            .wait_bars(timeout)
            .map_err(|e| Self::wait_error(e, &contract.symbol, timeout))
    }

    /// Resolve the provider's numeric identifier for a contract.
    pub fn resolve_identifier(&mut self, contract: &ResolvedContract) -> Result<i64, FeedError> {
        self.pace();
        self.inbox.begin_request();

        let req_id = self.take_req_id();
        self.wire.send_contract_request(req_id, contract)?;

        let ids = self
            .inbox
            .wait_contract_ids(STANDARD_TIMEOUT)
            .map_err(|e| Self::wait_error(e, &contract.symbol, STANDARD_TIMEOUT))?;

        match ids.as_slice() {
            [id] => Ok(*id),
            [] => Err(FeedError::NoContract {
                symbol: contract.symbol.clone(),
            }),
            _ => Err(FeedError::AmbiguousInstrument {
                symbol: contract.symbol.clone(),
                count: ids.len(),
            }),
        }
    }

    /// Tear down the wire. Safe to call once at the end of a run.
    pub fn disconnect(&mut self) {
        self.wire.close();
    }

    /// Wait out the remainder of the pacing delay, then mark this call.
    fn pace(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.pacing {
                std::thread::sleep(self.pacing - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
    }

    fn take_req_id(&mut self) -> i64 {
        let id = self.next_req_id;
        self.next_req_id += 1;
        id
    }

    fn wait_error(err: WaitError, symbol: &str, timeout: Duration) -> FeedError {
        match err {
            WaitError::TimedOut => FeedError::Timeout {
                symbol: symbol.to_string(),
                seconds: timeout.as_secs(),
            },
            WaitError::Provider { code, message } => FeedError::Provider {
                code,
                symbol: symbol.to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContractKind;
    use std::sync::Mutex;

    /// Transport whose sessions echo scripted replies straight into the inbox.
    struct ScriptedTransport {
        accept_from: u32,
        bars: Vec<Bar>,
        contract_ids: Vec<i64>,
        opened_ids: Arc<Mutex<Vec<u32>>>,
    }

    struct ScriptedWire {
        inbox: Arc<FeedInbox>,
        bars: Vec<Bar>,
        contract_ids: Vec<i64>,
    }

    impl FeedWire for ScriptedWire {
        fn send_bar_request(&mut self, _req_id: i64, _request: &BarRequest) -> Result<(), FeedError> {
            for bar in &self.bars {
                self.inbox.push_bar(*bar);
            }
            self.inbox.finish_bars();
            Ok(())
        }

        fn send_contract_request(
            &mut self,
            _req_id: i64,
            _contract: &ResolvedContract,
        ) -> Result<(), FeedError> {
            for id in &self.contract_ids {
                self.inbox.push_contract_id(*id);
            }
            self.inbox.finish_contracts();
            Ok(())
        }

        fn close(&mut self) {}
    }

    impl FeedTransport for ScriptedTransport {
        fn open(
            &self,
            _host: &str,
            _port: u16,
            client_id: u32,
            inbox: Arc<FeedInbox>,
        ) -> Result<Box<dyn FeedWire>, FeedError> {
            self.opened_ids.lock().unwrap().push(client_id);
            if client_id < self.accept_from {
                return Err(FeedError::Transport("identity rejected".into()));
            }
            Ok(Box::new(ScriptedWire {
                inbox,
                bars: self.bars.clone(),
                contract_ids: self.contract_ids.clone(),
            }))
        }
    }

    fn contract(symbol: &str) -> ResolvedContract {
        ResolvedContract {
            symbol: symbol.to_string(),
            kind: ContractKind::Equity,
            venue: "SMART".to_string(),
            currency: "USD".to_string(),
            expiry: None,
            include_expired: false,
        }
    }

    fn bar(ts: i64) -> Bar {
        Bar {
            timestamp: ts,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        }
    }

    fn transport(accept_from: u32) -> ScriptedTransport {
        ScriptedTransport {
            accept_from,
            bars: vec![bar(1000), bar(1005)],
            contract_ids: vec![7],
            opened_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[test]
    fn connect_walks_the_identity_ladder() {
        let t = transport(3);
        let client = FeedClient::connect(&t, "127.0.0.1", 4002);
        assert!(client.is_ok());
        assert_eq!(*t.opened_ids.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn connect_fails_when_all_identities_rejected() {
        let t = transport(99);
        let err = FeedClient::connect(&t, "127.0.0.1", 4002).unwrap_err();
        assert!(matches!(err, FeedError::ConnectionUnavailable { .. }));
        assert_eq!(t.opened_ids.lock().unwrap().len(), CLIENT_IDS.len());
    }

    #[test]
    fn fetch_bars_returns_scripted_rows() {
        let t = transport(1);
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::ZERO);
        let bars = client
            .fetch_bars(&contract("SPY"), "20240102-21:00:00", DurationToken::OneDay)
            .unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn empty_fetch_is_not_an_error() {
        let mut t = transport(1);
        t.bars.clear();
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::ZERO);
        let bars = client
            .fetch_bars(&contract("SPY"), "20240102-21:00:00", DurationToken::OneDay)
            .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn single_contract_match_resolves() {
        let t = transport(1);
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::ZERO);
        assert_eq!(client.resolve_identifier(&contract("SPY")).unwrap(), 7);
    }

    #[test]
    fn multiple_contract_matches_are_ambiguous() {
        let mut t = transport(1);
        t.contract_ids = vec![7, 8];
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::ZERO);
        let err = client.resolve_identifier(&contract("SPY")).unwrap_err();
        assert!(matches!(
            err,
            FeedError::AmbiguousInstrument { count: 2, .. }
        ));
    }

    #[test]
    fn zero_contract_matches_fail() {
        let mut t = transport(1);
        t.contract_ids.clear();
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::ZERO);
        let err = client.resolve_identifier(&contract("SPY")).unwrap_err();
        assert!(matches!(err, FeedError::NoContract { .. }));
    }

    #[test]
    fn consecutive_calls_are_paced_apart() {
        let t = transport(1);
        let mut client = FeedClient::connect(&t, "127.0.0.1", 4002)
            .unwrap()
            .with_pacing(Duration::from_millis(50));

        let started = Instant::now();
        let c = contract("SPY");
        client
            .fetch_bars(&c, "20240102-21:00:00", DurationToken::OneDay)
            .unwrap();
        client
            .fetch_bars(&c, "20240103-21:00:00", DurationToken::OneDay)
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
