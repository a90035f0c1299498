//! Blocking reply slots between the gateway listener thread and the caller.
//!
//! One request is outstanding at a time — the whole pipeline is sequential —
//! so the inbox holds a single slot. The listener pushes rows and an
//! end-of-data marker; the caller blocks on the condvar with a timeout.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::domain::Bar;

/// Provider status codes that are informational connection chatter, not
/// request failures. Data still arrives normally after these.
const INFORMATIONAL_STATUS_CODES: [i32; 7] = [2104, 2106, 2107, 2108, 2119, 2158, 2176];

/// Why a wait ended without data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    TimedOut,
    Provider { code: i32, message: String },
}

#[derive(Debug, Default)]
struct Slot {
    bars: Vec<Bar>,
    contract_ids: Vec<i64>,
    done: bool,
    error: Option<(i32, String)>,
}

/// Shared reply state between the listener thread and the blocking caller.
#[derive(Debug, Default)]
pub struct FeedInbox {
    slot: Mutex<Slot>,
    cond: Condvar,
}

impl FeedInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller side: reset the slot before sending a request.
    pub fn begin_request(&self) {
        let mut slot = self.slot.lock().expect("feed inbox lock poisoned");
        *slot = Slot::default();
    }

    /// Listener side: one bar row arrived.
    pub fn push_bar(&self, bar: Bar) {
        let mut slot = self.slot.lock().expect("feed inbox lock poisoned");
        slot.bars.push(bar);
    }

    /// Listener side: the provider signalled end-of-data for the bar request.
    pub fn finish_bars(&self) {
        self.finish();
    }

    /// Listener side: one contract match arrived.
    pub fn push_contract_id(&self, contract_id: i64) {
        let mut slot = self.slot.lock().expect("feed inbox lock poisoned");
        slot.contract_ids.push(contract_id);
    }

    /// Listener side: end of contract matches.
    pub fn finish_contracts(&self) {
        self.finish();
    }

    /// Listener side: a provider error or status message arrived.
    ///
    /// Informational status codes are dropped here; anything else fails the
    /// pending request and wakes the caller.
    pub fn fail(&self, code: i32, message: impl Into<String>) {
        if INFORMATIONAL_STATUS_CODES.contains(&code) {
            return;
        }
        let mut slot = self.slot.lock().expect("feed inbox lock poisoned");
        slot.error = Some((code, message.into()));
        slot.done = true;
        self.cond.notify_all();
    }

    /// Caller side: block until end-of-data, error, or timeout; returns the
    /// accumulated bars.
    pub fn wait_bars(&self, timeout: Duration) -> Result<Vec<Bar>, WaitError> {
        self.wait(timeout)
            .map(|mut slot| std::mem::take(&mut slot.bars))
    }

    /// Caller side: block for contract matches.
    pub fn wait_contract_ids(&self, timeout: Duration) -> Result<Vec<i64>, WaitError> {
        self.wait(timeout)
            .map(|mut slot| std::mem::take(&mut slot.contract_ids))
    }

    fn finish(&self) {
        let mut slot = self.slot.lock().expect("feed inbox lock poisoned");
        slot.done = true;
        self.cond.notify_all();
    }

    fn wait(&self, timeout: Duration) -> Result<std::sync::MutexGuard<'_, Slot>, WaitError> {
        let slot = self.slot.lock().expect("feed inbox lock poisoned");
        let (slot, result) = self
            .cond
            .wait_timeout_while(slot, timeout, |s| !s.done)
            .expect("feed inbox lock poisoned");
        if result.timed_out() {
            return Err(WaitError::TimedOut);
        }
        if let Some((code, message)) = &slot.error {
            return Err(WaitError::Provider {
                code: *code,
                message: message.clone(),
            });
        }
        Ok(slot)
    }
}
