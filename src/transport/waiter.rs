//! Ack/value correlation: polling waiters over the latest-message
//! slot.
//!
//! Waiters never touch the serial handle. They poll the slot with an
//! exponential backoff (50 ms, growing by 1.5x, capped at 200 ms) and
//! return control promptly on expiry. Retry policy for unanswered
//! commands belongs to the caller, e.g. a handshake loop that resends
//! and re-waits.

use std::thread;
use std::time::{Duration, Instant};

use crate::protocol::VariableValue;
use crate::registry::Variable;

use super::error::{Result, TransportError};
use super::link::SerialLink;
use super::slot::LatestMessageSlot;

const POLL_INITIAL: Duration = Duration::from_millis(50);
const POLL_MAX: Duration = Duration::from_millis(200);

fn grow(backoff: Duration) -> Duration {
    backoff.mul_f64(1.5).min(POLL_MAX)
}

/// Poll the slot until `var` carries any value, or the timeout
/// expires. A zero timeout expires immediately.
pub fn wait_for_value(
    slot: &LatestMessageSlot,
    var: &Variable,
    timeout: Duration,
) -> Result<VariableValue> {
    if timeout.is_zero() {
        return Err(TransportError::Timeout);
    }
    let deadline = Instant::now() + timeout;
    let mut backoff = POLL_INITIAL;
    loop {
        if let Some(value) = slot.value_of(var) {
            return Ok(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(TransportError::Timeout);
        }
        thread::sleep(backoff.min(deadline - now));
        backoff = grow(backoff);
    }
}

/// Poll the slot until `var` carries a value that both differs from
/// the baseline captured on entry and matches `expected`.
///
/// The baseline filter is what keeps a stale value that was already
/// sitting in the slot before the request went out from counting as an
/// acknowledgement. Floats match within an absolute `1e-6`; `None`
/// timeout waits indefinitely.
pub fn wait_for_ack(
    slot: &LatestMessageSlot,
    var: &Variable,
    expected: &VariableValue,
    timeout: Option<Duration>,
) -> Result<()> {
    let baseline = slot.value_of(var);
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut backoff = POLL_INITIAL;
    loop {
        if let Some(candidate) = slot.value_of(var) {
            let is_new = baseline
                .as_ref()
                .is_none_or(|base| !candidate.approx_eq(base));
            if is_new && candidate.approx_eq(expected) {
                return Ok(());
            }
        }
        let now = Instant::now();
        if let Some(deadline) = deadline {
            if now >= deadline {
                return Err(TransportError::Timeout);
            }
            thread::sleep(backoff.min(deadline - now));
        } else {
            thread::sleep(backoff);
        }
        backoff = grow(backoff);
    }
}

impl SerialLink {
    fn resolve(&self, name: &str) -> Result<Variable> {
        self.registry()
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::UnknownVariable {
                name: name.to_owned(),
            })
    }

    /// [`wait_for_value`] against this link's slot, by variable name.
    pub fn wait_for_value(&self, name: &str, timeout: Duration) -> Result<VariableValue> {
        let var = self.resolve(name)?;
        wait_for_value(&self.slot(), &var, timeout)
    }

    /// [`wait_for_ack`] against this link's slot, by variable name.
    pub fn wait_for_ack(
        &self,
        name: &str,
        expected: &VariableValue,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let var = self.resolve(name)?;
        wait_for_ack(&self.slot(), &var, expected, timeout)
    }
}
