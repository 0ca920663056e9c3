//! Negotiation waiter (spec §4.7): a single `wait_for(conditions,
//! timeout)` primitive built on `tokio::sync::Notify`, not a poll loop.
//! The connection task calls `Waiter::signal` every time it processes a
//! negotiation event; any in-flight `wait_for` re-checks its predicate
//! at that point instead of sleeping and polling.

use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout as tokio_timeout;

use crate::error::{Result, TelnetError};
use crate::negotiation::Negotiator;
use crate::option::TelnetOption;

/// A single per-option predicate evaluated against the negotiator's
/// current state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Condition {
    RemoteEnabled(TelnetOption),
    LocalEnabled(TelnetOption),
    NotPending(TelnetOption),
}

impl Condition {
    fn holds(&self, negotiator: &Negotiator) -> bool {
        match *self {
            Condition::RemoteEnabled(opt) => negotiator.remote_enabled(opt),
            Condition::LocalEnabled(opt) => negotiator.local_enabled(opt),
            Condition::NotPending(opt) => !negotiator.pending(opt),
        }
    }

    /// Parses a `(kind, option_name)` pair, surfacing an unknown option
    /// name as `TelnetError::NameError` (spec §4.7 "Invalid option names
    /// fail with a NAME_ERROR condition").
    pub fn parse(kind: &str, option_name: &str) -> Result<Self> {
        let option = TelnetOption::by_name(option_name)
            .ok_or_else(|| TelnetError::NameError(option_name.to_string()))?;

        match kind.to_ascii_lowercase().as_str() {
            "remote_enabled" | "him" => Ok(Condition::RemoteEnabled(option)),
            "local_enabled" | "us" => Ok(Condition::LocalEnabled(option)),
            "not_pending" | "settled" => Ok(Condition::NotPending(option)),
            other => Err(TelnetError::NameError(other.to_string())),
        }
    }
}

/// Fires `notify_waiters` every time the connection task observes a
/// negotiation state change; holds no conditions itself, since those
/// live on the stack of whichever call is in `wait_for`.
#[derive(Default)]
pub struct Waiter {
    notify: Notify,
}

impl Waiter {
    pub fn new() -> Self {
        Waiter { notify: Notify::new() }
    }

    /// Called by the connection task after `Negotiator::handle` produces
    /// a state transition.
    pub fn signal(&self) {
        self.notify.notify_waiters();
    }

    /// Waits until every condition holds against the current negotiator
    /// state, or `timeout` elapses.
    pub async fn wait_for(
        &self,
        negotiator: &Negotiator,
        conditions: &[Condition],
        timeout: Duration,
    ) -> Result<()> {
        if conditions.iter().all(|c| c.holds(negotiator)) {
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let notified = self.notify.notified();
            if tokio_timeout(remaining, notified).await.is_err() {
                return Err(TelnetError::Timeout(format!("{conditions:?}")));
            }

            if conditions.iter().all(|c| c.holds(negotiator)) {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(TelnetError::Timeout(format!("{conditions:?}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::OptionPolicy;

    #[test]
    fn unknown_option_name_is_a_name_error() {
        match Condition::parse("remote_enabled", "bogus") {
            Err(TelnetError::NameError(name)) => assert_eq!(name, "bogus"),
            other => panic!("expected NameError, got {other:?}"),
        }
    }

    #[test]
    fn known_option_name_parses_into_condition() {
        assert_eq!(
            Condition::parse("remote_enabled", "naws").unwrap(),
            Condition::RemoteEnabled(TelnetOption::Naws)
        );
    }

    #[tokio::test]
    async fn wait_for_resolves_immediately_when_already_satisfied() {
        let negotiator = Negotiator::new(OptionPolicy::default());
        let waiter = Waiter::new();
        let result =
            waiter.wait_for(&negotiator, &[], Duration::from_millis(50)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wait_for_times_out_when_condition_never_holds() {
        let negotiator = Negotiator::new(OptionPolicy::default());
        let waiter = Waiter::new();
        let conditions = [Condition::RemoteEnabled(TelnetOption::Naws)];
        let result = waiter.wait_for(&negotiator, &conditions, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(TelnetError::Timeout(_))));
    }

    #[tokio::test]
    async fn wait_for_resolves_once_negotiator_state_changes_and_signal_fires() {
        let mut negotiator = Negotiator::new(OptionPolicy::default());
        let waiter = Waiter::new();

        negotiator.handle(&crate::event::TelnetEvent::Do(TelnetOption::Naws));
        assert!(negotiator.local_enabled(TelnetOption::Naws));
        waiter.signal();

        let conditions = [Condition::LocalEnabled(TelnetOption::Naws)];
        let result = waiter.wait_for(&negotiator, &conditions, Duration::from_millis(50)).await;
        assert!(result.is_ok());
    }
}
