//! Fixed-delay reconnect policy with a bounded number of consecutive dial failures.

use std::time::Duration;

/// What the supervisor should do after a failed dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Sleep for the given delay, then dial again.
    Retry(Duration),
    /// The failure bound is reached; the session is over.
    GiveUp,
}

/// Stateless reconnect policy. The supervisor owns the failure counter and
/// resets it to zero after every successful dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Pause before every re-dial, after a dial failure or a dropped connection.
    pub delay: Duration,
    /// Consecutive dial failures tolerated before giving up. `None` retries forever.
    pub max_dial_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_dial_attempts: Some(5),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_dial_attempts: Option<u32>) -> Self {
        Self { delay, max_dial_attempts }
    }

    /// Decide after `consecutive_failures` failed dials in a row (1-based).
    pub fn on_dial_failure(&self, consecutive_failures: u32) -> ReconnectDecision {
        match self.max_dial_attempts {
            Some(max) if consecutive_failures >= max => ReconnectDecision::GiveUp,
            _ => ReconnectDecision::Retry(self.delay),
        }
    }

    /// Delay before re-dialing after an established connection was lost.
    /// Losing an established connection never counts against the bound.
    pub fn on_disconnect(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gives_up_at_the_bound() {
        let policy = ReconnectPolicy::default();
        for failures in 1..5 {
            assert_eq!(
                policy.on_dial_failure(failures),
                ReconnectDecision::Retry(Duration::from_secs(1)),
                "failures={failures}"
            );
        }
        assert_eq!(policy.on_dial_failure(5), ReconnectDecision::GiveUp);
        assert_eq!(policy.on_dial_failure(6), ReconnectDecision::GiveUp);
    }

    #[test]
    fn unbounded_never_gives_up() {
        let policy = ReconnectPolicy::new(Duration::from_millis(10), None);
        assert_eq!(
            policy.on_dial_failure(10_000),
            ReconnectDecision::Retry(Duration::from_millis(10))
        );
    }

    #[test]
    fn disconnect_uses_the_same_fixed_delay() {
        let policy = ReconnectPolicy::new(Duration::from_millis(250), Some(1));
        assert_eq!(policy.on_disconnect(), Duration::from_millis(250));
    }
}
