//! Status Reconciler
//!
//! Maps gateway-reported statuses to user-facing display states and decides
//! whether a caller should poll again.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::attempt::PaymentStatus;

/// User-facing display state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    /// Terminal: render the success screen
    Approved,
    /// Non-terminal: render a waiting indicator, never an error
    Pending,
    /// Terminal: render the decline reason when available
    Rejected,
    /// System-level failure, distinct from a gateway decline; permits a
    /// manual retry/reload
    Error,
}

impl DisplayState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Pure mapping from gateway status to display state.
///
/// `refunded` renders as approved: the attempt itself succeeded and refund
/// flows are handled out-of-band, outside this scope. `cancelled` renders
/// as rejected since the checkout will not complete.
pub fn resolve_status(status: PaymentStatus) -> DisplayState {
    match status {
        PaymentStatus::Approved | PaymentStatus::Refunded => DisplayState::Approved,
        PaymentStatus::Pending | PaymentStatus::InProcess => DisplayState::Pending,
        PaymentStatus::Rejected | PaymentStatus::Cancelled => DisplayState::Rejected,
        PaymentStatus::Error => DisplayState::Error,
    }
}

/// What the caller should do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollDecision {
    /// Poll again after this delay
    Wait(Duration),
    /// Terminal display state reached (or manual-retry error); stop polling
    Stop,
    /// Backoff cap exhausted while still pending; present a "check back
    /// later" state instead of polling forever
    CheckBackLater,
}

/// Capped exponential backoff for status polling
///
/// Pending statuses back off 2s, 4s, 8s, ... up to a ceiling and a maximum
/// poll count. Polling is read-only, so stopping or repeating a poll never
/// corrupts state.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    initial: Duration,
    ceiling: Duration,
    max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            ceiling: Duration::from_secs(32),
            max_polls: 8,
        }
    }
}

impl PollPolicy {
    pub fn new(initial: Duration, ceiling: Duration, max_polls: u32) -> Self {
        Self {
            initial,
            ceiling,
            max_polls,
        }
    }

    /// Decide the next step given the current display state and the number
    /// of polls already performed
    pub fn next(&self, state: DisplayState, polls_so_far: u32) -> PollDecision {
        match state {
            DisplayState::Approved | DisplayState::Rejected | DisplayState::Error => {
                PollDecision::Stop
            }
            DisplayState::Pending => {
                if polls_so_far >= self.max_polls {
                    return PollDecision::CheckBackLater;
                }
                let factor = 2u32.saturating_pow(polls_so_far);
                let delay = self
                    .initial
                    .saturating_mul(factor)
                    .min(self.ceiling);
                PollDecision::Wait(delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_total_and_pure() {
        use PaymentStatus as S;
        let all = [
            S::Pending,
            S::InProcess,
            S::Approved,
            S::Rejected,
            S::Cancelled,
            S::Refunded,
            S::Error,
        ];
        for status in all {
            // Same input, same output, every time.
            assert_eq!(resolve_status(status), resolve_status(status));
        }
        assert_eq!(resolve_status(S::Approved), DisplayState::Approved);
        assert_eq!(resolve_status(S::Refunded), DisplayState::Approved);
        assert_eq!(resolve_status(S::InProcess), DisplayState::Pending);
        assert_eq!(resolve_status(S::Cancelled), DisplayState::Rejected);
        assert_eq!(resolve_status(S::Error), DisplayState::Error);
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let policy = PollPolicy::default();

        assert_eq!(
            policy.next(DisplayState::Pending, 0),
            PollDecision::Wait(Duration::from_secs(2))
        );
        assert_eq!(
            policy.next(DisplayState::Pending, 1),
            PollDecision::Wait(Duration::from_secs(4))
        );
        assert_eq!(
            policy.next(DisplayState::Pending, 2),
            PollDecision::Wait(Duration::from_secs(8))
        );
        // Capped at the ceiling
        assert_eq!(
            policy.next(DisplayState::Pending, 6),
            PollDecision::Wait(Duration::from_secs(32))
        );
    }

    #[test]
    fn cap_exhaustion_yields_check_back_later() {
        let policy = PollPolicy::default();
        assert_eq!(
            policy.next(DisplayState::Pending, 8),
            PollDecision::CheckBackLater
        );
    }

    #[test]
    fn terminal_states_stop_polling() {
        let policy = PollPolicy::default();
        assert_eq!(policy.next(DisplayState::Approved, 0), PollDecision::Stop);
        assert_eq!(policy.next(DisplayState::Rejected, 3), PollDecision::Stop);
        // Error permits manual retry, no automatic polling
        assert_eq!(policy.next(DisplayState::Error, 0), PollDecision::Stop);
    }
}
