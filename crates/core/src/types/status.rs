//! Payment status enums.

use serde::{Deserialize, Serialize};

/// Resolution state of a payment attempt.
///
/// A payment intent starts `Pending` and resolves to exactly one of the
/// terminal states. There is no path back out of a terminal state; a new
/// attempt starts a new intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Pending,
    Verified,
    Failed,
    Cancelled,
}

impl PaymentState {
    /// Whether this state is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Failed | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentState::Pending.is_terminal());
        assert!(PaymentState::Verified.is_terminal());
        assert!(PaymentState::Failed.is_terminal());
        assert!(PaymentState::Cancelled.is_terminal());
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(PaymentState::default(), PaymentState::Pending);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PaymentState::Verified).unwrap();
        assert_eq!(json, "\"verified\"");
    }
}
