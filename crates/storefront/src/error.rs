//! Checkout fault taxonomy.
//!
//! Every fault is handled at the orchestrator boundary and converted to a
//! user-visible notice; nothing propagates to the host as a panic or an
//! unhandled error. The variants distinguish who the fault belongs to:
//! validation faults are the user's to fix, configuration faults are the
//! operator's, transport faults are retryable, and an unconfirmed
//! verification is deliberately ambiguous.

use thiserror::Error;

use crate::backend::BackendError;

/// Faults that terminate a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart has no lines; nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,

    /// No authenticated identity was supplied.
    #[error("not signed in")]
    NotAuthenticated,

    /// Required deployment configuration is absent. Operator fault, not a
    /// user fault; shown to the user only as a generic unavailability notice.
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    /// Order creation failed without a backend-supplied message (network
    /// error, timeout, unparseable body). Safe to retry - no charge was
    /// attempted.
    #[error("error initiating payment")]
    OrderCreation(#[source] BackendError),

    /// The backend explicitly refused to create the order.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// The payment widget could not be loaded or reached.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The backend examined the gateway receipt and rejected it (e.g.,
    /// signature mismatch). The charge did not complete.
    #[error("payment verification rejected: {0}")]
    VerificationRejected(String),

    /// The verification call itself failed, so whether the charge succeeded
    /// is unknown. The user must check order history before paying again.
    #[error("payment verification could not be confirmed")]
    VerificationUnconfirmed(#[source] BackendError),
}

impl CheckoutError {
    /// User-facing notice text for this fault.
    ///
    /// Backend-supplied messages are surfaced verbatim; operator faults are
    /// kept generic (the detail goes to the logs instead).
    #[must_use]
    pub fn user_notice(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty!".to_owned(),
            Self::NotAuthenticated => "Please log in to proceed with payment.".to_owned(),
            Self::Configuration(_) => {
                "Payment is temporarily unavailable. Please try again later.".to_owned()
            }
            Self::OrderCreation(_) => "Error initiating payment. Please try again.".to_owned(),
            Self::OrderRejected(message) | Self::VerificationRejected(message) => message.clone(),
            Self::GatewayUnavailable(_) => {
                "Failed to load payment gateway. Please try again.".to_owned()
            }
            Self::VerificationUnconfirmed(_) => {
                "We could not confirm your payment. Please check your order history \
                 before paying again."
                    .to_owned()
            }
        }
    }

    /// Whether a fresh attempt from `Idle` is known to be safe.
    ///
    /// False only for an unconfirmed verification, where the charge may have
    /// gone through.
    #[must_use]
    pub const fn safe_to_retry(&self) -> bool {
        !matches!(self, Self::VerificationUnconfirmed(_))
    }
}
