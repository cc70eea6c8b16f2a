//! Checkout orchestration.
//!
//! Drives one payment attempt to completion or clearly-communicated failure
//! without ever taking ownership of cart state: the orchestrator reads a
//! [`CartSnapshot`](crate::cart::CartSnapshot), runs the three-step protocol
//! (create order, collect payment, verify), and asks the cart to clear only
//! after the backend confirms the charge.
//!
//! ```text
//! Idle -> OrderCreated -> PaymentCollected -> Verified
//!   \          \                 \
//!    \          +--> Cancelled    +--> Failed
//!     +-------------> Failed
//! ```
//!
//! No step is retried automatically; every terminal state requires a fresh
//! user-initiated pay action, which restarts from `Idle`. An attempt the
//! host abandons by dropping the `pay` future restarts the same way, so the
//! orchestrator can never wedge.

pub mod gateway;

use std::sync::Arc;

use tracing::instrument;

use crave_dine_core::{CurrencyCode, OrderId, PaymentState, Price};

use crate::backend::{PaymentApi, VerifyRequest};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::error::CheckoutError;
use crate::models::User;
use crate::notify::Notifier;
use gateway::{GatewayCheckout, GatewayOutcome, GatewayPrefill, PaymentGateway};

const MERCHANT_NAME: &str = "Crave & Dine";
const ORDER_DESCRIPTION: &str = "Food Order Payment";

/// Where the protocol currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    OrderCreated,
    PaymentCollected,
    Verified,
    Failed,
    Cancelled,
}

impl CheckoutPhase {
    /// Whether the host should allow the pay action from this phase.
    ///
    /// `Verified` is excluded: the host navigates to the confirmation view
    /// first, and a later pay action restarts the protocol from `Idle`.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Failed | Self::Cancelled)
    }

    /// Whether the phase ends an attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Failed | Self::Cancelled)
    }
}

/// Transient record of one payment attempt. Exists only for the duration of
/// the attempt; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub order_id: OrderId,
    pub amount: Price,
    pub state: PaymentState,
}

/// How one pay action resolved. Returned exactly once per attempt.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Payment verified and cart cleared; navigate to the order
    /// confirmation view.
    Completed { order_id: OrderId },
    /// The user dismissed the widget; cart untouched.
    Cancelled,
    /// No usable delivery address; open the address-capture step.
    AddressRequired,
    /// The attempt terminated on a fault; cart untouched.
    Failed(CheckoutError),
}

/// Sequences the create -> collect -> verify payment protocol.
pub struct CheckoutOrchestrator<A, G> {
    api: A,
    gateway: G,
    notifier: Arc<dyn Notifier>,
    key_id: String,
    currency: CurrencyCode,
    phase: CheckoutPhase,
    intent: Option<PaymentIntent>,
}

impl<A: PaymentApi, G: PaymentGateway> CheckoutOrchestrator<A, G> {
    #[must_use]
    pub fn new(config: &StorefrontConfig, api: A, gateway: G, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            gateway,
            notifier,
            key_id: config.razorpay_key_id.clone(),
            currency: config.currency,
            phase: CheckoutPhase::Idle,
            intent: None,
        }
    }

    /// Current protocol phase. The host should disable its pay action
    /// whenever this is not a startable phase.
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// The in-flight or last-resolved payment intent, if any.
    #[must_use]
    pub const fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    /// Run one payment attempt for the cart's current contents.
    ///
    /// Preconditions are checked in order before any network call: non-empty
    /// cart, authenticated user, usable delivery address, gateway key
    /// present. Each failure aborts with a specific notice and leaves the
    /// cart untouched.
    #[instrument(skip_all, fields(attempt = %uuid::Uuid::new_v4()))]
    pub async fn pay(&mut self, cart: &mut CartStore, user: Option<&User>) -> CheckoutOutcome {
        // A fresh pay action always restarts the protocol from Idle.
        // `pay` holds `&mut self`, so a non-Idle phase here can only be a
        // resolved attempt or one the host abandoned by dropping the future
        // mid-flight; attempts are never resumed or retried.
        if self.phase != CheckoutPhase::Idle {
            self.phase = CheckoutPhase::Idle;
            self.intent = None;
        }

        if cart.item_count() == 0 {
            return self.reject(CheckoutError::EmptyCart);
        }
        let Some(user) = user else {
            return self.reject(CheckoutError::NotAuthenticated);
        };
        let Some(address) = user.address.as_ref().filter(|a| a.has_street()) else {
            self.notifier
                .info("Please add a delivery address to continue.");
            return CheckoutOutcome::AddressRequired;
        };
        if self.key_id.trim().is_empty() {
            tracing::error!("razorpay key id is not configured");
            return self.reject(CheckoutError::Configuration("RAZORPAY_KEY_ID"));
        }

        let snapshot = cart.snapshot();

        // Step 1: create the gateway order on the backend.
        let order = match self.api.create_order(snapshot.total).await {
            Ok(order) => order,
            Err(error) => {
                let error = match error.backend_message() {
                    Some(message) => CheckoutError::OrderRejected(message.to_owned()),
                    None => CheckoutError::OrderCreation(error),
                };
                return self.fail(error);
            }
        };
        self.phase = CheckoutPhase::OrderCreated;
        let currency = order.currency.parse().unwrap_or(self.currency);
        self.intent = Some(PaymentIntent {
            order_id: order.id.clone(),
            amount: Price::from_minor_units(order.amount, currency),
            state: PaymentState::Pending,
        });
        tracing::debug!(order_id = %order.id, amount = order.amount, "gateway order created");

        // Step 2: hand the order to the payment widget and await the user.
        let checkout = GatewayCheckout {
            key_id: self.key_id.clone(),
            order_id: order.id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            merchant_name: MERCHANT_NAME.to_owned(),
            description: ORDER_DESCRIPTION.to_owned(),
            prefill: GatewayPrefill::from_user(user),
        };
        let receipt = match self.gateway.collect(checkout).await {
            GatewayOutcome::Completed(receipt) => receipt,
            GatewayOutcome::Dismissed => {
                self.phase = CheckoutPhase::Cancelled;
                self.resolve_intent(PaymentState::Cancelled);
                self.notifier.info("Payment cancelled.");
                return CheckoutOutcome::Cancelled;
            }
            GatewayOutcome::Unavailable(reason) => {
                return self.fail(CheckoutError::GatewayUnavailable(reason));
            }
        };
        self.phase = CheckoutPhase::PaymentCollected;

        // Step 3: have the backend verify the receipt before trusting it.
        let request = VerifyRequest {
            razorpay_payment_id: receipt.payment_id,
            razorpay_order_id: receipt.order_id,
            razorpay_signature: receipt.signature,
            items: snapshot.lines.clone(),
            total_amount: snapshot.total,
            address: address.clone(),
            user_id: user.id.clone(),
        };
        match self.api.verify_payment(request).await {
            Ok(verdict) if verdict.success => {
                self.phase = CheckoutPhase::Verified;
                self.resolve_intent(PaymentState::Verified);
                self.notifier.success("Payment successful! Order placed.");
                cart.clear();
                CheckoutOutcome::Completed { order_id: order.id }
            }
            Ok(verdict) => self.fail(CheckoutError::VerificationRejected(
                verdict
                    .message
                    .unwrap_or_else(|| "Payment verification failed.".to_owned()),
            )),
            Err(error) => self.fail(CheckoutError::VerificationUnconfirmed(error)),
        }
    }

    /// Abort before the protocol started: notify, leave the phase alone.
    fn reject(&self, error: CheckoutError) -> CheckoutOutcome {
        tracing::warn!(error = %error, "checkout precondition failed");
        self.notifier.error(&error.user_notice());
        CheckoutOutcome::Failed(error)
    }

    /// Terminate a started attempt: resolve the intent, enter `Failed`,
    /// notify.
    fn fail(&mut self, error: CheckoutError) -> CheckoutOutcome {
        self.phase = CheckoutPhase::Failed;
        self.resolve_intent(PaymentState::Failed);
        match &error {
            CheckoutError::VerificationUnconfirmed(source) => {
                tracing::error!(error = %error, source = %source, "checkout failed");
            }
            _ => tracing::warn!(error = %error, "checkout failed"),
        }
        self.notifier.error(&error.user_notice());
        CheckoutOutcome::Failed(error)
    }

    fn resolve_intent(&mut self, state: PaymentState) {
        if let Some(intent) = &mut self.intent {
            intent.state = state;
        }
    }
}
