//! Awaitable wrapper around the Razorpay checkout widget.
//!
//! The widget itself lives in the host UI; it historically reported back
//! through a success handler and a dismiss callback. Here the pair is folded
//! into a single awaitable: [`PaymentGateway::collect`] resolves to exactly
//! one [`GatewayOutcome`], so the orchestrator reads as straight-line code.
//!
//! [`ChannelGateway`] is the production implementation. It talks to the host
//! over an mpsc request channel with a oneshot reply per checkout, and it
//! acquires that channel lazily through a [`WidgetLoader`] - the analogue of
//! injecting the checkout script on first use. The loaded handle is cached
//! process-wide; initialization is idempotent because the cell is only ever
//! filled once.

use thiserror::Error;
use tokio::sync::{OnceCell, mpsc, oneshot};

use crave_dine_core::{OrderId, PaymentId};

use crate::models::User;

/// Buyer details prefilled into the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

impl GatewayPrefill {
    /// Prefill from an authenticated user, with guest fallbacks for any
    /// missing profile field.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone().unwrap_or_else(|| "Guest".to_owned()),
            email: user
                .email
                .clone()
                .unwrap_or_else(|| "guest@example.com".to_owned()),
            contact: user
                .contact
                .clone()
                .unwrap_or_else(|| "9999999999".to_owned()),
        }
    }
}

/// Everything the widget needs to collect one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCheckout {
    /// Razorpay public key id.
    pub key_id: String,
    pub order_id: OrderId,
    /// Amount in the currency's minor unit, as returned by order creation.
    pub amount: i64,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
    pub prefill: GatewayPrefill,
}

/// Receipt produced by the widget's success path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub signature: String,
}

/// Resolution of one widget invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The user completed payment; the receipt still needs verification.
    Completed(GatewayReceipt),
    /// The user closed the widget without paying. Normal, not an error.
    Dismissed,
    /// The widget could not be loaded or reached.
    Unavailable(String),
}

/// Errors from loading the widget channel.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("failed to load payment gateway: {0}")]
    Load(String),
}

/// One checkout handed to the host UI, with a slot for the outcome.
#[derive(Debug)]
pub struct WidgetRequest {
    pub checkout: GatewayCheckout,
    pub reply: oneshot::Sender<GatewayOutcome>,
}

/// Channel over which the host UI serves widget requests.
pub type WidgetHandle = mpsc::Sender<WidgetRequest>;

/// Produces the widget channel on first use.
///
/// This is where the host injects its checkout script / mounts its widget.
/// `load` is only invoked once per [`ChannelGateway`]; the result is cached.
pub trait WidgetLoader: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<WidgetHandle, GatewayError>> + Send;
}

/// Loader for a widget channel that already exists.
#[derive(Debug, Clone)]
pub struct ReadyHandle(pub WidgetHandle);

impl WidgetLoader for ReadyHandle {
    async fn load(&self) -> Result<WidgetHandle, GatewayError> {
        Ok(self.0.clone())
    }
}

/// A payment collector the orchestrator can await.
pub trait PaymentGateway: Send + Sync {
    fn collect(&self, checkout: GatewayCheckout) -> impl Future<Output = GatewayOutcome> + Send;
}

/// Production gateway: bridges checkouts to the host UI's widget.
pub struct ChannelGateway<L> {
    loader: L,
    handle: OnceCell<WidgetHandle>,
}

impl<L: WidgetLoader> ChannelGateway<L> {
    #[must_use]
    pub const fn new(loader: L) -> Self {
        Self {
            loader,
            handle: OnceCell::const_new(),
        }
    }

    async fn handle(&self) -> Result<&WidgetHandle, GatewayError> {
        self.handle
            .get_or_try_init(|| self.loader.load())
            .await
    }
}

impl<L: WidgetLoader> PaymentGateway for ChannelGateway<L> {
    async fn collect(&self, checkout: GatewayCheckout) -> GatewayOutcome {
        let handle = match self.handle().await {
            Ok(handle) => handle,
            Err(e) => return GatewayOutcome::Unavailable(e.to_string()),
        };

        let (reply, outcome) = oneshot::channel();
        if handle
            .send(WidgetRequest { checkout, reply })
            .await
            .is_err()
        {
            return GatewayOutcome::Unavailable("payment widget disconnected".to_owned());
        }

        // A dropped reply means the widget went away mid-checkout; treat it
        // as unavailable rather than guessing at a dismissal.
        outcome
            .await
            .unwrap_or_else(|_| GatewayOutcome::Unavailable(
                "payment widget closed without replying".to_owned(),
            ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crave_dine_core::UserId;

    fn checkout() -> GatewayCheckout {
        GatewayCheckout {
            key_id: "rzp_test_k3y".to_owned(),
            order_id: OrderId::new("order_1"),
            amount: 23_900,
            currency: "INR".to_owned(),
            merchant_name: "Crave & Dine".to_owned(),
            description: "Food Order Payment".to_owned(),
            prefill: GatewayPrefill {
                name: "Guest".to_owned(),
                email: "guest@example.com".to_owned(),
                contact: "9999999999".to_owned(),
            },
        }
    }

    #[test]
    fn test_prefill_falls_back_to_guest_details() {
        let user = User {
            id: UserId::new("u1"),
            name: None,
            email: None,
            contact: None,
            address: None,
        };
        let prefill = GatewayPrefill::from_user(&user);
        assert_eq!(prefill.name, "Guest");
        assert_eq!(prefill.email, "guest@example.com");
        assert_eq!(prefill.contact, "9999999999");
    }

    #[tokio::test]
    async fn test_collect_round_trips_through_widget_channel() {
        let (tx, mut rx) = mpsc::channel::<WidgetRequest>(1);
        let gateway = ChannelGateway::new(ReadyHandle(tx));

        let server = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            let order_id = request.checkout.order_id.clone();
            request
                .reply
                .send(GatewayOutcome::Completed(GatewayReceipt {
                    payment_id: PaymentId::new("pay_1"),
                    order_id,
                    signature: "sig".to_owned(),
                }))
                .unwrap();
        });

        let outcome = gateway.collect(checkout()).await;
        server.await.unwrap();

        match outcome {
            GatewayOutcome::Completed(receipt) => {
                assert_eq!(receipt.order_id, OrderId::new("order_1"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dismissal_resolves_to_dismissed() {
        let (tx, mut rx) = mpsc::channel::<WidgetRequest>(1);
        let gateway = ChannelGateway::new(ReadyHandle(tx));

        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.reply.send(GatewayOutcome::Dismissed).unwrap();
        });

        assert_eq!(gateway.collect(checkout()).await, GatewayOutcome::Dismissed);
    }

    #[tokio::test]
    async fn test_load_failure_is_unavailable() {
        struct FailingLoader;
        impl WidgetLoader for FailingLoader {
            async fn load(&self) -> Result<WidgetHandle, GatewayError> {
                Err(GatewayError::Load("script blocked".to_owned()))
            }
        }

        let gateway = ChannelGateway::new(FailingLoader);
        match gateway.collect(checkout()).await {
            GatewayOutcome::Unavailable(reason) => assert!(reason.contains("script blocked")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_loader_runs_once_and_handle_is_cached() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingLoader {
            calls: std::sync::Arc<AtomicUsize>,
            handle: WidgetHandle,
        }
        impl WidgetLoader for CountingLoader {
            async fn load(&self) -> Result<WidgetHandle, GatewayError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.handle.clone())
            }
        }

        let (tx, mut rx) = mpsc::channel::<WidgetRequest>(4);
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let gateway = ChannelGateway::new(CountingLoader {
            calls: calls.clone(),
            handle: tx,
        });

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let _ = request.reply.send(GatewayOutcome::Dismissed);
            }
        });

        let _ = gateway.collect(checkout()).await;
        let _ = gateway.collect(checkout()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_reply_is_unavailable() {
        let (tx, mut rx) = mpsc::channel::<WidgetRequest>(1);
        let gateway = ChannelGateway::new(ReadyHandle(tx));

        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            drop(request.reply);
        });

        match gateway.collect(checkout()).await {
            GatewayOutcome::Unavailable(reason) => {
                assert!(reason.contains("without replying"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
