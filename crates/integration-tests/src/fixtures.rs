//! Shared fakes and builders for the test suites.
//!
//! The backend and the payment widget are the two collaborators checkout
//! talks to; both get scriptable stand-ins here so the suites can walk the
//! orchestrator through every terminal state.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crave_dine_core::{Address, ItemId, OrderId, PaymentId, UserId};
use crave_dine_storefront::backend::{
    BackendError, GatewayOrder, PaymentApi, VerifyRequest, VerifyResponse,
};
use crave_dine_storefront::cart::storage::MemoryStore;
use crave_dine_storefront::cart::{CartStore, MenuItem};
use crave_dine_storefront::config::StorefrontConfig;
use crave_dine_storefront::models::User;
use crave_dine_storefront::notify::MemoryNotifier;
use crave_dine_storefront::payment::gateway::{
    GatewayCheckout, GatewayOutcome, GatewayReceipt, PaymentGateway,
};

// =============================================================================
// Builders
// =============================================================================

/// A config pointing at nothing; the fakes never dial out.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        api_base_url: "http://localhost:4000/api/v1"
            .parse()
            .expect("static test URL"),
        razorpay_key_id: "rzp_test_k3y".to_owned(),
        cart_dir: std::env::temp_dir(),
        http_timeout: std::time::Duration::from_secs(5),
        currency: crave_dine_core::CurrencyCode::INR,
    }
}

/// A config with the gateway key missing, for configuration-fault tests.
#[must_use]
pub fn unconfigured_config() -> StorefrontConfig {
    let mut config = test_config();
    config.razorpay_key_id = String::new();
    config
}

#[must_use]
pub fn naan() -> MenuItem {
    MenuItem {
        id: ItemId::new("x1"),
        name: "Naan".to_owned(),
        price: Decimal::new(60, 0),
    }
}

#[must_use]
pub fn paneer_tikka() -> MenuItem {
    MenuItem {
        id: ItemId::new("x2"),
        name: "Paneer Tikka".to_owned(),
        price: Decimal::new(240, 0),
    }
}

#[must_use]
pub fn delivery_address() -> Address {
    Address {
        house_name: "Rose Villa".to_owned(),
        street: "12 MG Road".to_owned(),
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        zip_code: "560001".to_owned(),
        country: "India".to_owned(),
    }
}

#[must_use]
pub fn user_with_address() -> User {
    User {
        id: UserId::new("64fa01"),
        name: Some("asha".to_owned()),
        email: Some("asha@example.com".to_owned()),
        contact: None,
        address: Some(delivery_address()),
    }
}

#[must_use]
pub fn user_without_address() -> User {
    User {
        address: None,
        ..user_with_address()
    }
}

/// An in-memory cart plus the notifier recording its notices.
#[must_use]
pub fn open_cart() -> (CartStore, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let cart = CartStore::open(Box::new(MemoryStore::new()), notifier.clone());
    (cart, notifier)
}

// =============================================================================
// Backend fake
// =============================================================================

/// Scripted behavior for `POST /payment/order`.
#[derive(Debug, Clone, Copy)]
pub enum OrderStep {
    Succeed,
    /// Non-2xx with no parseable message (network-ish fault).
    Transport,
    /// Backend refuses with an explicit message.
    Reject(&'static str),
}

/// Scripted behavior for `POST /payment/verify`.
#[derive(Debug, Clone, Copy)]
pub enum VerifyStep {
    Succeed,
    /// 2xx with `success: false` and an optional message.
    Reject(Option<&'static str>),
    /// The call itself fails; charge state unknown.
    Transport,
}

/// Scripted [`PaymentApi`] recording every call.
pub struct FakeApi {
    order_step: Mutex<OrderStep>,
    verify_step: Mutex<VerifyStep>,
    order_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    pub last_verify: Mutex<Option<VerifyRequest>>,
}

impl FakeApi {
    #[must_use]
    pub fn new(order_step: OrderStep, verify_step: VerifyStep) -> Self {
        Self {
            order_step: Mutex::new(order_step),
            verify_step: Mutex::new(verify_step),
            order_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            last_verify: Mutex::new(None),
        }
    }

    /// Reprogram the next order-creation responses.
    pub fn set_order_step(&self, step: OrderStep) {
        if let Ok(mut current) = self.order_step.lock() {
            *current = step;
        }
    }

    /// Reprogram the next verification responses.
    pub fn set_verify_step(&self, step: VerifyStep) {
        if let Ok(mut current) = self.verify_step.lock() {
            *current = step;
        }
    }

    #[must_use]
    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl PaymentApi for &FakeApi {
    async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, BackendError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.order_step.lock().map(|s| *s).expect("step lock");
        match step {
            OrderStep::Succeed => Ok(GatewayOrder {
                id: OrderId::new("order_test_1"),
                amount: (amount * Decimal::from(100)).to_i64().unwrap_or(0),
                currency: "INR".to_owned(),
            }),
            OrderStep::Transport => Err(BackendError::Api {
                status: 502,
                message: None,
            }),
            OrderStep::Reject(message) => Err(BackendError::Rejected(message.to_owned())),
        }
    }

    async fn verify_payment(&self, request: VerifyRequest) -> Result<VerifyResponse, BackendError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_verify.lock() {
            *last = Some(request);
        }
        let step = self.verify_step.lock().map(|s| *s).expect("step lock");
        match step {
            VerifyStep::Succeed => Ok(VerifyResponse {
                success: true,
                message: None,
            }),
            VerifyStep::Reject(message) => Ok(VerifyResponse {
                success: false,
                message: message.map(str::to_owned),
            }),
            VerifyStep::Transport => Err(BackendError::Api {
                status: 504,
                message: None,
            }),
        }
    }
}

// =============================================================================
// Gateway fake
// =============================================================================

/// Scripted behavior for the payment widget.
#[derive(Debug, Clone, Copy)]
pub enum WidgetScript {
    Complete,
    Dismiss,
    FailLoad(&'static str),
    /// Never resolve; models a widget the user walked away from.
    Hang,
}

/// Scripted [`PaymentGateway`] recording every invocation.
pub struct FakeGateway {
    script: Mutex<WidgetScript>,
    pub invocations: AtomicUsize,
    pub last_checkout: Mutex<Option<GatewayCheckout>>,
}

impl FakeGateway {
    #[must_use]
    pub fn new(script: WidgetScript) -> Self {
        Self {
            script: Mutex::new(script),
            invocations: AtomicUsize::new(0),
            last_checkout: Mutex::new(None),
        }
    }

    /// Reprogram the next widget invocations.
    pub fn set_script(&self, script: WidgetScript) {
        if let Ok(mut current) = self.script.lock() {
            *current = script;
        }
    }

    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for &FakeGateway {
    async fn collect(&self, checkout: GatewayCheckout) -> GatewayOutcome {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let order_id = checkout.order_id.clone();
        if let Ok(mut last) = self.last_checkout.lock() {
            *last = Some(checkout);
        }
        let script = self.script.lock().map(|s| *s).expect("script lock");
        match script {
            WidgetScript::Complete => GatewayOutcome::Completed(GatewayReceipt {
                payment_id: PaymentId::new("pay_test_1"),
                order_id,
                signature: "sig_test".to_owned(),
            }),
            WidgetScript::Dismiss => GatewayOutcome::Dismissed,
            WidgetScript::FailLoad(reason) => GatewayOutcome::Unavailable(reason.to_owned()),
            WidgetScript::Hang => std::future::pending::<GatewayOutcome>().await,
        }
    }
}
