//! Ordering-backend REST client.
//!
//! Covers the payment endpoints the checkout orchestrator drives plus the
//! account surface that shares the same session: address capture and order
//! history. Every call carries the configured timeout; the client keeps a
//! cookie jar for session cookies and optionally attaches a bearer token.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crave_dine_core::{Address, OrderId, PaymentId, UserId};

use crate::cart::CartLine;
use crate::config::StorefrontConfig;
use crate::models::{Order, User};

/// Errors that can occur when talking to the ordering backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (network error, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error: {status}: {}", message.as_deref().unwrap_or("<no message>"))]
    Api {
        status: u16,
        /// The backend's `message` field, when the error body had one.
        message: Option<String>,
    },

    /// Backend answered 2xx but reported `success: false`.
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// The backend's own message for this fault, verbatim, if it sent one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

/// Error body shape used by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

/// Gateway-side order returned by `POST /payment/order`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: OrderId,
    /// Amount in the currency's minor unit (paise), as the gateway bills it.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    success: bool,
    #[serde(default)]
    order: Option<GatewayOrder>,
    #[serde(default)]
    message: Option<String>,
}

/// Body of `POST /payment/verify`. Field names match the gateway receipt
/// contract exactly.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub razorpay_payment_id: PaymentId,
    pub razorpay_order_id: OrderId,
    pub razorpay_signature: String,
    pub items: Vec<CartLine>,
    #[serde(rename = "totalAmount", with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub address: Address,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// Backend verdict on a gateway receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateAddressBody<'a> {
    address: &'a Address,
}

#[derive(Debug, Deserialize)]
struct UpdateAddressResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    #[serde(default)]
    orders: Vec<Order>,
}

// =============================================================================
// PaymentApi seam
// =============================================================================

/// The two payment calls the checkout orchestrator needs.
///
/// Split out as a trait so the orchestrator's state machine is testable
/// without a live backend.
pub trait PaymentApi: Send + Sync {
    /// `POST /payment/order` with the cart total.
    fn create_order(
        &self,
        amount: Decimal,
    ) -> impl Future<Output = Result<GatewayOrder, BackendError>> + Send;

    /// `POST /payment/verify` with the gateway receipt and order contents.
    fn verify_payment(
        &self,
        request: VerifyRequest,
    ) -> impl Future<Output = Result<VerifyResponse, BackendError>> + Send;
}

// =============================================================================
// BackendClient
// =============================================================================

/// REST client for the ordering backend.
///
/// Cheaply cloneable; all clones share one connection pool, cookie jar, and
/// auth token slot.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    config: StorefrontConfig,
    auth_token: RwLock<Option<SecretString>>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                config: config.clone(),
                auth_token: RwLock::new(None),
            }),
        })
    }

    /// Attach a session bearer token; subsequent calls carry it.
    pub fn set_auth_token(&self, token: SecretString) {
        if let Ok(mut slot) = self.inner.auth_token.write() {
            *slot = Some(token);
        }
    }

    /// Drop the session bearer token (logout).
    pub fn clear_auth_token(&self) {
        if let Ok(mut slot) = self.inner.auth_token.write() {
            *slot = None;
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.inner.config.endpoint(path);
        let builder = self.inner.client.request(method, url);
        let token = self
            .inner
            .auth_token
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|t| t.expose_secret().to_owned()));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success response into `BackendError::Api`, extracting the
    /// backend's `message` field when the body parses.
    async fn api_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
            .and_then(|body| body.message);
        BackendError::Api { status, message }
    }

    // =========================================================================
    // Payment endpoints
    // =========================================================================

    /// Create a gateway order for the given amount.
    ///
    /// # Errors
    ///
    /// `Api` on non-2xx, `Rejected` when the backend reports
    /// `success: false`, `Http`/`Parse` on transport or body faults.
    #[instrument(skip(self))]
    pub async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/payment/order")
            .json(&CreateOrderBody { amount })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        if !body.success {
            return Err(BackendError::Rejected(body.message.unwrap_or_else(|| {
                "Failed to create order on backend.".to_owned()
            })));
        }
        body.order
            .ok_or_else(|| BackendError::Parse("order creation response had no order".to_owned()))
    }

    /// Submit a gateway receipt for verification.
    ///
    /// A 2xx response is returned as-is, including `success: false`
    /// verdicts; the caller decides how a rejection is surfaced.
    ///
    /// # Errors
    ///
    /// `Api` on non-2xx, `Http`/`Parse` on transport or body faults.
    #[instrument(skip(self, request), fields(order_id = %request.razorpay_order_id))]
    pub async fn verify_payment(
        &self,
        request: VerifyRequest,
    ) -> Result<VerifyResponse, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/payment/verify")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    // =========================================================================
    // Account endpoints (same session, driven by the address-capture and
    // dashboard collaborators)
    // =========================================================================

    /// Save the user's delivery address.
    ///
    /// The address is validated client-side before calling; the backend
    /// returns the updated user.
    ///
    /// # Errors
    ///
    /// `Api` on non-2xx, `Http`/`Parse` on transport or body faults.
    #[instrument(skip(self, address))]
    pub async fn update_address(&self, address: &Address) -> Result<User, BackendError> {
        let response = self
            .request(reqwest::Method::PUT, "/auth/address")
            .json(&UpdateAddressBody { address })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: UpdateAddressResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(body.user)
    }

    /// Fetch the signed-in user's order history.
    ///
    /// # Errors
    ///
    /// `Api` on non-2xx, `Http`/`Parse` on transport or body faults.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, BackendError> {
        let response = self
            .request(reqwest::Method::GET, "/orders/my")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: OrdersResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(body.orders)
    }

    /// Delete the signed-in user's entire order history.
    ///
    /// Destructive; the host UI confirms with the user before calling.
    ///
    /// # Errors
    ///
    /// `Api` on non-2xx, `Http` on transport faults.
    #[instrument(skip(self))]
    pub async fn clear_orders(&self) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::DELETE, "/orders/my")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }
}

impl PaymentApi for BackendClient {
    async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, BackendError> {
        Self::create_order(self, amount).await
    }

    async fn verify_payment(&self, request: VerifyRequest) -> Result<VerifyResponse, BackendError> {
        Self::verify_payment(self, request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crave_dine_core::ItemId;

    #[test]
    fn test_verify_request_wire_shape() {
        let request = VerifyRequest {
            razorpay_payment_id: PaymentId::new("pay_1"),
            razorpay_order_id: OrderId::new("order_1"),
            razorpay_signature: "sig".to_owned(),
            items: vec![CartLine {
                id: ItemId::new("x1"),
                name: "Naan".to_owned(),
                dish_name: "Naan".to_owned(),
                price: Decimal::new(60, 0),
                quantity: 3,
            }],
            total_amount: Decimal::new(2390, 1),
            address: Address {
                house_name: "Rose Villa".to_owned(),
                street: "12 MG Road".to_owned(),
                city: "Bengaluru".to_owned(),
                state: "Karnataka".to_owned(),
                zip_code: "560001".to_owned(),
                country: "India".to_owned(),
            },
            user_id: UserId::new("64fa01"),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("razorpay_payment_id").is_some());
        assert!(json.get("razorpay_order_id").is_some());
        assert!(json.get("razorpay_signature").is_some());
        assert!(json.get("totalAmount").is_some());
        assert!(json.get("userId").is_some());
        assert_eq!(json["items"][0]["dishName"], "Naan");
        assert_eq!(json["address"]["zipCode"], "560001");
        // Amounts cross the wire as JSON numbers, not strings.
        assert!(json["totalAmount"].is_f64() || json["totalAmount"].is_i64());
    }

    #[test]
    fn test_create_order_response_parses() {
        let json = r#"{
            "success": true,
            "order": { "id": "order_M9zX", "amount": 23900, "currency": "INR" }
        }"#;
        let body: CreateOrderResponse = serde_json::from_str(json).unwrap();
        assert!(body.success);
        let order = body.order.unwrap();
        assert_eq!(order.id, OrderId::new("order_M9zX"));
        assert_eq!(order.amount, 23_900);
        assert_eq!(order.currency, "INR");
    }

    #[test]
    fn test_backend_message_extraction() {
        let with_message = BackendError::Api {
            status: 400,
            message: Some("Amount too small".to_owned()),
        };
        assert_eq!(with_message.backend_message(), Some("Amount too small"));

        let bare = BackendError::Api {
            status: 502,
            message: None,
        };
        assert_eq!(bare.backend_message(), None);

        let rejected = BackendError::Rejected("No such user".to_owned());
        assert_eq!(rejected.backend_message(), Some("No such user"));
    }
}
