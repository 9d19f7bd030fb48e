//! Gateway Integration
//!
//! Abstraction over the external payment processor. The processor itself is
//! never reimplemented here; this module defines the capability surface the
//! orchestration needs (Strategy pattern), the wire-facing request/response
//! types, and a mock double for tests and demos.

mod mock;

pub use mock::{MockBehavior, MockGateway};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attempt::{Payer, PaymentStatus};
use crate::preference::BackUrls;

/// Gateway-level failure, classified so the services can map it onto the
/// checkout error taxonomy
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The gateway actively rejected the request (4xx with a payload)
    #[error("gateway rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The request timed out; the gateway may or may not have processed it
    #[error("gateway request timed out")]
    Timeout,

    /// Connection-level failure or gateway 5xx
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with a payload we could not interpret
    #[error("gateway response could not be decoded: {0}")]
    Decode(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Redirect policy after an asynchronous method resolves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoReturn {
    /// Redirect the browser immediately on approval
    Approved,
    All,
}

/// One line item as the gateway expects it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Request to register a payment intent with the gateway
#[derive(Clone, Debug, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub back_urls: BackUrls,
    pub auto_return: AutoReturn,
    /// Purchase purpose flag carried on the wire
    pub purpose: String,
}

impl PreferenceRequest {
    pub fn new(items: Vec<PreferenceItem>, back_urls: BackUrls) -> Self {
        Self {
            items,
            back_urls,
            auto_return: AutoReturn::Approved,
            purpose: "wallet_purchase".into(),
        }
    }
}

/// Gateway acknowledgement of a created preference
#[derive(Clone, Debug)]
pub struct GatewayPreference {
    pub id: String,
    /// Hosted checkout URL, when the gateway provides one
    pub init_point: Option<String>,
    /// Full gateway response, passed through to the HTTP layer
    pub raw: serde_json::Value,
}

/// Request to execute a payment against the gateway
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRequest {
    pub transaction_amount: Decimal,
    pub description: String,
    pub payment_method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    pub payer: Payer,
    /// Idempotency key; the reconciliation lookup key after an ambiguous
    /// failure
    pub external_reference: String,
}

/// Gateway-side view of a payment
#[derive(Clone, Debug)]
pub struct GatewayPayment {
    pub id: String,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub raw: serde_json::Value,
}

/// Payment gateway capability surface (Strategy pattern)
///
/// Implement this per processor. `create_preference` has no funds side
/// effect; `create_payment` does, so its failures must be reconciled through
/// `find_payment_by_reference` before any resubmission.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Register a payment intent; returns the gateway's preference record
    async fn create_preference(&self, request: PreferenceRequest) -> GatewayResult<GatewayPreference>;

    /// Submit a payment for execution; the gateway replies synchronously
    /// with an initial status
    async fn create_payment(&self, request: PaymentRequest) -> GatewayResult<GatewayPayment>;

    /// Read-only status lookup by gateway payment id
    async fn get_payment(&self, gateway_id: &str) -> GatewayResult<GatewayPayment>;

    /// Read-only lookup by our external reference, for reconciling an
    /// ambiguous submission failure
    async fn find_payment_by_reference(
        &self,
        external_reference: &str,
    ) -> GatewayResult<Option<GatewayPayment>>;

    /// Gateway name, for logs and health reporting
    fn name(&self) -> &str;
}
