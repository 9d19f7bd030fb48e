//! Payment Attempt State Machine
//!
//! One attempt per submission of payer/payment-method details against a
//! preference. Status transitions are monotonic: once a terminal status is
//! reached no later gateway report can move the attempt back to a live one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutError, Result};

/// Gateway-reported payment status
///
/// Wire names match the gateway's lowercase strings (`in_process` etc.).
/// Unknown strings deserialize to `Error` rather than failing the whole
/// payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    InProcess,
    Approved,
    Rejected,
    Cancelled,
    Refunded,
    #[serde(other)]
    Error,
}

impl PaymentStatus {
    /// Terminal statuses admit no further transitions within this scope
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Rejected | Self::Cancelled | Self::Refunded
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payer details collected by the checkout widget
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<serde_json::Value>,
}

/// Payment-method details submitted by the checkout widget
///
/// Any `transaction_amount` present here is cross-checked against the
/// preference's trusted amount, never charged as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentForm {
    /// Gateway method id (e.g. "visa", "pix", "ticket")
    pub payment_method_id: String,

    /// Tokenized instrument for card methods
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub installments: Option<u32>,

    pub payer: Payer,

    #[serde(default)]
    pub description: Option<String>,

    /// Client-side amount, cross-check only
    #[serde(default)]
    pub transaction_amount: Option<Decimal>,
}

/// A single payment submission against a preference
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// Local attempt id
    pub id: String,

    /// Preference this attempt executes
    pub preference_id: String,

    /// Gateway method id
    pub payment_method_id: String,

    pub payer: Payer,

    /// Trusted amount, re-derived from the preference's quote snapshot
    pub amount: Decimal,

    pub status: PaymentStatus,

    /// Gateway decline reason, when supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,

    /// Gateway-assigned payment id, set once the gateway acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,

    /// Idempotency key attached before submission; the reconciliation
    /// lookup key after an ambiguous failure
    pub external_reference: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    /// Create a fresh attempt, not yet submitted
    pub fn new(
        preference_id: impl Into<String>,
        payment_method_id: impl Into<String>,
        payer: Payer,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            preference_id: preference_id.into(),
            payment_method_id: payment_method_id.into(),
            payer,
            amount,
            status: PaymentStatus::Pending,
            status_detail: None,
            gateway_payment_id: None,
            external_reference: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a gateway-reported status through the monotonic state machine.
    ///
    /// Re-observing the current status is a no-op. Any attempt to leave a
    /// terminal status fails with `InvalidTransition`.
    pub fn apply_status(&mut self, status: PaymentStatus, detail: Option<String>) -> Result<()> {
        if status == self.status {
            if detail.is_some() {
                self.status_detail = detail;
            }
            return Ok(());
        }

        if self.status.is_terminal() {
            return Err(CheckoutError::InvalidTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }

        tracing::debug!(
            attempt_id = %self.id,
            from = %self.status,
            to = %status,
            "payment status transition"
        );

        self.status = status;
        self.status_detail = detail;
        self.updated_at = Utc::now();
        Ok(())
    }
}
