//! Preference Model
//!
//! A preference is the gateway-registered payment intent for one checkout
//! session: the quote snapshot plus the redirect destinations the gateway
//! may send the browser to once an asynchronous method resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quote::Quote;

/// Redirect destinations handed to the gateway at preference creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

impl Default for BackUrls {
    fn default() -> Self {
        Self {
            success: "http://localhost:3000/success".into(),
            failure: "http://localhost:3000/failure".into(),
            pending: "http://localhost:3000/pending".into(),
        }
    }
}

/// A gateway-registered payment intent
///
/// Write-once: created by the intent service, never mutated afterwards. The
/// quote snapshot is the single source of truth for the amount a later
/// payment attempt is allowed to charge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Preference {
    /// Gateway-assigned preference id
    pub id: String,

    /// Quote snapshot taken at creation
    pub quote: Quote,

    /// Redirect destinations registered with the gateway
    pub back_urls: BackUrls,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Preference {
    pub fn new(id: impl Into<String>, quote: Quote, back_urls: BackUrls) -> Self {
        Self {
            id: id.into(),
            quote,
            back_urls,
            created_at: Utc::now(),
        }
    }

    /// The trusted amount for any payment attempt against this preference
    pub fn amount(&self) -> rust_decimal::Decimal {
        self.quote.total()
    }
}
