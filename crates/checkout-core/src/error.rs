//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error taxonomy
///
/// Gateway failures are logged with detail by the services AND surfaced
/// through one of these variants. A logged-but-unreported payment failure is
/// a correctness defect, not an option.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Malformed quote, item or payment form (field-level detail)
    #[error("Validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Gateway rejected preference creation (no funds side effect; caller
    /// may retry manually)
    #[error("Preference creation failed: {detail}")]
    IntentCreation { detail: String },

    /// Payment submission failed in transit (timeout/network). The gateway
    /// may still have processed it; reconcile the carried attempt by its
    /// external reference before resubmitting.
    #[error("Payment submission failed: {detail}")]
    PaymentSubmission {
        detail: String,
        /// Attempt recorded for reconciliation, when one exists
        attempt_id: Option<String>,
    },

    /// Gateway declined the submission at validation level (e.g. malformed
    /// instrument)
    #[error("Payment rejected by gateway: {detail}")]
    PaymentRejected { detail: String },

    /// Attempted transition out of a terminal payment status
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Storage error (write-once violation, missing record backend fault)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal fault
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Whether the caller may retry without reconciliation.
    ///
    /// `PaymentSubmission` is deliberately NOT retryable here: the gateway
    /// may have processed the charge, so a status lookup by external
    /// reference must happen first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IntentCreation { .. })
    }

    /// User-facing message, safe to render in a checkout UI
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("Invalid {field}: {message}"),
            Self::IntentCreation { .. } => {
                "We could not start your checkout. Please try again.".into()
            }
            Self::PaymentSubmission { .. } => {
                "We could not confirm your payment. Please wait while we check its status.".into()
            }
            Self::PaymentRejected { detail } => format!("Payment was declined: {detail}"),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_failure_is_not_blindly_retryable() {
        let err = CheckoutError::PaymentSubmission {
            detail: "timeout".into(),
            attempt_id: None,
        };
        assert!(!err.is_retryable());

        let err = CheckoutError::IntentCreation {
            detail: "gateway 500".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn user_messages_do_not_leak_internals() {
        let err = CheckoutError::Internal("lock poisoned".into());
        assert!(!err.user_message().contains("lock"));
    }
}
