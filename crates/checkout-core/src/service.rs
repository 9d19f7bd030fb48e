//! Orchestration Services
//!
//! The intent service turns a validated quote into a gateway-registered
//! preference; the payment executor submits a filled payment form against a
//! preference and tracks the resulting attempt through reconciliation and
//! read-only status polls.

use std::sync::Arc;

use crate::attempt::{PaymentAttempt, PaymentForm, PaymentStatus};
use crate::error::{CheckoutError, Result};
use crate::gateway::{Gateway, GatewayError, PaymentRequest, PreferenceItem, PreferenceRequest};
use crate::preference::{BackUrls, Preference};
use crate::quote::Quote;
use crate::status::{resolve_status, DisplayState, PollDecision, PollPolicy};
use crate::store::{AttemptStore, PreferenceStore};

/// Result of registering a payment intent
#[derive(Clone, Debug)]
pub struct CreatedPreference {
    pub preference: Preference,
    /// Full gateway response, passed through to the HTTP layer
    pub gateway_response: serde_json::Value,
}

/// Turns quotes into gateway-registered preferences
#[derive(Clone)]
pub struct IntentService {
    gateway: Arc<dyn Gateway>,
    preferences: Arc<dyn PreferenceStore>,
}

impl IntentService {
    pub fn new(gateway: Arc<dyn Gateway>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            gateway,
            preferences,
        }
    }

    /// Register a payment intent with the gateway and persist the quote
    /// snapshot under the returned preference id.
    ///
    /// No funds side effect: on failure the caller may retry manually. No
    /// automatic retry happens here.
    pub async fn create_preference(
        &self,
        quote: Quote,
        back_urls: BackUrls,
    ) -> Result<CreatedPreference> {
        if quote.is_empty() {
            return Err(CheckoutError::Validation {
                field: "quote".into(),
                message: "quote must not be empty".into(),
            });
        }

        let items = quote
            .items()
            .iter()
            .map(|item| PreferenceItem {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let request = PreferenceRequest::new(items, back_urls.clone());

        let registered = self
            .gateway
            .create_preference(request)
            .await
            .map_err(|e| {
                tracing::error!(gateway = self.gateway.name(), error = %e, "preference creation failed");
                CheckoutError::IntentCreation {
                    detail: e.to_string(),
                }
            })?;

        let preference = Preference::new(registered.id.clone(), quote, back_urls);
        self.preferences.insert(&preference)?;

        tracing::info!(
            preference_id = %preference.id,
            amount = %preference.amount(),
            "preference created"
        );

        Ok(CreatedPreference {
            preference,
            gateway_response: registered.raw,
        })
    }
}

/// Submits payment attempts and tracks them through settlement
#[derive(Clone)]
pub struct PaymentExecutor {
    gateway: Arc<dyn Gateway>,
    preferences: Arc<dyn PreferenceStore>,
    attempts: Arc<dyn AttemptStore>,
}

impl PaymentExecutor {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        preferences: Arc<dyn PreferenceStore>,
        attempts: Arc<dyn AttemptStore>,
    ) -> Self {
        Self {
            gateway,
            preferences,
            attempts,
        }
    }

    /// Execute a filled payment form against a preference.
    ///
    /// The charged amount is re-derived from the preference's quote
    /// snapshot. A client-submitted amount that diverges from it fails the
    /// execution outright.
    pub async fn execute_payment(
        &self,
        form: PaymentForm,
        preference_id: &str,
    ) -> Result<PaymentAttempt> {
        let preference = self
            .preferences
            .get(preference_id)?
            .ok_or_else(|| CheckoutError::Validation {
                field: "preference_id".into(),
                message: format!("unknown preference {preference_id}"),
            })?;

        let amount = preference.amount();
        if let Some(submitted) = form.transaction_amount {
            if submitted != amount {
                return Err(CheckoutError::Validation {
                    field: "transaction_amount".into(),
                    message: format!(
                        "submitted amount {submitted} diverges from the preference amount {amount}"
                    ),
                });
            }
        }

        let mut attempt = PaymentAttempt::new(
            preference_id,
            form.payment_method_id.clone(),
            form.payer.clone(),
            amount,
        );

        let request = PaymentRequest {
            transaction_amount: amount,
            description: form
                .description
                .clone()
                .unwrap_or_else(|| preference.quote.summary()),
            payment_method_id: form.payment_method_id,
            token: form.token,
            installments: form.installments,
            payer: form.payer,
            external_reference: attempt.external_reference.clone(),
        };

        match self.gateway.create_payment(request).await {
            Ok(payment) => {
                attempt.gateway_payment_id = Some(payment.id);
                attempt.apply_status(payment.status, payment.status_detail)?;
                self.attempts.upsert(&attempt)?;

                tracing::info!(
                    attempt_id = %attempt.id,
                    status = %attempt.status,
                    amount = %attempt.amount,
                    "payment submitted"
                );
                Ok(attempt)
            }
            Err(GatewayError::Rejected { status, detail }) => {
                attempt.apply_status(PaymentStatus::Rejected, Some(detail.clone()))?;
                self.attempts.upsert(&attempt)?;

                tracing::warn!(
                    attempt_id = %attempt.id,
                    status_code = status,
                    detail = %detail,
                    "gateway rejected payment submission"
                );
                Err(CheckoutError::PaymentRejected { detail })
            }
            Err(e) => {
                // Ambiguous: the gateway may still have processed the
                // payment. The attempt keeps its external reference so
                // `reconcile` can find out before any resubmission.
                attempt.apply_status(PaymentStatus::Error, Some(e.to_string()))?;
                self.attempts.upsert(&attempt)?;

                tracing::error!(
                    attempt_id = %attempt.id,
                    external_reference = %attempt.external_reference,
                    error = %e,
                    "payment submission failed in transit"
                );
                Err(CheckoutError::PaymentSubmission {
                    detail: e.to_string(),
                    attempt_id: Some(attempt.id),
                })
            }
        }
    }

    /// Look up an attempt by its local id
    pub fn attempt(&self, attempt_id: &str) -> Result<Option<PaymentAttempt>> {
        self.attempts.get(attempt_id)
    }

    /// Reconcile an attempt whose submission failed in transit.
    ///
    /// Queries the gateway by external reference. If the gateway did
    /// process the payment the attempt absorbs the confirmed status; if
    /// nothing is found the attempt stays in `error` and resubmission is
    /// safe.
    pub async fn reconcile(&self, attempt_id: &str) -> Result<PaymentAttempt> {
        let mut attempt = self.require_attempt(attempt_id)?;

        match self
            .gateway
            .find_payment_by_reference(&attempt.external_reference)
            .await
        {
            Ok(Some(payment)) => {
                attempt.gateway_payment_id = Some(payment.id);
                attempt.apply_status(payment.status, payment.status_detail)?;
                self.attempts.upsert(&attempt)?;
                tracing::info!(
                    attempt_id = %attempt.id,
                    status = %attempt.status,
                    "reconciled attempt against gateway record"
                );
            }
            Ok(None) => {
                tracing::info!(
                    attempt_id = %attempt.id,
                    "gateway has no record for this reference; resubmission is safe"
                );
            }
            Err(e) => {
                tracing::error!(attempt_id = %attempt.id, error = %e, "reconciliation lookup failed");
                return Err(CheckoutError::PaymentSubmission {
                    detail: e.to_string(),
                    attempt_id: Some(attempt.id),
                });
            }
        }

        Ok(attempt)
    }

    /// Read-only status poll: fetch the gateway's current view and apply it
    /// through the monotonic state machine. Safe to repeat or cancel.
    pub async fn refresh(&self, attempt_id: &str) -> Result<PaymentAttempt> {
        let mut attempt = self.require_attempt(attempt_id)?;

        if attempt.is_settled() {
            return Ok(attempt);
        }

        let Some(gateway_id) = attempt.gateway_payment_id.clone() else {
            // Never acknowledged by the gateway; reconciliation by external
            // reference is the right tool, not a status poll.
            return Ok(attempt);
        };

        let payment = self.gateway.get_payment(&gateway_id).await.map_err(|e| {
            tracing::error!(attempt_id = %attempt.id, error = %e, "status poll failed");
            CheckoutError::PaymentSubmission {
                detail: e.to_string(),
                attempt_id: Some(attempt.id.clone()),
            }
        })?;

        attempt.apply_status(payment.status, payment.status_detail)?;
        self.attempts.upsert(&attempt)?;
        Ok(attempt)
    }

    /// Poll an attempt under the given policy until it settles or the
    /// policy gives up.
    ///
    /// Returns the final attempt and its display state; polling stops at
    /// the first terminal display state and never resumes.
    pub async fn poll_until_settled(
        &self,
        attempt_id: &str,
        policy: PollPolicy,
    ) -> Result<(PaymentAttempt, DisplayState)> {
        let mut polls = 0u32;

        loop {
            let attempt = self.refresh(attempt_id).await?;
            let state = resolve_status(attempt.status);

            match policy.next(state, polls) {
                PollDecision::Stop | PollDecision::CheckBackLater => {
                    return Ok((attempt, state));
                }
                PollDecision::Wait(delay) => {
                    tokio::time::sleep(delay).await;
                    polls += 1;
                }
            }
        }
    }

    fn require_attempt(&self, attempt_id: &str) -> Result<PaymentAttempt> {
        self.attempts
            .get(attempt_id)?
            .ok_or_else(|| CheckoutError::Validation {
                field: "attempt_id".into(),
                message: format!("unknown attempt {attempt_id}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::Payer;
    use crate::gateway::{MockBehavior, MockGateway};
    use crate::quote::QuoteBuilder;
    use crate::store::{MemoryAttemptStore, MemoryPreferenceStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct Harness {
        gateway: Arc<MockGateway>,
        intent: IntentService,
        executor: PaymentExecutor,
    }

    fn harness() -> Harness {
        let gateway = Arc::new(MockGateway::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let attempts = Arc::new(MemoryAttemptStore::new());
        Harness {
            gateway: gateway.clone(),
            intent: IntentService::new(gateway.clone(), preferences.clone()),
            executor: PaymentExecutor::new(gateway, preferences, attempts),
        }
    }

    fn macbook_quote() -> Quote {
        QuoteBuilder::new()
            .item("Macbook air", 1, dec!(1200))
            .build()
            .unwrap()
    }

    fn card_form(amount: Option<Decimal>) -> PaymentForm {
        PaymentForm {
            payment_method_id: "visa".into(),
            token: Some("tok_test".into()),
            installments: Some(1),
            payer: Payer {
                email: "buyer@example.com".into(),
                identification: None,
            },
            description: None,
            transaction_amount: amount,
        }
    }

    #[tokio::test]
    async fn identical_quotes_get_distinct_preferences_with_equal_amounts() {
        let h = harness();

        let a = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();
        let b = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        assert_ne!(a.preference.id, b.preference.id);
        assert_eq!(a.preference.amount(), b.preference.amount());
    }

    #[tokio::test]
    async fn empty_quote_is_rejected_before_the_gateway_is_called() {
        let h = harness();
        // The builder refuses empty quotes, but one can still arrive over
        // the wire through deserialization.
        let empty: Quote = serde_json::from_str(r#"{"items":[]}"#).unwrap();

        let err = h
            .intent
            .create_preference(empty, BackUrls::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation { ref field, .. } if field == "quote"));
    }

    #[tokio::test]
    async fn execute_rejects_diverging_client_amount() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        let err = h
            .executor
            .execute_payment(card_form(Some(dec!(1))), &created.preference.id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation { ref field, .. } if field == "transaction_amount"
        ));
    }

    #[tokio::test]
    async fn matching_client_amount_is_accepted() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        let attempt = h
            .executor
            .execute_payment(card_form(Some(dec!(1200))), &created.preference.id)
            .await
            .unwrap();

        assert_eq!(attempt.status, PaymentStatus::Approved);
        assert_eq!(attempt.amount, dec!(1200));
    }

    #[tokio::test]
    async fn unknown_preference_fails_validation() {
        let h = harness();
        let err = h
            .executor
            .execute_payment(card_form(None), "PREF-404")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation { .. }));
    }

    #[tokio::test]
    async fn gateway_timeout_surfaces_submission_failure_never_approved() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway.script(MockBehavior::Timeout);
        let err = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentSubmission { .. }));
    }

    #[tokio::test]
    async fn reconcile_absorbs_a_payment_the_gateway_did_process() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway
            .script(MockBehavior::TimeoutButProcessed(PaymentStatus::Approved));
        let err = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap_err();

        let CheckoutError::PaymentSubmission {
            attempt_id: Some(attempt_id),
            ..
        } = err
        else {
            panic!("expected a submission failure carrying the attempt id");
        };

        // The attempt was recorded as `error`, never approved on its own.
        let recorded = h.executor.attempt(&attempt_id).unwrap().unwrap();
        assert_eq!(recorded.status, PaymentStatus::Error);
        assert!(recorded.gateway_payment_id.is_none());

        // Reconciliation by external reference absorbs the confirmed status.
        let reconciled = h.executor.reconcile(&attempt_id).await.unwrap();
        assert_eq!(reconciled.status, PaymentStatus::Approved);
        assert!(reconciled.gateway_payment_id.is_some());
    }

    #[tokio::test]
    async fn reconcile_leaves_unprocessed_attempt_retryable() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway.script(MockBehavior::Timeout);
        let err = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap_err();

        let CheckoutError::PaymentSubmission {
            attempt_id: Some(attempt_id),
            ..
        } = err
        else {
            panic!("expected a submission failure carrying the attempt id");
        };

        let reconciled = h.executor.reconcile(&attempt_id).await.unwrap();
        assert_eq!(reconciled.status, PaymentStatus::Error);
        assert!(reconciled.gateway_payment_id.is_none());
    }

    #[tokio::test]
    async fn declined_card_settles_as_rejected_attempt() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway.script(MockBehavior::Decline {
            detail: "cc_rejected_insufficient_amount".into(),
        });

        let attempt = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap();

        assert_eq!(attempt.status, PaymentStatus::Rejected);
        assert_eq!(
            attempt.status_detail.as_deref(),
            Some("cc_rejected_insufficient_amount")
        );
        assert_eq!(resolve_status(attempt.status), DisplayState::Rejected);
    }

    #[tokio::test]
    async fn polling_stops_at_first_terminal_status() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway.script(MockBehavior::Pending);
        let attempt = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap();
        assert_eq!(resolve_status(attempt.status), DisplayState::Pending);

        // Gateway settles the asynchronous method while we poll.
        let gateway_id = attempt.gateway_payment_id.clone().unwrap();
        h.gateway.settle(&gateway_id, PaymentStatus::Approved);

        let policy = PollPolicy::new(Duration::from_millis(1), Duration::from_millis(4), 8);
        let (settled, state) = h
            .executor
            .poll_until_settled(&attempt.id, policy)
            .await
            .unwrap();

        assert_eq!(state, DisplayState::Approved);
        assert!(settled.is_settled());

        // A further poll is a no-op: terminal states never resume.
        let again = h.executor.refresh(&settled.id).await.unwrap();
        assert_eq!(again.status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn exhausted_policy_yields_check_back_later() {
        let h = harness();
        let created = h
            .intent
            .create_preference(macbook_quote(), BackUrls::default())
            .await
            .unwrap();

        h.gateway.script(MockBehavior::InProcess);
        let attempt = h
            .executor
            .execute_payment(card_form(None), &created.preference.id)
            .await
            .unwrap();

        let policy = PollPolicy::new(Duration::from_millis(1), Duration::from_millis(2), 2);
        let (still_open, state) = h
            .executor
            .poll_until_settled(&attempt.id, policy)
            .await
            .unwrap();

        assert_eq!(state, DisplayState::Pending);
        assert!(!still_open.is_settled());
    }
}
