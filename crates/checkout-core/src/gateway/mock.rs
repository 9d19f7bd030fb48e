//! Mock Gateway
//!
//! For tests and demos. Behaviors are scripted per payment submission;
//! created records are kept in memory so status lookups and reconciliation
//! by external reference behave like the real processor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde_json::json;

use super::{
    Gateway, GatewayError, GatewayPayment, GatewayPreference, GatewayResult, PaymentRequest,
    PreferenceRequest,
};
use crate::attempt::PaymentStatus;

/// Scripted outcome for the next payment submission
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Synchronous approval (card-style)
    Approve,
    /// Synchronous decline: a created payment with `rejected` status
    Decline { detail: String },
    /// Validation-level rejection: the gateway refuses the submission
    Reject { detail: String },
    /// Asynchronous method: payment created in `pending`
    Pending,
    /// Asynchronous method: payment created in `in_process`
    InProcess,
    /// Transport timeout; nothing was processed
    Timeout,
    /// Transport timeout returned to the caller, but the gateway did
    /// process the payment (the ambiguous case reconciliation exists for)
    TimeoutButProcessed(PaymentStatus),
}

/// In-memory gateway double
pub struct MockGateway {
    seq: AtomicU64,
    behaviors: Mutex<Vec<MockBehavior>>,
    payments: RwLock<HashMap<String, GatewayPayment>>,
    by_reference: RwLock<HashMap<String, String>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Every submission approves unless scripted otherwise
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            behaviors: Mutex::new(Vec::new()),
            payments: RwLock::new(HashMap::new()),
            by_reference: RwLock::new(HashMap::new()),
        }
    }

    /// Queue a behavior for the next payment submission (FIFO)
    pub fn script(&self, behavior: MockBehavior) {
        self.behaviors.lock().unwrap().push(behavior);
    }

    /// Overwrite the status of a recorded payment, simulating the gateway
    /// settling an asynchronous method out-of-band
    pub fn settle(&self, gateway_id: &str, status: PaymentStatus) {
        if let Some(payment) = self.payments.write().unwrap().get_mut(gateway_id) {
            payment.status = status;
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }

    fn record(&self, request: &PaymentRequest, status: PaymentStatus, detail: Option<String>) -> GatewayPayment {
        let id = self.next_id("MOCK-PAY");
        let payment = GatewayPayment {
            id: id.clone(),
            status,
            status_detail: detail,
            external_reference: Some(request.external_reference.clone()),
            raw: json!({
                "id": id,
                "status": status.as_str(),
                "transaction_amount": request.transaction_amount,
                "external_reference": request.external_reference,
            }),
        };
        self.by_reference
            .write()
            .unwrap()
            .insert(request.external_reference.clone(), id.clone());
        self.payments.write().unwrap().insert(id, payment.clone());
        payment
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn create_preference(&self, request: PreferenceRequest) -> GatewayResult<GatewayPreference> {
        let id = self.next_id("MOCK-PREF");
        Ok(GatewayPreference {
            id: id.clone(),
            init_point: Some(format!("https://gateway.test/checkout/{id}")),
            raw: json!({
                "id": id,
                "items": request.items,
                "auto_return": request.auto_return,
                "back_urls": {
                    "success": request.back_urls.success,
                    "failure": request.back_urls.failure,
                    "pending": request.back_urls.pending,
                },
            }),
        })
    }

    async fn create_payment(&self, request: PaymentRequest) -> GatewayResult<GatewayPayment> {
        let behavior = {
            let mut behaviors = self.behaviors.lock().unwrap();
            if behaviors.is_empty() {
                MockBehavior::Approve
            } else {
                behaviors.remove(0)
            }
        };

        match behavior {
            MockBehavior::Approve => Ok(self.record(&request, PaymentStatus::Approved, Some("accredited".into()))),
            MockBehavior::Decline { detail } => {
                Ok(self.record(&request, PaymentStatus::Rejected, Some(detail)))
            }
            MockBehavior::Reject { detail } => Err(GatewayError::Rejected {
                status: 400,
                detail,
            }),
            MockBehavior::Pending => Ok(self.record(&request, PaymentStatus::Pending, None)),
            MockBehavior::InProcess => Ok(self.record(&request, PaymentStatus::InProcess, None)),
            MockBehavior::Timeout => Err(GatewayError::Timeout),
            MockBehavior::TimeoutButProcessed(status) => {
                self.record(&request, status, None);
                Err(GatewayError::Timeout)
            }
        }
    }

    async fn get_payment(&self, gateway_id: &str) -> GatewayResult<GatewayPayment> {
        self.payments
            .read()
            .unwrap()
            .get(gateway_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                detail: format!("payment {gateway_id} not found"),
            })
    }

    async fn find_payment_by_reference(
        &self,
        external_reference: &str,
    ) -> GatewayResult<Option<GatewayPayment>> {
        let by_ref = self.by_reference.read().unwrap();
        let Some(id) = by_ref.get(external_reference) else {
            return Ok(None);
        };
        Ok(self.payments.read().unwrap().get(id).cloned())
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::Payer;
    use rust_decimal_macros::dec;

    fn request() -> PaymentRequest {
        PaymentRequest {
            transaction_amount: dec!(1200),
            description: "Macbook air".into(),
            payment_method_id: "visa".into(),
            token: Some("tok_test".into()),
            installments: Some(1),
            payer: Payer::default(),
            external_reference: "ref-1".into(),
        }
    }

    #[tokio::test]
    async fn approves_by_default_with_distinct_ids() {
        let gateway = MockGateway::new();
        let a = gateway.create_payment(request()).await.unwrap();
        let b = gateway
            .create_payment(PaymentRequest {
                external_reference: "ref-2".into(),
                ..request()
            })
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn timeout_but_processed_is_findable_by_reference() {
        let gateway = MockGateway::new();
        gateway.script(MockBehavior::TimeoutButProcessed(PaymentStatus::Approved));

        let err = gateway.create_payment(request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout));

        let found = gateway
            .find_payment_by_reference("ref-1")
            .await
            .unwrap()
            .expect("payment was processed despite the timeout");
        assert_eq!(found.status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn plain_timeout_leaves_no_record() {
        let gateway = MockGateway::new();
        gateway.script(MockBehavior::Timeout);

        let _ = gateway.create_payment(request()).await.unwrap_err();
        assert!(gateway
            .find_payment_by_reference("ref-1")
            .await
            .unwrap()
            .is_none());
    }
}
