//! Application State

use std::sync::Arc;

use checkout_core::{
    BackUrls, Gateway, IntentService, MemoryAttemptStore, MemoryPreferenceStore, PaymentExecutor,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Quote -> gateway-registered preference
    pub intent: IntentService,

    /// Payment submission, reconciliation and status polling
    pub executor: PaymentExecutor,

    /// Redirect destinations registered with every preference
    pub back_urls: BackUrls,

    /// Gateway name, for health reporting
    pub gateway_name: String,
}

impl AppState {
    /// Wire the services around one gateway and fresh in-memory stores
    pub fn new(gateway: Arc<dyn Gateway>, back_urls: BackUrls) -> Self {
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let attempts = Arc::new(MemoryAttemptStore::new());
        let gateway_name = gateway.name().to_string();

        Self {
            intent: IntentService::new(gateway.clone(), preferences.clone()),
            executor: PaymentExecutor::new(gateway, preferences, attempts),
            back_urls,
            gateway_name,
        }
    }
}
