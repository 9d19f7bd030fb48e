//! Gateway Client Configuration

use std::time::Duration;

use checkout_core::{CheckoutError, Result};

const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// MercadoPago client configuration
///
/// Credentials are always injected, never hardcoded. The timeout bounds
/// every gateway call; 10-30s is the sensible range for a synchronous
/// payment submission.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Bearer access token
    pub access_token: String,

    /// API base URL (override for sandboxes or test servers)
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from environment variables:
    /// `MP_ACCESS_TOKEN` (required), `MP_BASE_URL`, `MP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("MP_ACCESS_TOKEN")
            .map_err(|_| CheckoutError::Config("MP_ACCESS_TOKEN not set".into()))?;

        let base_url =
            std::env::var("MP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let timeout_secs = std::env::var("MP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            access_token,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production_api_with_bounded_timeout() {
        let config = GatewayConfig::new("TEST-token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.timeout >= Duration::from_secs(10));
        assert!(config.timeout <= Duration::from_secs(30));
    }
}
