//! Server Configuration

use checkout_core::BackUrls;

/// HTTP server configuration
///
/// Redirect URLs default to the local frontend routes but are always
/// overridable through the environment; nothing deployment-specific is
/// hardcoded in the handlers.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address for the listener
    pub bind_addr: String,

    /// Redirect destinations registered with every preference
    pub back_urls: BackUrls,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            back_urls: BackUrls::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables:
    /// `PORT` or `BIND_ADDR`, and `CHECKOUT_{SUCCESS,FAILURE,PENDING}_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
            std::env::var("PORT")
                .map(|port| format!("0.0.0.0:{port}"))
                .unwrap_or(defaults.bind_addr)
        });

        let back_urls = BackUrls {
            success: std::env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or(defaults.back_urls.success),
            failure: std::env::var("CHECKOUT_FAILURE_URL")
                .unwrap_or(defaults.back_urls.failure),
            pending: std::env::var("CHECKOUT_PENDING_URL")
                .unwrap_or(defaults.back_urls.pending),
        };

        Self {
            bind_addr,
            back_urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_local_frontend() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.back_urls.success, "http://localhost:3000/success");
        assert_eq!(config.back_urls.pending, "http://localhost:3000/pending");
    }
}
