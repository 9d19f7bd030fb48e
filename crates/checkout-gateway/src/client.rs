//! MercadoPago Gateway Client

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;

use checkout_core::gateway::{
    Gateway, GatewayError, GatewayPayment, GatewayPreference, GatewayResult, PaymentRequest,
    PreferenceRequest,
};
use checkout_core::PaymentStatus;

use crate::config::GatewayConfig;

/// MercadoPago REST client
///
/// Holds its own `reqwest::Client` with the configured timeout applied to
/// every request, so a hung gateway call surfaces as
/// [`GatewayError::Timeout`] instead of blocking a checkout forever.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl MercadoPagoClient {
    pub fn new(config: GatewayConfig) -> checkout_core::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| checkout_core::CheckoutError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create from `MP_*` environment variables
    pub fn from_env() -> checkout_core::Result<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn classify(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(err.to_string())
        }
    }

    /// Read the response body, mapping non-success statuses onto the
    /// gateway error taxonomy: 4xx carry the gateway's payload as a
    /// rejection, 5xx are transport-level.
    async fn read_json(response: Response) -> GatewayResult<Value> {
        let status = response.status();
        let body = response.text().await.map_err(Self::classify)?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
        } else if status.is_client_error() {
            Err(GatewayError::Rejected {
                status: status.as_u16(),
                detail: body,
            })
        } else {
            Err(GatewayError::Transport(format!(
                "gateway answered {status}: {body}"
            )))
        }
    }
}

/// Extract a field that may arrive as a JSON number or string (MercadoPago
/// payment ids are numbers, preference ids are strings)
fn field_as_string(value: &Value, field: &str) -> GatewayResult<String> {
    match value.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(GatewayError::Decode(format!(
            "missing or malformed `{field}` in gateway response"
        ))),
    }
}

fn payment_from_value(value: Value) -> GatewayResult<GatewayPayment> {
    let id = field_as_string(&value, "id")?;

    let status: PaymentStatus = value
        .get("status")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| GatewayError::Decode(e.to_string()))?
        .ok_or_else(|| GatewayError::Decode("missing `status` in gateway response".into()))?;

    let status_detail = value
        .get("status_detail")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    let external_reference = value
        .get("external_reference")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    Ok(GatewayPayment {
        id,
        status,
        status_detail,
        external_reference,
        raw: value,
    })
}

#[async_trait]
impl Gateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> GatewayResult<GatewayPreference> {
        tracing::debug!(items = request.items.len(), "creating gateway preference");

        let response = self
            .http
            .post(self.url("/checkout/preferences"))
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await
            .map_err(Self::classify)?;

        let body = Self::read_json(response).await?;
        let id = field_as_string(&body, "id")?;
        let init_point = body
            .get("init_point")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        Ok(GatewayPreference {
            id,
            init_point,
            raw: body,
        })
    }

    async fn create_payment(&self, request: PaymentRequest) -> GatewayResult<GatewayPayment> {
        tracing::debug!(
            method = %request.payment_method_id,
            external_reference = %request.external_reference,
            "submitting payment"
        );

        let response = self
            .http
            .post(self.url("/v1/payments"))
            .bearer_auth(&self.config.access_token)
            .header("X-Idempotency-Key", &request.external_reference)
            .json(&request)
            .send()
            .await
            .map_err(Self::classify)?;

        payment_from_value(Self::read_json(response).await?)
    }

    async fn get_payment(&self, gateway_id: &str) -> GatewayResult<GatewayPayment> {
        let response = self
            .http
            .get(self.url(&format!("/v1/payments/{gateway_id}")))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(Self::classify)?;

        payment_from_value(Self::read_json(response).await?)
    }

    async fn find_payment_by_reference(
        &self,
        external_reference: &str,
    ) -> GatewayResult<Option<GatewayPayment>> {
        let response = self
            .http
            .get(self.url("/v1/payments/search"))
            .bearer_auth(&self.config.access_token)
            .query(&[("external_reference", external_reference)])
            .send()
            .await
            .map_err(Self::classify)?;

        // A search for an unknown reference is an empty result set, not an
        // error; 404 here means the endpoint itself is unavailable.
        let body = match Self::read_json(response).await {
            Ok(body) => body,
            Err(GatewayError::Rejected { status, detail })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Err(GatewayError::Transport(detail));
            }
            Err(e) => return Err(e),
        };

        let Some(first) = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
        else {
            return Ok(None);
        };

        payment_from_value(first.clone()).map(Some)
    }

    fn name(&self) -> &str {
        "MercadoPago"
    }
}
