//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use checkout_core::{
    resolve_status, CheckoutError, DisplayState, PaymentAttempt, PaymentForm, QuoteBuilder,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub gateway: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePreferenceRequest {
    pub description: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Matches the shape the checkout widget expects: the preference id plus
/// the raw gateway response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreferenceResponse {
    pub preference_id: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub preference_id: String,

    #[serde(flatten)]
    pub form: PaymentForm,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub attempt: PaymentAttempt,
    pub display: DisplayState,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,

    /// Set on submission failures so the client can drive reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<String>,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Map the checkout error taxonomy onto HTTP statuses. Every gateway
/// failure that reaches here has already been logged by the services; the
/// caller still always receives the explicit failure signal.
fn error_response(err: &CheckoutError) -> ErrorReply {
    let (status, code, attempt_id) = match err {
        CheckoutError::Validation { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", None)
        }
        CheckoutError::IntentCreation { .. } => {
            (StatusCode::BAD_GATEWAY, "INTENT_CREATION_FAILED", None)
        }
        CheckoutError::PaymentRejected { .. } => {
            (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REJECTED", None)
        }
        CheckoutError::PaymentSubmission { attempt_id, .. } => (
            StatusCode::BAD_GATEWAY,
            "PAYMENT_SUBMISSION_FAILED",
            attempt_id.clone(),
        ),
        CheckoutError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", None)
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.into(),
            attempt_id,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gateway: state.gateway_name,
    })
}

/// Create a gateway preference from the submitted cart item
pub async fn create_preference(
    State(state): State<AppState>,
    Json(payload): Json<CreatePreferenceRequest>,
) -> Result<Json<CreatePreferenceResponse>, ErrorReply> {
    let quote = QuoteBuilder::new()
        .item(payload.description, payload.quantity, payload.price)
        .build()
        .map_err(|e| error_response(&e))?;

    let created = state
        .intent
        .create_preference(quote, state.back_urls.clone())
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(CreatePreferenceResponse {
        preference_id: created.preference.id,
        response: created.gateway_response,
    }))
}

/// Execute a filled payment form against a preference
pub async fn process_payment(
    State(state): State<AppState>,
    Json(payload): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentAttempt>, ErrorReply> {
    let attempt = state
        .executor
        .execute_payment(payload.form, &payload.preference_id)
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(attempt))
}

/// Current state of a payment attempt, refreshed against the gateway when
/// it is still open. The status-display component resolves this
/// independently by payment id.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ErrorReply> {
    let attempt = state
        .executor
        .refresh(&attempt_id)
        .await
        .map_err(|e| error_response(&e))?;

    let display = resolve_status(attempt.status);
    Ok(Json(PaymentStatusResponse { attempt, display }))
}

/// Reconcile an attempt whose submission failed in transit; required before
/// any user-initiated resubmission
pub async fn reconcile_payment(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ErrorReply> {
    let attempt = state
        .executor
        .reconcile(&attempt_id)
        .await
        .map_err(|e| error_response(&e))?;

    let display = resolve_status(attempt.status);
    Ok(Json(PaymentStatusResponse { attempt, display }))
}
