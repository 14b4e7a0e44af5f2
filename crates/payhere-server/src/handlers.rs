//! HTTP Handlers

use std::collections::{BTreeMap, HashMap};

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::Html,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payhere_sdk::{
    CheckoutRedirect, Customer, ErrorKind, PaymentError, PaymentFields, PaymentStatus,
    PayhereClient,
};

use crate::render;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub payhere_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub item_count: Option<i64>,
    pub customer: Customer,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
    #[serde(default)]
    pub notify_url: Option<String>,
    #[serde(default)]
    pub custom_1: Option<String>,
    #[serde(default)]
    pub custom_2: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub method: String,
    pub fields: PaymentFields,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Helpers
// ============================================================================

fn error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "VALIDATION_ERROR",
        ErrorKind::MissingField => "MISSING_FIELD",
        ErrorKind::Verification => "VERIFICATION_FAILED",
        ErrorKind::Config => "CONFIG_ERROR",
    }
}

fn api_error(err: &PaymentError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: error_code(err.kind()).into(),
            context: err.context(),
        }),
    )
}

fn payments_disabled() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Payments not configured".into(),
            code: "PAYMENTS_DISABLED".into(),
            context: BTreeMap::new(),
        }),
    )
}

fn client(state: &AppState) -> Result<&PayhereClient, ApiError> {
    state.payhere.as_deref().ok_or_else(payments_disabled)
}

fn missing(field: &str) -> PaymentError {
    PaymentError::MissingField {
        field: field.to_string(),
    }
}

fn build_checkout(
    client: &PayhereClient,
    payload: &CheckoutRequest,
) -> payhere_sdk::Result<CheckoutRedirect> {
    let mut request = client.payment_request();
    request
        .set_order_id(&payload.order_id)?
        .set_amount(payload.amount)?
        .set_customer(&payload.customer)?;

    if let Some(currency) = &payload.currency {
        request.set_currency(currency)?;
    }
    match (&payload.item_name, payload.item_count) {
        (Some(item_name), count) => {
            request.set_items(item_name, count.unwrap_or(1))?;
        }
        (None, Some(_)) => return Err(missing("items")),
        (None, None) => {}
    }
    if let Some(url) = &payload.return_url {
        request.set_return_url(url)?;
    }
    if let Some(url) = &payload.cancel_url {
        request.set_cancel_url(url)?;
    }
    if let Some(url) = &payload.notify_url {
        request.set_notify_url(url)?;
    }
    match (&payload.custom_1, &payload.custom_2) {
        (Some(custom_1), custom_2) => {
            request.set_custom_fields(custom_1, custom_2.as_deref())?;
        }
        (None, Some(_)) => return Err(missing("custom_1")),
        (None, None) => {}
    }

    request.checkout()
}

fn checkout_redirect(
    state: &AppState,
    payload: &CheckoutRequest,
) -> Result<CheckoutRedirect, ApiError> {
    let client = client(state)?;
    build_checkout(client, payload).map_err(|e| {
        tracing::info!(order_id = %payload.order_id, error = %e, "Rejected checkout request");
        api_error(&e)
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payhere_configured: state.payhere.is_some(),
        environment: state
            .payhere
            .as_ref()
            .map(|client| client.config().environment().as_str()),
    })
}

/// Build and sign a checkout request, returned as JSON
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let redirect = checkout_redirect(&state, &payload)?;

    tracing::info!(order_id = %payload.order_id, "Created checkout request");

    Ok(Json(CheckoutResponse {
        checkout_url: redirect.action,
        method: redirect.method,
        fields: redirect.fields,
    }))
}

/// Build and sign a checkout request, returned as an auto-submitting page
pub async fn checkout_form(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Html<String>, ApiError> {
    let redirect = checkout_redirect(&state, &payload)?;
    Ok(Html(render::redirect_page(&redirect).into_string()))
}

/// PayHere notification endpoint.
///
/// Verified notifications are always acknowledged with 200, whatever the
/// payment outcome, so the gateway does not retry. Payloads that fail
/// verification are rejected.
pub async fn payhere_notify(
    State(state): State<AppState>,
    Form(payload): Form<HashMap<String, String>>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let client = client(&state)?;

    let notification = client.notification(payload).map_err(|e| {
        tracing::warn!(context = ?e.context(), "Malformed PayHere notification");
        api_error(&e)
    })?;

    if let Err(e) = notification.verify() {
        match e.kind() {
            ErrorKind::Verification => {
                tracing::warn!(context = ?e.context(), "PayHere notification failed verification");
            }
            _ => {
                tracing::warn!(context = ?e.context(), "Invalid PayHere notification");
            }
        }
        return Err(api_error(&e));
    }

    let order_id = notification.order_id();
    let payment_id = notification.payment_id();

    match notification.status() {
        PaymentStatus::Success => {
            tracing::info!(
                order_id,
                payment_id,
                amount = ?notification.amount(),
                currency = notification.currency(),
                method = ?notification.method(),
                "Payment succeeded"
            );
        }
        PaymentStatus::ChargedBack => {
            tracing::warn!(order_id, payment_id, "Payment charged back");
        }
        PaymentStatus::Unknown => {
            tracing::warn!(
                order_id,
                status_code = ?notification.status_code(),
                "Unknown payment status"
            );
        }
        status => {
            tracing::info!(order_id, payment_id, status = %status, "Payment status update");
        }
    }

    Ok((StatusCode::OK, "OK"))
}
