//! Payment Error Types

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// An outbound field (or a parsed inbound value) failed validation
    #[error("Invalid value for '{field}': {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is absent or blank
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    /// Notification authenticity check failed
    #[error("Payment notification verification failed: {0}")]
    Verification(VerificationFailure),

    /// Bad merchant credentials or environment
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Closed classification of [`PaymentError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    MissingField,
    Verification,
    Config,
}

/// Why a notification was rejected.
///
/// The two cases are kept apart so operators can tell a notification that
/// was routed to the wrong merchant from one that was tampered with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationFailure {
    /// Payload `merchant_id` is not the configured merchant
    MerchantMismatch {
        expected: String,
        received: String,
        order_id: String,
    },

    /// Recomputed signature does not match `md5sig`
    HashMismatch {
        order_id: String,
        payment_id: String,
        expected_hash: String,
        received_hash: String,
        amount: String,
        currency: String,
        status_code: String,
    },
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MerchantMismatch { expected, received, order_id } => write!(
                f,
                "merchant id mismatch for order {order_id} (expected {expected}, received {received})"
            ),
            Self::HashMismatch { order_id, payment_id, .. } => write!(
                f,
                "signature mismatch for order {order_id} (payment {payment_id})"
            ),
        }
    }
}

impl PaymentError {
    pub(crate) fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::Verification(_) => ErrorKind::Verification,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Name of the offending field, when the error is about one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::MissingField { field } => Some(field),
            _ => None,
        }
    }

    /// Structured context for audit logging.
    ///
    /// Never contains the merchant secret.
    pub fn context(&self) -> BTreeMap<String, String> {
        let mut ctx = BTreeMap::new();
        match self {
            Self::Validation { field, value, reason } => {
                ctx.insert("field".into(), field.clone());
                ctx.insert("value".into(), value.clone());
                ctx.insert("reason".into(), reason.clone());
            }
            Self::MissingField { field } => {
                ctx.insert("field".into(), field.clone());
            }
            Self::Verification(VerificationFailure::MerchantMismatch {
                expected,
                received,
                order_id,
            }) => {
                ctx.insert("reason".into(), "merchant_mismatch".into());
                ctx.insert("expected_merchant_id".into(), expected.clone());
                ctx.insert("received_merchant_id".into(), received.clone());
                ctx.insert("order_id".into(), order_id.clone());
            }
            Self::Verification(VerificationFailure::HashMismatch {
                order_id,
                payment_id,
                expected_hash,
                received_hash,
                amount,
                currency,
                status_code,
            }) => {
                ctx.insert("reason".into(), "hash_mismatch".into());
                ctx.insert("order_id".into(), order_id.clone());
                ctx.insert("payment_id".into(), payment_id.clone());
                ctx.insert("expected_hash".into(), expected_hash.clone());
                ctx.insert("received_hash".into(), received_hash.clone());
                ctx.insert("amount".into(), amount.clone());
                ctx.insert("currency".into(), currency.clone());
                ctx.insert("status_code".into(), status_code.clone());
            }
            Self::Config(message) => {
                ctx.insert("message".into(), message.clone());
            }
        }
        ctx
    }

    /// HTTP-style status a caller can answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::MissingField { .. } => 400,
            Self::Config(_) => 401,
            Self::Verification(_) => 403,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { .. } => "Some payment details are invalid.",
            Self::MissingField { .. } => "Some required payment details are missing.",
            Self::Verification(_) => "Payment notification could not be verified.",
            Self::Config(_) => "Payment service configuration error.",
        }
    }
}
