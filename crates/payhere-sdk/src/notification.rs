//! Payment Notification Verification
//!
//! The gateway POSTs a form-encoded notification to the merchant's
//! `notify_url` whenever a payment changes state. [`Notification`] wraps
//! that payload, authenticates it and exposes typed accessors.
//!
//! Status accessors work before [`Notification::verify`] has been called,
//! but nothing should be acted on (marking an order paid, say) until it has
//! returned `Ok`.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::MerchantConfig;
use crate::error::{PaymentError, Result, VerificationFailure};
use crate::signer::{SignatureFields, compute_signature, format_amount, verify_signature};
use crate::status::PaymentStatus;
use crate::validation::field;

/// Raw notification body as decoded by the HTTP layer
pub type NotificationPayload = HashMap<String, String>;

/// Fields every notification must carry, in the order they are checked
pub const REQUIRED_NOTIFICATION_FIELDS: [&str; 7] = [
    field::MERCHANT_ID,
    field::ORDER_ID,
    field::PAYMENT_ID,
    field::PAYHERE_AMOUNT,
    field::PAYHERE_CURRENCY,
    field::STATUS_CODE,
    field::MD5SIG,
];

/// An inbound payment notification
#[derive(Clone, Debug)]
pub struct Notification {
    config: Arc<MerchantConfig>,
    data: NotificationPayload,
}

impl Notification {
    /// Fails on the first required field that is absent or blank
    pub fn new(config: Arc<MerchantConfig>, data: NotificationPayload) -> Result<Self> {
        if let Some(missing) = REQUIRED_NOTIFICATION_FIELDS
            .into_iter()
            .find(|key| data.get(*key).is_none_or(|value| value.trim().is_empty()))
        {
            tracing::debug!(field = missing, "Notification missing required field");
            return Err(PaymentError::missing(missing));
        }

        Ok(Self { config, data })
    }

    fn required(&self, key: &str) -> &str {
        self.data.get(key).map_or("", |value| value.trim())
    }

    /// Authenticate the notification.
    ///
    /// Returns `Ok(true)` only when the merchant id matches the configured
    /// one and `md5sig` matches the recomputed signature. Any failure is an
    /// error, never `Ok(false)`.
    pub fn verify(&self) -> Result<bool> {
        let merchant_id = self.required(field::MERCHANT_ID);
        let order_id = self.required(field::ORDER_ID);

        if merchant_id != self.config.merchant_id() {
            tracing::warn!(
                order_id,
                expected = self.config.merchant_id(),
                received = merchant_id,
                "Notification addressed to a different merchant"
            );
            return Err(PaymentError::Verification(
                VerificationFailure::MerchantMismatch {
                    expected: self.config.merchant_id().to_string(),
                    received: merchant_id.to_string(),
                    order_id: order_id.to_string(),
                },
            ));
        }

        let amount = format_amount(self.parsed_amount()?);
        let currency = self.required(field::PAYHERE_CURRENCY);
        let status_code = self.required(field::STATUS_CODE);
        let received = self.required(field::MD5SIG);

        let expected = compute_signature(
            &SignatureFields::notification(merchant_id, order_id, &amount, currency, status_code),
            self.config.merchant_secret(),
        );

        if !verify_signature(received, &expected) {
            let payment_id = self.required(field::PAYMENT_ID);
            tracing::warn!(order_id, payment_id, "Notification signature mismatch");
            return Err(PaymentError::Verification(VerificationFailure::HashMismatch {
                order_id: order_id.to_string(),
                payment_id: payment_id.to_string(),
                expected_hash: expected,
                received_hash: received.to_string(),
                amount,
                currency: currency.to_string(),
                status_code: status_code.to_string(),
            }));
        }

        tracing::debug!(order_id, status = %self.status(), "Notification verified");
        Ok(true)
    }

    fn parsed_amount(&self) -> Result<Decimal> {
        let raw = self.required(field::PAYHERE_AMOUNT);
        raw.parse::<Decimal>().map_err(|_| {
            PaymentError::validation(field::PAYHERE_AMOUNT, raw, "not a decimal amount")
        })
    }

    /// Raw status code; `None` when it is not an integer
    pub fn status_code(&self) -> Option<i32> {
        self.required(field::STATUS_CODE).parse().ok()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status_code()
            .map_or(PaymentStatus::Unknown, PaymentStatus::from_code)
    }

    pub fn status_text(&self) -> &'static str {
        self.status().as_str()
    }

    pub fn is_success(&self) -> bool {
        self.status() == PaymentStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.status() == PaymentStatus::Pending
    }

    pub fn is_canceled(&self) -> bool {
        self.status() == PaymentStatus::Canceled
    }

    pub fn is_failed(&self) -> bool {
        self.status() == PaymentStatus::Failed
    }

    pub fn is_charged_back(&self) -> bool {
        self.status() == PaymentStatus::ChargedBack
    }

    pub fn merchant_id(&self) -> &str {
        self.required(field::MERCHANT_ID)
    }

    pub fn order_id(&self) -> &str {
        self.required(field::ORDER_ID)
    }

    /// Gateway-side payment reference
    pub fn payment_id(&self) -> &str {
        self.required(field::PAYMENT_ID)
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.parsed_amount().ok()
    }

    pub fn currency(&self) -> &str {
        self.required(field::PAYHERE_CURRENCY)
    }

    pub fn custom_1(&self) -> Option<&str> {
        self.get(field::CUSTOM_1)
    }

    pub fn custom_2(&self) -> Option<&str> {
        self.get(field::CUSTOM_2)
    }

    pub fn card_holder_name(&self) -> Option<&str> {
        self.get(field::CARD_HOLDER_NAME)
    }

    /// Masked card number
    pub fn card_no(&self) -> Option<&str> {
        self.get(field::CARD_NO)
    }

    /// Payment method, e.g. `VISA`
    pub fn method(&self) -> Option<&str> {
        self.get(field::METHOD)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.get(field::STATUS_MESSAGE)
    }

    /// Any field from the payload
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub const fn data(&self) -> &NotificationPayload {
        &self.data
    }
}
