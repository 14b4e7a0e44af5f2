//! PayHere Client

use std::sync::Arc;

use crate::config::{Environment, MerchantConfig};
use crate::error::Result;
use crate::notification::{Notification, NotificationPayload};
use crate::request::PaymentRequest;

/// Entry point holding the merchant configuration.
///
/// Cheap to clone; every builder and notification it creates shares the
/// same immutable config.
#[derive(Clone, Debug)]
pub struct PayhereClient {
    config: Arc<MerchantConfig>,
}

impl PayhereClient {
    /// Create a new client
    pub fn new(
        merchant_id: impl Into<String>,
        merchant_secret: impl Into<String>,
        environment: Environment,
    ) -> Result<Self> {
        MerchantConfig::new(merchant_id, merchant_secret, environment).map(Self::with_config)
    }

    pub fn with_config(config: MerchantConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        MerchantConfig::from_env().map(Self::with_config)
    }

    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Start a new checkout request
    pub fn payment_request(&self) -> PaymentRequest {
        PaymentRequest::new(Arc::clone(&self.config))
    }

    /// Wrap a received notification payload
    pub fn notification(&self, payload: NotificationPayload) -> Result<Notification> {
        Notification::new(Arc::clone(&self.config), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Customer;
    use crate::signer::{SignatureFields, compute_signature};
    use rust_decimal_macros::dec;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_types_are_send_and_sync() {
        assert_send_sync::<MerchantConfig>();
        assert_send_sync::<PayhereClient>();
        assert_send_sync::<PaymentRequest>();
        assert_send_sync::<Notification>();
    }

    #[test]
    fn test_request_and_notification_share_config() {
        let client = PayhereClient::new("1211149", "secret", Environment::Sandbox).unwrap();

        let mut request = client.payment_request();
        request
            .set_order_id("ORDER_1")
            .unwrap()
            .set_amount(dec!(1000))
            .unwrap()
            .set_customer(&Customer {
                first_name: "John".into(),
                last_name: "Doe".into(),
                email: "john@example.com".into(),
                phone: "0771234567".into(),
                address: "123 Test Street".into(),
                city: "Colombo".into(),
                country: "Sri Lanka".into(),
            })
            .unwrap();
        let fields = request.finalize().unwrap();

        let md5sig = compute_signature(
            &SignatureFields::notification("1211149", "ORDER_1", "1000.00", "LKR", "2"),
            "secret",
        );
        let payload = [
            ("merchant_id", "1211149"),
            ("order_id", "ORDER_1"),
            ("payment_id", "P1"),
            ("payhere_amount", fields.get("amount").unwrap()),
            ("payhere_currency", fields.get("currency").unwrap()),
            ("status_code", "2"),
            ("md5sig", md5sig.as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let notification = client.notification(payload).unwrap();
        assert!(notification.verify().unwrap());
        assert!(notification.is_success());
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(PayhereClient::new("", "secret", Environment::Live).is_err());
    }
}
