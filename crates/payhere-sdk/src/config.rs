//! Merchant Configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

const SANDBOX_CHECKOUT_URL: &str = "https://sandbox.payhere.lk/pay/checkout";
const LIVE_CHECKOUT_URL: &str = "https://www.payhere.lk/pay/checkout";

/// Gateway environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Live => "live",
        }
    }

    /// Hosted checkout endpoint the payment form posts to
    pub const fn checkout_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_CHECKOUT_URL,
            Self::Live => LIVE_CHECKOUT_URL,
        }
    }

    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

impl FromStr for Environment {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "live" => Ok(Self::Live),
            other => Err(PaymentError::Config(format!(
                "unknown environment '{other}' (expected 'sandbox' or 'live')"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merchant credentials and target environment.
///
/// Immutable after construction. The secret is only ever used to derive
/// signatures and is redacted from `Debug` output.
#[derive(Clone)]
pub struct MerchantConfig {
    merchant_id: String,
    merchant_secret: String,
    environment: Environment,
}

impl MerchantConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        merchant_secret: impl Into<String>,
        environment: Environment,
    ) -> Result<Self> {
        let merchant_id = merchant_id.into().trim().to_string();
        let merchant_secret = merchant_secret.into().trim().to_string();

        if merchant_id.is_empty() {
            return Err(PaymentError::Config("merchant id must not be empty".into()));
        }
        if merchant_secret.is_empty() {
            return Err(PaymentError::Config("merchant secret must not be empty".into()));
        }

        Ok(Self {
            merchant_id,
            merchant_secret,
            environment,
        })
    }

    /// Create from environment variables
    ///
    /// Reads `PAYHERE_MERCHANT_ID`, `PAYHERE_MERCHANT_SECRET` and the optional
    /// `PAYHERE_ENVIRONMENT` (`sandbox` when unset).
    pub fn from_env() -> Result<Self> {
        let merchant_id = std::env::var("PAYHERE_MERCHANT_ID")
            .map_err(|_| PaymentError::Config("PAYHERE_MERCHANT_ID not set".into()))?;
        let merchant_secret = std::env::var("PAYHERE_MERCHANT_SECRET")
            .map_err(|_| PaymentError::Config("PAYHERE_MERCHANT_SECRET not set".into()))?;
        let environment = match std::env::var("PAYHERE_ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        Self::new(merchant_id, merchant_secret, environment)
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub(crate) fn merchant_secret(&self) -> &str {
        &self.merchant_secret
    }

    pub const fn environment(&self) -> Environment {
        self.environment
    }

    pub const fn is_sandbox(&self) -> bool {
        !self.environment.is_live()
    }

    pub const fn checkout_url(&self) -> &'static str {
        self.environment.checkout_url()
    }
}

impl fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("merchant_id", &self.merchant_id)
            .field("merchant_secret", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_url_per_environment() {
        let sandbox = MerchantConfig::new("M", "S", Environment::Sandbox).unwrap();
        let live = MerchantConfig::new("M", "S", Environment::Live).unwrap();

        assert_eq!(sandbox.checkout_url(), "https://sandbox.payhere.lk/pay/checkout");
        assert_eq!(live.checkout_url(), "https://www.payhere.lk/pay/checkout");
        assert!(sandbox.is_sandbox());
        assert!(!live.is_sandbox());
    }

    #[test]
    fn test_blank_credentials_rejected() {
        let err = MerchantConfig::new("  ", "S", Environment::Sandbox).unwrap_err();
        assert!(matches!(err, PaymentError::Config(_)));

        let err = MerchantConfig::new("M", "", Environment::Live).unwrap_err();
        assert!(matches!(err, PaymentError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = MerchantConfig::new("1211149", "top-secret", Environment::Sandbox).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("1211149"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("LIVE".parse::<Environment>().unwrap(), Environment::Live);
        assert_eq!(" sandbox ".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert!("production".parse::<Environment>().is_err());
    }
}
