//! Checkout Request Builder
//!
//! Accumulates validated checkout fields and signs them for the gateway's
//! hosted checkout page.
//!
//! ```text
//!   new()/reset()        set_*() ok           finalize()
//!  ───────────────▶ Empty ─────────▶ Accumulating ─────────▶ Finalized
//!                                  ▲                          │
//!                                  └──────── set_*() ok ──────┘
//! ```
//!
//! A setter that fails validation leaves both the fields and the state
//! untouched. `finalize` never caches: every call re-checks the required
//! fields and signs the current values.

use std::sync::Arc;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MerchantConfig;
use crate::error::{PaymentError, Result};
use crate::signer::{SignatureFields, compute_signature};
use crate::validation::{self, Currency, field};

/// Fields that must be present and non-blank before signing, in the order
/// they are checked
pub const REQUIRED_FIELDS: [&str; 10] = [
    field::ORDER_ID,
    field::AMOUNT,
    field::CURRENCY,
    field::FIRST_NAME,
    field::LAST_NAME,
    field::EMAIL,
    field::PHONE,
    field::ADDRESS,
    field::CITY,
    field::COUNTRY,
];

/// Order of keys in a finalized field map; `hash` is appended last
const WIRE_ORDER: [&str; 18] = [
    field::MERCHANT_ID,
    field::ORDER_ID,
    field::AMOUNT,
    field::CURRENCY,
    field::ITEMS,
    field::ITEM_NUMBER,
    field::FIRST_NAME,
    field::LAST_NAME,
    field::EMAIL,
    field::PHONE,
    field::ADDRESS,
    field::CITY,
    field::COUNTRY,
    field::RETURN_URL,
    field::CANCEL_URL,
    field::NOTIFY_URL,
    field::CUSTOM_1,
    field::CUSTOM_2,
];

/// Builder lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderState {
    Empty,
    Accumulating,
    Finalized,
}

/// Signed checkout fields in wire order, `hash` last
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentFields(IndexMap<String, String>);

impl PaymentFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn hash(&self) -> Option<&str> {
        self.get(field::HASH)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PaymentFields {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Everything a render layer needs to hand the customer to the gateway.
///
/// The values are plain data; escaping them for HTML is the renderer's job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    /// Gateway checkout endpoint
    pub action: String,

    /// Always `post`
    pub method: String,

    /// Signed form fields
    pub fields: PaymentFields,
}

/// Customer details for [`PaymentRequest::set_customer`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

/// Checkout request builder
#[derive(Clone, Debug)]
pub struct PaymentRequest {
    config: Arc<MerchantConfig>,
    fields: IndexMap<&'static str, String>,
    state: BuilderState,
}

impl PaymentRequest {
    pub fn new(config: Arc<MerchantConfig>) -> Self {
        let mut request = Self {
            config,
            fields: IndexMap::new(),
            state: BuilderState::Empty,
        };
        request.seed();
        request
    }

    fn seed(&mut self) {
        self.fields.clear();
        self.fields
            .insert(field::MERCHANT_ID, self.config.merchant_id().to_string());
        self.fields
            .insert(field::CURRENCY, Currency::default().as_str().to_string());
        self.state = BuilderState::Empty;
    }

    fn store(&mut self, values: impl IntoIterator<Item = (&'static str, String)>) -> &mut Self {
        for (key, value) in values {
            self.fields.insert(key, value);
        }
        self.state = BuilderState::Accumulating;
        self
    }

    pub const fn state(&self) -> BuilderState {
        self.state
    }

    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Current (unsigned) value of a field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn set_order_id(&mut self, order_id: &str) -> Result<&mut Self> {
        let order_id = validation::validate_order_id(order_id)?;
        Ok(self.store([(field::ORDER_ID, order_id)]))
    }

    /// Stored rendered to two decimals, e.g. `1000` becomes `"1000.00"`
    pub fn set_amount(&mut self, amount: Decimal) -> Result<&mut Self> {
        let amount = validation::validate_amount(amount)?;
        Ok(self.store([(field::AMOUNT, amount)]))
    }

    /// Case-insensitive; stored upper-case
    pub fn set_currency(&mut self, currency: &str) -> Result<&mut Self> {
        let currency = validation::validate_currency(currency)?;
        Ok(self.store([(field::CURRENCY, currency.as_str().to_string())]))
    }

    pub fn set_items(&mut self, item_name: &str, item_count: i64) -> Result<&mut Self> {
        let item_name = validation::validate_item_name(item_name)?;
        let item_count = validation::validate_item_count(item_count)?;
        Ok(self.store([
            (field::ITEMS, item_name),
            (field::ITEM_NUMBER, item_count.to_string()),
        ]))
    }

    pub fn set_first_name(&mut self, first_name: &str) -> Result<&mut Self> {
        let value = validation::validate_name(field::FIRST_NAME, first_name)?;
        Ok(self.store([(field::FIRST_NAME, value)]))
    }

    pub fn set_last_name(&mut self, last_name: &str) -> Result<&mut Self> {
        let value = validation::validate_name(field::LAST_NAME, last_name)?;
        Ok(self.store([(field::LAST_NAME, value)]))
    }

    pub fn set_email(&mut self, email: &str) -> Result<&mut Self> {
        let value = validation::validate_email(email)?;
        Ok(self.store([(field::EMAIL, value)]))
    }

    pub fn set_phone(&mut self, phone: &str) -> Result<&mut Self> {
        let value = validation::validate_phone(phone)?;
        Ok(self.store([(field::PHONE, value)]))
    }

    pub fn set_address(&mut self, address: &str) -> Result<&mut Self> {
        let value = validation::validate_address(address)?;
        Ok(self.store([(field::ADDRESS, value)]))
    }

    pub fn set_city(&mut self, city: &str) -> Result<&mut Self> {
        let value = validation::validate_locality(field::CITY, city)?;
        Ok(self.store([(field::CITY, value)]))
    }

    pub fn set_country(&mut self, country: &str) -> Result<&mut Self> {
        let value = validation::validate_locality(field::COUNTRY, country)?;
        Ok(self.store([(field::COUNTRY, value)]))
    }

    /// Sets all customer fields, or none of them if any is invalid
    pub fn set_customer(&mut self, customer: &Customer) -> Result<&mut Self> {
        let values = [
            (
                field::FIRST_NAME,
                validation::validate_name(field::FIRST_NAME, &customer.first_name)?,
            ),
            (
                field::LAST_NAME,
                validation::validate_name(field::LAST_NAME, &customer.last_name)?,
            ),
            (field::EMAIL, validation::validate_email(&customer.email)?),
            (field::PHONE, validation::validate_phone(&customer.phone)?),
            (field::ADDRESS, validation::validate_address(&customer.address)?),
            (
                field::CITY,
                validation::validate_locality(field::CITY, &customer.city)?,
            ),
            (
                field::COUNTRY,
                validation::validate_locality(field::COUNTRY, &customer.country)?,
            ),
        ];
        Ok(self.store(values))
    }

    /// Where the customer lands after paying
    pub fn set_return_url(&mut self, url: &str) -> Result<&mut Self> {
        let value = validation::validate_url(field::RETURN_URL, url, self.config.environment())?;
        Ok(self.store([(field::RETURN_URL, value)]))
    }

    /// Where the customer lands after cancelling
    pub fn set_cancel_url(&mut self, url: &str) -> Result<&mut Self> {
        let value = validation::validate_url(field::CANCEL_URL, url, self.config.environment())?;
        Ok(self.store([(field::CANCEL_URL, value)]))
    }

    /// Server-to-server notification callback
    pub fn set_notify_url(&mut self, url: &str) -> Result<&mut Self> {
        let value = validation::validate_url(field::NOTIFY_URL, url, self.config.environment())?;
        Ok(self.store([(field::NOTIFY_URL, value)]))
    }

    /// `custom_2` is removed when `None` or blank
    pub fn set_custom_fields(
        &mut self,
        custom_1: &str,
        custom_2: Option<&str>,
    ) -> Result<&mut Self> {
        let custom_1 = validation::validate_custom_field(field::CUSTOM_1, custom_1)?;
        let custom_2 = validation::validate_optional_custom_field(field::CUSTOM_2, custom_2)?;

        self.store([(field::CUSTOM_1, custom_1)]);
        if let Some(value) = custom_2 {
            self.store([(field::CUSTOM_2, value)]);
        } else {
            self.fields.shift_remove(field::CUSTOM_2);
        }
        Ok(self)
    }

    /// First required field that is absent or blank
    pub fn missing_field(&self) -> Option<&'static str> {
        REQUIRED_FIELDS.into_iter().find(|key| {
            self.fields
                .get(key)
                .is_none_or(|value| value.trim().is_empty())
        })
    }

    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Check completeness, sign the current fields and return them in wire
    /// order with `hash` last.
    pub fn finalize(&mut self) -> Result<PaymentFields> {
        if let Some(missing) = self.missing_field() {
            tracing::debug!(field = missing, "Checkout request incomplete");
            return Err(PaymentError::missing(missing));
        }

        let value = |key: &str| self.fields.get(key).map_or("", String::as_str);
        let signature = compute_signature(
            &SignatureFields::request(
                value(field::MERCHANT_ID),
                value(field::ORDER_ID),
                value(field::AMOUNT),
                value(field::CURRENCY),
            ),
            self.config.merchant_secret(),
        );

        let mut out = IndexMap::with_capacity(WIRE_ORDER.len() + 1);
        for key in WIRE_ORDER {
            if let Some(v) = self.fields.get(key) {
                out.insert(key.to_string(), v.clone());
            }
        }
        out.insert(field::HASH.to_string(), signature);

        tracing::debug!(
            order_id = value(field::ORDER_ID),
            amount = value(field::AMOUNT),
            currency = value(field::CURRENCY),
            "Signed checkout request"
        );
        self.state = BuilderState::Finalized;

        Ok(PaymentFields(out))
    }

    /// Alias of [`finalize`](Self::finalize)
    pub fn data(&mut self) -> Result<PaymentFields> {
        self.finalize()
    }

    /// Finalize and pair the fields with the environment's checkout URL
    pub fn checkout(&mut self) -> Result<CheckoutRedirect> {
        let fields = self.finalize()?;
        Ok(CheckoutRedirect {
            action: self.config.checkout_url().to_string(),
            method: "post".into(),
            fields,
        })
    }

    /// Drop every field except `merchant_id` and the default currency, for
    /// issuing another request from the same builder
    pub fn reset(&mut self) -> &mut Self {
        self.seed();
        self
    }
}
