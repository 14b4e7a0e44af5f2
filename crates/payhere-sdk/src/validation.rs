//! Field Validation
//!
//! Every outbound field passes through one of these rules before it is
//! stored. Input is trimmed first; a rule either returns the normalized
//! value or a [`PaymentError::Validation`] naming the field and the
//! offending value. Nothing is clamped or dropped silently.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Environment;
use crate::error::{PaymentError, Result};
use crate::signer::format_amount;

/// Wire names of checkout and notification fields
pub mod field {
    pub const MERCHANT_ID: &str = "merchant_id";
    pub const ORDER_ID: &str = "order_id";
    pub const AMOUNT: &str = "amount";
    pub const CURRENCY: &str = "currency";
    pub const ITEMS: &str = "items";
    pub const ITEM_NUMBER: &str = "item_number";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const COUNTRY: &str = "country";
    pub const RETURN_URL: &str = "return_url";
    pub const CANCEL_URL: &str = "cancel_url";
    pub const NOTIFY_URL: &str = "notify_url";
    pub const CUSTOM_1: &str = "custom_1";
    pub const CUSTOM_2: &str = "custom_2";
    pub const HASH: &str = "hash";

    pub const PAYMENT_ID: &str = "payment_id";
    pub const PAYHERE_AMOUNT: &str = "payhere_amount";
    pub const PAYHERE_CURRENCY: &str = "payhere_currency";
    pub const STATUS_CODE: &str = "status_code";
    pub const MD5SIG: &str = "md5sig";
    pub const STATUS_MESSAGE: &str = "status_message";
    pub const METHOD: &str = "method";
    pub const CARD_HOLDER_NAME: &str = "card_holder_name";
    pub const CARD_NO: &str = "card_no";
}

pub const MAX_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);
pub const MAX_ITEM_COUNT: i64 = 9999;

const ORDER_ID_MAX: usize = 50;
const ITEM_NAME_MAX: usize = 100;
const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 100;
const ADDRESS_MAX: usize = 200;
const LOCALITY_MAX: usize = 50;
const CUSTOM_MAX: usize = 100;
const PHONE_DIGITS_MIN: usize = 9;
const PHONE_DIGITS_MAX: usize = 15;

/// Currencies accepted by the gateway
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Lkr,
    Usd,
    Gbp,
    Eur,
    Aud,
}

impl Currency {
    pub const ALL: [Self; 5] = [Self::Lkr, Self::Usd, Self::Gbp, Self::Eur, Self::Aud];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lkr => "LKR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Eur => "EUR",
            Self::Aud => "AUD",
        }
    }

    /// Comma-separated list used in error messages
    pub fn supported() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                PaymentError::validation(
                    field::CURRENCY,
                    trimmed,
                    format!("unsupported currency; supported currencies: {}", Self::supported()),
                )
            })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            tracing::error!(%pattern, %error, "Invalid validation regex");
            None
        }
    }
}

static ORDER_ID_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"^[A-Za-z0-9_-]+$"));

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r"^(?i)[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
});

fn is_match(regex: &LazyLock<Option<Regex>>, field: &str, value: &str) -> Result<bool> {
    regex
        .as_ref()
        .map(|regex| regex.is_match(value))
        .ok_or_else(|| PaymentError::validation(field, value, "validator unavailable"))
}

/// Escape the HTML-special characters `& < > " '`
pub fn escape_html(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}

/// Remove markup (tags, comments, attributes), leaving only text content
pub fn strip_tags(value: &str) -> String {
    let text = ammonia::Builder::empty().clean(value).to_string();
    html_escape::decode_html_entities(&text).into_owned()
}

/// Strip markup, then escape what is left
pub fn sanitize(value: &str) -> String {
    escape_html(strip_tags(value).trim())
}

fn require_text(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PaymentError::validation(field, value, "must not be empty"));
    }
    let length = trimmed.chars().count();
    if length > max {
        return Err(PaymentError::validation(
            field,
            trimmed,
            format!("must be at most {max} characters (got {length})"),
        ));
    }
    Ok(trimmed.to_string())
}

fn free_text(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = require_text(field, value, max)?;
    let clean = sanitize(&trimmed);
    if clean.is_empty() {
        return Err(PaymentError::validation(field, trimmed, "contains no text"));
    }
    Ok(clean)
}

pub fn validate_order_id(value: &str) -> Result<String> {
    let trimmed = require_text(field::ORDER_ID, value, ORDER_ID_MAX)?;
    if !is_match(&ORDER_ID_REGEX, field::ORDER_ID, &trimmed)? {
        return Err(PaymentError::validation(
            field::ORDER_ID,
            trimmed,
            "may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(trimmed)
}

/// Validate and render an amount to two decimals.
///
/// Bounds are checked on the raw value so nothing above the ceiling is
/// rounded down into range.
pub fn validate_amount(amount: Decimal) -> Result<String> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::validation(
            field::AMOUNT,
            amount.to_string(),
            "must be greater than zero",
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(PaymentError::validation(
            field::AMOUNT,
            amount.to_string(),
            format!("must not exceed {MAX_AMOUNT}"),
        ));
    }

    let formatted = format_amount(amount);
    if formatted == "0.00" {
        return Err(PaymentError::validation(
            field::AMOUNT,
            amount.to_string(),
            "rounds to zero at two decimal places",
        ));
    }
    Ok(formatted)
}

pub fn validate_currency(value: &str) -> Result<Currency> {
    value.parse()
}

pub fn validate_item_name(value: &str) -> Result<String> {
    free_text(field::ITEMS, value, ITEM_NAME_MAX)
}

pub fn validate_item_count(count: i64) -> Result<u32> {
    if !(1..=MAX_ITEM_COUNT).contains(&count) {
        return Err(PaymentError::validation(
            field::ITEM_NUMBER,
            count.to_string(),
            format!("must be between 1 and {MAX_ITEM_COUNT}"),
        ));
    }
    u32::try_from(count).map_err(|_| {
        PaymentError::validation(field::ITEM_NUMBER, count.to_string(), "out of range")
    })
}

/// First or last name
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    free_text(field, value, NAME_MAX)
}

pub fn validate_email(value: &str) -> Result<String> {
    let trimmed = require_text(field::EMAIL, value, EMAIL_MAX)?;
    if !is_match(&EMAIL_REGEX, field::EMAIL, &trimmed)? {
        return Err(PaymentError::validation(
            field::EMAIL,
            trimmed,
            "invalid email address format",
        ));
    }
    Ok(trimmed)
}

/// Accepts an optional leading `+` and ignores spaces, hyphens and
/// parentheses. The stored value is the trimmed input.
pub fn validate_phone(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::validation(
            field::PHONE,
            trimmed,
            "must contain only digits, spaces, hyphens and parentheses",
        ));
    }
    let count = digits.len();
    if !(PHONE_DIGITS_MIN..=PHONE_DIGITS_MAX).contains(&count) {
        return Err(PaymentError::validation(
            field::PHONE,
            trimmed,
            format!("must have between {PHONE_DIGITS_MIN} and {PHONE_DIGITS_MAX} digits (got {count})"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_address(value: &str) -> Result<String> {
    free_text(field::ADDRESS, value, ADDRESS_MAX)
}

/// City or country
pub fn validate_locality(field: &str, value: &str) -> Result<String> {
    free_text(field, value, LOCALITY_MAX)
}

/// Absolute http(s) URL; live merchants must use https
pub fn validate_url(field: &str, value: &str, environment: Environment) -> Result<String> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| PaymentError::validation(field, trimmed, format!("invalid URL: {e}")))?;

    match url.scheme() {
        "https" => {}
        "http" if !environment.is_live() => {}
        "http" => {
            return Err(PaymentError::validation(
                field,
                trimmed,
                "must use https in the live environment",
            ));
        }
        scheme => {
            return Err(PaymentError::validation(
                field,
                trimmed,
                format!("unsupported URL scheme '{scheme}'"),
            ));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(PaymentError::validation(field, trimmed, "URL has no host"));
    }
    Ok(trimmed.to_string())
}

pub fn validate_custom_field(field: &str, value: &str) -> Result<String> {
    free_text(field, value, CUSTOM_MAX)
}

/// Blank input is treated as absent
pub fn validate_optional_custom_field(field: &str, value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => free_text(field, value, CUSTOM_MAX).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn reason(err: &PaymentError) -> String {
        match err {
            PaymentError::Validation { reason, .. } => reason.clone(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_order_id() {
        assert_eq!(validate_order_id("  ORDER_12-a ").unwrap(), "ORDER_12-a");
        assert!(validate_order_id("").is_err());
        assert!(validate_order_id("order 1").is_err());
        assert!(validate_order_id("order#1").is_err());
        assert!(validate_order_id(&"A".repeat(50)).is_ok());
        assert!(validate_order_id(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        let err = validate_amount(dec!(-5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("amount"));

        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec!(0.001)).is_err());
        assert!(validate_amount(dec!(1000000.00)).is_err());
        assert!(validate_amount(dec!(999999.994)).is_err());
        assert!(validate_amount(dec!(999999.995)).is_err());
        assert_eq!(validate_amount(dec!(999999.99)).unwrap(), "999999.99");
        assert_eq!(validate_amount(dec!(1000.00)).unwrap(), "1000.00");
        assert_eq!(validate_amount(dec!(0.01)).unwrap(), "0.01");
    }

    #[test]
    fn test_currency() {
        assert_eq!(validate_currency("usd").unwrap(), Currency::Usd);
        assert_eq!(validate_currency(" Lkr ").unwrap().to_string(), "LKR");

        let err = validate_currency("xyz").unwrap_err();
        assert_eq!(err.field(), Some("currency"));
        assert!(reason(&err).contains("LKR, USD, GBP, EUR, AUD"));
    }

    #[test]
    fn test_item_count() {
        assert_eq!(validate_item_count(1).unwrap(), 1);
        assert_eq!(validate_item_count(9999).unwrap(), 9999);
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(10_000).is_err());
        assert!(validate_item_count(-1).is_err());
    }

    #[test]
    fn test_names_are_sanitized() {
        assert_eq!(
            validate_name(field::FIRST_NAME, "<b>John</b>").unwrap(),
            "John"
        );
        assert_eq!(
            validate_name(field::LAST_NAME, "O'Brien & Sons").unwrap(),
            "O&#x27;Brien &amp; Sons"
        );
        assert!(validate_name(field::FIRST_NAME, "   ").is_err());
        assert!(validate_name(field::FIRST_NAME, "<script></script>").is_err());
        assert!(validate_name(field::FIRST_NAME, &"x".repeat(51)).is_err());
    }

    #[test]
    fn test_comments_and_attributes_are_stripped() {
        assert_eq!(
            validate_name(field::FIRST_NAME, "<!-- a > b -->John").unwrap(),
            "John"
        );
        assert_eq!(
            validate_name(field::FIRST_NAME, r#"<a title="x>y">John</a>"#).unwrap(),
            "John"
        );
        assert_eq!(
            validate_item_name("<p>Gold &amp; Silver</p>").unwrap(),
            "Gold &amp; Silver"
        );
        assert!(validate_name(field::FIRST_NAME, "<!-- only a comment -->").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(
            validate_email(" john.doe@example.com ").unwrap(),
            "john.doe@example.com"
        );
        assert!(validate_email("john.doe").is_err());
        assert!(validate_email("john@").is_err());
        assert!(validate_email("a b@example.com").is_err());
        let long = format!("{}@example.com", "a".repeat(95));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_phone() {
        assert_eq!(validate_phone("0771234567").unwrap(), "0771234567");
        assert_eq!(validate_phone("+94 (77) 123-4567").unwrap(), "+94 (77) 123-4567");
        assert!(validate_phone("12345678").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("07712345ab").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_address_and_locality() {
        assert_eq!(validate_address("123 Main Street").unwrap(), "123 Main Street");
        assert!(validate_address(&"a".repeat(201)).is_err());
        assert_eq!(validate_locality(field::CITY, "Colombo").unwrap(), "Colombo");
        assert!(validate_locality(field::COUNTRY, "").is_err());
    }

    #[test]
    fn test_urls() {
        let sandbox = Environment::Sandbox;
        let live = Environment::Live;

        assert!(validate_url(field::RETURN_URL, "http://localhost/return", sandbox).is_ok());
        assert!(validate_url(field::RETURN_URL, "https://shop.example/return", live).is_ok());

        let err = validate_url(field::NOTIFY_URL, "http://shop.example/notify", live).unwrap_err();
        assert_eq!(err.field(), Some("notify_url"));
        assert!(reason(&err).contains("https"));

        assert!(validate_url(field::CANCEL_URL, "/relative/path", sandbox).is_err());
        assert!(validate_url(field::CANCEL_URL, "ftp://shop.example/x", sandbox).is_err());
        assert!(validate_url(field::CANCEL_URL, "not a url", sandbox).is_err());
    }

    #[test]
    fn test_custom_fields() {
        assert_eq!(
            validate_custom_field(field::CUSTOM_1, "user_id_123").unwrap(),
            "user_id_123"
        );
        assert!(validate_custom_field(field::CUSTOM_1, "").is_err());
        assert_eq!(validate_optional_custom_field(field::CUSTOM_2, None).unwrap(), None);
        assert_eq!(validate_optional_custom_field(field::CUSTOM_2, Some("  ")).unwrap(), None);
        assert!(validate_optional_custom_field(field::CUSTOM_2, Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}
