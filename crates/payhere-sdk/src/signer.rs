//! Request and Notification Signatures
//!
//! The gateway authenticates both directions with the same scheme:
//!
//! ```text
//! secret_digest = UPPER(HEX(MD5(merchant_secret)))
//! signature     = UPPER(HEX(MD5(merchant_id + order_id + amount + currency
//!                               [+ status_code] + secret_digest)))
//! ```
//!
//! `status_code` only takes part when checking an inbound notification.
//! MD5 is mandated by the gateway's wire format and cannot be swapped out.

use md5::{Digest, Md5};
use rust_decimal::{Decimal, RoundingStrategy};
use subtle::ConstantTimeEq;

/// Render an amount the way the gateway signs it: two decimals, `.`
/// separator, no grouping, half-away-from-zero rounding.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Upper-case hex MD5 of the merchant secret
pub fn secret_digest(secret: &str) -> String {
    md5_upper_hex(secret.as_bytes())
}

/// Fields bound by a signature
#[derive(Clone, Copy, Debug)]
pub struct SignatureFields<'a> {
    pub merchant_id: &'a str,
    pub order_id: &'a str,
    /// Already rendered with [`format_amount`]
    pub amount: &'a str,
    pub currency: &'a str,
    /// Present only for inbound notifications
    pub status_code: Option<&'a str>,
}

impl<'a> SignatureFields<'a> {
    /// Tuple signed for an outbound checkout request
    pub const fn request(
        merchant_id: &'a str,
        order_id: &'a str,
        amount: &'a str,
        currency: &'a str,
    ) -> Self {
        Self {
            merchant_id,
            order_id,
            amount,
            currency,
            status_code: None,
        }
    }

    /// Tuple signed by the gateway for a notification
    pub const fn notification(
        merchant_id: &'a str,
        order_id: &'a str,
        amount: &'a str,
        currency: &'a str,
        status_code: &'a str,
    ) -> Self {
        Self {
            merchant_id,
            order_id,
            amount,
            currency,
            status_code: Some(status_code),
        }
    }
}

/// Compute the upper-case hex signature for `fields` under `secret`
pub fn compute_signature(fields: &SignatureFields<'_>, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(fields.merchant_id.as_bytes());
    hasher.update(fields.order_id.as_bytes());
    hasher.update(fields.amount.as_bytes());
    hasher.update(fields.currency.as_bytes());
    if let Some(status_code) = fields.status_code {
        hasher.update(status_code.as_bytes());
    }
    hasher.update(secret_digest(secret).as_bytes());

    hex::encode_upper(hasher.finalize())
}

/// Compare a received signature against the expected one in constant time.
///
/// The candidate is upper-cased first; hex case carries no information.
pub fn verify_signature(candidate: &str, expected: &str) -> bool {
    let candidate = candidate.trim().to_ascii_uppercase();
    candidate.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn md5_upper_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Md5::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request_signature(order_id: &str, amount: &str, currency: &str) -> String {
        compute_signature(&SignatureFields::request("M", order_id, amount, currency), "S")
    }

    #[test]
    fn test_fixed_vector() {
        let inner = format!("MO1100.00LKR{}", md5_upper_hex(b"S"));
        let expected = md5_upper_hex(inner.as_bytes());

        assert_eq!(request_signature("O1", "100.00", "LKR"), expected);
        assert_eq!(expected, "1183F93D1DF40F8D7C6E57FEACB173CA");
        assert_eq!(
            compute_signature(&SignatureFields::notification("M", "O1", "100.00", "LKR", "2"), "S"),
            "1ED0944FFBCAD23582F354E2391C99EB"
        );
        assert!(expected.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_secret_digest_known_value() {
        // md5("S")
        assert_eq!(secret_digest("S"), "5DBC98DCC983A70728BD082D1A47546E");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1000)), "1000.00");
        assert_eq!(format_amount(dec!(1000.5)), "1000.50");
        assert_eq!(format_amount(dec!(999999.99)), "999999.99");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(12.344)), "12.34");
        assert_eq!(format_amount(dec!(1234567.1)), "1234567.10");
    }

    #[test]
    fn test_format_amount_idempotent() {
        for amount in [dec!(1), dec!(0.1), dec!(10.255), dec!(99.999), dec!(123456.78)] {
            let once = format_amount(amount);
            let twice = format_amount(once.parse().unwrap());
            assert_eq!(once, twice);
            assert_eq!(once.split('.').nth(1).map(str::len), Some(2));
        }
    }

    #[test]
    fn test_sign_then_verify_round_trip() {
        let fields = SignatureFields::notification("M", "O1", "100.00", "LKR", "2");
        let signature = compute_signature(&fields, "S");
        assert!(verify_signature(&signature, &compute_signature(&fields, "S")));
        assert!(verify_signature(&signature.to_lowercase(), &signature));
    }

    #[test]
    fn test_status_code_changes_signature() {
        let request = compute_signature(&SignatureFields::request("M", "O1", "100.00", "LKR"), "S");
        let notification = |status| SignatureFields::notification("M", "O1", "100.00", "LKR", status);
        let success = compute_signature(&notification("2"), "S");
        let failed = compute_signature(&notification("-2"), "S");

        assert_ne!(request, success);
        assert_ne!(success, failed);
    }

    #[test]
    fn test_each_signed_field_matters() {
        let base = request_signature("O1", "100.00", "LKR");

        assert_ne!(base, request_signature("O2", "100.00", "LKR"));
        assert_ne!(base, request_signature("O1", "100.01", "LKR"));
        assert_ne!(base, request_signature("O1", "100.00", "USD"));
        assert_ne!(
            base,
            compute_signature(&SignatureFields::request("N", "O1", "100.00", "LKR"), "S")
        );
        assert_ne!(
            base,
            compute_signature(&SignatureFields::request("M", "O1", "100.00", "LKR"), "T")
        );
        assert!(!verify_signature(&request_signature("O2", "100.00", "LKR"), &base));
    }

    #[test]
    fn test_verify_rejects_length_mismatch() {
        let base = request_signature("O1", "100.00", "LKR");
        assert!(!verify_signature(&base[..31], &base));
        assert!(!verify_signature("", &base));
    }
}
