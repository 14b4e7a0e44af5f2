//! Payment Status Codes

use serde::{Deserialize, Serialize};

/// Payment status reported by a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    Pending,
    Canceled,
    Failed,
    ChargedBack,
    Unknown,
}

impl PaymentStatus {
    /// Classify a raw gateway status code. Total: unmapped codes are `Unknown`.
    pub const fn from_code(code: i32) -> Self {
        match code {
            2 => Self::Success,
            0 => Self::Pending,
            -1 => Self::Canceled,
            -2 => Self::Failed,
            -3 => Self::ChargedBack,
            _ => Self::Unknown,
        }
    }

    /// Gateway code for this status, `None` for `Unknown`
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Success => Some(2),
            Self::Pending => Some(0),
            Self::Canceled => Some(-1),
            Self::Failed => Some(-2),
            Self::ChargedBack => Some(-3),
            Self::Unknown => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Pending => "Pending",
            Self::Canceled => "Canceled",
            Self::Failed => "Failed",
            Self::ChargedBack => "Chargedback",
            Self::Unknown => "Unknown",
        }
    }

    /// Terminal states never transition again for the same payment
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Canceled | Self::Failed | Self::ChargedBack
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(PaymentStatus::from_code(2), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_code(0), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_code(-1), PaymentStatus::Canceled);
        assert_eq!(PaymentStatus::from_code(-2), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_code(-3), PaymentStatus::ChargedBack);
    }

    #[test]
    fn test_classifier_is_total() {
        let known = [2, 0, -1, -2, -3];
        for code in [i32::MIN, -100, -4, 1, 3, 42, i32::MAX] {
            assert_eq!(PaymentStatus::from_code(code), PaymentStatus::Unknown);
        }
        for code in known {
            let status = PaymentStatus::from_code(code);
            assert_ne!(status, PaymentStatus::Unknown);
            assert_eq!(status.code(), Some(code));
        }
    }

    #[test]
    fn test_status_text() {
        assert_eq!(PaymentStatus::ChargedBack.to_string(), "Chargedback");
        assert_eq!(PaymentStatus::Unknown.as_str(), "Unknown");
        assert!(!PaymentStatus::Pending.is_final());
    }
}
