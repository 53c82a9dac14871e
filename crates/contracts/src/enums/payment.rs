use serde::{Deserialize, Serialize};

/// Способ оплаты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    BankTransfer,
    Cheque,
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Cheque => "Cheque",
        }
    }

    pub fn all() -> Vec<PaymentMethod> {
        vec![
            PaymentMethod::Cash,
            PaymentMethod::Upi,
            PaymentMethod::BankTransfer,
            PaymentMethod::Cheque,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "cash" => Some(PaymentMethod::Cash),
            "upi" => Some(PaymentMethod::Upi),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "cheque" => Some(PaymentMethod::Cheque),
            _ => None,
        }
    }

    /// Lenient parsing for spreadsheet cells ("UPI", "Bank Transfer", "online")
    pub fn parse_loose(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "" => None,
            "online" | "gpay" | "phonepe" | "paytm" => Some(PaymentMethod::Upi),
            "bank" | "neft" | "imps" | "rtgs" => Some(PaymentMethod::BankTransfer),
            other => Self::from_code(other),
        }
    }
}

/// Payment state of a distributed book, derived from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        }
    }

    /// Status for `paid` out of `book_value`; amounts are compared in paise
    pub fn from_amounts(paid: f64, book_value: f64) -> Self {
        let paid_paise = (paid * 100.0).round() as i64;
        let value_paise = (book_value * 100.0).round() as i64;
        if paid_paise <= 0 {
            PaymentStatus::Unpaid
        } else if paid_paise >= value_paise {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose() {
        assert_eq!(PaymentMethod::parse_loose("UPI"), Some(PaymentMethod::Upi));
        assert_eq!(
            PaymentMethod::parse_loose("Bank Transfer"),
            Some(PaymentMethod::BankTransfer)
        );
        assert_eq!(PaymentMethod::parse_loose(" cash "), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse_loose(""), None);
        assert_eq!(PaymentMethod::parse_loose("barter"), None);
    }

    #[test]
    fn test_status_from_amounts() {
        assert_eq!(PaymentStatus::from_amounts(0.0, 500.0), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_amounts(300.0, 500.0), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(500.0, 500.0), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_amounts(499.999, 500.0), PaymentStatus::Paid);
    }
}
