use serde::{Deserialize, Serialize};

/// Вид комиссии за сбор платежей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    /// Paid on or before the early threshold date
    Early,
    /// Paid after the early threshold but on or before the standard one
    Standard,
    /// Payment against a book flagged as an extra book
    ExtraBooks,
}

impl CommissionType {
    pub fn code(&self) -> &'static str {
        match self {
            CommissionType::Early => "early",
            CommissionType::Standard => "standard",
            CommissionType::ExtraBooks => "extra_books",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CommissionType::Early => "Early payment",
            CommissionType::Standard => "Standard payment",
            CommissionType::ExtraBooks => "Extra books",
        }
    }

    pub fn all() -> Vec<CommissionType> {
        vec![
            CommissionType::Early,
            CommissionType::Standard,
            CommissionType::ExtraBooks,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "early" => Some(CommissionType::Early),
            "standard" => Some(CommissionType::Standard),
            "extra_books" => Some(CommissionType::ExtraBooks),
            _ => None,
        }
    }

    /// Date-bound types need a threshold date when enabled
    pub fn requires_threshold(&self) -> bool {
        !matches!(self, CommissionType::ExtraBooks)
    }
}

impl std::fmt::Display for CommissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
