use crate::enums::PaymentMethod;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Monthly contribution of a CSF member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsfPayment {
    pub id: String,
    pub community_id: String,
    pub member_id: String,
    /// Month paid for, `YYYY-MM`
    pub payment_month: String,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCsfPaymentDto {
    pub member_id: String,
    pub payment_month: String,
    pub amount: f64,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfPaymentListItem {
    #[serde(flatten)]
    pub payment: CsfPayment,
    pub flat_number: String,
    pub member_name: String,
}

/// Member paid more than once for the same month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfDuplicateGroup {
    pub member_id: String,
    pub flat_number: String,
    pub member_name: String,
    pub payment_month: String,
    pub count: i64,
    pub total_amount: f64,
    pub payment_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfReminder {
    pub member_id: String,
    pub flat_number: String,
    pub member_name: String,
    pub mobile: String,
    pub message: String,
    pub whatsapp_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfReminderList {
    pub month: String,
    pub reminders: Vec<CsfReminder>,
    /// Unpaid members without a usable mobile
    pub without_mobile: Vec<String>,
}

/// Normalises `YYYY-MM`, `YYYY/MM`, `MM-YYYY`, `MM/YYYY` and `Mon YYYY`
/// (`Jan 2025`, `January-2025`) to `YYYY-MM`
pub fn normalize_month(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s
        .split(|c: char| c == '-' || c == '/' || c == ' ' || c == '.')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 2 {
        return None;
    }

    let numeric = |p: &str| p.parse::<u32>().ok();
    let (year, month) = match (numeric(parts[0]), numeric(parts[1])) {
        (Some(a), Some(b)) if parts[0].len() == 4 => (a, b),
        (Some(a), Some(b)) if parts[1].len() == 4 => (b, a),
        (None, Some(y)) if parts[1].len() == 4 => (y, month_from_name(parts[0])?),
        _ => return None,
    };

    if !(1..=12).contains(&month) || !(1900..=2999).contains(&year) {
        return None;
    }
    Some(format!("{:04}-{:02}", year, month))
}

fn month_from_name(name: &str) -> Option<u32> {
    const NAMES: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_lowercase();
    NAMES
        .iter()
        .position(|n| lower.starts_with(n))
        .map(|i| i as u32 + 1)
}
