use crate::enums::{PaymentMethod, PaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ledger row: money collected for one distributed book on one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCollection {
    pub id: String,
    pub event_id: String,
    pub distribution_id: String,
    pub amount_paid: f64,
    pub payment_date: NaiveDate,
    /// Date used for commission thresholds; falls back to `payment_date`
    pub commission_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub collected_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentCollection {
    pub fn effective_commission_date(&self) -> NaiveDate {
        self.commission_date.unwrap_or(self.payment_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentDto {
    pub amount_paid: f64,
    pub payment_date: NaiveDate,
    pub commission_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Pays the outstanding balance of a book in one go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidDto {
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Payment history of one distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionPayments {
    pub distribution_id: String,
    pub book_number: i32,
    pub member_name: String,
    pub book_value: f64,
    pub total_paid: f64,
    pub outstanding: f64,
    pub status: PaymentStatus,
    pub payments: Vec<PaymentCollection>,
}

/// Flat row used by the payments CSV and the level report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentExportRow {
    pub event_code: String,
    pub book_number: i32,
    pub member_name: String,
    pub distribution_path: String,
    pub amount_paid: f64,
    pub payment_date: NaiveDate,
    pub commission_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
}

/// Distribution whose payments exceed the book value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpaymentAuditRow {
    pub distribution_id: String,
    pub book_number: i32,
    pub member_name: String,
    pub book_value: f64,
    pub total_paid: f64,
    pub excess: f64,
}
