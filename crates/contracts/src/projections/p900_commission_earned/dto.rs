use crate::enums::CommissionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Derived commission row, one per (distribution, type, payment date)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionEarned {
    pub id: String,
    pub event_id: String,
    pub distribution_id: String,
    pub commission_type: CommissionType,
    pub payment_date: NaiveDate,
    pub commission_date: NaiveDate,
    pub payment_amount: f64,
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub level_1_value: String,
    pub book_number: i32,
    pub member_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelOneCommission {
    pub level_1_value: String,
    pub early: f64,
    pub standard: f64,
    pub extra_books: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionReport {
    pub event_id: String,
    pub rows: Vec<CommissionEarned>,
    pub by_level_1: Vec<LevelOneCommission>,
    pub total_early: f64,
    pub total_standard: f64,
    pub total_extra_books: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCommissionsDto {
    pub confirmation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionSyncResult {
    pub payments_processed: usize,
    pub rows_written: usize,
    pub rows_deleted: u64,
}
