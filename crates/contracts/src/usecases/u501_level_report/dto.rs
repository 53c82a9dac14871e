use crate::shared::excel::ImportRowError;
use serde::{Deserialize, Serialize};

pub const REPORT_SHEET: &str = "Level Report";
pub const MULTIPLE_PAYMENTS_SHEET: &str = "Multiple Payments";

pub const COL_SR_NO: &str = "Sr No";
pub const COL_MEMBER_NAME: &str = "Member Name";
pub const COL_MOBILE: &str = "Mobile";
pub const COL_BOOK_NUMBER: &str = "Book Number";
pub const COL_PAYMENT_AMOUNT: &str = "Payment Amount";
pub const COL_PAYMENT_DATE: &str = "Payment Date";
pub const COL_COMMISSION_DATE: &str = "Commission Date";
pub const COL_PAYMENT_STATUS: &str = "Payment Status";
pub const COL_PAYMENT_METHOD: &str = "Payment Method";
pub const COL_RETURN_STATUS: &str = "Return Status";

/// Outcome of importing a filled-in level report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelReportImportResult {
    pub rows_read: usize,
    pub payments_upserted: usize,
    pub distributions_created: usize,
    pub books_returned: usize,
    pub commissions_written: usize,
    pub skipped: Vec<ImportRowError>,
}
