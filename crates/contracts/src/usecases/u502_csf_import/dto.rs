use crate::shared::excel::ImportRowError;
use serde::{Deserialize, Serialize};

pub const COL_FLAT_NUMBER: &str = "Flat Number";
pub const COL_MEMBER_NAME: &str = "Member Name";
pub const COL_MOBILE: &str = "Mobile";
pub const COL_MONTH: &str = "Month";
pub const COL_AMOUNT: &str = "Amount";
pub const COL_PAYMENT_DATE: &str = "Payment Date";
pub const COL_PAYMENT_METHOD: &str = "Payment Method";
pub const COL_NOTES: &str = "Notes";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsfImportResult {
    pub rows_read: usize,
    pub imported: usize,
    /// Members created from rows whose flat was not on the roll yet
    pub members_created: usize,
    pub duplicates_in_file: Vec<ImportRowError>,
    pub duplicates_in_db: Vec<ImportRowError>,
    pub errors: Vec<ImportRowError>,
}
