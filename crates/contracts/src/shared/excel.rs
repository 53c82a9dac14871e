use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Workbook sheet parsed on the client: every row maps header -> cell text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelData {
    pub metadata: ExcelMetadata,
    pub rows: Vec<HashMap<String, String>>,
    #[serde(default)]
    pub column_mapping: Vec<ColumnMapping>,
    #[serde(default)]
    pub file_headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelMetadata {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub expected: String,
    pub found: Option<String>,
    pub file_index: Option<usize>,
}

/// Row that an import skipped; `row` is 1-based and counts the header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRowError {
    pub row: usize,
    pub reason: String,
}

impl ImportRowError {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}
