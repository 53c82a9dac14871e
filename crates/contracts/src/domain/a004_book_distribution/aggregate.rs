use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Assignment of a book to a member at a position in the level hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookDistribution {
    pub id: String,
    pub event_id: String,
    pub book_id: String,
    pub book_number: i32,
    /// Flattened hierarchy, e.g. "Wing A > Floor 1 > 101"
    pub distribution_path: String,
    /// First segment of the path; commission reports group by it
    pub level_1_value: String,
    pub member_name: String,
    pub mobile: Option<String>,
    pub is_extra_book: bool,
    pub is_returned: bool,
    pub notes: Option<String>,
    pub distributed_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assign or re-assign a book.
///
/// The position is given either as level value ids (one per level, top
/// down) or as plain value names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignBookDto {
    #[serde(default)]
    pub level_value_ids: Vec<String>,
    #[serde(default)]
    pub level_values: Vec<String>,
    pub member_name: String,
    pub mobile: Option<String>,
    #[serde(default)]
    pub is_extra_book: bool,
    pub notes: Option<String>,
    pub distributed_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnBookDto {
    pub is_returned: bool,
}
