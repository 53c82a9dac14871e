use crate::shared::excel::ImportRowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Drawn prize with a snapshot of the book holder at recording time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotteryWinner {
    pub id: String,
    pub event_id: String,
    pub prize_rank: i32,
    pub prize_name: String,
    pub ticket_number: i64,
    pub book_id: Option<String>,
    pub book_number: Option<i32>,
    pub distribution_id: Option<String>,
    pub winner_name: String,
    pub mobile: Option<String>,
    pub distribution_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordWinnerDto {
    pub prize_rank: i32,
    pub prize_name: String,
    pub ticket_number: i64,
    /// Defaults to the member holding the ticket's book
    pub winner_name: Option<String>,
    pub mobile: Option<String>,
}

/// Outcome of a winners CSV upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WinnerImportResult {
    pub rows_read: usize,
    pub imported: usize,
    pub skipped: Vec<ImportRowError>,
}
