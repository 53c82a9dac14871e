use crate::domain::a004_book_distribution::BookDistribution;
use crate::enums::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One physical ticket book of an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotteryBook {
    pub id: String,
    pub event_id: String,
    pub book_number: i32,
    pub start_ticket: i64,
    pub end_ticket: i64,
    pub created_at: DateTime<Utc>,
}

/// Book row of the books page: assignment and derived paid status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookListItem {
    #[serde(flatten)]
    pub book: LotteryBook,
    pub distribution: Option<BookDistribution>,
    pub paid_amount: f64,
    pub payment_count: i64,
    /// None for books that are not distributed
    pub status: Option<PaymentStatus>,
}

/// Status filter of the books list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookFilter {
    All,
    Unassigned,
    Assigned,
    Returned,
    Unpaid,
    Partial,
    Paid,
}

impl BookFilter {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "" | "all" => Some(BookFilter::All),
            "unassigned" | "available" => Some(BookFilter::Unassigned),
            "assigned" | "distributed" => Some(BookFilter::Assigned),
            "returned" => Some(BookFilter::Returned),
            "unpaid" => Some(BookFilter::Unpaid),
            "partial" => Some(BookFilter::Partial),
            "paid" => Some(BookFilter::Paid),
            _ => None,
        }
    }

    pub fn matches(&self, item: &BookListItem) -> bool {
        let returned = item.distribution.as_ref().map_or(false, |d| d.is_returned);
        match self {
            BookFilter::All => true,
            BookFilter::Unassigned => item.distribution.is_none(),
            BookFilter::Assigned => item.distribution.is_some() && !returned,
            BookFilter::Returned => returned,
            BookFilter::Unpaid => !returned && item.status == Some(PaymentStatus::Unpaid),
            BookFilter::Partial => item.status == Some(PaymentStatus::Partial),
            BookFilter::Paid => item.status == Some(PaymentStatus::Paid),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookListQuery {
    pub status: Option<String>,
    pub level_1: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBooksResult {
    pub generated: i32,
    pub first_ticket: i64,
    pub last_ticket: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketLookup {
    pub ticket_number: i64,
    pub book: LotteryBook,
    pub distribution: Option<BookDistribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(distribution: Option<BookDistribution>, status: Option<PaymentStatus>) -> BookListItem {
        BookListItem {
            book: LotteryBook {
                id: "b".into(),
                event_id: "e".into(),
                book_number: 1,
                start_ticket: 1,
                end_ticket: 10,
                created_at: Utc::now(),
            },
            distribution,
            paid_amount: 0.0,
            payment_count: 0,
            status,
        }
    }

    fn distribution(is_returned: bool) -> BookDistribution {
        BookDistribution {
            id: "d".into(),
            event_id: "e".into(),
            book_id: "b".into(),
            book_number: 1,
            distribution_path: "A > 1".into(),
            level_1_value: "A".into(),
            member_name: "Ravi".into(),
            mobile: None,
            is_extra_book: false,
            is_returned,
            notes: None,
            distributed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_codes_and_matching() {
        assert_eq!(BookFilter::from_code(""), Some(BookFilter::All));
        assert_eq!(BookFilter::from_code("Paid"), Some(BookFilter::Paid));
        assert_eq!(BookFilter::from_code("bogus"), None);

        let free = item(None, None);
        let returned = item(Some(distribution(true)), Some(PaymentStatus::Unpaid));
        let partial = item(Some(distribution(false)), Some(PaymentStatus::Partial));

        assert!(BookFilter::Unassigned.matches(&free));
        assert!(!BookFilter::Unassigned.matches(&partial));
        assert!(BookFilter::Returned.matches(&returned));
        assert!(!BookFilter::Unpaid.matches(&returned));
        assert!(BookFilter::Partial.matches(&partial));
        assert!(BookFilter::Assigned.matches(&partial));
    }
}
