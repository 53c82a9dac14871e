use crate::domain::common::{AggregateId, BaseAggregate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

crate::uuid_id!(LotteryEventId);

pub const MAX_TICKETS_PER_BOOK: i32 = 1_000;
pub const MAX_TOTAL_BOOKS: i32 = 10_000;
pub const MAX_FIRST_TICKET_NUMBER: i64 = 1_000_000_000_000;

// ============================================================================
// Aggregate Root
// ============================================================================

/// Lottery fundraising event of one community
///
/// Book economics (`tickets_per_book`, `price_per_ticket`, `total_books`,
/// `first_ticket_number`) are frozen once books are generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryEvent {
    #[serde(flatten)]
    pub base: BaseAggregate<LotteryEventId>,

    pub community_id: String,
    pub tickets_per_book: i32,
    pub price_per_ticket: f64,
    pub total_books: i32,
    pub first_ticket_number: i64,
    pub draw_date: Option<NaiveDate>,

    #[serde(default)]
    pub books_generated: bool,

    pub created_by: Option<String>,
}

impl LotteryEvent {
    pub fn new_for_insert(community_id: String, dto: &LotteryEventDto, created_by: Option<String>) -> Self {
        let code = dto
            .code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| format!("LOT-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]));
        let mut base = BaseAggregate::new(LotteryEventId::new_v4(), code, dto.name.trim().to_string());
        base.comment = dto.description.clone();

        Self {
            base,
            community_id,
            tickets_per_book: dto.tickets_per_book,
            price_per_ticket: dto.price_per_ticket,
            total_books: dto.total_books,
            first_ticket_number: dto.first_ticket_number.unwrap_or(1),
            draw_date: dto.draw_date,
            books_generated: false,
            created_by,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Expected value of one fully paid book
    pub fn book_value(&self) -> f64 {
        self.tickets_per_book as f64 * self.price_per_ticket
    }

    pub fn total_tickets(&self) -> i64 {
        self.tickets_per_book as i64 * self.total_books as i64
    }

    pub fn last_ticket_number(&self) -> i64 {
        self.first_ticket_number
            .saturating_add(self.total_tickets())
            .saturating_sub(1)
    }

    pub fn contains_ticket(&self, ticket_number: i64) -> bool {
        ticket_number >= self.first_ticket_number && ticket_number <= self.last_ticket_number()
    }

    /// Ticket range `(start, end)` of a 1-based book number
    pub fn ticket_range(&self, book_number: i32) -> (i64, i64) {
        let per_book = self.tickets_per_book as i64;
        let start = (book_number as i64 - 1)
            .saturating_mul(per_book)
            .saturating_add(self.first_ticket_number);
        (start, start.saturating_add(per_book).saturating_sub(1))
    }

    /// Book number holding `ticket_number`, if it belongs to the event
    pub fn book_number_for_ticket(&self, ticket_number: i64) -> Option<i32> {
        if !self.contains_ticket(ticket_number) {
            return None;
        }
        let offset = ticket_number - self.first_ticket_number;
        Some((offset / self.tickets_per_book as i64) as i32 + 1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Event name cannot be empty".into());
        }
        if self.tickets_per_book <= 0 || self.tickets_per_book > MAX_TICKETS_PER_BOOK {
            return Err(format!(
                "Tickets per book must be between 1 and {}",
                MAX_TICKETS_PER_BOOK
            ));
        }
        if !(self.price_per_ticket > 0.0) {
            return Err("Price per ticket must be positive".into());
        }
        if self.total_books <= 0 || self.total_books > MAX_TOTAL_BOOKS {
            return Err(format!("Total books must be between 1 and {}", MAX_TOTAL_BOOKS));
        }
        if self.first_ticket_number < 0 || self.first_ticket_number > MAX_FIRST_TICKET_NUMBER {
            return Err(format!(
                "First ticket number must be between 0 and {}",
                MAX_FIRST_TICKET_NUMBER
            ));
        }
        Ok(())
    }

    /// Applies an edit; economics may only change before books exist
    pub fn update(&mut self, dto: &LotteryEventDto) -> Result<(), String> {
        let economics_changed = dto.tickets_per_book != self.tickets_per_book
            || (dto.price_per_ticket - self.price_per_ticket).abs() > f64::EPSILON
            || dto.total_books != self.total_books
            || dto
                .first_ticket_number
                .map_or(false, |n| n != self.first_ticket_number);

        if economics_changed && self.books_generated {
            return Err(
                "Tickets per book, price, total books and first ticket are fixed once books are generated"
                    .into(),
            );
        }

        if let Some(code) = dto.code.as_ref().filter(|c| !c.trim().is_empty()) {
            self.base.code = code.trim().to_string();
        }
        self.base.description = dto.name.trim().to_string();
        self.base.comment = dto.description.clone();
        self.draw_date = dto.draw_date;
        self.tickets_per_book = dto.tickets_per_book;
        self.price_per_ticket = dto.price_per_ticket;
        self.total_books = dto.total_books;
        if let Some(first) = dto.first_ticket_number {
            self.first_ticket_number = first;
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryEventDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub tickets_per_book: i32,
    pub price_per_ticket: f64,
    pub total_books: i32,
    pub first_ticket_number: Option<i64>,
    pub draw_date: Option<NaiveDate>,
}

/// Collection totals of an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    pub book_value: f64,
    pub total_books: i64,
    pub distributed_books: i64,
    pub returned_books: i64,
    pub extra_books: i64,
    pub expected_amount: f64,
    pub collected_amount: f64,
    pub outstanding_amount: f64,
    pub fully_paid_books: i64,
    pub partially_paid_books: i64,
    pub total_commission: f64,
    pub by_level_1: Vec<LevelOneSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelOneSummary {
    pub level_1_value: String,
    pub books: i64,
    pub expected_amount: f64,
    pub collected_amount: f64,
    pub commission: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> LotteryEventDto {
        LotteryEventDto {
            id: None,
            code: Some("DIWALI".into()),
            name: "Diwali Lottery".into(),
            description: None,
            tickets_per_book: 10,
            price_per_ticket: 50.0,
            total_books: 100,
            first_ticket_number: Some(1001),
            draw_date: None,
        }
    }

    #[test]
    fn test_ticket_arithmetic() {
        let event = LotteryEvent::new_for_insert("c".into(), &dto(), None);
        assert_eq!(event.book_value(), 500.0);
        assert_eq!(event.ticket_range(1), (1001, 1010));
        assert_eq!(event.ticket_range(3), (1021, 1030));
        assert_eq!(event.last_ticket_number(), 1001 + 1000 - 1);
        assert_eq!(event.book_number_for_ticket(1001), Some(1));
        assert_eq!(event.book_number_for_ticket(1010), Some(1));
        assert_eq!(event.book_number_for_ticket(1011), Some(2));
        assert_eq!(event.book_number_for_ticket(1000), None);
        assert_eq!(event.book_number_for_ticket(2001), None);
    }

    #[test]
    fn test_economics_frozen_after_generation() {
        let mut event = LotteryEvent::new_for_insert("c".into(), &dto(), None);
        event.books_generated = true;

        let mut rename = dto();
        rename.name = "Renamed".into();
        assert!(event.update(&rename).is_ok());
        assert_eq!(event.base.description, "Renamed");

        let mut reprice = dto();
        reprice.price_per_ticket = 60.0;
        assert!(event.update(&reprice).is_err());
        assert_eq!(event.price_per_ticket, 50.0);
    }

    #[test]
    fn test_validate() {
        let mut bad = dto();
        bad.tickets_per_book = 0;
        assert!(LotteryEvent::new_for_insert("c".into(), &bad, None).validate().is_err());

        let mut bad = dto();
        bad.price_per_ticket = 0.0;
        assert!(LotteryEvent::new_for_insert("c".into(), &bad, None).validate().is_err());

        assert!(LotteryEvent::new_for_insert("c".into(), &dto(), None).validate().is_ok());
    }

    #[test]
    fn test_first_ticket_number_bounded() {
        let mut huge = dto();
        huge.first_ticket_number = Some(i64::MAX - 100);
        let event = LotteryEvent::new_for_insert("c".into(), &huge, None);
        assert!(event.validate().is_err());
        // Диапазоны не переполняются даже для невалидного события
        assert_eq!(event.ticket_range(100).1, i64::MAX - 1);
        assert_eq!(event.last_ticket_number(), i64::MAX - 1);

        let mut negative = dto();
        negative.first_ticket_number = Some(-1);
        assert!(LotteryEvent::new_for_insert("c".into(), &negative, None).validate().is_err());

        let mut edge = dto();
        edge.first_ticket_number = Some(MAX_FIRST_TICKET_NUMBER);
        let event = LotteryEvent::new_for_insert("c".into(), &edge, None);
        assert!(event.validate().is_ok());
        assert_eq!(event.ticket_range(100), (MAX_FIRST_TICKET_NUMBER + 990, MAX_FIRST_TICKET_NUMBER + 999));
    }
}
