use std::collections::HashMap;

use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a003_lottery_book::{
    BookFilter, BookListItem, BookListQuery, GenerateBooksResult, LotteryBook, TicketLookup,
};
use contracts::enums::PaymentStatus;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a002_lottery_event::repository as event_repository;
use crate::domain::a004_book_distribution::repository as distribution_repository;
use crate::domain::a005_payment_collection::repository as payment_repository;
use crate::shared::error::{AppError, AppResult};

/// Creates all books of the event; allowed exactly once
pub async fn generate(db: &DatabaseConnection, event: &LotteryEvent) -> AppResult<GenerateBooksResult> {
    let event_id = event.to_string_id();
    let txn = db.begin().await?;

    // Флаг перечитываем внутри транзакции
    let mut event = event_repository::get_by_id(&txn, &event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Lottery event not found"))?;
    if event.books_generated || repository::count_for_event(&txn, &event_id).await? > 0 {
        return Err(AppError::conflict("Books have already been generated for this event"));
    }
    event.validate().map_err(AppError::Validation)?;

    let books: Vec<(i32, i64, i64)> = (1..=event.total_books)
        .map(|n| {
            let (start, end) = event.ticket_range(n);
            (n, start, end)
        })
        .collect();
    repository::insert_many(&txn, &event_id, &books).await?;

    event.books_generated = true;
    event.before_write();
    event_repository::update(&txn, &event).await?;
    txn.commit().await?;

    tracing::info!(
        "Generated {} books for event {} (tickets {}..{})",
        books.len(),
        event.base.code,
        event.first_ticket_number,
        event.last_ticket_number()
    );

    Ok(GenerateBooksResult {
        generated: event.total_books,
        first_ticket: event.first_ticket_number,
        last_ticket: event.last_ticket_number(),
    })
}

/// Books with assignment and paid status, filtered
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    query: &BookListQuery,
) -> AppResult<Vec<BookListItem>> {
    let filter = match query.status.as_deref() {
        Some(code) => BookFilter::from_code(code)
            .ok_or_else(|| AppError::validation(format!("Unknown status filter '{}'", code)))?,
        None => BookFilter::All,
    };
    let event_id = event.to_string_id();
    let book_value = event.book_value();

    let books = repository::list_by_event(conn, &event_id).await?;
    let mut distributions: HashMap<String, _> = distribution_repository::list_by_event(conn, &event_id)
        .await?
        .into_iter()
        .map(|d| (d.book_id.clone(), d))
        .collect();
    let paid = payment_repository::totals_by_distribution(conn, &event_id).await?;

    let level_1 = query.level_1.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let search = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let items = books
        .into_iter()
        .map(|book| {
            let distribution = distributions.remove(&book.id);
            let totals = distribution
                .as_ref()
                .and_then(|d| paid.get(&d.id).copied())
                .unwrap_or_default();
            let status = distribution
                .as_ref()
                .map(|_| PaymentStatus::from_amounts(totals.total, book_value));
            BookListItem {
                book,
                distribution,
                paid_amount: totals.total,
                payment_count: totals.count,
                status,
            }
        })
        .filter(|item| filter.matches(item))
        .filter(|item| match level_1 {
            Some(value) => item
                .distribution
                .as_ref()
                .map_or(false, |d| d.level_1_value.eq_ignore_ascii_case(value)),
            None => true,
        })
        .filter(|item| match &search {
            Some(needle) => matches_search(item, needle),
            None => true,
        })
        .collect();
    Ok(items)
}

fn matches_search(item: &BookListItem, needle: &str) -> bool {
    if item.book.book_number.to_string() == needle {
        return true;
    }
    if let Ok(ticket) = needle.parse::<i64>() {
        if ticket >= item.book.start_ticket && ticket <= item.book.end_ticket {
            return true;
        }
    }
    item.distribution.as_ref().map_or(false, |d| {
        d.member_name.to_lowercase().contains(needle)
            || d.distribution_path.to_lowercase().contains(needle)
            || d.mobile.as_deref().map_or(false, |m| m.contains(needle))
    })
}

pub async fn get_for_event<C: ConnectionTrait>(conn: &C, event_id: &str, book_id: &str) -> AppResult<LotteryBook> {
    repository::get_by_id(conn, book_id)
        .await?
        .filter(|b| b.event_id == event_id)
        .ok_or_else(|| AppError::not_found("Book not found"))
}

/// Book (and holder) of a ticket number
pub async fn lookup_ticket<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    ticket_number: i64,
) -> AppResult<TicketLookup> {
    let book_number = event.book_number_for_ticket(ticket_number).ok_or_else(|| {
        AppError::validation(format!(
            "Ticket {} is outside this event ({}..{})",
            ticket_number,
            event.first_ticket_number,
            event.last_ticket_number()
        ))
    })?;
    let event_id = event.to_string_id();
    let book = repository::find_by_number(conn, &event_id, book_number)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {} has not been generated", book_number)))?;
    let distribution = distribution_repository::get_by_book(conn, &book.id).await?;
    Ok(TicketLookup {
        ticket_number,
        book,
        distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, seed_community, seed_event};

    #[tokio::test]
    async fn test_generate_once() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "books").await;
        let event = seed_event(&db, &c, false).await;

        let result = generate(&db, &event).await.unwrap();
        assert_eq!(result.generated, 20);
        assert_eq!(result.first_ticket, 1);
        assert_eq!(result.last_ticket, 200);
        assert!(matches!(generate(&db, &event).await, Err(AppError::Conflict(_))));

        let reloaded = event_repository::get_by_id(&db, &event.to_string_id())
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.books_generated);

        let books = repository::list_by_event(&db, &event.to_string_id()).await.unwrap();
        assert_eq!(books.len(), 20);
        assert_eq!((books[1].start_ticket, books[1].end_ticket), (11, 20));
    }

    #[tokio::test]
    async fn test_list_filters_and_lookup() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "filters").await;
        let event = seed_event(&db, &c, true).await;
        assign(&db, &event, 3, "A", "Ravi").await;

        let all = list(&db, &event, &BookListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 20);

        let unassigned = list(
            &db,
            &event,
            &BookListQuery { status: Some("unassigned".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(unassigned.len(), 19);

        let unpaid = list(
            &db,
            &event,
            &BookListQuery { status: Some("unpaid".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].book.book_number, 3);

        let found = list(
            &db,
            &event,
            &BookListQuery { search: Some("ravi".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);

        assert!(list(
            &db,
            &event,
            &BookListQuery { status: Some("bogus".into()), ..Default::default() },
        )
        .await
        .is_err());

        let lookup = lookup_ticket(&db, &event, 25).await.unwrap();
        assert_eq!(lookup.book.book_number, 3);
        assert_eq!(lookup.distribution.unwrap().member_name, "Ravi");
        assert!(lookup_ticket(&db, &event, 201).await.is_err());
    }
}
