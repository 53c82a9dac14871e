use chrono::Utc;
use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a007_lottery_winner::{LotteryWinner, RecordWinnerDto, WinnerImportResult};
use contracts::shared::excel::ImportRowError;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a003_lottery_book::repository as book_repository;
use crate::domain::a004_book_distribution::repository as distribution_repository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::tabular::{csv_to_rows, field, is_blank};
use crate::shared::text::{clean_mobile, sanitize_opt, sanitize_text};

/// Records a prize; the holder of the ticket's book is captured as of now
pub async fn record<C: ConnectionTrait>(conn: &C, event: &LotteryEvent, dto: RecordWinnerDto) -> AppResult<LotteryWinner> {
    let event_id = event.to_string_id();
    let prize_name = sanitize_text(&dto.prize_name);
    if prize_name.is_empty() {
        return Err(AppError::validation("Prize name is required"));
    }
    if dto.prize_rank < 1 {
        return Err(AppError::validation("Prize rank must be 1 or more"));
    }
    let book_number = event.book_number_for_ticket(dto.ticket_number).ok_or_else(|| {
        AppError::validation(format!(
            "Ticket {} does not belong to this event ({}..{})",
            dto.ticket_number,
            event.first_ticket_number,
            event.last_ticket_number()
        ))
    })?;

    let existing = repository::list_by_event(conn, &event_id).await?;
    if existing.iter().any(|w| w.prize_rank == dto.prize_rank) {
        return Err(AppError::conflict(format!("Prize rank {} is already recorded", dto.prize_rank)));
    }
    if existing.iter().any(|w| w.ticket_number == dto.ticket_number) {
        return Err(AppError::conflict(format!("Ticket {} has already won", dto.ticket_number)));
    }

    let book = book_repository::find_by_number(conn, &event_id, book_number).await?;
    let distribution = match &book {
        Some(b) => distribution_repository::get_by_book(conn, &b.id).await?,
        None => None,
    };

    let winner_name = sanitize_opt(dto.winner_name.as_deref())
        .or_else(|| distribution.as_ref().map(|d| d.member_name.clone()))
        .ok_or_else(|| AppError::validation("Winner name is required for an undistributed ticket"))?;
    let mobile = clean_mobile(dto.mobile.as_deref()).or_else(|| distribution.as_ref().and_then(|d| d.mobile.clone()));

    let winner = LotteryWinner {
        id: uuid::Uuid::new_v4().to_string(),
        event_id,
        prize_rank: dto.prize_rank,
        prize_name,
        ticket_number: dto.ticket_number,
        book_id: book.as_ref().map(|b| b.id.clone()),
        book_number: book.as_ref().map(|b| b.book_number),
        distribution_id: distribution.as_ref().map(|d| d.id.clone()),
        winner_name,
        mobile,
        distribution_path: distribution.map(|d| d.distribution_path),
        created_at: Utc::now(),
    };
    repository::insert(conn, &winner).await?;
    tracing::info!(
        "Prize {} ({}) recorded for ticket {}",
        winner.prize_rank,
        winner.prize_name,
        winner.ticket_number
    );
    Ok(winner)
}

pub async fn list<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<Vec<LotteryWinner>> {
    Ok(repository::list_by_event(conn, &event.to_string_id()).await?)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, event: &LotteryEvent, winner_id: &str) -> AppResult<()> {
    let winner = repository::get_by_id(conn, winner_id)
        .await?
        .filter(|w| w.event_id == event.to_string_id())
        .ok_or_else(|| AppError::not_found("Winner not found"))?;
    repository::delete(conn, &winner.id).await?;
    Ok(())
}

pub const WINNER_CSV_HEADERS: [&str; 7] = [
    "prize_rank",
    "prize_name",
    "ticket_number",
    "book_number",
    "winner_name",
    "mobile",
    "distribution_path",
];

pub async fn export_csv<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<String> {
    let winners = list(conn, event).await?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(WINNER_CSV_HEADERS).map_err(anyhow::Error::from)?;
    for w in &winners {
        writer
            .write_record([
                w.prize_rank.to_string(),
                w.prize_name.clone(),
                w.ticket_number.to_string(),
                w.book_number.map(|n| n.to_string()).unwrap_or_default(),
                w.winner_name.clone(),
                w.mobile.clone().unwrap_or_default(),
                w.distribution_path.clone().unwrap_or_default(),
            ])
            .map_err(anyhow::Error::from)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("csv flush failed: {}", e))?;
    Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
}

/// Imports winners from CSV in one transaction; bad rows are skipped and reported
pub async fn import_csv(db: &DatabaseConnection, event: &LotteryEvent, csv_text: &str) -> AppResult<WinnerImportResult> {
    let table = csv_to_rows(csv_text).map_err(|e| AppError::validation(e.to_string()))?;
    let rows = table.rows;
    let mut result = WinnerImportResult {
        rows_read: rows.len(),
        skipped: table.malformed,
        ..Default::default()
    };

    let txn = db.begin().await?;
    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 2;
        if is_blank(row) {
            continue;
        }
        let rank = field(row, "prize_rank").and_then(|v| v.parse::<i32>().ok());
        let ticket = field(row, "ticket_number").and_then(|v| v.parse::<i64>().ok());
        let (Some(prize_rank), Some(ticket_number)) = (rank, ticket) else {
            result
                .skipped
                .push(ImportRowError::new(row_no, "prize_rank and ticket_number must be numbers"));
            continue;
        };
        let dto = RecordWinnerDto {
            prize_rank,
            prize_name: field(row, "prize_name").unwrap_or_default().to_string(),
            ticket_number,
            winner_name: field(row, "winner_name").map(String::from),
            mobile: field(row, "mobile").map(String::from),
        };
        match record(&txn, event, dto).await {
            Ok(_) => result.imported += 1,
            Err(AppError::Validation(msg)) | Err(AppError::Conflict(msg)) => {
                result.skipped.push(ImportRowError::new(row_no, msg))
            }
            Err(other) => return Err(other),
        }
    }
    txn.commit().await?;
    result.skipped.sort_by_key(|e| e.row);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, seed_community, seed_event};

    fn dto(rank: i32, ticket: i64) -> RecordWinnerDto {
        RecordWinnerDto {
            prize_rank: rank,
            prize_name: format!("Prize {}", rank),
            ticket_number: ticket,
            winner_name: None,
            mobile: None,
        }
    }

    #[tokio::test]
    async fn test_record_rules() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "win").await;
        let event = seed_event(&db, &c, true).await;
        assign(&db, &event, 2, "A", "Ravi").await;

        let w = record(&db, &event, dto(1, 15)).await.unwrap();
        assert_eq!(w.winner_name, "Ravi");
        assert_eq!(w.book_number, Some(2));
        assert_eq!(w.distribution_path.as_deref(), Some("A"));

        assert!(matches!(record(&db, &event, dto(1, 16)).await, Err(AppError::Conflict(_))));
        assert!(matches!(record(&db, &event, dto(2, 15)).await, Err(AppError::Conflict(_))));
        assert!(matches!(record(&db, &event, dto(2, 999)).await, Err(AppError::Validation(_))));
        // Нераспределённый билет требует имени
        assert!(record(&db, &event, dto(2, 55)).await.is_err());
        let mut named = dto(2, 55);
        named.winner_name = Some("Walk-in".into());
        assert_eq!(record(&db, &event, named).await.unwrap().distribution_id, None);

        delete(&db, &event, &w.id).await.unwrap();
        assert_eq!(list(&db, &event).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_csv_export_import() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "wincsv").await;
        let event = seed_event(&db, &c, true).await;
        assign(&db, &event, 1, "B", "Sita").await;

        let csv = "prize_rank,prize_name,ticket_number,winner_name\n1,TV,3,\n2,Fan,500,Someone\nx,Bad,1,\n3,Cycle,3,\n";
        let result = import_csv(&db, &event, csv).await.unwrap();
        assert_eq!(result.rows_read, 4);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped.len(), 3);
        assert_eq!(result.skipped[0].row, 3);

        let exported = export_csv(&db, &event).await.unwrap();
        assert!(exported.starts_with("prize_rank,prize_name,ticket_number"));
        assert!(exported.contains("1,TV,3,1,Sita"));
    }
}
