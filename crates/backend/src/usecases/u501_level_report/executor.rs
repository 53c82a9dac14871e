use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a004_book_distribution::{AssignBookDto, BookDistribution, ReturnBookDto};
use contracts::enums::PaymentMethod;
use contracts::shared::excel::{ExcelData, ImportRowError};
use contracts::usecases::u501_level_report::*;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::BTreeSet;

use crate::domain::a002_lottery_event::levels;
use crate::domain::a003_lottery_book::repository as book_repository;
use crate::domain::a004_book_distribution::{repository as distribution_repository, service as distribution_service};
use crate::domain::a005_payment_collection::service as payment_service;
use crate::projections::p900_commission_earned::service as commission_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::tabular::{csv_to_rows, field, is_blank, report_malformed, TableRow};
use crate::shared::text::{parse_amount, parse_date};

/// What one report row asks for after it was matched to a book
enum RowOutcome {
    Nothing,
    Returned,
    Paid(String),
}

/// Excel cells sometimes carry book numbers as "12.0"
fn parse_book_number(raw: &str) -> Option<i32> {
    let value = raw.trim().parse::<f64>().ok()?;
    if value.fract() != 0.0 || value < 1.0 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

fn is_returned_flag(raw: Option<&str>) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("returned") || v.trim().eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

/// Errors the caller can fix in the file end up in `skipped`; anything else aborts
fn row_error(err: AppError) -> AppResult<String> {
    match err {
        AppError::Validation(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => Ok(msg),
        other => Err(other),
    }
}

async fn import_row<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    level_names: &[String],
    row: &TableRow,
    result: &mut LevelReportImportResult,
) -> AppResult<RowOutcome> {
    let event_id = event.to_string_id();
    let book_number = field(row, COL_BOOK_NUMBER)
        .and_then(parse_book_number)
        .ok_or_else(|| AppError::validation("Book Number is missing or not a number"))?;
    let book = book_repository::find_by_number(conn, &event_id, book_number)
        .await?
        .ok_or_else(|| AppError::validation(format!("Book {} does not exist in this event", book_number)))?;

    let distribution: BookDistribution = match distribution_repository::get_by_book(conn, &book.id).await? {
        Some(d) => d,
        None => {
            let Some(member_name) = field(row, COL_MEMBER_NAME) else {
                if field(row, COL_PAYMENT_AMOUNT).is_some() {
                    return Err(AppError::validation(format!(
                        "Book {} is not distributed and the row has no member name",
                        book_number
                    )));
                }
                return Ok(RowOutcome::Nothing);
            };
            let level_values = level_names
                .iter()
                .map(|name| field(row, name).unwrap_or_default().to_string())
                .collect();
            let dto = AssignBookDto {
                level_values,
                member_name: member_name.to_string(),
                mobile: field(row, COL_MOBILE).map(String::from),
                ..Default::default()
            };
            let created = distribution_service::assign(conn, event, &book.id, dto, true).await?;
            result.distributions_created += 1;
            created
        }
    };

    if is_returned_flag(field(row, COL_RETURN_STATUS)) {
        if !distribution.is_returned {
            distribution_service::set_returned(conn, event, &distribution.id, ReturnBookDto { is_returned: true })
                .await?;
            result.books_returned += 1;
        }
        return Ok(RowOutcome::Returned);
    }

    let amount = match field(row, COL_PAYMENT_AMOUNT) {
        None => return Ok(RowOutcome::Nothing),
        Some(raw) => parse_amount(raw)
            .ok_or_else(|| AppError::validation(format!("Payment Amount '{}' is not a number", raw)))?,
    };
    if amount <= 0.0 {
        return Ok(RowOutcome::Nothing);
    }
    if distribution.is_returned {
        return Err(AppError::conflict(format!(
            "Book {} was returned and cannot take payments",
            book_number
        )));
    }

    let payment_date = field(row, COL_PAYMENT_DATE)
        .and_then(parse_date)
        .ok_or_else(|| AppError::validation("Payment Date is missing or not a date"))?;
    let commission_date = match field(row, COL_COMMISSION_DATE) {
        None => None,
        Some(raw) => Some(
            parse_date(raw)
                .ok_or_else(|| AppError::validation(format!("Commission Date '{}' is not a date", raw)))?,
        ),
    };
    let method = field(row, COL_PAYMENT_METHOD)
        .and_then(PaymentMethod::parse_loose)
        .unwrap_or_default();

    payment_service::upsert_imported(conn, event, &distribution, amount, payment_date, commission_date, method)
        .await?;
    result.payments_upserted += 1;
    Ok(RowOutcome::Paid(distribution.id))
}

/// Applies a filled-in level report.
///
/// Every row runs inside its own savepoint, so a rejected row leaves no
/// partial writes behind while the accepted rows commit together.
pub async fn import_rows(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    rows: &[TableRow],
) -> AppResult<LevelReportImportResult> {
    let event_id = event.to_string_id();
    let mut result = LevelReportImportResult {
        rows_read: rows.len(),
        ..Default::default()
    };

    let level_names: Vec<String> = levels::list_levels(db, &event_id)
        .await?
        .into_iter()
        .map(|l| l.level_name)
        .collect();

    let txn = db.begin().await?;
    let mut touched: BTreeSet<String> = BTreeSet::new();
    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 2;
        if is_blank(row) {
            continue;
        }
        let savepoint = txn.begin().await?;
        let mut row_result = LevelReportImportResult::default();
        match import_row(&savepoint, event, &level_names, row, &mut row_result).await {
            Ok(outcome) => {
                savepoint.commit().await?;
                result.payments_upserted += row_result.payments_upserted;
                result.distributions_created += row_result.distributions_created;
                result.books_returned += row_result.books_returned;
                if let RowOutcome::Paid(distribution_id) = outcome {
                    touched.insert(distribution_id);
                }
            }
            Err(err) => {
                savepoint.rollback().await?;
                let reason = row_error(err)?;
                tracing::debug!("Level report row {} skipped: {}", row_no, reason);
                result.skipped.push(ImportRowError::new(row_no, reason));
            }
        }
    }

    if !touched.is_empty() {
        let ids: Vec<String> = touched.into_iter().collect();
        let sync = commission_service::resync_distributions(&txn, &event_id, &ids).await?;
        result.commissions_written = sync.rows_written;
    }
    txn.commit().await?;

    tracing::info!(
        "Level report imported for {}: {} rows, {} payments, {} new distributions, {} returned, {} skipped",
        event.base.code,
        result.rows_read,
        result.payments_upserted,
        result.distributions_created,
        result.books_returned,
        result.skipped.len()
    );
    Ok(result)
}

/// Workbook parsed on the client
pub async fn import_excel(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    data: &ExcelData,
) -> AppResult<LevelReportImportResult> {
    tracing::info!(
        "Importing level report '{}' ({} rows)",
        data.metadata.file_name,
        data.rows.len()
    );
    import_rows(db, event, &data.rows).await
}

pub async fn import_csv(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    csv_text: &str,
) -> AppResult<LevelReportImportResult> {
    let table = csv_to_rows(csv_text).map_err(|e| AppError::validation(e.to_string()))?;
    let mut result = import_rows(db, event, &table.rows).await?;
    report_malformed(&mut result.skipped, table.malformed);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_payment_collection::repository as payment_repository;
    use crate::projections::p900_commission_earned::repository as commission_repository;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, enable_early, seed_community, seed_event};
    use chrono::NaiveDate;
    use maplit::hashmap;

    #[test]
    fn test_parse_book_number() {
        assert_eq!(parse_book_number("12"), Some(12));
        assert_eq!(parse_book_number("12.0"), Some(12));
        assert_eq!(parse_book_number("12.5"), None);
        assert_eq!(parse_book_number("0"), None);
        assert_eq!(parse_book_number("abc"), None);
    }

    #[tokio::test]
    async fn test_import_report_rows() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "imp").await;
        let event = seed_event(&db, &c, true).await;
        let event_id = event.to_string_id();
        enable_early(&db, &event, 10.0, NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()).await;
        let ravi = assign(&db, &event, 1, "A", "Ravi").await;
        assign(&db, &event, 3, "A", "Sunil").await;

        let rows: Vec<TableRow> = vec![
            hashmap! {
                "Book Number".to_string() => "1".to_string(),
                "Payment Amount".to_string() => "300".to_string(),
                "Payment Date".to_string() => "01/10/2024".to_string(),
                "Payment Method".to_string() => "UPI".to_string(),
            },
            hashmap! {
                "Book Number".to_string() => "2".to_string(),
                "Wing".to_string() => "C".to_string(),
                "Member Name".to_string() => "Kavya".to_string(),
                "Payment Amount".to_string() => "500".to_string(),
                "Payment Date".to_string() => "2024-10-02".to_string(),
            },
            hashmap! {
                "Book Number".to_string() => "3".to_string(),
                "Return Status".to_string() => "Returned".to_string(),
            },
            hashmap! {
                "Book Number".to_string() => "99".to_string(),
                "Payment Amount".to_string() => "100".to_string(),
            },
            hashmap! {
                "Book Number".to_string() => "1".to_string(),
                "Payment Amount".to_string() => "400".to_string(),
                "Payment Date".to_string() => "03-10-2024".to_string(),
            },
            hashmap! {
                "Book Number".to_string() => "4".to_string(),
                "Payment Amount".to_string() => "100".to_string(),
            },
            TableRow::new(),
        ];

        let result = import_rows(&db, &event, &rows).await.unwrap();
        assert_eq!(result.rows_read, 7);
        assert_eq!(result.payments_upserted, 2);
        assert_eq!(result.distributions_created, 1);
        assert_eq!(result.books_returned, 1);
        assert_eq!(result.commissions_written, 2);
        let skipped_rows: Vec<usize> = result.skipped.iter().map(|s| s.row).collect();
        assert_eq!(skipped_rows, vec![5, 6, 7]);

        let payments = payment_repository::list_by_distribution(&db, &ravi.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].payment_method, PaymentMethod::Upi);

        let kavya = distribution_repository::list_by_event(&db, &event_id)
            .await
            .unwrap()
            .into_iter()
            .find(|d| d.member_name == "Kavya")
            .unwrap();
        assert_eq!(kavya.level_1_value, "C");

        let commissions = commission_repository::list_by_event(&db, &event_id).await.unwrap();
        assert_eq!(commissions.len(), 2);
        let total: f64 = commissions.iter().map(|c| c.commission_amount).sum();
        assert!((total - 80.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_reimport_overwrites_same_day() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "imp2").await;
        let event = seed_event(&db, &c, true).await;
        let d = assign(&db, &event, 5, "B", "Latha").await;

        let csv = "Book Number,Payment Amount,Payment Date\n5,200,2024-10-01\n";
        import_csv(&db, &event, csv).await.unwrap();
        let csv = "Book Number,Payment Amount,Payment Date\n5,250,2024-10-01\n";
        let result = import_csv(&db, &event, csv).await.unwrap();
        assert!(result.skipped.is_empty());

        let payments = payment_repository::list_by_distribution(&db, &d.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_paid, 250.0);
    }
}
