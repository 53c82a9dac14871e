use contracts::domain::a002_lottery_event::levels::split_path;
use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a005_payment_collection::PaymentCollection;
use contracts::enums::PaymentStatus;
use contracts::usecases::u501_level_report::*;
use sea_orm::ConnectionTrait;
use std::collections::HashMap;

use crate::domain::a002_lottery_event::levels;
use crate::domain::a003_lottery_book::repository as book_repository;
use crate::domain::a004_book_distribution::repository as distribution_repository;
use crate::domain::a005_payment_collection::repository as payment_repository;
use crate::shared::error::AppResult;
use crate::shared::text::round2;
use crate::shared::xlsx::{Cell, Sheet, Workbook};

fn date_cell(date: Option<chrono::NaiveDate>) -> Cell {
    date.map(|d| d.format("%Y-%m-%d").to_string()).into()
}

/// Level-wise report: one row per book, payments folded into the latest day.
///
/// Books with several payment days also appear on the "Multiple Payments"
/// sheet, one row per payment.
pub async fn build_workbook<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<Workbook> {
    let event_id = event.to_string_id();
    let level_names: Vec<String> = levels::list_levels(conn, &event_id)
        .await?
        .into_iter()
        .map(|l| l.level_name)
        .collect();
    let books = book_repository::list_by_event(conn, &event_id).await?;
    let distributions: HashMap<String, _> = distribution_repository::list_by_event(conn, &event_id)
        .await?
        .into_iter()
        .map(|d| (d.book_id.clone(), d))
        .collect();

    // list_by_event is chronological, so the last entry is the latest day
    let mut payments: HashMap<String, Vec<PaymentCollection>> = HashMap::new();
    for p in payment_repository::list_by_event(conn, &event_id).await? {
        payments.entry(p.distribution_id.clone()).or_default().push(p);
    }

    let mut headers: Vec<&str> = vec![COL_SR_NO];
    headers.extend(level_names.iter().map(String::as_str));
    headers.extend([
        COL_MEMBER_NAME,
        COL_MOBILE,
        COL_BOOK_NUMBER,
        COL_PAYMENT_AMOUNT,
        COL_PAYMENT_DATE,
        COL_COMMISSION_DATE,
        COL_PAYMENT_STATUS,
        COL_PAYMENT_METHOD,
        COL_RETURN_STATUS,
    ]);
    let mut report = Sheet::new(REPORT_SHEET, &headers);
    let mut multiple = Sheet::new(
        MULTIPLE_PAYMENTS_SHEET,
        &[
            COL_BOOK_NUMBER,
            COL_MEMBER_NAME,
            "Payment #",
            "Amount",
            COL_PAYMENT_DATE,
            COL_COMMISSION_DATE,
            "Method",
        ],
    );

    for (idx, book) in books.iter().enumerate() {
        let mut row: Vec<Cell> = vec![Cell::Number((idx + 1) as f64)];
        let Some(dist) = distributions.get(&book.id) else {
            row.extend(level_names.iter().map(|_| Cell::Empty));
            row.extend([Cell::Empty, Cell::Empty, book.book_number.into()]);
            row.extend(std::iter::repeat(Cell::Empty).take(6));
            report.push(row);
            continue;
        };

        let segments = split_path(&dist.distribution_path);
        row.extend((0..level_names.len()).map(|i| Cell::from(segments.get(i).cloned())));
        row.extend([
            Cell::from(dist.member_name.clone()),
            Cell::from(dist.mobile.clone()),
            book.book_number.into(),
        ]);

        let book_payments = payments.get(&dist.id).map(Vec::as_slice).unwrap_or(&[]);
        let paid = round2(book_payments.iter().map(|p| p.amount_paid).sum());
        let status = PaymentStatus::from_amounts(paid, event.book_value());
        match book_payments.last() {
            Some(latest) => row.extend([
                Cell::Number(latest.amount_paid),
                date_cell(Some(latest.payment_date)),
                date_cell(latest.commission_date),
                status.display_name().into(),
                latest.payment_method.display_name().into(),
            ]),
            None => row.extend([
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                status.display_name().into(),
                Cell::Empty,
            ]),
        }
        row.push(if dist.is_returned { "Returned".into() } else { Cell::Empty });
        report.push(row);

        if book_payments.len() > 1 {
            for (n, p) in book_payments.iter().enumerate() {
                multiple.push(vec![
                    book.book_number.into(),
                    dist.member_name.clone().into(),
                    Cell::Number((n + 1) as f64),
                    Cell::Number(p.amount_paid),
                    date_cell(Some(p.payment_date)),
                    date_cell(p.commission_date),
                    p.payment_method.display_name().into(),
                ]);
            }
        }
    }

    let mut workbook = Workbook::new();
    workbook.add_sheet(report);
    if multiple.rows.len() > 1 {
        workbook.add_sheet(multiple);
    }
    Ok(workbook)
}

pub async fn export_xlsx<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<Vec<u8>> {
    let workbook = build_workbook(conn, event).await?;
    Ok(workbook.to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_payment_collection::service as payment_service;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, payment, seed_community, seed_event};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_report_layout() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "rep").await;
        let event = seed_event(&db, &c, true).await;
        let d1 = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();

        let one = assign(&db, &event, 1, "A", "Ravi").await;
        let two = assign(&db, &event, 2, "B", "Meena").await;
        payment_service::record(&db, &event, &one.id, payment(500.0, d1), None).await.unwrap();
        payment_service::record(&db, &event, &two.id, payment(100.0, d1), None).await.unwrap();
        payment_service::record(&db, &event, &two.id, payment(150.0, d2), None).await.unwrap();

        let workbook = build_workbook(&db, &event).await.unwrap();
        assert_eq!(workbook.sheets.len(), 2);

        let report = &workbook.sheets[0];
        assert_eq!(report.name, REPORT_SHEET);
        assert_eq!(report.rows.len(), 21);
        assert_eq!(report.rows[0][1], Cell::from("Wing"));
        assert_eq!(report.rows[1][1], Cell::from("A"));
        assert_eq!(report.rows[1][4], Cell::Number(1.0));
        assert_eq!(report.rows[1][8], Cell::from("Paid"));
        assert_eq!(report.rows[2][5], Cell::Number(150.0));
        assert_eq!(report.rows[2][6], Cell::from("2024-10-05"));
        assert_eq!(report.rows[2][8], Cell::from("Partially Paid"));
        assert_eq!(report.rows[3][2], Cell::Empty);

        let multiple = &workbook.sheets[1];
        assert_eq!(multiple.rows.len(), 3);
        assert_eq!(multiple.rows[1][3], Cell::Number(100.0));
    }

    #[tokio::test]
    async fn test_no_multiple_sheet_without_repeats() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "rep2").await;
        let event = seed_event(&db, &c, true).await;
        let workbook = build_workbook(&db, &event).await.unwrap();
        assert_eq!(workbook.sheets.len(), 1);
        assert!(!export_xlsx(&db, &event).await.unwrap().is_empty());
    }
}
