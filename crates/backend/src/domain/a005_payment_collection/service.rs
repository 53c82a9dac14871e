use chrono::{NaiveDate, Utc};
use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a004_book_distribution::BookDistribution;
use contracts::domain::a005_payment_collection::{
    DistributionPayments, MarkPaidDto, OverpaymentAuditRow, PaymentCollection, RecordPaymentDto,
};
use contracts::enums::{PaymentMethod, PaymentStatus};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a004_book_distribution::service as distribution_service;
use crate::projections::p900_commission_earned::service as commission_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::{round2, sanitize_opt, to_paise};

async fn total_paid<C: ConnectionTrait>(conn: &C, distribution_id: &str) -> AppResult<f64> {
    let payments = repository::list_by_distribution(conn, distribution_id).await?;
    Ok(round2(payments.iter().map(|p| p.amount_paid).sum()))
}

fn ensure_within_book_value(
    event: &LotteryEvent,
    distribution: &BookDistribution,
    already_paid: f64,
    amount: f64,
) -> AppResult<()> {
    let book_value = event.book_value();
    if to_paise(already_paid) + to_paise(amount) > to_paise(book_value) {
        return Err(AppError::validation(format!(
            "Payment of {:.2} exceeds the outstanding {:.2} of book {}",
            amount,
            round2((book_value - already_paid).max(0.0)),
            distribution.book_number
        )));
    }
    Ok(())
}

/// Records a payment; a second payment on the same day is added to that day's row
pub async fn record(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    distribution_id: &str,
    dto: RecordPaymentDto,
    collected_by: Option<String>,
) -> AppResult<PaymentCollection> {
    let amount = round2(dto.amount_paid);
    if !(amount > 0.0) {
        return Err(AppError::validation("Payment amount must be positive"));
    }

    let event_id = event.to_string_id();
    let txn = db.begin().await?;
    let distribution = distribution_service::get_for_event(&txn, &event_id, distribution_id).await?;
    if distribution.is_returned {
        return Err(AppError::conflict(format!(
            "Book {} was returned and cannot take payments",
            distribution.book_number
        )));
    }

    let paid = total_paid(&txn, &distribution.id).await?;
    ensure_within_book_value(event, &distribution, paid, amount)?;

    let now = Utc::now();
    let notes = sanitize_opt(dto.notes.as_deref());
    let payment = match repository::find_by_day(&txn, &distribution.id, dto.payment_date).await? {
        Some(mut existing) => {
            existing.amount_paid = round2(existing.amount_paid + amount);
            if dto.commission_date.is_some() {
                existing.commission_date = dto.commission_date;
            }
            existing.payment_method = dto.payment_method;
            if notes.is_some() {
                existing.notes = notes;
            }
            existing.updated_at = now;
            repository::update(&txn, &existing).await?;
            existing
        }
        None => {
            let payment = PaymentCollection {
                id: uuid::Uuid::new_v4().to_string(),
                event_id: event_id.clone(),
                distribution_id: distribution.id.clone(),
                amount_paid: amount,
                payment_date: dto.payment_date,
                commission_date: dto.commission_date,
                payment_method: dto.payment_method,
                notes,
                collected_by,
                created_at: now,
                updated_at: now,
            };
            repository::insert(&txn, &payment).await?;
            payment
        }
    };

    commission_service::resync_distributions(&txn, &event_id, &[distribution.id.clone()]).await?;
    txn.commit().await?;

    tracing::info!(
        "Payment {:.2} recorded for book {} on {}",
        amount,
        distribution.book_number,
        dto.payment_date
    );
    Ok(payment)
}

/// Pays the whole outstanding balance
pub async fn mark_paid(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    distribution_id: &str,
    dto: MarkPaidDto,
    collected_by: Option<String>,
) -> AppResult<PaymentCollection> {
    let paid = total_paid(db, distribution_id).await?;
    let outstanding = round2(event.book_value() - paid);
    if to_paise(outstanding) <= 0 {
        return Err(AppError::conflict("Book is already fully paid"));
    }
    record(
        db,
        event,
        distribution_id,
        RecordPaymentDto {
            amount_paid: outstanding,
            payment_date: dto.payment_date,
            commission_date: None,
            payment_method: dto.payment_method,
            notes: Some("Marked as fully paid".into()),
        },
        collected_by,
    )
    .await
}

/// Writes an imported payment, replacing the amount already recorded for that day
pub async fn upsert_imported<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    distribution: &BookDistribution,
    amount: f64,
    payment_date: NaiveDate,
    commission_date: Option<NaiveDate>,
    payment_method: PaymentMethod,
) -> AppResult<()> {
    let amount = round2(amount);
    let payments = repository::list_by_distribution(conn, &distribution.id).await?;
    let other_days: f64 = payments
        .iter()
        .filter(|p| p.payment_date != payment_date)
        .map(|p| p.amount_paid)
        .sum();
    ensure_within_book_value(event, distribution, round2(other_days), amount)?;

    let now = Utc::now();
    let payment = PaymentCollection {
        id: uuid::Uuid::new_v4().to_string(),
        event_id: event.to_string_id(),
        distribution_id: distribution.id.clone(),
        amount_paid: amount,
        payment_date,
        commission_date,
        payment_method,
        notes: Some("Imported".into()),
        collected_by: None,
        created_at: now,
        updated_at: now,
    };
    repository::upsert_by_day(conn, &payment).await?;
    Ok(())
}

pub async fn delete(db: &DatabaseConnection, event: &LotteryEvent, payment_id: &str) -> AppResult<()> {
    let event_id = event.to_string_id();
    let txn = db.begin().await?;
    let payment = repository::get_by_id(&txn, payment_id)
        .await?
        .filter(|p| p.event_id == event_id)
        .ok_or_else(|| AppError::not_found("Payment not found"))?;
    repository::delete(&txn, &payment.id).await?;
    commission_service::resync_distributions(&txn, &event_id, &[payment.distribution_id.clone()]).await?;
    txn.commit().await?;
    tracing::info!(
        "Payment {:.2} of {} deleted",
        payment.amount_paid,
        payment.payment_date
    );
    Ok(())
}

pub async fn list_for_distribution<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    distribution_id: &str,
) -> AppResult<DistributionPayments> {
    let distribution = distribution_service::get_for_event(conn, &event.to_string_id(), distribution_id).await?;
    let payments = repository::list_by_distribution(conn, &distribution.id).await?;
    let book_value = round2(event.book_value());
    let total = round2(payments.iter().map(|p| p.amount_paid).sum());
    Ok(DistributionPayments {
        distribution_id: distribution.id,
        book_number: distribution.book_number,
        member_name: distribution.member_name,
        book_value,
        total_paid: total,
        outstanding: round2((book_value - total).max(0.0)),
        status: PaymentStatus::from_amounts(total, book_value),
        payments,
    })
}

/// Payments CSV: event, book, member, path, amount, dates, method
pub async fn export_csv<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<String> {
    let rows = repository::export_rows(conn, &event.to_string_id(), &event.base.code).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Event",
            "Book Number",
            "Member Name",
            "Distribution Path",
            "Amount Paid",
            "Payment Date",
            "Commission Date",
            "Payment Method",
        ])
        .map_err(anyhow::Error::from)?;
    for row in &rows {
        writer
            .write_record([
                row.event_code.clone(),
                row.book_number.to_string(),
                row.member_name.clone(),
                row.distribution_path.clone(),
                format!("{:.2}", row.amount_paid),
                row.payment_date.to_string(),
                row.commission_date.map(|d| d.to_string()).unwrap_or_default(),
                row.payment_method.display_name().to_string(),
            ])
            .map_err(anyhow::Error::from)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("csv flush failed: {}", e))?;
    Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
}

/// Distributions paid beyond their book value
pub async fn audit_overpayments<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
) -> AppResult<Vec<OverpaymentAuditRow>> {
    Ok(repository::overpaid(conn, &event.to_string_id(), event.book_value()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projections::p900_commission_earned::repository as commission_repository;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, payment, seed_community, seed_event};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_partial_payments_merge_and_overpayment() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "pay").await;
        let event = seed_event(&db, &c, true).await;
        let dist = assign(&db, &event, 1, "A", "Ravi").await;

        record(&db, &event, &dist.id, payment(100.0, d(10, 1)), None).await.unwrap();
        record(&db, &event, &dist.id, payment(50.0, d(10, 1)), None).await.unwrap();
        record(&db, &event, &dist.id, payment(150.0, d(10, 5)), None).await.unwrap();

        let listed = list_for_distribution(&db, &event, &dist.id).await.unwrap();
        assert_eq!(listed.payments.len(), 2);
        assert_eq!(listed.payments[0].amount_paid, 150.0);
        assert_eq!(listed.total_paid, 300.0);
        assert_eq!(listed.outstanding, 200.0);
        assert_eq!(listed.status, PaymentStatus::Partial);

        assert!(matches!(
            record(&db, &event, &dist.id, payment(200.01, d(10, 6)), None).await,
            Err(AppError::Validation(_))
        ));
        assert!(record(&db, &event, &dist.id, payment(0.0, d(10, 6)), None).await.is_err());

        let paid = mark_paid(
            &db,
            &event,
            &dist.id,
            MarkPaidDto { payment_date: d(10, 7), payment_method: PaymentMethod::Upi },
            None,
        )
        .await
        .unwrap();
        assert_eq!(paid.amount_paid, 200.0);
        assert_eq!(
            list_for_distribution(&db, &event, &dist.id).await.unwrap().status,
            PaymentStatus::Paid
        );
        assert!(mark_paid(
            &db,
            &event,
            &dist.id,
            MarkPaidDto { payment_date: d(10, 8), payment_method: PaymentMethod::Cash },
            None,
        )
        .await
        .is_err());
        assert!(audit_overpayments(&db, &event).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_reports_overpaid_books() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "audit").await;
        let event = seed_event(&db, &c, true).await;
        let dist = assign(&db, &event, 2, "B", "Sita").await;

        // Старые данные могли обойти проверку
        let now = Utc::now();
        for (amount, day) in [(400.0, 1), (300.0, 2)] {
            repository::insert(
                &db,
                &PaymentCollection {
                    id: uuid::Uuid::new_v4().to_string(),
                    event_id: event.to_string_id(),
                    distribution_id: dist.id.clone(),
                    amount_paid: amount,
                    payment_date: d(9, day),
                    commission_date: None,
                    payment_method: PaymentMethod::Cash,
                    notes: None,
                    collected_by: None,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .unwrap();
        }

        let audit = audit_overpayments(&db, &event).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].book_number, 2);
        assert_eq!(audit[0].excess, 200.0);
    }

    #[tokio::test]
    async fn test_delete_payment_removes_commissions_and_csv() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "del").await;
        let event = seed_event(&db, &c, true).await;
        crate::test_support::enable_early(&db, &event, 10.0, d(10, 31)).await;
        let dist = assign(&db, &event, 1, "A", "Ravi").await;

        let p = record(&db, &event, &dist.id, payment(300.0, d(10, 1)), None).await.unwrap();
        let rows = commission_repository::list_by_event(&db, &event.to_string_id()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commission_amount, 30.0);

        let csv = export_csv(&db, &event).await.unwrap();
        assert!(csv.starts_with("Event,Book Number"));
        assert!(csv.contains("Ravi"));
        assert!(csv.contains("300.00"));

        delete(&db, &event, &p.id).await.unwrap();
        assert!(commission_repository::list_by_event(&db, &event.to_string_id())
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(delete(&db, &event, &p.id).await, Err(AppError::NotFound(_))));
    }
}
