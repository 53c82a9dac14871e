use std::collections::{BTreeMap, HashMap};

use contracts::domain::a004_book_distribution::BookDistribution;
use contracts::domain::a005_payment_collection::PaymentCollection;
use contracts::enums::CommissionType;
use contracts::projections::p900_commission_earned::{
    CommissionReport, CommissionSyncResult, LevelOneCommission, ResetCommissionsDto,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::engine::{derive_commissions, PaymentFact};
use super::repository;
use crate::domain::a004_book_distribution::repository as distribution_repository;
use crate::domain::a005_payment_collection::repository as payment_repository;
use crate::domain::a006_commission_setting::repository as setting_repository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::round2;

/// Typed confirmation required by [`reset`]
pub const RESET_CONFIRMATION: &str = "RESET";

fn to_facts(payments: &[PaymentCollection], distributions: &HashMap<String, BookDistribution>) -> Vec<PaymentFact> {
    payments
        .iter()
        .filter_map(|p| {
            let distribution = distributions.get(&p.distribution_id)?;
            Some(PaymentFact {
                distribution_id: p.distribution_id.clone(),
                payment_date: p.payment_date,
                commission_date: p.effective_commission_date(),
                amount: p.amount_paid,
                is_extra_book: distribution.is_extra_book,
                level_1_value: distribution.level_1_value.clone(),
            })
        })
        .collect()
}

/// Rebuilds every commission row of the event on the caller's transaction
pub async fn full_resync<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<CommissionSyncResult> {
    let rows_deleted = repository::delete_for_event(conn, event_id).await?;

    let settings = setting_repository::list_by_event(conn, event_id).await?;
    let distributions: HashMap<String, BookDistribution> = distribution_repository::list_by_event(conn, event_id)
        .await?
        .into_iter()
        .map(|d| (d.id.clone(), d))
        .collect();
    let payments = payment_repository::list_by_event(conn, event_id).await?;

    let rows = derive_commissions(&to_facts(&payments, &distributions), &settings);
    let rows_written = repository::upsert_rows(conn, event_id, &rows).await?;

    Ok(CommissionSyncResult {
        payments_processed: payments.len(),
        rows_written,
        rows_deleted,
    })
}

/// Full resync in its own transaction
pub async fn sync_event(db: &DatabaseConnection, event_id: &str) -> AppResult<CommissionSyncResult> {
    let txn = db.begin().await?;
    let result = full_resync(&txn, event_id).await?;
    txn.commit().await?;
    tracing::info!(
        "Commissions of event {} synced: {} payment(s), {} row(s) written, {} removed",
        event_id,
        result.payments_processed,
        result.rows_written,
        result.rows_deleted
    );
    Ok(result)
}

/// Re-derives the rows of the given distributions only
pub async fn resync_distributions<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    distribution_ids: &[String],
) -> AppResult<CommissionSyncResult> {
    let rows_deleted = repository::delete_for_distributions(conn, distribution_ids).await?;

    let mut distributions = HashMap::new();
    for id in distribution_ids {
        if let Some(d) = distribution_repository::get_by_id(conn, id).await? {
            distributions.insert(d.id.clone(), d);
        }
    }
    let settings = setting_repository::list_by_event(conn, event_id).await?;
    let payments = payment_repository::list_by_distributions(conn, distribution_ids).await?;

    let rows = derive_commissions(&to_facts(&payments, &distributions), &settings);
    let rows_written = repository::upsert_rows(conn, event_id, &rows).await?;

    Ok(CommissionSyncResult {
        payments_processed: payments.len(),
        rows_written,
        rows_deleted,
    })
}

/// Deletes every commission row of the event
pub async fn reset(db: &DatabaseConnection, event_id: &str, dto: ResetCommissionsDto) -> AppResult<u64> {
    if dto.confirmation.trim() != RESET_CONFIRMATION {
        return Err(AppError::validation(format!(
            "Type {} to confirm",
            RESET_CONFIRMATION
        )));
    }
    let txn = db.begin().await?;
    let removed = repository::delete_for_event(&txn, event_id).await?;
    txn.commit().await?;
    tracing::warn!("Commissions of event {} reset ({} row(s))", event_id, removed);
    Ok(removed)
}

/// Rows plus per level-1 totals by commission type
pub async fn report<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<CommissionReport> {
    let rows = repository::list_by_event(conn, event_id).await?;

    let mut by_level: BTreeMap<String, LevelOneCommission> = BTreeMap::new();
    let mut report = CommissionReport {
        event_id: event_id.to_string(),
        ..Default::default()
    };

    for row in &rows {
        let level = by_level
            .entry(row.level_1_value.clone())
            .or_insert_with(|| LevelOneCommission {
                level_1_value: row.level_1_value.clone(),
                ..Default::default()
            });
        match row.commission_type {
            CommissionType::Early => {
                level.early += row.commission_amount;
                report.total_early += row.commission_amount;
            }
            CommissionType::Standard => {
                level.standard += row.commission_amount;
                report.total_standard += row.commission_amount;
            }
            CommissionType::ExtraBooks => {
                level.extra_books += row.commission_amount;
                report.total_extra_books += row.commission_amount;
            }
        }
        level.total += row.commission_amount;
    }

    report.by_level_1 = by_level
        .into_values()
        .map(|mut l| {
            l.early = round2(l.early);
            l.standard = round2(l.standard);
            l.extra_books = round2(l.extra_books);
            l.total = round2(l.total);
            l
        })
        .collect();
    report.total_early = round2(report.total_early);
    report.total_standard = round2(report.total_standard);
    report.total_extra_books = round2(report.total_extra_books);
    report.grand_total = round2(report.total_early + report.total_standard + report.total_extra_books);
    report.rows = rows;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_payment_collection::service as payment_service;
    use crate::domain::a006_commission_setting::service as setting_service;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, payment, seed_community, seed_event};
    use chrono::NaiveDate;
    use contracts::domain::a006_commission_setting::{CommissionSettingInput, SaveCommissionSettingsDto};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn inputs() -> SaveCommissionSettingsDto {
        SaveCommissionSettingsDto {
            settings: vec![
                CommissionSettingInput {
                    commission_type: CommissionType::Early,
                    is_enabled: true,
                    commission_percent: 10.0,
                    threshold_date: Some(d(10, 15)),
                },
                CommissionSettingInput {
                    commission_type: CommissionType::Standard,
                    is_enabled: true,
                    commission_percent: 5.0,
                    threshold_date: Some(d(10, 31)),
                },
                CommissionSettingInput {
                    commission_type: CommissionType::ExtraBooks,
                    is_enabled: true,
                    commission_percent: 2.0,
                    threshold_date: None,
                },
            ],
        }
    }

    fn keys(report: &CommissionReport) -> Vec<(String, CommissionType, NaiveDate, f64)> {
        report
            .rows
            .iter()
            .map(|r| (r.distribution_id.clone(), r.commission_type, r.payment_date, r.commission_amount))
            .collect()
    }

    #[tokio::test]
    async fn test_worked_example_and_idempotent_resync() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "comm").await;
        let event = seed_event(&db, &c, true).await;
        let event_id = event.to_string_id();
        setting_service::save(&db, &event_id, inputs()).await.unwrap();

        let dist = assign(&db, &event, 1, "A", "Ravi").await;
        payment_service::record(&db, &event, &dist.id, payment(300.0, d(10, 10)), None)
            .await
            .unwrap();
        payment_service::record(&db, &event, &dist.id, payment(200.0, d(10, 20)), None)
            .await
            .unwrap();

        let first = report(&db, &event_id).await.unwrap();
        assert_eq!(first.total_early, 30.0);
        assert_eq!(first.total_standard, 10.0);
        assert_eq!(first.grand_total, 40.0);
        assert_eq!(first.by_level_1.len(), 1);
        assert_eq!(first.by_level_1[0].level_1_value, "A");
        assert_eq!(first.rows[0].book_number, 1);

        let synced = sync_event(&db, &event_id).await.unwrap();
        assert_eq!(synced.payments_processed, 2);
        assert_eq!(synced.rows_written, 2);
        let second = report(&db, &event_id).await.unwrap();
        sync_event(&db, &event_id).await.unwrap();
        let third = report(&db, &event_id).await.unwrap();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(keys(&second), keys(&third));
    }

    #[tokio::test]
    async fn test_extra_book_and_reset() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "extra").await;
        let event = seed_event(&db, &c, true).await;
        let event_id = event.to_string_id();
        setting_service::save(&db, &event_id, inputs()).await.unwrap();

        let dist = crate::test_support::assign_extra(&db, &event, 4, "B", "Mohan").await;
        payment_service::record(&db, &event, &dist.id, payment(500.0, d(10, 1)), None)
            .await
            .unwrap();

        let report_before = report(&db, &event_id).await.unwrap();
        assert_eq!(report_before.rows.len(), 2);
        assert_eq!(report_before.total_extra_books, 10.0);
        assert_eq!(report_before.total_early, 50.0);

        assert!(matches!(
            reset(&db, &event_id, ResetCommissionsDto { confirmation: "reset".into() }).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            reset(&db, &event_id, ResetCommissionsDto { confirmation: "RESET".into() })
                .await
                .unwrap(),
            2
        );
        assert!(report(&db, &event_id).await.unwrap().rows.is_empty());

        // Данные восстанавливаются из платежей
        sync_event(&db, &event_id).await.unwrap();
        assert_eq!(report(&db, &event_id).await.unwrap().grand_total, 60.0);
    }
}
