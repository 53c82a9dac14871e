use chrono::Utc;
use contracts::domain::a006_commission_setting::{
    merge_with_stored, validate_settings, CommissionSetting, SaveCommissionSettingsDto,
};
use contracts::projections::p900_commission_earned::CommissionSyncResult;
use contracts::enums::CommissionType;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::projections::p900_commission_earned::service as commission_service;
use crate::shared::error::{AppError, AppResult};

/// One setting per commission type; unconfigured types come back disabled
pub async fn get<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<Vec<CommissionSetting>> {
    let stored = repository::list_by_event(conn, event_id).await?;
    Ok(CommissionType::all()
        .into_iter()
        .map(|t| {
            stored
                .iter()
                .find(|s| s.commission_type == t)
                .cloned()
                .unwrap_or_else(|| CommissionSetting::disabled(event_id, t))
        })
        .collect())
}

/// Saves the settings and re-derives every commission of the event
pub async fn save(
    db: &DatabaseConnection,
    event_id: &str,
    dto: SaveCommissionSettingsDto,
) -> AppResult<CommissionSyncResult> {
    validate_settings(&dto.settings).map_err(AppError::Validation)?;

    let now = Utc::now();
    let txn = db.begin().await?;
    let stored = repository::list_by_event(&txn, event_id).await?;
    validate_settings(&merge_with_stored(&stored, &dto.settings)).map_err(AppError::Validation)?;

    for input in &dto.settings {
        repository::upsert(
            &txn,
            &CommissionSetting {
                event_id: event_id.to_string(),
                commission_type: input.commission_type,
                is_enabled: input.is_enabled,
                commission_percent: input.commission_percent,
                threshold_date: input.threshold_date,
                updated_at: Some(now),
            },
        )
        .await?;
    }
    let result = commission_service::full_resync(&txn, event_id).await?;
    txn.commit().await?;

    tracing::info!(
        "Commission settings saved for event {}: {} row(s) re-derived",
        event_id,
        result.rows_written
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{seed_community, seed_event};
    use chrono::NaiveDate;
    use contracts::domain::a006_commission_setting::CommissionSettingInput;

    #[tokio::test]
    async fn test_defaults_and_save() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "settings").await;
        let event = seed_event(&db, &c, false).await;
        let event_id = event.to_string_id();

        let defaults = get(&db, &event_id).await.unwrap();
        assert_eq!(defaults.len(), 3);
        assert!(defaults.iter().all(|s| !s.is_enabled));

        let bad = SaveCommissionSettingsDto {
            settings: vec![CommissionSettingInput {
                commission_type: CommissionType::Early,
                is_enabled: true,
                commission_percent: 10.0,
                threshold_date: None,
            }],
        };
        assert!(matches!(save(&db, &event_id, bad).await, Err(AppError::Validation(_))));

        let good = SaveCommissionSettingsDto {
            settings: vec![
                CommissionSettingInput {
                    commission_type: CommissionType::Early,
                    is_enabled: true,
                    commission_percent: 10.0,
                    threshold_date: NaiveDate::from_ymd_opt(2024, 10, 15),
                },
                CommissionSettingInput {
                    commission_type: CommissionType::ExtraBooks,
                    is_enabled: true,
                    commission_percent: 2.5,
                    threshold_date: None,
                },
            ],
        };
        save(&db, &event_id, good.clone()).await.unwrap();
        // Повторное сохранение перезаписывает строки
        save(&db, &event_id, good).await.unwrap();

        let saved = get(&db, &event_id).await.unwrap();
        let early = saved.iter().find(|s| s.commission_type == CommissionType::Early).unwrap();
        assert!(early.is_enabled);
        assert_eq!(early.commission_percent, 10.0);
        let standard = saved
            .iter()
            .find(|s| s.commission_type == CommissionType::Standard)
            .unwrap();
        assert!(!standard.is_enabled);
        assert_eq!(repository::list_by_event(&db, &event_id).await.unwrap().len(), 2);

        // Стандартный порог раньше сохранённого раннего
        let standard_only = |day: u32| SaveCommissionSettingsDto {
            settings: vec![CommissionSettingInput {
                commission_type: CommissionType::Standard,
                is_enabled: true,
                commission_percent: 5.0,
                threshold_date: NaiveDate::from_ymd_opt(2024, 10, day),
            }],
        };
        assert!(matches!(
            save(&db, &event_id, standard_only(1)).await,
            Err(AppError::Validation(_))
        ));
        save(&db, &event_id, standard_only(31)).await.unwrap();
        assert_eq!(repository::list_by_event(&db, &event_id).await.unwrap().len(), 3);
    }
}
