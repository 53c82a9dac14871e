use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a006_commission_setting::CommissionSetting;
use contracts::enums::CommissionType;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a006_commission_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub commission_type: String,
    pub is_enabled: bool,
    pub commission_percent: f64,
    pub threshold_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    fn into_setting(self) -> Option<CommissionSetting> {
        let commission_type = CommissionType::from_code(&self.commission_type)?;
        Some(CommissionSetting {
            event_id: self.event_id,
            commission_type,
            is_enabled: self.is_enabled,
            commission_percent: self.commission_percent,
            threshold_date: self.threshold_date,
            updated_at: Some(self.updated_at),
        })
    }
}

/// Stored settings; rows with unknown type codes are ignored
pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<CommissionSetting>> {
    let models = Entity::find()
        .filter(Column::EventId.eq(event_id))
        .all(conn)
        .await?;
    Ok(models.into_iter().filter_map(Model::into_setting).collect())
}

pub async fn upsert<C: ConnectionTrait>(conn: &C, setting: &CommissionSetting) -> anyhow::Result<()> {
    let active = ActiveModel {
        event_id: Set(setting.event_id.clone()),
        commission_type: Set(setting.commission_type.code().to_string()),
        is_enabled: Set(setting.is_enabled),
        commission_percent: Set(setting.commission_percent),
        threshold_date: Set(setting.threshold_date),
        updated_at: Set(setting.updated_at.unwrap_or_else(Utc::now)),
    };
    Entity::insert(active)
        .on_conflict(
            OnConflict::columns([Column::EventId, Column::CommissionType])
                .update_columns([
                    Column::IsEnabled,
                    Column::CommissionPercent,
                    Column::ThresholdDate,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn delete_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}
