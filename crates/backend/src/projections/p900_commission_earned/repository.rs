use chrono::{NaiveDate, Utc};
use contracts::enums::CommissionType;
use contracts::projections::p900_commission_earned::CommissionEarned;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, Set, Statement};

use super::engine::DerivedCommission;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "p900_commission_earned")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub distribution_id: String,
    pub commission_type: String,
    pub payment_date: NaiveDate,
    pub commission_date: NaiveDate,
    pub payment_amount: f64,
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub level_1_value: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Inserts rows, overwriting any row with the same
/// `(distribution_id, commission_type, payment_date)`
pub async fn upsert_rows<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    rows: &[DerivedCommission],
) -> anyhow::Result<usize> {
    let created_at = Utc::now().to_rfc3339();
    for row in rows {
        let active = ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            event_id: Set(event_id.to_string()),
            distribution_id: Set(row.distribution_id.clone()),
            commission_type: Set(row.commission_type.code().to_string()),
            payment_date: Set(row.payment_date),
            commission_date: Set(row.commission_date),
            payment_amount: Set(row.payment_amount),
            commission_percent: Set(row.commission_percent),
            commission_amount: Set(row.commission_amount),
            level_1_value: Set(row.level_1_value.clone()),
            created_at: Set(created_at.clone()),
        };
        Entity::insert(active)
            .on_conflict(
                OnConflict::columns([Column::DistributionId, Column::CommissionType, Column::PaymentDate])
                    .update_columns([
                        Column::CommissionDate,
                        Column::PaymentAmount,
                        Column::CommissionPercent,
                        Column::CommissionAmount,
                        Column::Level1Value,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
    }
    Ok(rows.len())
}

pub async fn delete_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_distributions<C: ConnectionTrait>(
    conn: &C,
    distribution_ids: &[String],
) -> anyhow::Result<u64> {
    if distribution_ids.is_empty() {
        return Ok(0);
    }
    let res = Entity::delete_many()
        .filter(Column::DistributionId.is_in(distribution_ids.iter().cloned()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

#[derive(Debug, FromQueryResult)]
struct CommissionRow {
    id: String,
    event_id: String,
    distribution_id: String,
    commission_type: String,
    payment_date: NaiveDate,
    commission_date: NaiveDate,
    payment_amount: f64,
    commission_percent: f64,
    commission_amount: f64,
    level_1_value: String,
    book_number: i32,
    member_name: String,
    created_at: String,
}

/// Rows of an event with book number and holder, in a stable order
pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<CommissionEarned>> {
    let rows = CommissionRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        r#"
        SELECT c.id, c.event_id, c.distribution_id, c.commission_type, c.payment_date,
               c.commission_date, c.payment_amount, c.commission_percent, c.commission_amount,
               c.level_1_value, b.book_number, d.member_name, c.created_at
        FROM p900_commission_earned c
        JOIN a004_book_distribution d ON d.id = c.distribution_id
        JOIN a003_lottery_book b ON b.id = d.book_id
        WHERE c.event_id = ?
        ORDER BY c.level_1_value, b.book_number, c.payment_date, c.commission_type
        "#,
        [event_id.into()],
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let commission_type = CommissionType::from_code(&r.commission_type)?;
            Some(CommissionEarned {
                id: r.id,
                event_id: r.event_id,
                distribution_id: r.distribution_id,
                commission_type,
                payment_date: r.payment_date,
                commission_date: r.commission_date,
                payment_amount: r.payment_amount,
                commission_percent: r.commission_percent,
                commission_amount: r.commission_amount,
                level_1_value: r.level_1_value,
                book_number: r.book_number,
                member_name: r.member_name,
                created_at: r.created_at,
            })
        })
        .collect())
}
