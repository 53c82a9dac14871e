use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a005_payment_collection::{OverpaymentAuditRow, PaymentCollection, PaymentExportRow};
use contracts::enums::PaymentMethod;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    Set, Statement,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a005_payment_collection")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub distribution_id: String,
    pub amount_paid: f64,
    pub payment_date: NaiveDate,
    pub commission_date: Option<NaiveDate>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub collected_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PaymentCollection {
    fn from(m: Model) -> Self {
        PaymentCollection {
            id: m.id,
            event_id: m.event_id,
            distribution_id: m.distribution_id,
            amount_paid: m.amount_paid,
            payment_date: m.payment_date,
            commission_date: m.commission_date,
            payment_method: PaymentMethod::from_code(&m.payment_method).unwrap_or_default(),
            notes: m.notes,
            collected_by: m.collected_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn to_active(p: &PaymentCollection) -> ActiveModel {
    ActiveModel {
        id: Set(p.id.clone()),
        event_id: Set(p.event_id.clone()),
        distribution_id: Set(p.distribution_id.clone()),
        amount_paid: Set(p.amount_paid),
        payment_date: Set(p.payment_date),
        commission_date: Set(p.commission_date),
        payment_method: Set(p.payment_method.code().to_string()),
        notes: Set(p.notes.clone()),
        collected_by: Set(p.collected_by.clone()),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

/// Sum and number of payments of one distribution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaidTotal {
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, FromQueryResult)]
struct PaidTotalRow {
    distribution_id: String,
    total: f64,
    count: i64,
}

pub async fn totals_by_distribution<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
) -> anyhow::Result<HashMap<String, PaidTotal>> {
    let rows = PaidTotalRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        r#"
        SELECT distribution_id, CAST(SUM(amount_paid) AS REAL) AS total, COUNT(*) AS count
        FROM a005_payment_collection
        WHERE event_id = ?
        GROUP BY distribution_id
        "#,
        [event_id.into()],
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.distribution_id,
                PaidTotal {
                    total: r.total,
                    count: r.count,
                },
            )
        })
        .collect())
}

pub async fn list_by_distribution<C: ConnectionTrait>(
    conn: &C,
    distribution_id: &str,
) -> anyhow::Result<Vec<PaymentCollection>> {
    Ok(Entity::find()
        .filter(Column::DistributionId.eq(distribution_id))
        .order_by_asc(Column::PaymentDate)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Payments in chronological order
pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<PaymentCollection>> {
    Ok(Entity::find()
        .filter(Column::EventId.eq(event_id))
        .order_by_asc(Column::PaymentDate)
        .order_by_asc(Column::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn list_by_distributions<C: ConnectionTrait>(
    conn: &C,
    distribution_ids: &[String],
) -> anyhow::Result<Vec<PaymentCollection>> {
    if distribution_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Entity::find()
        .filter(Column::DistributionId.is_in(distribution_ids.iter().cloned()))
        .order_by_asc(Column::PaymentDate)
        .order_by_asc(Column::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<PaymentCollection>> {
    Ok(Entity::find_by_id(id.to_string()).one(conn).await?.map(Into::into))
}

/// Ledger row of a distribution for one day
pub async fn find_by_day<C: ConnectionTrait>(
    conn: &C,
    distribution_id: &str,
    payment_date: NaiveDate,
) -> anyhow::Result<Option<PaymentCollection>> {
    Ok(Entity::find()
        .filter(Column::DistributionId.eq(distribution_id))
        .filter(Column::PaymentDate.eq(payment_date))
        .one(conn)
        .await?
        .map(Into::into))
}

pub async fn count_for_distribution<C: ConnectionTrait>(conn: &C, distribution_id: &str) -> anyhow::Result<u64> {
    Ok(Entity::find()
        .filter(Column::DistributionId.eq(distribution_id))
        .count(conn)
        .await?)
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> anyhow::Result<u64> {
    Ok(Entity::find().count(conn).await?)
}

pub async fn count_created_since<C: ConnectionTrait>(conn: &C, since: DateTime<Utc>) -> anyhow::Result<u64> {
    Ok(Entity::find()
        .filter(Column::CreatedAt.gte(since))
        .count(conn)
        .await?)
}

pub async fn insert<C: ConnectionTrait>(conn: &C, payment: &PaymentCollection) -> anyhow::Result<()> {
    Entity::insert(to_active(payment)).exec(conn).await?;
    Ok(())
}

pub async fn update<C: ConnectionTrait>(conn: &C, payment: &PaymentCollection) -> anyhow::Result<()> {
    to_active(payment).update(conn).await?;
    Ok(())
}

/// Insert or overwrite the ledger row keyed `(distribution_id, payment_date)`
pub async fn upsert_by_day<C: ConnectionTrait>(conn: &C, payment: &PaymentCollection) -> anyhow::Result<()> {
    Entity::insert(to_active(payment))
        .on_conflict(
            OnConflict::columns([Column::DistributionId, Column::PaymentDate])
                .update_columns([
                    Column::AmountPaid,
                    Column::CommissionDate,
                    Column::PaymentMethod,
                    Column::Notes,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<bool> {
    let res = Entity::delete_by_id(id.to_string()).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

pub async fn delete_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

#[derive(Debug, FromQueryResult)]
struct ExportRow {
    book_number: i32,
    member_name: String,
    distribution_path: String,
    amount_paid: f64,
    payment_date: NaiveDate,
    commission_date: Option<NaiveDate>,
    payment_method: String,
}

/// Every payment with book and holder, by book number then date
pub async fn export_rows<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    event_code: &str,
) -> anyhow::Result<Vec<PaymentExportRow>> {
    let rows = ExportRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        r#"
        SELECT b.book_number, d.member_name, d.distribution_path,
               p.amount_paid, p.payment_date, p.commission_date, p.payment_method
        FROM a005_payment_collection p
        JOIN a004_book_distribution d ON d.id = p.distribution_id
        JOIN a003_lottery_book b ON b.id = d.book_id
        WHERE p.event_id = ?
        ORDER BY b.book_number, p.payment_date
        "#,
        [event_id.into()],
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| PaymentExportRow {
            event_code: event_code.to_string(),
            book_number: r.book_number,
            member_name: r.member_name,
            distribution_path: r.distribution_path,
            amount_paid: r.amount_paid,
            payment_date: r.payment_date,
            commission_date: r.commission_date,
            payment_method: PaymentMethod::from_code(&r.payment_method).unwrap_or_default(),
        })
        .collect())
}

#[derive(Debug, FromQueryResult)]
struct OverpaidRow {
    distribution_id: String,
    book_number: i32,
    member_name: String,
    total_paid: f64,
}

/// Distributions whose payments add up to more than `book_value`
pub async fn overpaid<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    book_value: f64,
) -> anyhow::Result<Vec<OverpaymentAuditRow>> {
    let rows = OverpaidRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        r#"
        SELECT d.id AS distribution_id, b.book_number, d.member_name,
               CAST(SUM(p.amount_paid) AS REAL) AS total_paid
        FROM a005_payment_collection p
        JOIN a004_book_distribution d ON d.id = p.distribution_id
        JOIN a003_lottery_book b ON b.id = d.book_id
        WHERE p.event_id = ?
        GROUP BY d.id, b.book_number, d.member_name
        HAVING SUM(p.amount_paid) > ?
        ORDER BY b.book_number
        "#,
        [event_id.into(), (book_value + 0.005).into()],
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| OverpaymentAuditRow {
            excess: crate::shared::text::round2(r.total_paid - book_value),
            distribution_id: r.distribution_id,
            book_number: r.book_number,
            member_name: r.member_name,
            book_value,
            total_paid: crate::shared::text::round2(r.total_paid),
        })
        .collect())
}
