use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a009_csf_payment::{CsfPayment, CsfPaymentListItem};
use contracts::enums::PaymentMethod;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a009_csf_payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub member_id: String,
    pub payment_month: String,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CsfPayment {
    fn from(m: Model) -> Self {
        CsfPayment {
            id: m.id,
            community_id: m.community_id,
            member_id: m.member_id,
            payment_month: m.payment_month,
            amount: m.amount,
            payment_date: m.payment_date,
            payment_method: PaymentMethod::from_code(&m.payment_method).unwrap_or_default(),
            notes: m.notes,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ListRow {
    id: String,
    community_id: String,
    member_id: String,
    payment_month: String,
    amount: f64,
    payment_date: NaiveDate,
    payment_method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    flat_number: String,
    member_name: String,
}

impl From<ListRow> for CsfPaymentListItem {
    fn from(r: ListRow) -> Self {
        CsfPaymentListItem {
            payment: CsfPayment {
                id: r.id,
                community_id: r.community_id,
                member_id: r.member_id,
                payment_month: r.payment_month,
                amount: r.amount,
                payment_date: r.payment_date,
                payment_method: PaymentMethod::from_code(&r.payment_method).unwrap_or_default(),
                notes: r.notes,
                created_at: r.created_at,
            },
            flat_number: r.flat_number,
            member_name: r.member_name,
        }
    }
}

/// Payments with member details, newest month first; optionally one month only
pub async fn list_by_community<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    month: Option<&str>,
) -> anyhow::Result<Vec<CsfPaymentListItem>> {
    let mut sql = String::from(
        r#"
        SELECT p.id, p.community_id, p.member_id, p.payment_month, p.amount, p.payment_date,
               p.payment_method, p.notes, p.created_at, m.flat_number, m.member_name
        FROM a009_csf_payment p
        JOIN a008_csf_member m ON m.id = p.member_id
        WHERE p.community_id = ?
        "#,
    );
    let mut values: Vec<sea_orm::Value> = vec![community_id.into()];
    if let Some(month) = month {
        sql.push_str(" AND p.payment_month = ?");
        values.push(month.into());
    }
    sql.push_str(" ORDER BY p.payment_month DESC, m.flat_number, p.payment_date");

    let rows = ListRow::find_by_statement(Statement::from_sql_and_values(DatabaseBackend::Sqlite, &sql, values))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_for_member_month<C: ConnectionTrait>(
    conn: &C,
    member_id: &str,
    payment_month: &str,
) -> anyhow::Result<Vec<CsfPayment>> {
    Ok(Entity::find()
        .filter(Column::MemberId.eq(member_id))
        .filter(Column::PaymentMonth.eq(payment_month))
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<CsfPayment>> {
    Ok(Entity::find_by_id(id.to_string()).one(conn).await?.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, p: &CsfPayment) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(p.id.clone()),
        community_id: Set(p.community_id.clone()),
        member_id: Set(p.member_id.clone()),
        payment_month: Set(p.payment_month.clone()),
        amount: Set(p.amount),
        payment_date: Set(p.payment_date),
        payment_method: Set(p.payment_method.code().to_string()),
        notes: Set(p.notes.clone()),
        created_at: Set(p.created_at),
    };
    Entity::insert(active).exec(conn).await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<bool> {
    let res = Entity::delete_by_id(id.to_string()).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

pub async fn delete_for_member<C: ConnectionTrait>(conn: &C, member_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::MemberId.eq(member_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_community<C: ConnectionTrait>(conn: &C, community_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::CommunityId.eq(community_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
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
