use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a004_book_distribution::BookDistribution;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, Set, Statement};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a004_book_distribution")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub book_id: String,
    pub distribution_path: String,
    pub level_1_value: String,
    pub member_name: String,
    pub mobile: Option<String>,
    pub is_extra_book: bool,
    pub is_returned: bool,
    pub notes: Option<String>,
    pub distributed_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Distribution joined with its book number
#[derive(Debug, FromQueryResult)]
struct DistributionRow {
    id: String,
    event_id: String,
    book_id: String,
    book_number: i32,
    distribution_path: String,
    level_1_value: String,
    member_name: String,
    mobile: Option<String>,
    is_extra_book: bool,
    is_returned: bool,
    notes: Option<String>,
    distributed_at: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DistributionRow> for BookDistribution {
    fn from(r: DistributionRow) -> Self {
        BookDistribution {
            id: r.id,
            event_id: r.event_id,
            book_id: r.book_id,
            book_number: r.book_number,
            distribution_path: r.distribution_path,
            level_1_value: r.level_1_value,
            member_name: r.member_name,
            mobile: r.mobile,
            is_extra_book: r.is_extra_book,
            is_returned: r.is_returned,
            notes: r.notes,
            distributed_at: r.distributed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn to_active(d: &BookDistribution) -> ActiveModel {
    ActiveModel {
        id: Set(d.id.clone()),
        event_id: Set(d.event_id.clone()),
        book_id: Set(d.book_id.clone()),
        distribution_path: Set(d.distribution_path.clone()),
        level_1_value: Set(d.level_1_value.clone()),
        member_name: Set(d.member_name.clone()),
        mobile: Set(d.mobile.clone()),
        is_extra_book: Set(d.is_extra_book),
        is_returned: Set(d.is_returned),
        notes: Set(d.notes.clone()),
        distributed_at: Set(d.distributed_at),
        created_at: Set(d.created_at),
        updated_at: Set(d.updated_at),
    }
}

const SELECT_JOINED: &str = r#"
    SELECT d.id, d.event_id, d.book_id, b.book_number, d.distribution_path, d.level_1_value,
           d.member_name, d.mobile, d.is_extra_book, d.is_returned, d.notes, d.distributed_at,
           d.created_at, d.updated_at
    FROM a004_book_distribution d
    JOIN a003_lottery_book b ON b.id = d.book_id
"#;

async fn select_where<C: ConnectionTrait>(
    conn: &C,
    condition: &str,
    value: &str,
) -> anyhow::Result<Vec<BookDistribution>> {
    let sql = format!("{} WHERE {} = ? ORDER BY b.book_number", SELECT_JOINED, condition);
    let rows = DistributionRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &sql,
        [value.into()],
    ))
    .all(conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<BookDistribution>> {
    select_where(conn, "d.event_id", event_id).await
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<BookDistribution>> {
    Ok(select_where(conn, "d.id", id).await?.into_iter().next())
}

pub async fn get_by_book<C: ConnectionTrait>(conn: &C, book_id: &str) -> anyhow::Result<Option<BookDistribution>> {
    Ok(select_where(conn, "d.book_id", book_id).await?.into_iter().next())
}

pub async fn insert<C: ConnectionTrait>(conn: &C, distribution: &BookDistribution) -> anyhow::Result<()> {
    Entity::insert(to_active(distribution)).exec(conn).await?;
    Ok(())
}

pub async fn update<C: ConnectionTrait>(conn: &C, distribution: &BookDistribution) -> anyhow::Result<()> {
    to_active(distribution).update(conn).await?;
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
