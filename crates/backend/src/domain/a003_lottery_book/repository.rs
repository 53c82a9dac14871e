use chrono::Utc;
use contracts::domain::a003_lottery_book::LotteryBook;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a003_lottery_book")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub book_number: i32,
    pub start_ticket: i64,
    pub end_ticket: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LotteryBook {
    fn from(m: Model) -> Self {
        LotteryBook {
            id: m.id,
            event_id: m.event_id,
            book_number: m.book_number,
            start_ticket: m.start_ticket,
            end_ticket: m.end_ticket,
            created_at: m.created_at,
        }
    }
}

/// SQLite limits bound parameters per statement
const INSERT_CHUNK: usize = 100;

/// Inserts books `(book_number, start_ticket, end_ticket)` of one event
pub async fn insert_many<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    books: &[(i32, i64, i64)],
) -> anyhow::Result<usize> {
    let now = Utc::now();
    for chunk in books.chunks(INSERT_CHUNK) {
        let models = chunk.iter().map(|(number, start, end)| ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            event_id: Set(event_id.to_string()),
            book_number: Set(*number),
            start_ticket: Set(*start),
            end_ticket: Set(*end),
            created_at: Set(now),
        });
        Entity::insert_many(models).exec(conn).await?;
    }
    Ok(books.len())
}

pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<LotteryBook>> {
    Ok(Entity::find()
        .filter(Column::EventId.eq(event_id))
        .order_by_asc(Column::BookNumber)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<LotteryBook>> {
    Ok(Entity::find_by_id(id.to_string()).one(conn).await?.map(Into::into))
}

pub async fn find_by_number<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    book_number: i32,
) -> anyhow::Result<Option<LotteryBook>> {
    Ok(Entity::find()
        .filter(Column::EventId.eq(event_id))
        .filter(Column::BookNumber.eq(book_number))
        .one(conn)
        .await?
        .map(Into::into))
}

pub async fn count_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<u64> {
    Ok(Entity::find()
        .filter(Column::EventId.eq(event_id))
        .count(conn)
        .await?)
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> anyhow::Result<u64> {
    Ok(Entity::find().count(conn).await?)
}

pub async fn delete_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}
