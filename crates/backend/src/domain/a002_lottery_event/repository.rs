use chrono::{NaiveDate, Utc};
use contracts::domain::a002_lottery_event::aggregate::{LotteryEvent, LotteryEventId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_lottery_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub tickets_per_book: i32,
    pub price_per_ticket: f64,
    pub total_books: i32,
    pub first_ticket_number: i64,
    pub draw_date: Option<NaiveDate>,
    pub books_generated: bool,
    pub created_by: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LotteryEvent {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        LotteryEvent {
            base: BaseAggregate::with_metadata(
                LotteryEventId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            community_id: m.community_id,
            tickets_per_book: m.tickets_per_book,
            price_per_ticket: m.price_per_ticket,
            total_books: m.total_books,
            first_ticket_number: m.first_ticket_number,
            draw_date: m.draw_date,
            books_generated: m.books_generated,
            created_by: m.created_by,
        }
    }
}

fn to_active(aggregate: &LotteryEvent) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.to_string_id()),
        community_id: Set(aggregate.community_id.clone()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        tickets_per_book: Set(aggregate.tickets_per_book),
        price_per_ticket: Set(aggregate.price_per_ticket),
        total_books: Set(aggregate.total_books),
        first_ticket_number: Set(aggregate.first_ticket_number),
        draw_date: Set(aggregate.draw_date),
        books_generated: Set(aggregate.books_generated),
        created_by: Set(aggregate.created_by.clone()),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn list_by_community<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
) -> anyhow::Result<Vec<LotteryEvent>> {
    let items = Entity::find()
        .filter(Column::CommunityId.eq(community_id))
        .order_by_desc(Column::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<LotteryEvent>> {
    let result = Entity::find_by_id(id.to_string()).one(conn).await?;
    Ok(result.map(Into::into))
}

pub async fn find_by_code<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    code: &str,
) -> anyhow::Result<Option<LotteryEvent>> {
    let result = Entity::find()
        .filter(Column::CommunityId.eq(community_id))
        .filter(Column::Code.eq(code))
        .one(conn)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, aggregate: &LotteryEvent) -> anyhow::Result<String> {
    to_active(aggregate).insert(conn).await?;
    Ok(aggregate.to_string_id())
}

pub async fn update<C: ConnectionTrait>(conn: &C, aggregate: &LotteryEvent) -> anyhow::Result<()> {
    to_active(aggregate).update(conn).await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<bool> {
    let res = Entity::delete_by_id(id.to_string()).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> anyhow::Result<u64> {
    Ok(Entity::find().count(conn).await?)
}
