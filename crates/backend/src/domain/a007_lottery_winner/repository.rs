use chrono::{DateTime, Utc};
use contracts::domain::a007_lottery_winner::LotteryWinner;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a007_lottery_winner")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub prize_rank: i32,
    pub prize_name: String,
    pub ticket_number: i64,
    pub book_id: Option<String>,
    pub book_number: Option<i32>,
    pub distribution_id: Option<String>,
    pub winner_name: String,
    pub mobile: Option<String>,
    pub distribution_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LotteryWinner {
    fn from(m: Model) -> Self {
        LotteryWinner {
            id: m.id,
            event_id: m.event_id,
            prize_rank: m.prize_rank,
            prize_name: m.prize_name,
            ticket_number: m.ticket_number,
            book_id: m.book_id,
            book_number: m.book_number,
            distribution_id: m.distribution_id,
            winner_name: m.winner_name,
            mobile: m.mobile,
            distribution_path: m.distribution_path,
            created_at: m.created_at,
        }
    }
}

pub async fn list_by_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<LotteryWinner>> {
    Ok(Entity::find()
        .filter(Column::EventId.eq(event_id))
        .order_by_asc(Column::PrizeRank)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<LotteryWinner>> {
    Ok(Entity::find_by_id(id.to_string()).one(conn).await?.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, w: &LotteryWinner) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(w.id.clone()),
        event_id: Set(w.event_id.clone()),
        prize_rank: Set(w.prize_rank),
        prize_name: Set(w.prize_name.clone()),
        ticket_number: Set(w.ticket_number),
        book_id: Set(w.book_id.clone()),
        book_number: Set(w.book_number),
        distribution_id: Set(w.distribution_id.clone()),
        winner_name: Set(w.winner_name.clone()),
        mobile: Set(w.mobile.clone()),
        distribution_path: Set(w.distribution_path.clone()),
        created_at: Set(w.created_at),
    };
    Entity::insert(active).exec(conn).await?;
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
