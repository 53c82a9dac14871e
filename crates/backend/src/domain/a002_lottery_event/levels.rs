//! Storage of distribution level names and the value hierarchy of an event.

use contracts::domain::a002_lottery_event::levels::{DistributionLevel, LevelValue};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

pub mod level {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "a002_distribution_level")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub event_id: String,
        pub level_number: i32,
        pub level_name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod level_value {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "a002_distribution_level_value")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub event_id: String,
        pub level_number: i32,
        pub value_name: String,
        pub parent_value_id: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<level::Model> for DistributionLevel {
    fn from(m: level::Model) -> Self {
        DistributionLevel {
            id: m.id,
            event_id: m.event_id,
            level_number: m.level_number,
            level_name: m.level_name,
        }
    }
}

impl From<level_value::Model> for LevelValue {
    fn from(m: level_value::Model) -> Self {
        LevelValue {
            id: m.id,
            event_id: m.event_id,
            level_number: m.level_number,
            value_name: m.value_name,
            parent_value_id: m.parent_value_id,
        }
    }
}

pub async fn list_levels<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<DistributionLevel>> {
    Ok(level::Entity::find()
        .filter(level::Column::EventId.eq(event_id))
        .order_by_asc(level::Column::LevelNumber)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Replaces all level names of an event (numbered from 1)
pub async fn replace_levels<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    names: &[String],
) -> anyhow::Result<()> {
    level::Entity::delete_many()
        .filter(level::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;

    for (idx, name) in names.iter().enumerate() {
        let active = level::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            event_id: Set(event_id.to_string()),
            level_number: Set(idx as i32 + 1),
            level_name: Set(name.clone()),
        };
        level::Entity::insert(active).exec(conn).await?;
    }
    Ok(())
}

pub async fn list_values<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<Vec<LevelValue>> {
    Ok(level_value::Entity::find()
        .filter(level_value::Column::EventId.eq(event_id))
        .order_by_asc(level_value::Column::LevelNumber)
        .order_by_asc(level_value::Column::ValueName)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_value<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<LevelValue>> {
    Ok(level_value::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .map(Into::into))
}

pub async fn insert_value<C: ConnectionTrait>(conn: &C, value: &LevelValue) -> anyhow::Result<()> {
    let active = level_value::ActiveModel {
        id: Set(value.id.clone()),
        event_id: Set(value.event_id.clone()),
        level_number: Set(value.level_number),
        value_name: Set(value.value_name.clone()),
        parent_value_id: Set(value.parent_value_id.clone()),
    };
    level_value::Entity::insert(active).exec(conn).await?;
    Ok(())
}

/// Deletes values one by one in the given order; pass leaves before parents
/// so no row is removed by cascade and the count stays exact
pub async fn delete_values<C: ConnectionTrait>(conn: &C, ids: &[String]) -> anyhow::Result<u64> {
    let mut removed = 0;
    for id in ids {
        let res = level_value::Entity::delete_by_id(id.clone()).exec(conn).await?;
        removed += res.rows_affected;
    }
    Ok(removed)
}

pub async fn delete_all_for_event<C: ConnectionTrait>(conn: &C, event_id: &str) -> anyhow::Result<()> {
    level_value::Entity::delete_many()
        .filter(level_value::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    level::Entity::delete_many()
        .filter(level::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;
    Ok(())
}
