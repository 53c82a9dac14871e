use chrono::Utc;
use contracts::domain::a001_community::aggregate::{Community, CommunityFeature, CommunityId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use contracts::enums::FeatureKey;
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_community")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Community {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        Community {
            base: BaseAggregate::with_metadata(
                CommunityId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            address: m.address,
            is_active: m.is_active,
        }
    }
}

fn to_active(aggregate: &Community) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.to_string_id()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        address: Set(aggregate.address.clone()),
        is_active: Set(aggregate.is_active),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn list_all<C: ConnectionTrait>(conn: &C) -> anyhow::Result<Vec<Community>> {
    let items = Entity::find()
        .order_by_asc(Column::Description)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<Community>> {
    let result = Entity::find_by_id(id.to_string()).one(conn).await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_code<C: ConnectionTrait>(conn: &C, code: &str) -> anyhow::Result<Option<Community>> {
    let result = Entity::find()
        .filter(Column::Code.eq(code))
        .one(conn)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, aggregate: &Community) -> anyhow::Result<String> {
    to_active(aggregate).insert(conn).await?;
    Ok(aggregate.to_string_id())
}

pub async fn update<C: ConnectionTrait>(conn: &C, aggregate: &Community) -> anyhow::Result<()> {
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

// ============================================================================
// Feature toggles
// ============================================================================

pub mod feature {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "a001_community_feature")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub community_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub feature: String,
        pub is_enabled: bool,
        pub updated_at: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub async fn list_features<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
) -> anyhow::Result<Vec<CommunityFeature>> {
    let rows = feature::Entity::find()
        .filter(feature::Column::CommunityId.eq(community_id))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|m| {
            FeatureKey::from_code(&m.feature).map(|feature| CommunityFeature {
                community_id: m.community_id,
                feature,
                is_enabled: m.is_enabled,
                updated_at: m.updated_at,
            })
        })
        .collect())
}

/// Stored toggle, None when the feature row was never written
pub async fn get_feature<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    feature_key: FeatureKey,
) -> anyhow::Result<Option<bool>> {
    let row = feature::Entity::find_by_id((community_id.to_string(), feature_key.code().to_string()))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.is_enabled))
}

pub async fn upsert_feature<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    feature_key: FeatureKey,
    is_enabled: bool,
) -> anyhow::Result<()> {
    let active = feature::ActiveModel {
        community_id: Set(community_id.to_string()),
        feature: Set(feature_key.code().to_string()),
        is_enabled: Set(is_enabled),
        updated_at: Set(Utc::now().to_rfc3339()),
    };
    feature::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([feature::Column::CommunityId, feature::Column::Feature])
                .update_columns([feature::Column::IsEnabled, feature::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}
