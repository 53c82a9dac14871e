use chrono::{DateTime, Utc};
use contracts::domain::a010_deletion_request::DeletionRequest;
use contracts::enums::{DeletionStatus, DeletionTarget};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a010_deletion_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub target_type: String,
    pub target_id: String,
    pub target_label: String,
    pub reason: String,
    pub status: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    fn into_request(self) -> Option<DeletionRequest> {
        Some(DeletionRequest {
            target_type: DeletionTarget::from_code(&self.target_type)?,
            status: DeletionStatus::from_code(&self.status)?,
            id: self.id,
            community_id: self.community_id,
            target_id: self.target_id,
            target_label: self.target_label,
            reason: self.reason,
            requested_by: self.requested_by,
            requested_at: self.requested_at,
            decided_by: self.decided_by,
            decided_at: self.decided_at,
            decision_note: self.decision_note,
        })
    }
}

fn to_active(r: &DeletionRequest) -> ActiveModel {
    ActiveModel {
        id: Set(r.id.clone()),
        community_id: Set(r.community_id.clone()),
        target_type: Set(r.target_type.code().to_string()),
        target_id: Set(r.target_id.clone()),
        target_label: Set(r.target_label.clone()),
        reason: Set(r.reason.clone()),
        status: Set(r.status.code().to_string()),
        requested_by: Set(r.requested_by.clone()),
        requested_at: Set(r.requested_at),
        decided_by: Set(r.decided_by.clone()),
        decided_at: Set(r.decided_at),
        decision_note: Set(r.decision_note.clone()),
    }
}

/// Newest first
pub async fn list<C: ConnectionTrait>(conn: &C, status: Option<DeletionStatus>) -> anyhow::Result<Vec<DeletionRequest>> {
    let mut query = Entity::find();
    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status.code()));
    }
    Ok(query
        .order_by_desc(Column::RequestedAt)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(Model::into_request)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<DeletionRequest>> {
    Ok(Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .and_then(Model::into_request))
}

pub async fn find_pending<C: ConnectionTrait>(
    conn: &C,
    target_type: DeletionTarget,
    target_id: &str,
) -> anyhow::Result<Option<DeletionRequest>> {
    Ok(Entity::find()
        .filter(Column::TargetType.eq(target_type.code()))
        .filter(Column::TargetId.eq(target_id))
        .filter(Column::Status.eq(DeletionStatus::Pending.code()))
        .one(conn)
        .await?
        .and_then(Model::into_request))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, request: &DeletionRequest) -> anyhow::Result<()> {
    Entity::insert(to_active(request)).exec(conn).await?;
    Ok(())
}

pub async fn update<C: ConnectionTrait>(conn: &C, request: &DeletionRequest) -> anyhow::Result<()> {
    to_active(request).update(conn).await?;
    Ok(())
}

pub async fn delete_for_community<C: ConnectionTrait>(conn: &C, community_id: &str) -> anyhow::Result<u64> {
    let res = Entity::delete_many()
        .filter(Column::CommunityId.eq(community_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count_pending<C: ConnectionTrait>(conn: &C) -> anyhow::Result<u64> {
    Ok(Entity::find()
        .filter(Column::Status.eq(DeletionStatus::Pending.code()))
        .count(conn)
        .await?)
}
