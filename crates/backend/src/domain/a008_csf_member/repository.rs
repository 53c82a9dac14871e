use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a008_csf_member::CsfMember;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a008_csf_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub flat_number: String,
    pub member_name: String,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub joined_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CsfMember {
    fn from(m: Model) -> Self {
        CsfMember {
            id: m.id,
            community_id: m.community_id,
            flat_number: m.flat_number,
            member_name: m.member_name,
            mobile: m.mobile,
            email: m.email,
            is_active: m.is_active,
            joined_on: m.joined_on,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn to_active(m: &CsfMember) -> ActiveModel {
    ActiveModel {
        id: Set(m.id.clone()),
        community_id: Set(m.community_id.clone()),
        flat_number: Set(m.flat_number.clone()),
        member_name: Set(m.member_name.clone()),
        mobile: Set(m.mobile.clone()),
        email: Set(m.email.clone()),
        is_active: Set(m.is_active),
        joined_on: Set(m.joined_on),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub async fn list_by_community<C: ConnectionTrait>(conn: &C, community_id: &str) -> anyhow::Result<Vec<CsfMember>> {
    Ok(Entity::find()
        .filter(Column::CommunityId.eq(community_id))
        .order_by_asc(Column::FlatNumber)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<Option<CsfMember>> {
    Ok(Entity::find_by_id(id.to_string()).one(conn).await?.map(Into::into))
}

pub async fn find_by_flat<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    flat_number: &str,
) -> anyhow::Result<Option<CsfMember>> {
    Ok(Entity::find()
        .filter(Column::CommunityId.eq(community_id))
        .filter(Column::FlatNumber.eq(flat_number))
        .one(conn)
        .await?
        .map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(conn: &C, member: &CsfMember) -> anyhow::Result<()> {
    Entity::insert(to_active(member)).exec(conn).await?;
    Ok(())
}

pub async fn update<C: ConnectionTrait>(conn: &C, member: &CsfMember) -> anyhow::Result<()> {
    to_active(member).update(conn).await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> anyhow::Result<bool> {
    let res = Entity::delete_by_id(id.to_string()).exec(conn).await?;
    Ok(res.rows_affected > 0)
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
