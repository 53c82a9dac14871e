use chrono::Utc;
use contracts::domain::a008_csf_member::{CsfMember, CsfMemberDto};
use sea_orm::ConnectionTrait;

use super::repository;
use crate::domain::a009_csf_payment::repository as csf_payment_repository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::{clean_mobile, normalize_mobile, sanitize_opt, sanitize_text};

struct CleanMember {
    flat_number: String,
    member_name: String,
    mobile: Option<String>,
    email: Option<String>,
}

fn clean(dto: &CsfMemberDto) -> AppResult<CleanMember> {
    dto.validate().map_err(AppError::Validation)?;
    let member = CleanMember {
        flat_number: sanitize_text(&dto.flat_number).to_uppercase(),
        member_name: sanitize_text(&dto.member_name),
        mobile: clean_mobile(dto.mobile.as_deref()),
        email: sanitize_opt(dto.email.as_deref()),
    };
    if member.flat_number.is_empty() || member.member_name.is_empty() {
        return Err(AppError::validation("Flat number and member name are required"));
    }
    if let Some(mobile) = &member.mobile {
        if normalize_mobile(mobile).is_none() {
            return Err(AppError::validation(format!("'{}' is not a valid mobile number", mobile)));
        }
    }
    Ok(member)
}

pub async fn create<C: ConnectionTrait>(conn: &C, community_id: &str, dto: CsfMemberDto) -> AppResult<CsfMember> {
    let clean = clean(&dto)?;
    if repository::find_by_flat(conn, community_id, &clean.flat_number).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Flat {} already has a member",
            clean.flat_number
        )));
    }

    let now = Utc::now();
    let member = CsfMember {
        id: uuid::Uuid::new_v4().to_string(),
        community_id: community_id.to_string(),
        flat_number: clean.flat_number,
        member_name: clean.member_name,
        mobile: clean.mobile,
        email: clean.email,
        is_active: dto.is_active.unwrap_or(true),
        joined_on: dto.joined_on,
        created_at: now,
        updated_at: now,
    };
    repository::insert(conn, &member).await?;
    tracing::info!("CSF member {} ({}) added", member.member_name, member.flat_number);
    Ok(member)
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    id: &str,
    dto: CsfMemberDto,
) -> AppResult<CsfMember> {
    let mut member = get_for_community(conn, community_id, id).await?;
    let clean = clean(&dto)?;
    if let Some(other) = repository::find_by_flat(conn, community_id, &clean.flat_number).await? {
        if other.id != member.id {
            return Err(AppError::conflict(format!(
                "Flat {} already has a member",
                clean.flat_number
            )));
        }
    }

    member.flat_number = clean.flat_number;
    member.member_name = clean.member_name;
    member.mobile = clean.mobile;
    member.email = clean.email;
    if let Some(active) = dto.is_active {
        member.is_active = active;
    }
    if dto.joined_on.is_some() {
        member.joined_on = dto.joined_on;
    }
    member.updated_at = Utc::now();
    repository::update(conn, &member).await?;
    Ok(member)
}

pub async fn get_for_community<C: ConnectionTrait>(conn: &C, community_id: &str, id: &str) -> AppResult<CsfMember> {
    repository::get_by_id(conn, id)
        .await?
        .filter(|m| m.community_id == community_id)
        .ok_or_else(|| AppError::not_found("CSF member not found"))
}

pub async fn list<C: ConnectionTrait>(conn: &C, community_id: &str) -> AppResult<Vec<CsfMember>> {
    Ok(repository::list_by_community(conn, community_id).await?)
}

/// Member with all their payments, on the caller's transaction
pub async fn delete_cascade<C: ConnectionTrait>(conn: &C, member_id: &str) -> AppResult<()> {
    csf_payment_repository::delete_for_member(conn, member_id).await?;
    if !repository::delete(conn, member_id).await? {
        return Err(AppError::not_found("CSF member not found"));
    }
    tracing::info!("CSF member {} deleted with payments", member_id);
    Ok(())
}

pub async fn delete_all_for_community<C: ConnectionTrait>(conn: &C, community_id: &str) -> AppResult<()> {
    csf_payment_repository::delete_for_community(conn, community_id).await?;
    repository::delete_for_community(conn, community_id).await?;
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::seed_community;

    pub fn member_dto(flat: &str, name: &str, mobile: Option<&str>) -> CsfMemberDto {
        CsfMemberDto {
            flat_number: flat.into(),
            member_name: name.into(),
            mobile: mobile.map(String::from),
            email: None,
            is_active: None,
            joined_on: None,
        }
    }

    #[tokio::test]
    async fn test_member_crud() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "csf").await;
        let other = seed_community(&db, "csf2").await;

        let m = create(&db, &c, member_dto("a-101", "Ravi <b>Kumar</b>", Some("+91 98765 43210")))
            .await
            .unwrap();
        assert_eq!(m.flat_number, "A-101");
        assert_eq!(m.member_name, "Ravi Kumar");
        assert_eq!(m.mobile.as_deref(), Some("9876543210"));
        assert!(m.is_active);

        assert!(matches!(
            create(&db, &c, member_dto("A-101", "Dup", None)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            create(&db, &c, member_dto("A-102", "Bad", Some("12345"))).await,
            Err(AppError::Validation(_))
        ));
        // Тот же номер квартиры в другом сообществе допустим
        create(&db, &other, member_dto("A-101", "Other", None)).await.unwrap();

        let mut upd = member_dto("A-101", "Ravi K", None);
        upd.is_active = Some(false);
        let updated = update(&db, &c, &m.id, upd).await.unwrap();
        assert!(!updated.is_active);
        assert!(get_for_community(&db, &other, &m.id).await.is_err());

        delete_cascade(&db, &m.id).await.unwrap();
        assert!(list(&db, &c).await.unwrap().is_empty());
    }
}
