use chrono::Utc;
use contracts::domain::a010_deletion_request::{
    CreateDeletionRequestDto, DecideDeletionRequestDto, DeletionRequest,
};
use contracts::enums::{DeletionStatus, DeletionTarget};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a002_lottery_event::service as event_service;
use crate::domain::a008_csf_member::service as member_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::{sanitize_opt, sanitize_text};
use crate::system::auth::context::RequestContext;

async fn create_request<C: ConnectionTrait>(
    conn: &C,
    ctx: &RequestContext,
    target_type: DeletionTarget,
    target_id: String,
    target_label: String,
    dto: CreateDeletionRequestDto,
) -> AppResult<DeletionRequest> {
    let reason = sanitize_text(&dto.reason);
    if reason.is_empty() {
        return Err(AppError::validation("A reason is required"));
    }
    if repository::find_pending(conn, target_type, &target_id).await?.is_some() {
        return Err(AppError::conflict(format!(
            "A deletion request for '{}' is already pending",
            target_label
        )));
    }

    let request = DeletionRequest {
        id: uuid::Uuid::new_v4().to_string(),
        community_id: ctx.community_id()?.to_string(),
        target_type,
        target_id,
        target_label,
        reason,
        status: DeletionStatus::Pending,
        requested_by: ctx.username.clone(),
        requested_at: Utc::now(),
        decided_by: None,
        decided_at: None,
        decision_note: None,
    };
    repository::insert(conn, &request).await?;
    tracing::info!(
        "Deletion of {} '{}' requested by {}",
        request.target_type.code(),
        request.target_label,
        request.requested_by
    );
    Ok(request)
}

pub async fn request_event_deletion<C: ConnectionTrait>(
    conn: &C,
    ctx: &RequestContext,
    event_id: &str,
    dto: CreateDeletionRequestDto,
) -> AppResult<DeletionRequest> {
    let event = event_service::get_for_community(conn, ctx, event_id).await?;
    let label = format!("{} ({})", event.base.description, event.base.code);
    create_request(conn, ctx, DeletionTarget::LotteryEvent, event.to_string_id(), label, dto).await
}

pub async fn request_member_deletion<C: ConnectionTrait>(
    conn: &C,
    ctx: &RequestContext,
    member_id: &str,
    dto: CreateDeletionRequestDto,
) -> AppResult<DeletionRequest> {
    let member = member_service::get_for_community(conn, ctx.community_id()?, member_id).await?;
    let label = format!("{} ({})", member.member_name, member.flat_number);
    create_request(conn, ctx, DeletionTarget::CsfMember, member.id, label, dto).await
}

pub async fn list<C: ConnectionTrait>(conn: &C, status: Option<&str>) -> AppResult<Vec<DeletionRequest>> {
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => Some(
            DeletionStatus::from_code(code)
                .ok_or_else(|| AppError::validation(format!("Unknown status '{}'", code)))?,
        ),
        None => None,
    };
    Ok(repository::list(conn, status).await?)
}

async fn pending<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<DeletionRequest> {
    let request = repository::get_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Deletion request not found"))?;
    if request.is_decided() {
        return Err(AppError::conflict(format!(
            "Request was already {}",
            request.status.code()
        )));
    }
    Ok(request)
}

/// Deletes the target with everything under it and marks the request approved
pub async fn approve(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: &str,
    dto: DecideDeletionRequestDto,
) -> AppResult<DeletionRequest> {
    let txn = db.begin().await?;
    let mut request = pending(&txn, id).await?;

    let deleted = match request.target_type {
        DeletionTarget::LotteryEvent => event_service::delete_cascade(&txn, &request.target_id).await,
        DeletionTarget::CsfMember => member_service::delete_cascade(&txn, &request.target_id).await,
    };
    match deleted {
        Ok(()) => {}
        Err(AppError::NotFound(_)) => tracing::warn!(
            "Target of deletion request {} no longer exists",
            request.id
        ),
        Err(e) => return Err(e),
    }

    request.status = DeletionStatus::Approved;
    request.decided_by = Some(ctx.username.clone());
    request.decided_at = Some(Utc::now());
    request.decision_note = sanitize_opt(dto.note.as_deref());
    repository::update(&txn, &request).await?;
    txn.commit().await?;

    tracing::info!(
        "Deletion request {} approved by {}: {} '{}' removed",
        request.id,
        ctx.username,
        request.target_type.code(),
        request.target_label
    );
    Ok(request)
}

pub async fn reject<C: ConnectionTrait>(
    conn: &C,
    ctx: &RequestContext,
    id: &str,
    dto: DecideDeletionRequestDto,
) -> AppResult<DeletionRequest> {
    let mut request = pending(conn, id).await?;
    request.status = DeletionStatus::Rejected;
    request.decided_by = Some(ctx.username.clone());
    request.decided_at = Some(Utc::now());
    request.decision_note = sanitize_opt(dto.note.as_deref());
    repository::update(conn, &request).await?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a002_lottery_event::repository as event_repository;
    use crate::domain::a003_lottery_book::repository as book_repository;
    use crate::domain::a005_payment_collection::{repository as payment_repository, service as payment_service};
    use crate::domain::a008_csf_member::service::tests::member_dto;
    use crate::projections::p900_commission_earned::repository as commission_repository;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign, enable_early, group_admin_ctx, payment, seed_community, seed_event};
    use chrono::NaiveDate;
    use contracts::enums::UserRole;

    fn reason(text: &str) -> CreateDeletionRequestDto {
        CreateDeletionRequestDto { reason: text.into() }
    }

    fn admin() -> RequestContext {
        RequestContext::new("admin-id", "admin", UserRole::Admin, None)
    }

    #[tokio::test]
    async fn test_approve_event_deletes_everything() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "del").await;
        let ctx = group_admin_ctx(&c);
        let event = seed_event(&db, &c, true).await;
        let event_id = event.to_string_id();
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        enable_early(&db, &event, 10.0, date).await;
        let dist = assign(&db, &event, 1, "A", "Ravi").await;
        payment_service::record(&db, &event, &dist.id, payment(100.0, date), None)
            .await
            .unwrap();

        assert!(matches!(
            request_event_deletion(&db, &ctx, &event_id, reason(" ")).await,
            Err(AppError::Validation(_))
        ));
        let request = request_event_deletion(&db, &ctx, &event_id, reason("Created twice"))
            .await
            .unwrap();
        assert!(matches!(
            request_event_deletion(&db, &ctx, &event_id, reason("again")).await,
            Err(AppError::Conflict(_))
        ));

        let approved = approve(&db, &admin(), &request.id, DecideDeletionRequestDto::default())
            .await
            .unwrap();
        assert_eq!(approved.status, DeletionStatus::Approved);
        assert_eq!(approved.decided_by.as_deref(), Some("admin"));

        assert!(event_repository::get_by_id(&db, &event_id).await.unwrap().is_none());
        assert_eq!(book_repository::count_for_event(&db, &event_id).await.unwrap(), 0);
        assert!(payment_repository::list_by_event(&db, &event_id).await.unwrap().is_empty());
        assert!(commission_repository::list_by_event(&db, &event_id).await.unwrap().is_empty());

        assert!(matches!(
            reject(&db, &admin(), &request.id, DecideDeletionRequestDto::default()).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(list(&db, Some("approved")).await.unwrap().len(), 1);
        assert!(list(&db, Some("bogus")).await.is_err());
    }

    #[tokio::test]
    async fn test_reject_member_request() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "rej").await;
        let other = seed_community(&db, "rej2").await;
        let ctx = group_admin_ctx(&c);
        let m = member_service::create(&db, &c, member_dto("C-3", "Gopal", None)).await.unwrap();

        assert!(matches!(
            request_member_deletion(&db, &group_admin_ctx(&other), &m.id, reason("x")).await,
            Err(AppError::NotFound(_))
        ));
        let request = request_member_deletion(&db, &ctx, &m.id, reason("Left society")).await.unwrap();
        assert_eq!(request.target_label, "Gopal (C-3)");

        let rejected = reject(
            &db,
            &admin(),
            &request.id,
            DecideDeletionRequestDto { note: Some("Still a member".into()) },
        )
        .await
        .unwrap();
        assert_eq!(rejected.status, DeletionStatus::Rejected);
        assert!(member_service::get_for_community(&db, &c, &m.id).await.is_ok());
        assert_eq!(list(&db, Some("pending")).await.unwrap().len(), 0);
    }
}
