use contracts::domain::a001_community::aggregate::{
    Community, CommunityDto, CommunityFeature, SetFeatureDto,
};
use contracts::enums::FeatureKey;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a002_lottery_event::service as event_service;
use crate::domain::a008_csf_member::service as csf_member_service;
use crate::domain::a010_deletion_request::repository as deletion_repository;
use crate::shared::error::{AppError, AppResult};

/// Создание новой записи; все функции сообщества включаются по умолчанию
pub async fn create(db: &DatabaseConnection, dto: CommunityDto) -> AppResult<String> {
    let mut aggregate = Community::new_for_insert(
        dto.code.clone(),
        dto.name.clone(),
        dto.address.clone(),
        dto.comment.clone(),
    );
    aggregate.update(&dto);
    aggregate.validate().map_err(AppError::Validation)?;

    if repository::get_by_code(db, &aggregate.base.code).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Community code '{}' is already used",
            aggregate.base.code
        )));
    }

    let txn = db.begin().await?;
    let id = repository::insert(&txn, &aggregate).await?;
    for feature in FeatureKey::all() {
        repository::upsert_feature(&txn, &id, feature, true).await?;
    }
    txn.commit().await?;

    tracing::info!("Community {} created ({})", aggregate.base.code, id);
    Ok(id)
}

pub async fn update(db: &DatabaseConnection, id: &str, dto: CommunityDto) -> AppResult<()> {
    let mut aggregate = get_by_id(db, id).await?;
    aggregate.update(&dto);
    aggregate.validate().map_err(AppError::Validation)?;

    if let Some(other) = repository::get_by_code(db, &aggregate.base.code).await? {
        if other.to_string_id() != id {
            return Err(AppError::conflict(format!(
                "Community code '{}' is already used",
                aggregate.base.code
            )));
        }
    }

    aggregate.base.metadata.increment_version();
    aggregate.before_write();
    repository::update(db, &aggregate).await?;
    Ok(())
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<Community> {
    repository::get_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Community not found"))
}

pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<Community>> {
    Ok(repository::list_all(db).await?)
}

/// Removes the community with all lottery and CSF data in one transaction
pub async fn delete(db: &DatabaseConnection, id: &str) -> AppResult<()> {
    get_by_id(db, id).await?;

    let txn = db.begin().await?;
    for event in crate::domain::a002_lottery_event::repository::list_by_community(&txn, id).await? {
        event_service::delete_cascade(&txn, &event.to_string_id()).await?;
    }
    csf_member_service::delete_all_for_community(&txn, id).await?;
    deletion_repository::delete_for_community(&txn, id).await?;
    repository::delete(&txn, id).await?;
    txn.commit().await?;

    tracing::info!("Community {} deleted", id);
    Ok(())
}

/// Every feature with its state; features never written count as enabled
pub async fn list_features<C: ConnectionTrait>(conn: &C, community_id: &str) -> AppResult<Vec<CommunityFeature>> {
    get_by_id(conn, community_id).await?;
    let stored = repository::list_features(conn, community_id).await?;
    Ok(FeatureKey::all()
        .into_iter()
        .map(|feature| {
            stored
                .iter()
                .find(|f| f.feature == feature)
                .cloned()
                .unwrap_or(CommunityFeature {
                    community_id: community_id.to_string(),
                    feature,
                    is_enabled: true,
                    updated_at: String::new(),
                })
        })
        .collect())
}

pub async fn set_feature<C: ConnectionTrait>(conn: &C, community_id: &str, dto: SetFeatureDto) -> AppResult<()> {
    get_by_id(conn, community_id).await?;
    repository::upsert_feature(conn, community_id, dto.feature, dto.is_enabled).await?;
    tracing::info!(
        "Feature {} {} for community {}",
        dto.feature.code(),
        if dto.is_enabled { "enabled" } else { "disabled" },
        community_id
    );
    Ok(())
}

/// Forbidden unless the community is active and the feature is on
pub async fn ensure_feature_enabled<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    feature: FeatureKey,
) -> AppResult<()> {
    let community = get_by_id(conn, community_id).await?;
    if !community.is_active {
        return Err(AppError::forbidden("Community is inactive"));
    }
    let enabled = repository::get_feature(conn, community_id, feature)
        .await?
        .unwrap_or(true);
    if !enabled {
        return Err(AppError::forbidden(format!(
            "{} is disabled for this community",
            feature.display_name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    pub fn dto(code: &str) -> CommunityDto {
        CommunityDto {
            id: None,
            code: code.into(),
            name: format!("{} Society", code),
            address: Some("MG Road".into()),
            comment: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_unique_code_and_features() {
        let db = connect_in_memory().await.unwrap();
        let id = create(&db, dto("green")).await.unwrap();
        assert_eq!(get_by_id(&db, &id).await.unwrap().base.code, "GREEN");
        assert!(matches!(create(&db, dto("GREEN")).await, Err(AppError::Conflict(_))));

        let features = list_features(&db, &id).await.unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|f| f.is_enabled));

        ensure_feature_enabled(&db, &id, FeatureKey::Csf).await.unwrap();
        set_feature(
            &db,
            &id,
            SetFeatureDto {
                feature: FeatureKey::Csf,
                is_enabled: false,
            },
        )
        .await
        .unwrap();
        assert!(matches!(
            ensure_feature_enabled(&db, &id, FeatureKey::Csf).await,
            Err(AppError::Forbidden(_))
        ));
        ensure_feature_enabled(&db, &id, FeatureKey::Lottery).await.unwrap();
    }

    #[tokio::test]
    async fn test_inactive_community_blocks_features() {
        let db = connect_in_memory().await.unwrap();
        let id = create(&db, dto("blue")).await.unwrap();
        let mut update_dto = dto("blue");
        update_dto.is_active = Some(false);
        update(&db, &id, update_dto).await.unwrap();
        assert!(ensure_feature_enabled(&db, &id, FeatureKey::Lottery).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_community() {
        let db = connect_in_memory().await.unwrap();
        let id = create(&db, dto("red")).await.unwrap();
        delete(&db, &id).await.unwrap();
        assert!(matches!(get_by_id(&db, &id).await, Err(AppError::NotFound(_))));
        assert!(delete(&db, &id).await.is_err());
    }
}
