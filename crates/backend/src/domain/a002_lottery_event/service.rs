use std::collections::{BTreeMap, HashMap, HashSet};

use contracts::domain::a002_lottery_event::aggregate::{
    EventSummary, LevelOneSummary, LotteryEvent, LotteryEventDto,
};
use contracts::domain::a002_lottery_event::levels::{
    AddLevelValueDto, LevelTree, LevelValue, LevelValueNode, SetLevelsDto, MAX_LEVELS,
};
use contracts::enums::PaymentStatus;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::{levels, repository};
use crate::domain::a003_lottery_book::repository as book_repository;
use crate::domain::a004_book_distribution::repository as distribution_repository;
use crate::domain::a005_payment_collection::repository as payment_repository;
use crate::domain::a006_commission_setting::repository as setting_repository;
use crate::domain::a007_lottery_winner::repository as winner_repository;
use crate::projections::p900_commission_earned::repository as commission_repository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::{round2, sanitize_opt, sanitize_text};
use crate::system::auth::context::RequestContext;

pub async fn create(db: &DatabaseConnection, ctx: &RequestContext, dto: LotteryEventDto) -> AppResult<String> {
    let community_id = ctx.community_id()?.to_string();
    let dto = clean_dto(dto);
    let aggregate = LotteryEvent::new_for_insert(community_id.clone(), &dto, Some(ctx.user_id.clone()));
    aggregate.validate().map_err(AppError::Validation)?;

    if repository::find_by_code(db, &community_id, &aggregate.base.code).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Event code '{}' is already used",
            aggregate.base.code
        )));
    }

    let id = repository::insert(db, &aggregate).await?;
    tracing::info!("Lottery event {} created in community {}", aggregate.base.code, community_id);
    Ok(id)
}

pub async fn update(db: &DatabaseConnection, ctx: &RequestContext, id: &str, dto: LotteryEventDto) -> AppResult<()> {
    let mut aggregate = get_for_community(db, ctx, id).await?;
    let dto = clean_dto(dto);
    aggregate.update(&dto).map_err(AppError::Validation)?;
    aggregate.validate().map_err(AppError::Validation)?;

    if let Some(other) = repository::find_by_code(db, &aggregate.community_id, &aggregate.base.code).await? {
        if other.to_string_id() != id {
            return Err(AppError::conflict(format!(
                "Event code '{}' is already used",
                aggregate.base.code
            )));
        }
    }

    aggregate.base.metadata.increment_version();
    aggregate.before_write();
    repository::update(db, &aggregate).await?;
    Ok(())
}

fn clean_dto(mut dto: LotteryEventDto) -> LotteryEventDto {
    dto.name = sanitize_text(&dto.name);
    dto.description = sanitize_opt(dto.description.as_deref());
    dto.code = sanitize_opt(dto.code.as_deref()).map(|c| c.to_uppercase());
    dto
}

/// Event of the caller's community; events of other communities are reported as missing
pub async fn get_for_community<C: ConnectionTrait>(
    conn: &C,
    ctx: &RequestContext,
    id: &str,
) -> AppResult<LotteryEvent> {
    let community_id = ctx.community_id()?;
    match repository::get_by_id(conn, id).await? {
        Some(event) if event.community_id == community_id => Ok(event),
        _ => Err(AppError::not_found("Lottery event not found")),
    }
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<LotteryEvent> {
    repository::get_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Lottery event not found"))
}

pub async fn list(db: &DatabaseConnection, ctx: &RequestContext) -> AppResult<Vec<LotteryEvent>> {
    Ok(repository::list_by_community(db, ctx.community_id()?).await?)
}

/// Removes the event with every dependent row.
/// Runs on the caller's transaction; child rows go first so the result does
/// not depend on foreign key enforcement.
pub async fn delete_cascade<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<()> {
    commission_repository::delete_for_event(conn, event_id).await?;
    winner_repository::delete_for_event(conn, event_id).await?;
    payment_repository::delete_for_event(conn, event_id).await?;
    distribution_repository::delete_for_event(conn, event_id).await?;
    book_repository::delete_for_event(conn, event_id).await?;
    levels::delete_all_for_event(conn, event_id).await?;
    setting_repository::delete_for_event(conn, event_id).await?;
    if !repository::delete(conn, event_id).await? {
        return Err(AppError::not_found("Lottery event not found"));
    }
    tracing::info!("Lottery event {} deleted with all dependent rows", event_id);
    Ok(())
}

// ============================================================================
// Distribution levels
// ============================================================================

pub async fn get_level_tree<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<LevelTree> {
    let levels = levels::list_levels(conn, event_id).await?;
    let values = levels::list_values(conn, event_id).await?;
    Ok(LevelTree {
        levels,
        roots: build_tree(&values),
    })
}

fn build_tree(values: &[LevelValue]) -> Vec<LevelValueNode> {
    let mut by_parent: HashMap<Option<&str>, Vec<&LevelValue>> = HashMap::new();
    for value in values {
        by_parent
            .entry(value.parent_value_id.as_deref())
            .or_default()
            .push(value);
    }

    fn collect(parent: Option<&str>, by_parent: &HashMap<Option<&str>, Vec<&LevelValue>>) -> Vec<LevelValueNode> {
        by_parent
            .get(&parent)
            .map(|children| {
                children
                    .iter()
                    .map(|v| LevelValueNode {
                        id: v.id.clone(),
                        level_number: v.level_number,
                        value_name: v.value_name.clone(),
                        children: collect(Some(v.id.as_str()), by_parent),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    collect(None, &by_parent)
}

/// Replaces level names; values on levels that would disappear block the change
pub async fn set_level_names(db: &DatabaseConnection, event_id: &str, dto: SetLevelsDto) -> AppResult<()> {
    let names: Vec<String> = dto.names.iter().map(|n| sanitize_text(n)).collect();
    if names.is_empty() || names.len() > MAX_LEVELS {
        return Err(AppError::validation(format!(
            "Between 1 and {} levels are allowed",
            MAX_LEVELS
        )));
    }
    if names.iter().any(|n| n.is_empty()) {
        return Err(AppError::validation("Level name cannot be empty"));
    }
    let unique: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
    if unique.len() != names.len() {
        return Err(AppError::validation("Level names must be unique"));
    }

    let values = levels::list_values(db, event_id).await?;
    if let Some(orphan) = values.iter().find(|v| v.level_number as usize > names.len()) {
        return Err(AppError::conflict(format!(
            "Level {} still has values (e.g. '{}'); delete them first",
            orphan.level_number, orphan.value_name
        )));
    }

    let txn = db.begin().await?;
    levels::replace_levels(&txn, event_id, &names).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn add_level_value<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    dto: AddLevelValueDto,
) -> AppResult<String> {
    let value_name = sanitize_text(&dto.value_name);
    if value_name.is_empty() {
        return Err(AppError::validation("Value cannot be empty"));
    }

    let level_count = levels::list_levels(conn, event_id).await?.len() as i32;
    if dto.level_number < 1 || dto.level_number > level_count {
        return Err(AppError::validation(format!(
            "Level {} is not defined for this event",
            dto.level_number
        )));
    }

    let parent_value_id = match (dto.level_number, dto.parent_value_id) {
        (1, None) => None,
        (1, Some(_)) => return Err(AppError::validation("Level 1 values have no parent")),
        (_, None) => return Err(AppError::validation("Parent value is required")),
        (level, Some(parent_id)) => {
            let parent = levels::get_value(conn, &parent_id)
                .await?
                .filter(|p| p.event_id == event_id)
                .ok_or_else(|| AppError::not_found("Parent value not found"))?;
            if parent.level_number != level - 1 {
                return Err(AppError::validation(format!(
                    "Parent must be a level {} value",
                    level - 1
                )));
            }
            Some(parent_id)
        }
    };

    let siblings = levels::list_values(conn, event_id).await?;
    let duplicate = siblings.iter().any(|v| {
        v.level_number == dto.level_number
            && v.parent_value_id == parent_value_id
            && v.value_name.eq_ignore_ascii_case(&value_name)
    });
    if duplicate {
        return Err(AppError::conflict(format!("'{}' already exists", value_name)));
    }

    let value = LevelValue {
        id: uuid::Uuid::new_v4().to_string(),
        event_id: event_id.to_string(),
        level_number: dto.level_number,
        value_name,
        parent_value_id,
    };
    levels::insert_value(conn, &value).await?;
    Ok(value.id)
}

/// Deletes the value with its whole subtree; existing distributions keep their path
pub async fn delete_level_value(db: &DatabaseConnection, event_id: &str, value_id: &str) -> AppResult<u64> {
    let values = levels::list_values(db, event_id).await?;
    if !values.iter().any(|v| v.id == value_id) {
        return Err(AppError::not_found("Level value not found"));
    }

    let mut doomed = vec![value_id.to_string()];
    let mut idx = 0;
    while idx < doomed.len() {
        let current = doomed[idx].clone();
        doomed.extend(
            values
                .iter()
                .filter(|v| v.parent_value_id.as_deref() == Some(current.as_str()))
                .map(|v| v.id.clone()),
        );
        idx += 1;
    }

    let txn = db.begin().await?;
    // Обход в ширину: после reverse листья идут первыми
    doomed.reverse();
    let removed = levels::delete_values(&txn, &doomed).await?;
    txn.commit().await?;
    Ok(removed)
}

// ============================================================================
// Summary
// ============================================================================

pub async fn summary<C: ConnectionTrait>(conn: &C, event: &LotteryEvent) -> AppResult<EventSummary> {
    let event_id = event.to_string_id();
    let book_value = round2(event.book_value());
    let total_books = book_repository::count_for_event(conn, &event_id).await? as i64;
    let distributions = distribution_repository::list_by_event(conn, &event_id).await?;
    let paid = payment_repository::totals_by_distribution(conn, &event_id).await?;
    let commissions = commission_repository::list_by_event(conn, &event_id).await?;

    let mut summary = EventSummary {
        event_id: event_id.clone(),
        book_value,
        total_books,
        ..Default::default()
    };
    let mut by_level: BTreeMap<String, LevelOneSummary> = BTreeMap::new();

    for dist in &distributions {
        let total_paid = paid.get(&dist.id).map_or(0.0, |p| p.total);
        summary.collected_amount += total_paid;

        let level = by_level
            .entry(dist.level_1_value.clone())
            .or_insert_with(|| LevelOneSummary {
                level_1_value: dist.level_1_value.clone(),
                ..Default::default()
            });
        level.books += 1;
        level.collected_amount += total_paid;

        if dist.is_returned {
            summary.returned_books += 1;
            continue;
        }
        summary.distributed_books += 1;
        if dist.is_extra_book {
            summary.extra_books += 1;
        }
        summary.expected_amount += book_value;
        level.expected_amount += book_value;

        match PaymentStatus::from_amounts(total_paid, book_value) {
            PaymentStatus::Paid => summary.fully_paid_books += 1,
            PaymentStatus::Partial => summary.partially_paid_books += 1,
            PaymentStatus::Unpaid => {}
        }
    }

    for row in &commissions {
        summary.total_commission += row.commission_amount;
        if let Some(level) = by_level.get_mut(&row.level_1_value) {
            level.commission += row.commission_amount;
        }
    }

    summary.expected_amount = round2(summary.expected_amount);
    summary.collected_amount = round2(summary.collected_amount);
    summary.outstanding_amount = round2((summary.expected_amount - summary.collected_amount).max(0.0));
    summary.total_commission = round2(summary.total_commission);
    summary.by_level_1 = by_level
        .into_values()
        .map(|mut l| {
            l.expected_amount = round2(l.expected_amount);
            l.collected_amount = round2(l.collected_amount);
            l.commission = round2(l.commission);
            l
        })
        .collect();
    Ok(summary)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{group_admin_ctx, seed_community};

    pub fn event_dto(code: &str) -> LotteryEventDto {
        LotteryEventDto {
            id: None,
            code: Some(code.into()),
            name: "Diwali Lottery".into(),
            description: Some("Annual draw".into()),
            tickets_per_book: 10,
            price_per_ticket: 50.0,
            total_books: 20,
            first_ticket_number: Some(1),
            draw_date: None,
        }
    }

    #[tokio::test]
    async fn test_event_scoped_to_community() {
        let db = connect_in_memory().await.unwrap();
        let c1 = seed_community(&db, "alpha").await;
        let c2 = seed_community(&db, "beta").await;
        let ctx1 = group_admin_ctx(&c1);
        let ctx2 = group_admin_ctx(&c2);

        let id = create(&db, &ctx1, event_dto("D24")).await.unwrap();
        assert!(get_for_community(&db, &ctx1, &id).await.is_ok());
        assert!(matches!(
            get_for_community(&db, &ctx2, &id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            create(&db, &ctx1, event_dto("d24")).await,
            Err(AppError::Conflict(_))
        ));
        // Код уникален только внутри сообщества
        create(&db, &ctx2, event_dto("D24")).await.unwrap();
        assert_eq!(list(&db, &ctx1).await.unwrap().len(), 1);

        let mut huge = event_dto("HUGE");
        huge.first_ticket_number = Some(i64::MAX - 100);
        assert!(matches!(
            create(&db, &ctx1, huge).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_level_tree() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "gamma").await;
        let ctx = group_admin_ctx(&c);
        let event_id = create(&db, &ctx, event_dto("T1")).await.unwrap();

        set_level_names(&db, &event_id, SetLevelsDto { names: vec!["Wing".into(), "Floor".into()] })
            .await
            .unwrap();
        assert!(set_level_names(&db, &event_id, SetLevelsDto { names: vec!["A".into(); 6] })
            .await
            .is_err());

        let wing = add_level_value(
            &db,
            &event_id,
            AddLevelValueDto { level_number: 1, value_name: "A".into(), parent_value_id: None },
        )
        .await
        .unwrap();
        let floor = add_level_value(
            &db,
            &event_id,
            AddLevelValueDto { level_number: 2, value_name: "1".into(), parent_value_id: Some(wing.clone()) },
        )
        .await
        .unwrap();
        assert!(add_level_value(
            &db,
            &event_id,
            AddLevelValueDto { level_number: 2, value_name: "2".into(), parent_value_id: None },
        )
        .await
        .is_err());
        assert!(add_level_value(
            &db,
            &event_id,
            AddLevelValueDto { level_number: 2, value_name: "X".into(), parent_value_id: Some(floor.clone()) },
        )
        .await
        .is_err());
        assert!(matches!(
            add_level_value(
                &db,
                &event_id,
                AddLevelValueDto { level_number: 1, value_name: "a".into(), parent_value_id: None },
            )
            .await,
            Err(AppError::Conflict(_))
        ));

        let tree = get_level_tree(&db, &event_id).await.unwrap();
        assert_eq!(tree.levels.len(), 2);
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].children[0].value_name, "1");

        // Уровень со значениями нельзя убрать
        assert!(matches!(
            set_level_names(&db, &event_id, SetLevelsDto { names: vec!["Wing".into()] }).await,
            Err(AppError::Conflict(_))
        ));

        assert_eq!(delete_level_value(&db, &event_id, &wing).await.unwrap(), 2);
        assert!(get_level_tree(&db, &event_id).await.unwrap().roots.is_empty());
    }
}
