use chrono::Utc;
use contracts::domain::a002_lottery_event::levels::{join_path, LevelValue};
use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a004_book_distribution::{AssignBookDto, BookDistribution, ReturnBookDto};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a002_lottery_event::levels;
use crate::domain::a003_lottery_book::service as book_service;
use crate::domain::a005_payment_collection::repository as payment_repository;
use crate::projections::p900_commission_earned::service as commission_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::text::{clean_mobile, sanitize_opt, sanitize_text};

/// Position in the level tree as value names, top level first.
///
/// Ids must form a parent chain covering every level. Names are matched
/// case-insensitively along the same chain; with `create_missing` unknown
/// names are added to the tree instead of being rejected.
pub async fn resolve_path<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    value_ids: &[String],
    value_names: &[String],
    create_missing: bool,
) -> AppResult<Vec<String>> {
    let level_count = levels::list_levels(conn, event_id).await?.len();
    if level_count == 0 {
        return Err(AppError::validation("Define distribution levels for this event first"));
    }
    let values = levels::list_values(conn, event_id).await?;

    if !value_ids.is_empty() {
        if value_ids.len() != level_count {
            return Err(AppError::validation(format!(
                "A value is required for each of the {} levels",
                level_count
            )));
        }
        let mut parent: Option<&str> = None;
        let mut path = Vec::with_capacity(level_count);
        for (idx, id) in value_ids.iter().enumerate() {
            let value = values
                .iter()
                .find(|v| &v.id == id)
                .ok_or_else(|| AppError::validation("Unknown level value"))?;
            if value.level_number != idx as i32 + 1 || value.parent_value_id.as_deref() != parent {
                return Err(AppError::validation(format!(
                    "'{}' does not belong under the selected parent",
                    value.value_name
                )));
            }
            path.push(value.value_name.clone());
            parent = Some(value.id.as_str());
        }
        return Ok(path);
    }

    let names: Vec<String> = value_names.iter().map(|n| sanitize_text(n)).collect();
    if names.len() != level_count || names.iter().any(|n| n.is_empty()) {
        return Err(AppError::validation(format!(
            "A value is required for each of the {} levels",
            level_count
        )));
    }

    let mut created: Vec<LevelValue> = Vec::new();
    let mut parent: Option<String> = None;
    let mut path = Vec::with_capacity(level_count);
    for (idx, name) in names.iter().enumerate() {
        let level_number = idx as i32 + 1;
        let existing = values.iter().chain(created.iter()).find(|v| {
            v.level_number == level_number
                && v.parent_value_id == parent
                && v.value_name.eq_ignore_ascii_case(name)
        });
        let value = match existing {
            Some(v) => v.clone(),
            None if create_missing => {
                let value = LevelValue {
                    id: uuid::Uuid::new_v4().to_string(),
                    event_id: event_id.to_string(),
                    level_number,
                    value_name: name.clone(),
                    parent_value_id: parent.clone(),
                };
                levels::insert_value(conn, &value).await?;
                created.push(value.clone());
                value
            }
            None => {
                return Err(AppError::validation(format!(
                    "'{}' is not a value of level {}",
                    name, level_number
                )))
            }
        };
        path.push(value.value_name.clone());
        parent = Some(value.id);
    }
    Ok(path)
}

fn validate_member(dto: &AssignBookDto) -> AppResult<(String, Option<String>)> {
    let member_name = sanitize_text(&dto.member_name);
    if member_name.is_empty() {
        return Err(AppError::validation("Member name is required"));
    }
    Ok((member_name, clean_mobile(dto.mobile.as_deref())))
}

/// Assigns an unassigned book to a member
pub async fn assign<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    book_id: &str,
    dto: AssignBookDto,
    create_missing_levels: bool,
) -> AppResult<BookDistribution> {
    let event_id = event.to_string_id();
    let book = book_service::get_for_event(conn, &event_id, book_id).await?;
    if repository::get_by_book(conn, &book.id).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Book {} is already assigned",
            book.book_number
        )));
    }

    let (member_name, mobile) = validate_member(&dto)?;
    let path = resolve_path(
        conn,
        &event_id,
        &dto.level_value_ids,
        &dto.level_values,
        create_missing_levels,
    )
    .await?;

    let now = Utc::now();
    let distribution = BookDistribution {
        id: uuid::Uuid::new_v4().to_string(),
        event_id,
        book_id: book.id,
        book_number: book.book_number,
        distribution_path: join_path(&path),
        level_1_value: path.first().cloned().unwrap_or_default(),
        member_name,
        mobile,
        is_extra_book: dto.is_extra_book,
        is_returned: false,
        notes: sanitize_opt(dto.notes.as_deref()),
        distributed_at: dto.distributed_at.or_else(|| Some(now.date_naive())),
        created_at: now,
        updated_at: now,
    };
    repository::insert(conn, &distribution).await?;

    tracing::info!(
        "Book {} assigned to {} ({})",
        distribution.book_number,
        distribution.member_name,
        distribution.distribution_path
    );
    Ok(distribution)
}

pub async fn get_for_event<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    distribution_id: &str,
) -> AppResult<BookDistribution> {
    repository::get_by_id(conn, distribution_id)
        .await?
        .filter(|d| d.event_id == event_id)
        .ok_or_else(|| AppError::not_found("Distribution not found"))
}

/// Edits holder and position; commissions of the book are re-derived
pub async fn update(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    distribution_id: &str,
    dto: AssignBookDto,
) -> AppResult<BookDistribution> {
    let event_id = event.to_string_id();
    let txn = db.begin().await?;
    let mut distribution = get_for_event(&txn, &event_id, distribution_id).await?;

    let (member_name, mobile) = validate_member(&dto)?;
    let path = resolve_path(&txn, &event_id, &dto.level_value_ids, &dto.level_values, false).await?;

    distribution.member_name = member_name;
    distribution.mobile = mobile;
    distribution.distribution_path = join_path(&path);
    distribution.level_1_value = path.first().cloned().unwrap_or_default();
    distribution.is_extra_book = dto.is_extra_book;
    distribution.notes = sanitize_opt(dto.notes.as_deref());
    if dto.distributed_at.is_some() {
        distribution.distributed_at = dto.distributed_at;
    }
    distribution.updated_at = Utc::now();
    repository::update(&txn, &distribution).await?;

    commission_service::resync_distributions(&txn, &event_id, &[distribution.id.clone()]).await?;
    txn.commit().await?;
    Ok(distribution)
}

async fn ensure_no_payments<C: ConnectionTrait>(conn: &C, distribution: &BookDistribution, action: &str) -> AppResult<()> {
    let count = payment_repository::count_for_distribution(conn, &distribution.id).await?;
    if count > 0 {
        return Err(AppError::conflict(format!(
            "Book {} has {} payment(s) and cannot be {}",
            distribution.book_number, count, action
        )));
    }
    Ok(())
}

/// Frees the book again; only while nothing was paid
pub async fn unassign(db: &DatabaseConnection, event: &LotteryEvent, distribution_id: &str) -> AppResult<()> {
    let txn = db.begin().await?;
    let distribution = get_for_event(&txn, &event.to_string_id(), distribution_id).await?;
    ensure_no_payments(&txn, &distribution, "unassigned").await?;
    repository::delete(&txn, &distribution.id).await?;
    txn.commit().await?;
    tracing::info!("Book {} unassigned", distribution.book_number);
    Ok(())
}

/// Marks the book returned (or takes a return back); only while nothing was paid
pub async fn set_returned<C: ConnectionTrait>(
    conn: &C,
    event: &LotteryEvent,
    distribution_id: &str,
    dto: ReturnBookDto,
) -> AppResult<BookDistribution> {
    let mut distribution = get_for_event(conn, &event.to_string_id(), distribution_id).await?;
    if distribution.is_returned == dto.is_returned {
        return Ok(distribution);
    }
    if dto.is_returned {
        ensure_no_payments(conn, &distribution, "returned").await?;
    }
    distribution.is_returned = dto.is_returned;
    distribution.updated_at = Utc::now();
    repository::update(conn, &distribution).await?;
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_lottery_book::repository as book_repository;
    use crate::domain::a005_payment_collection::service as payment_service;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::{assign as assign_book, payment, seed_community, seed_event};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_assign_validates_path() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "assign").await;
        let event = seed_event(&db, &c, true).await;
        let event_id = event.to_string_id();
        let book = book_repository::find_by_number(&db, &event_id, 1).await.unwrap().unwrap();

        let dto = |values: Vec<&str>| AssignBookDto {
            level_values: values.into_iter().map(String::from).collect(),
            member_name: "Ravi".into(),
            mobile: Some("+91 98765 43210".into()),
            ..Default::default()
        };

        assert!(assign(&db, &event, &book.id, dto(vec!["Z"]), false).await.is_err());
        assert!(assign(&db, &event, &book.id, dto(vec![]), false).await.is_err());

        let d = assign(&db, &event, &book.id, dto(vec!["a"]), false).await.unwrap();
        assert_eq!(d.level_1_value, "A");
        assert_eq!(d.distribution_path, "A");
        assert_eq!(d.mobile.as_deref(), Some("9876543210"));
        assert!(matches!(
            assign(&db, &event, &book.id, dto(vec!["A"]), false).await,
            Err(AppError::Conflict(_))
        ));

        let book2 = book_repository::find_by_number(&db, &event_id, 2).await.unwrap().unwrap();
        let created = assign(&db, &event, &book2.id, dto(vec!["C"]), true).await.unwrap();
        assert_eq!(created.level_1_value, "C");
        assert_eq!(levels::list_values(&db, &event_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_payments_block_unassign_and_return() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "ret").await;
        let event = seed_event(&db, &c, true).await;
        let d1 = assign_book(&db, &event, 1, "A", "Ravi").await;
        let d2 = assign_book(&db, &event, 2, "B", "Sita").await;

        let returned = set_returned(&db, &event, &d1.id, ReturnBookDto { is_returned: true })
            .await
            .unwrap();
        assert!(returned.is_returned);
        set_returned(&db, &event, &d1.id, ReturnBookDto { is_returned: false })
            .await
            .unwrap();
        unassign(&db, &event, &d1.id).await.unwrap();

        payment_service::record(
            &db,
            &event,
            &d2.id,
            payment(100.0, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()),
            None,
        )
        .await
        .unwrap();
        assert!(matches!(unassign(&db, &event, &d2.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(
            set_returned(&db, &event, &d2.id, ReturnBookDto { is_returned: true }).await,
            Err(AppError::Conflict(_))
        ));
    }
}
