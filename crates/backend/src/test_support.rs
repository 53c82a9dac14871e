//! Fixtures shared by service tests.

use chrono::NaiveDate;
use contracts::domain::a001_community::CommunityDto;
use contracts::domain::a002_lottery_event::levels::{AddLevelValueDto, SetLevelsDto};
use contracts::domain::a002_lottery_event::LotteryEvent;
use contracts::domain::a004_book_distribution::{AssignBookDto, BookDistribution};
use contracts::domain::a005_payment_collection::RecordPaymentDto;
use contracts::domain::a006_commission_setting::{CommissionSettingInput, SaveCommissionSettingsDto};
use contracts::enums::{CommissionType, PaymentMethod, UserRole};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::a001_community::service as community_service;
use crate::domain::a002_lottery_event::service as event_service;
use crate::domain::a003_lottery_book::{repository as book_repository, service as book_service};
use crate::domain::a004_book_distribution::service as distribution_service;
use crate::domain::a006_commission_setting::service as setting_service;
use crate::shared::config::{parse_config, Config, DEFAULT_CONFIG};
use crate::shared::data::db::{connect_in_memory, AppState};
use crate::shared::mailer::testing::RecordingMailer;
use crate::system::auth::context::RequestContext;

pub async fn seed_community(db: &DatabaseConnection, code: &str) -> String {
    community_service::create(
        db,
        CommunityDto {
            id: None,
            code: code.into(),
            name: format!("{} Residency", code),
            address: None,
            comment: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
}

pub fn group_admin_ctx(community_id: &str) -> RequestContext {
    RequestContext::new("user-1", "manager", UserRole::GroupAdmin, Some(community_id.to_string()))
}

/// Event of 20 books × 10 tickets × ₹50 with one level "Wing" (values A, B)
pub async fn seed_event(db: &DatabaseConnection, community_id: &str, generate: bool) -> LotteryEvent {
    let ctx = group_admin_ctx(community_id);
    let id = event_service::create(db, &ctx, event_service::tests::event_dto("DIWALI"))
        .await
        .unwrap();
    event_service::set_level_names(db, &id, SetLevelsDto { names: vec!["Wing".into()] })
        .await
        .unwrap();
    for value in ["A", "B"] {
        event_service::add_level_value(
            db,
            &id,
            AddLevelValueDto {
                level_number: 1,
                value_name: value.into(),
                parent_value_id: None,
            },
        )
        .await
        .unwrap();
    }

    let event = event_service::get_by_id(db, &id).await.unwrap();
    if generate {
        book_service::generate(db, &event).await.unwrap();
    }
    event_service::get_by_id(db, &id).await.unwrap()
}

async fn assign_book(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    book_number: i32,
    level_1: &str,
    member: &str,
    is_extra_book: bool,
) -> BookDistribution {
    let book = book_repository::find_by_number(db, &event.to_string_id(), book_number)
        .await
        .unwrap()
        .unwrap();
    distribution_service::assign(
        db,
        event,
        &book.id,
        AssignBookDto {
            level_values: vec![level_1.into()],
            member_name: member.into(),
            mobile: Some("9876543210".into()),
            is_extra_book,
            ..Default::default()
        },
        false,
    )
    .await
    .unwrap()
}

pub async fn assign(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    book_number: i32,
    level_1: &str,
    member: &str,
) -> BookDistribution {
    assign_book(db, event, book_number, level_1, member, false).await
}

pub async fn assign_extra(
    db: &DatabaseConnection,
    event: &LotteryEvent,
    book_number: i32,
    level_1: &str,
    member: &str,
) -> BookDistribution {
    assign_book(db, event, book_number, level_1, member, true).await
}

pub fn payment(amount: f64, date: NaiveDate) -> RecordPaymentDto {
    RecordPaymentDto {
        amount_paid: amount,
        payment_date: date,
        commission_date: None,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

pub async fn enable_early(db: &DatabaseConnection, event: &LotteryEvent, percent: f64, threshold: NaiveDate) {
    setting_service::save(
        db,
        &event.to_string_id(),
        SaveCommissionSettingsDto {
            settings: vec![CommissionSettingInput {
                commission_type: CommissionType::Early,
                is_enabled: true,
                commission_percent: percent,
                threshold_date: Some(threshold),
            }],
        },
    )
    .await
    .unwrap();
}

/// App state over an in-memory database, a recording mailer and a fresh
/// storage directory; `adjust` tweaks the default config first
pub async fn test_state_with<F: FnOnce(&mut Config)>(adjust: F) -> (AppState, Arc<RecordingMailer>) {
    let mut config = parse_config(DEFAULT_CONFIG).unwrap();
    config.database.path = ":memory:".into();
    config.storage.path = std::env::temp_dir()
        .join(format!("hub-storage-{}", uuid::Uuid::new_v4()))
        .display()
        .to_string();
    adjust(&mut config);

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        db: connect_in_memory().await.unwrap(),
        config: Arc::new(config),
        jwt_secret: Arc::new("test-secret".to_string()),
        mailer: mailer.clone(),
    };
    (state, mailer)
}

pub async fn test_state() -> (AppState, Arc<RecordingMailer>) {
    test_state_with(|_| {}).await
}
