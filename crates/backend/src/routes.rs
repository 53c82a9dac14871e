use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::shared::data::db::AppState;
use crate::system::{self, auth::middleware as guard};

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(public_routes())
        .merge(
            authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_auth)),
        )
        .merge(admin_routes().route_layer(middleware::from_fn_with_state(state.clone(), guard::require_admin)))
        .merge(
            Router::new()
                .route("/api/community", get(handlers::a001_community::current))
                .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_group_admin)),
        )
        .merge(
            lottery_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_lottery)),
        )
        .merge(csf_routes().route_layer(middleware::from_fn_with_state(state.clone(), guard::require_csf)))
        .with_state(state)
}

// ========================================
// SYSTEM AUTH ROUTES (PUBLIC)
// ========================================
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/system/auth/login", post(system::handlers::auth::login))
        .route("/api/system/auth/refresh", post(system::handlers::auth::refresh))
        .route("/api/system/auth/logout", post(system::handlers::auth::logout))
}

// ========================================
// ANY SIGNED-IN USER
// ========================================
fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/system/auth/me", get(system::handlers::auth::current_user))
        .route(
            "/api/system/users/:id/change-password",
            post(system::handlers::users::change_password),
        )
}

// ========================================
// ADMIN ROUTES
// ========================================
fn admin_routes() -> Router<AppState> {
    Router::new()
        // System users management
        .route(
            "/api/system/users",
            get(system::handlers::users::list).post(system::handlers::users::create),
        )
        .route(
            "/api/system/users/:id",
            get(system::handlers::users::get_by_id)
                .put(system::handlers::users::update)
                .delete(system::handlers::users::delete),
        )
        // A001 Communities
        .route(
            "/api/admin/communities",
            get(handlers::a001_community::list_all).post(handlers::a001_community::create),
        )
        .route(
            "/api/admin/communities/:id",
            get(handlers::a001_community::get_by_id)
                .put(handlers::a001_community::update)
                .delete(handlers::a001_community::delete),
        )
        .route(
            "/api/admin/communities/:id/features",
            get(handlers::a001_community::list_features).post(handlers::a001_community::set_feature),
        )
        // A010 Deletion requests
        .route(
            "/api/admin/deletion-requests",
            get(handlers::a010_deletion_request::list),
        )
        .route(
            "/api/admin/deletion-requests/:id/approve",
            post(handlers::a010_deletion_request::approve),
        )
        .route(
            "/api/admin/deletion-requests/:id/reject",
            post(handlers::a010_deletion_request::reject),
        )
        // D400 System health, logs and tasks
        .route(
            "/api/admin/system-health",
            get(handlers::d400_system_health::get),
        )
        .route(
            "/api/logs",
            get(system::handlers::logs::list).delete(system::handlers::logs::clear),
        )
        .route("/api/admin/tasks", get(system::handlers::tasks::list))
        .route("/api/admin/tasks/:name/run", post(system::handlers::tasks::run))
        .route(
            "/api/admin/tasks/runs/:session_id/log",
            get(system::handlers::tasks::run_log),
        )
}

// ========================================
// LOTTERY ROUTES (group admin, feature "lottery")
// ========================================
fn lottery_routes() -> Router<AppState> {
    const EVENT: &str = "/api/lottery/events/:id";

    let event_path = |suffix: &str| format!("{}{}", EVENT, suffix);

    Router::new()
        // A002 Events, levels, summary
        .route(
            "/api/lottery/events",
            get(handlers::a002_lottery_event::list).post(handlers::a002_lottery_event::create),
        )
        .route(
            EVENT,
            get(handlers::a002_lottery_event::get_by_id).put(handlers::a002_lottery_event::update),
        )
        .route(
            &event_path("/deletion-request"),
            post(handlers::a010_deletion_request::request_event),
        )
        .route(&event_path("/summary"), get(handlers::a002_lottery_event::summary))
        .route(
            &event_path("/levels"),
            get(handlers::a002_lottery_event::get_levels).put(handlers::a002_lottery_event::set_levels),
        )
        .route(
            &event_path("/levels/values"),
            post(handlers::a002_lottery_event::add_level_value),
        )
        .route(
            &event_path("/levels/values/:value_id"),
            delete(handlers::a002_lottery_event::delete_level_value),
        )
        // A003 Books
        .route(&event_path("/books/generate"), post(handlers::a003_lottery_book::generate))
        .route(&event_path("/books"), get(handlers::a003_lottery_book::list))
        .route(
            &event_path("/books/:book_id/assign"),
            post(handlers::a003_lottery_book::assign),
        )
        .route(
            &event_path("/tickets/:number"),
            get(handlers::a003_lottery_book::lookup_ticket),
        )
        // A004 Distributions
        .route(
            &event_path("/distributions/:dist_id"),
            put(handlers::a004_book_distribution::update).delete(handlers::a004_book_distribution::unassign),
        )
        .route(
            &event_path("/distributions/:dist_id/return"),
            post(handlers::a004_book_distribution::set_returned),
        )
        // A005 Payments
        .route(
            &event_path("/distributions/:dist_id/payments"),
            get(handlers::a005_payment_collection::list_for_distribution)
                .post(handlers::a005_payment_collection::record),
        )
        .route(
            &event_path("/distributions/:dist_id/mark-paid"),
            post(handlers::a005_payment_collection::mark_paid),
        )
        .route(
            &event_path("/payments/:payment_id"),
            delete(handlers::a005_payment_collection::delete),
        )
        .route(
            &event_path("/payments/export.csv"),
            get(handlers::a005_payment_collection::export_csv),
        )
        .route(
            &event_path("/payments/import-csv"),
            post(handlers::a005_payment_collection::import_csv),
        )
        .route(
            &event_path("/payments/audit"),
            get(handlers::a005_payment_collection::audit),
        )
        // A006 Commission settings, P900 commissions
        .route(
            &event_path("/commission-settings"),
            get(handlers::a006_commission_setting::get).put(handlers::a006_commission_setting::save),
        )
        .route(&event_path("/commissions"), get(handlers::a006_commission_setting::report))
        .route(
            &event_path("/commissions/sync"),
            post(handlers::a006_commission_setting::sync),
        )
        .route(
            &event_path("/commissions/reset"),
            post(handlers::a006_commission_setting::reset),
        )
        // U501 Level report
        .route(&event_path("/report.xlsx"), get(handlers::u501_level_report::export_xlsx))
        .route(&event_path("/report/import"), post(handlers::u501_level_report::import))
        // A007 Winners
        .route(
            &event_path("/winners"),
            get(handlers::a007_lottery_winner::list).post(handlers::a007_lottery_winner::record),
        )
        .route(
            &event_path("/winners/:winner_id"),
            delete(handlers::a007_lottery_winner::delete),
        )
        .route(
            &event_path("/winners/export.csv"),
            get(handlers::a007_lottery_winner::export_csv),
        )
        .route(
            &event_path("/winners/import-csv"),
            post(handlers::a007_lottery_winner::import_csv),
        )
}

// ========================================
// CSF ROUTES (group admin, feature "csf")
// ========================================
fn csf_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/csf/members",
            get(handlers::a008_csf_member::list).post(handlers::a008_csf_member::create),
        )
        .route(
            "/api/csf/members/:id",
            get(handlers::a008_csf_member::get_by_id).put(handlers::a008_csf_member::update),
        )
        .route(
            "/api/csf/members/:id/deletion-request",
            post(handlers::a010_deletion_request::request_member),
        )
        .route(
            "/api/csf/payments",
            get(handlers::a009_csf_payment::list).post(handlers::a009_csf_payment::record),
        )
        .route("/api/csf/payments/:id", delete(handlers::a009_csf_payment::delete))
        .route("/api/csf/payments/import", post(handlers::a009_csf_payment::import))
        .route(
            "/api/csf/payments/import-csv",
            post(handlers::a009_csf_payment::import_csv),
        )
        .route("/api/csf/duplicates", get(handlers::a009_csf_payment::duplicates))
        .route("/api/csf/export.xlsx", get(handlers::a009_csf_payment::export_xlsx))
        .route("/api/csf/reminders", get(handlers::a009_csf_payment::reminders))
}
