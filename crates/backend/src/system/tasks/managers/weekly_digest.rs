use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::{
    a001_community, a005_payment_collection, a009_csf_payment, a010_deletion_request,
};
use crate::shared::data::db::AppState;
use crate::shared::format::format_number;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;

/// Еженедельная сводка активности за 7 дней
pub struct WeeklyDigestManager;

#[async_trait]
impl TaskManager for WeeklyDigestManager {
    fn task_type(&self) -> &'static str {
        "weekly_digest"
    }

    fn description(&self) -> &'static str {
        "Email a summary of the last 7 days of activity"
    }

    async fn run(&self, state: &AppState, session_id: &str, logger: Arc<TaskLogger>) -> Result<String> {
        let since = Utc::now() - Duration::days(7);
        let lottery_payments = a005_payment_collection::repository::count_created_since(&state.db, since).await?;
        let csf_payments = a009_csf_payment::repository::count_created_since(&state.db, since).await?;
        let pending = a010_deletion_request::repository::count_pending(&state.db).await?;
        let communities = a001_community::repository::count(&state.db).await?;

        let body = format!(
            "Community Hub activity since {}\n\n\
             Lottery payments recorded: {}\n\
             CSF payments recorded: {}\n\
             Pending deletion requests: {}\n\
             Communities: {}\n",
            since.format("%Y-%m-%d"),
            format_number(lottery_payments as usize),
            format_number(csf_payments as usize),
            pending,
            communities
        );
        logger.write_log(session_id, &body)?;

        let recipients = state.mailer.admin_recipients();
        if !recipients.is_empty() {
            state
                .mailer
                .send(&recipients, "Community Hub: weekly digest", &body)
                .await?;
        }
        Ok(format!(
            "{} lottery and {} CSF payments this week, {} pending requests, sent to {} recipient(s)",
            lottery_payments,
            csf_payments,
            pending,
            recipients.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_payment_collection::service as payment_service;
    use crate::system::tasks::initialization::{build_registry, task_logger};
    use crate::system::tasks::service::run_task;
    use crate::test_support::{assign, payment, seed_community, seed_event, test_state_with};

    #[tokio::test]
    async fn test_digest_counts_recent_payments() {
        let (state, mailer) = test_state_with(|_| {}).await;
        let c = seed_community(&state.db, "digest").await;
        let event = seed_event(&state.db, &c, true).await;
        let d = assign(&state.db, &event, 1, "A", "Ravi").await;
        let today = Utc::now().date_naive();
        payment_service::record(&state.db, &event, &d.id, payment(100.0, today), None)
            .await
            .unwrap();

        let registry = build_registry(&state).unwrap();
        let result = run_task(&state, &registry, task_logger(&state), "weekly_digest").await.unwrap();
        assert_eq!(result.status, "completed");
        assert!(result.summary.starts_with("1 lottery and 0 CSF payments"));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].2.contains("Lottery payments recorded: 1"));
    }
}
