use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use contracts::domain::a009_csf_payment::{
    normalize_month, CsfDuplicateGroup, CsfPayment, CsfPaymentListItem, CsfReminder, CsfReminderList,
    RecordCsfPaymentDto,
};
use sea_orm::ConnectionTrait;

use super::repository;
use crate::domain::a008_csf_member::service as member_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::format::format_inr;
use crate::shared::text::{round2, sanitize_opt, whatsapp_link};
use crate::shared::xlsx::{Cell, Sheet, Workbook};

pub fn parse_month(raw: &str) -> AppResult<String> {
    normalize_month(raw).ok_or_else(|| AppError::validation(format!("'{}' is not a valid month (YYYY-MM)", raw)))
}

/// Records a contribution; a second payment for the same member and month is refused
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    dto: RecordCsfPaymentDto,
) -> AppResult<CsfPayment> {
    let member = member_service::get_for_community(conn, community_id, &dto.member_id).await?;
    let payment_month = parse_month(&dto.payment_month)?;
    let amount = round2(dto.amount);
    if !(amount > 0.0) {
        return Err(AppError::validation("Amount must be positive"));
    }

    if !repository::list_for_member_month(conn, &member.id, &payment_month)
        .await?
        .is_empty()
    {
        return Err(AppError::conflict(format!(
            "{} ({}) has already paid for {}",
            member.member_name, member.flat_number, payment_month
        )));
    }

    let payment = CsfPayment {
        id: uuid::Uuid::new_v4().to_string(),
        community_id: community_id.to_string(),
        member_id: member.id,
        payment_month,
        amount,
        payment_date: dto.payment_date,
        payment_method: dto.payment_method,
        notes: sanitize_opt(dto.notes.as_deref()),
        created_at: Utc::now(),
    };
    repository::insert(conn, &payment).await?;
    Ok(payment)
}

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    month: Option<&str>,
) -> AppResult<Vec<CsfPaymentListItem>> {
    let month = match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => Some(parse_month(raw)?),
        None => None,
    };
    Ok(repository::list_by_community(conn, community_id, month.as_deref()).await?)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, community_id: &str, id: &str) -> AppResult<()> {
    let payment = repository::get_by_id(conn, id)
        .await?
        .filter(|p| p.community_id == community_id)
        .ok_or_else(|| AppError::not_found("CSF payment not found"))?;
    repository::delete(conn, &payment.id).await?;
    Ok(())
}

/// Member/month pairs paid more than once
pub async fn duplicates<C: ConnectionTrait>(conn: &C, community_id: &str) -> AppResult<Vec<CsfDuplicateGroup>> {
    let payments = repository::list_by_community(conn, community_id, None).await?;
    let mut groups: BTreeMap<(String, String), CsfDuplicateGroup> = BTreeMap::new();
    for item in payments {
        let group = groups
            .entry((item.flat_number.clone(), item.payment.payment_month.clone()))
            .or_insert_with(|| CsfDuplicateGroup {
                member_id: item.payment.member_id.clone(),
                flat_number: item.flat_number.clone(),
                member_name: item.member_name.clone(),
                payment_month: item.payment.payment_month.clone(),
                count: 0,
                total_amount: 0.0,
                payment_ids: Vec::new(),
            });
        group.count += 1;
        group.total_amount = round2(group.total_amount + item.payment.amount);
        group.payment_ids.push(item.payment.id);
    }
    Ok(groups.into_values().filter(|g| g.count > 1).collect())
}

/// Workbook with a "Payments" ledger and a per-member "Summary"
pub async fn export_xlsx<C: ConnectionTrait>(conn: &C, community_id: &str) -> AppResult<Vec<u8>> {
    let payments = repository::list_by_community(conn, community_id, None).await?;
    let members = member_service::list(conn, community_id).await?;

    let mut ledger = Sheet::new(
        "Payments",
        &["Flat Number", "Member Name", "Month", "Amount", "Payment Date", "Payment Method", "Notes"],
    );
    for item in &payments {
        ledger.push(vec![
            Cell::from(item.flat_number.as_str()),
            Cell::from(item.member_name.as_str()),
            Cell::from(item.payment.payment_month.as_str()),
            Cell::Number(item.payment.amount),
            Cell::from(item.payment.payment_date.to_string()),
            Cell::from(item.payment.payment_method.display_name()),
            Cell::from(item.payment.notes.clone()),
        ]);
    }

    let mut summary = Sheet::new(
        "Summary",
        &["Flat Number", "Member Name", "Mobile", "Active", "Months Paid", "Total Amount", "Last Month"],
    );
    for member in &members {
        let own: Vec<_> = payments.iter().filter(|p| p.payment.member_id == member.id).collect();
        let months: HashSet<&str> = own.iter().map(|p| p.payment.payment_month.as_str()).collect();
        let total = round2(own.iter().map(|p| p.payment.amount).sum());
        let last = months.iter().max().map(|m| m.to_string());
        summary.push(vec![
            Cell::from(member.flat_number.as_str()),
            Cell::from(member.member_name.as_str()),
            Cell::from(member.mobile.clone()),
            Cell::from(if member.is_active { "Yes" } else { "No" }),
            Cell::Number(months.len() as f64),
            Cell::Number(total),
            Cell::from(last),
        ]);
    }

    let mut workbook = Workbook::new();
    workbook.add_sheet(ledger);
    workbook.add_sheet(summary);
    Ok(workbook.to_bytes()?)
}

fn reminder_text(member_name: &str, community_name: &str, month: &str, amount: Option<f64>) -> String {
    let amount_part = amount
        .filter(|a| *a > 0.0)
        .map(|a| format!(" of {}", format_inr(a)))
        .unwrap_or_default();
    format!(
        "Dear {}, this is a gentle reminder that your {} CSF contribution{} for {} is pending. Please ignore if already paid. Thank you!",
        member_name, community_name, amount_part, month
    )
}

/// WhatsApp reminders for active members who have not paid for `month`
pub async fn reminders<C: ConnectionTrait>(
    conn: &C,
    community_id: &str,
    community_name: &str,
    month: &str,
    amount: Option<f64>,
) -> AppResult<CsfReminderList> {
    let month = parse_month(month)?;
    let paid: HashSet<String> = repository::list_by_community(conn, community_id, Some(&month))
        .await?
        .into_iter()
        .map(|p| p.payment.member_id)
        .collect();

    let mut list = CsfReminderList {
        month: month.clone(),
        reminders: Vec::new(),
        without_mobile: Vec::new(),
    };
    for member in member_service::list(conn, community_id).await? {
        if !member.is_active || paid.contains(&member.id) {
            continue;
        }
        let message = reminder_text(&member.member_name, community_name, &month, amount);
        let link = member
            .mobile
            .as_deref()
            .and_then(|m| whatsapp_link(m, &message).map(|url| (m.to_string(), url)));
        match link {
            Some((mobile, whatsapp_url)) => list.reminders.push(CsfReminder {
                member_id: member.id,
                flat_number: member.flat_number,
                member_name: member.member_name,
                mobile,
                message,
                whatsapp_url,
            }),
            None => list
                .without_mobile
                .push(format!("{} ({})", member.member_name, member.flat_number)),
        }
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a008_csf_member::service::tests::member_dto;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::seed_community;
    use chrono::NaiveDate;
    use contracts::enums::PaymentMethod;

    fn pay(member_id: &str, month: &str, amount: f64) -> RecordCsfPaymentDto {
        RecordCsfPaymentDto {
            member_id: member_id.into(),
            payment_month: month.into(),
            amount,
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            payment_method: PaymentMethod::Upi,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_record_duplicates_and_list() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "fund").await;
        let m = member_service::create(&db, &c, member_dto("B-1", "Anita", None)).await.unwrap();

        let p = record(&db, &c, pay(&m.id, "Mar 2025", 500.0)).await.unwrap();
        assert_eq!(p.payment_month, "2025-03");
        assert!(matches!(
            record(&db, &c, pay(&m.id, "2025-03", 500.0)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            record(&db, &c, pay(&m.id, "13-2025", 500.0)).await,
            Err(AppError::Validation(_))
        ));
        record(&db, &c, pay(&m.id, "2025-04", 500.0)).await.unwrap();

        assert_eq!(list(&db, &c, Some("2025-03")).await.unwrap().len(), 1);
        let all = list(&db, &c, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].payment.payment_month, "2025-04");
        assert_eq!(all[0].flat_number, "B-1");

        // Дубликаты из старых данных находит отчёт
        repository::insert(
            &db,
            &CsfPayment {
                id: uuid::Uuid::new_v4().to_string(),
                ..p.clone()
            },
        )
        .await
        .unwrap();
        let dups = duplicates(&db, &c).await.unwrap();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].count, 2);
        assert_eq!(dups[0].total_amount, 1000.0);

        delete(&db, &c, &p.id).await.unwrap();
        assert!(duplicates(&db, &c).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reminders_and_export() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "remind").await;
        let paid = member_service::create(&db, &c, member_dto("A-1", "Paid Member", Some("9876500001")))
            .await
            .unwrap();
        member_service::create(&db, &c, member_dto("A-2", "Late Member", Some("9876500002")))
            .await
            .unwrap();
        member_service::create(&db, &c, member_dto("A-3", "No Phone", None)).await.unwrap();
        let mut inactive = member_dto("A-4", "Moved Out", Some("9876500004"));
        inactive.is_active = Some(false);
        member_service::create(&db, &c, inactive).await.unwrap();

        record(&db, &c, pay(&paid.id, "2025-03", 500.0)).await.unwrap();

        let list = reminders(&db, &c, "Green Park", "2025-03", Some(500.0)).await.unwrap();
        assert_eq!(list.reminders.len(), 1);
        let r = &list.reminders[0];
        assert_eq!(r.member_name, "Late Member");
        assert!(r.whatsapp_url.starts_with("https://wa.me/919876500002?text="));
        assert!(r.message.contains("₹500.00"));
        assert!(r.message.contains("2025-03"));
        assert_eq!(list.without_mobile, vec!["No Phone (A-3)".to_string()]);

        let bytes = export_xlsx(&db, &c).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
