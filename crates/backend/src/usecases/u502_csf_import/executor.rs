use chrono::Utc;
use contracts::domain::a008_csf_member::{CsfMember, CsfMemberDto};
use contracts::domain::a009_csf_payment::RecordCsfPaymentDto;
use contracts::enums::PaymentMethod;
use contracts::shared::excel::{ExcelData, ImportRowError};
use contracts::usecases::u502_csf_import::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::{HashMap, HashSet};

use crate::domain::a008_csf_member::service as member_service;
use crate::domain::a009_csf_payment::service as payment_service;
use crate::shared::error::{AppError, AppResult};
use crate::shared::tabular::{csv_to_rows, field, is_blank, report_malformed, TableRow};
use crate::shared::text::{normalize_mobile, parse_amount, parse_date};

/// Lookup of the community roll by flat number, then by mobile
struct MemberIndex {
    by_flat: HashMap<String, CsfMember>,
    by_mobile: HashMap<String, CsfMember>,
}

impl MemberIndex {
    fn new(members: Vec<CsfMember>) -> Self {
        let mut index = Self {
            by_flat: HashMap::new(),
            by_mobile: HashMap::new(),
        };
        for m in members {
            index.add(m);
        }
        index
    }

    fn add(&mut self, member: CsfMember) {
        if let Some(mobile) = member.mobile.as_deref().and_then(normalize_mobile) {
            self.by_mobile.entry(mobile).or_insert_with(|| member.clone());
        }
        self.by_flat.insert(member.flat_number.to_uppercase(), member);
    }

    fn resolve(&self, flat: Option<&str>, mobile: Option<&str>) -> Option<&CsfMember> {
        flat.and_then(|f| self.by_flat.get(&f.trim().to_uppercase()))
            .or_else(|| mobile.and_then(normalize_mobile).and_then(|m| self.by_mobile.get(&m)))
    }
}

/// Imports CSF contributions row by row.
///
/// Rows for a member and month already seen earlier in the file, or already
/// paid in the database, are reported and not written.
pub async fn import_rows(
    db: &DatabaseConnection,
    community_id: &str,
    rows: &[TableRow],
) -> AppResult<CsfImportResult> {
    let mut result = CsfImportResult {
        rows_read: rows.len(),
        ..Default::default()
    };

    let txn = db.begin().await?;
    let mut index = MemberIndex::new(member_service::list(&txn, community_id).await?);
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let today = Utc::now().date_naive();

    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 2;
        if is_blank(row) {
            continue;
        }

        let flat = field(row, COL_FLAT_NUMBER);
        let mobile = field(row, COL_MOBILE);
        let member = match index.resolve(flat, mobile) {
            Some(m) => m.clone(),
            None => {
                let (Some(flat), Some(name)) = (flat, field(row, COL_MEMBER_NAME)) else {
                    result
                        .errors
                        .push(ImportRowError::new(row_no, "Member not found by flat number or mobile"));
                    continue;
                };
                let dto = CsfMemberDto {
                    flat_number: flat.to_string(),
                    member_name: name.to_string(),
                    mobile: mobile.map(String::from),
                    email: None,
                    is_active: Some(true),
                    joined_on: None,
                };
                match member_service::create(&txn, community_id, dto).await {
                    Ok(m) => {
                        result.members_created += 1;
                        index.add(m.clone());
                        m
                    }
                    Err(AppError::Validation(msg)) | Err(AppError::Conflict(msg)) => {
                        result.errors.push(ImportRowError::new(row_no, msg));
                        continue;
                    }
                    Err(other) => return Err(other),
                }
            }
        };

        let Some(month) = field(row, COL_MONTH) else {
            result.errors.push(ImportRowError::new(row_no, "Month is required"));
            continue;
        };
        let month = match payment_service::parse_month(month) {
            Ok(m) => m,
            Err(e) => {
                result.errors.push(ImportRowError::new(row_no, e.to_string()));
                continue;
            }
        };
        let Some(amount) = field(row, COL_AMOUNT).and_then(parse_amount) else {
            result.errors.push(ImportRowError::new(row_no, "Amount is missing or not a number"));
            continue;
        };
        let payment_date = match field(row, COL_PAYMENT_DATE) {
            None => today,
            Some(raw) => match parse_date(raw) {
                Some(d) => d,
                None => {
                    result
                        .errors
                        .push(ImportRowError::new(row_no, format!("'{}' is not a date", raw)));
                    continue;
                }
            },
        };

        if !seen.insert((member.id.clone(), month.clone())) {
            result.duplicates_in_file.push(ImportRowError::new(
                row_no,
                format!("{} ({}) appears again for {}", member.member_name, member.flat_number, month),
            ));
            continue;
        }

        let dto = RecordCsfPaymentDto {
            member_id: member.id.clone(),
            payment_month: month,
            amount,
            payment_date,
            payment_method: field(row, COL_PAYMENT_METHOD)
                .and_then(PaymentMethod::parse_loose)
                .unwrap_or_default(),
            notes: field(row, COL_NOTES).map(String::from),
        };
        match payment_service::record(&txn, community_id, dto).await {
            Ok(_) => result.imported += 1,
            Err(AppError::Conflict(msg)) => result.duplicates_in_db.push(ImportRowError::new(row_no, msg)),
            Err(AppError::Validation(msg)) => result.errors.push(ImportRowError::new(row_no, msg)),
            Err(other) => return Err(other),
        }
    }
    txn.commit().await?;

    tracing::info!(
        "CSF import: {} rows, {} imported, {} new members, {} duplicates in file, {} already paid, {} errors",
        result.rows_read,
        result.imported,
        result.members_created,
        result.duplicates_in_file.len(),
        result.duplicates_in_db.len(),
        result.errors.len()
    );
    Ok(result)
}

pub async fn import_excel(db: &DatabaseConnection, community_id: &str, data: &ExcelData) -> AppResult<CsfImportResult> {
    import_rows(db, community_id, &data.rows).await
}

pub async fn import_csv(db: &DatabaseConnection, community_id: &str, csv_text: &str) -> AppResult<CsfImportResult> {
    let table = csv_to_rows(csv_text).map_err(|e| AppError::validation(e.to_string()))?;
    let mut result = import_rows(db, community_id, &table.rows).await?;
    report_malformed(&mut result.errors, table.malformed);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a008_csf_member::service::tests::member_dto;
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::seed_community;

    #[tokio::test]
    async fn test_import_resolves_and_reports_duplicates() {
        let db = connect_in_memory().await.unwrap();
        let c = seed_community(&db, "csfimp").await;
        member_service::create(&db, &c, member_dto("A-101", "Ravi", Some("9876543210"))).await.unwrap();
        let meena = member_service::create(&db, &c, member_dto("B-202", "Meena", Some("9123456780")))
            .await
            .unwrap();
        payment_service::record(
            &db,
            &c,
            RecordCsfPaymentDto {
                member_id: meena.id.clone(),
                payment_month: "2024-09".into(),
                amount: 500.0,
                payment_date: chrono::NaiveDate::from_ymd_opt(2024, 9, 3).unwrap(),
                payment_method: PaymentMethod::Cash,
                notes: None,
            },
        )
        .await
        .unwrap();

        let csv = "\
Flat Number,Member Name,Mobile,Month,Amount,Payment Date,Payment Method
a-101,,,2024-09,500,05/09/2024,UPI
,,+91 91234 56780,Sep 2024,500,2024-09-06,
A-101,,,09/2024,500,2024-09-07,
C-303,Kiran,,2024-09,\"1,000\",2024-09-08,cash
Z-999,,,2024-09,500,2024-09-08,
A-101,,,2024-10,abc,2024-10-01,
";
        let result = import_csv(&db, &c, csv).await.unwrap();
        assert_eq!(result.rows_read, 6);
        assert_eq!(result.imported, 2);
        assert_eq!(result.members_created, 1);
        assert_eq!(result.duplicates_in_db.len(), 1);
        assert_eq!(result.duplicates_in_db[0].row, 3);
        assert_eq!(result.duplicates_in_file.len(), 1);
        assert_eq!(result.duplicates_in_file[0].row, 4);
        let error_rows: Vec<usize> = result.errors.iter().map(|e| e.row).collect();
        assert_eq!(error_rows, vec![6, 7]);

        let kiran = member_service::list(&db, &c)
            .await
            .unwrap()
            .into_iter()
            .find(|m| m.flat_number == "C-303")
            .unwrap();
        let paid = payment_service::list(&db, &c, Some("2024-09")).await.unwrap();
        assert!(paid.iter().any(|p| p.payment.member_id == kiran.id && p.payment.amount == 1000.0));
    }
}
