//! Commission eligibility rules.
//!
//! Pure functions over payments and settings; the stored projection is
//! always a re-run of [`derive_commissions`].

use chrono::NaiveDate;
use contracts::domain::a006_commission_setting::CommissionSetting;
use contracts::enums::CommissionType;

use crate::shared::text::round2;

/// Payment as seen by the rules
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFact {
    pub distribution_id: String,
    pub payment_date: NaiveDate,
    /// Defaults to `payment_date` when the ledger row has none
    pub commission_date: NaiveDate,
    pub amount: f64,
    pub is_extra_book: bool,
    pub level_1_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedCommission {
    pub distribution_id: String,
    pub commission_type: CommissionType,
    pub payment_date: NaiveDate,
    pub commission_date: NaiveDate,
    pub payment_amount: f64,
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub level_1_value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DatedRule {
    percent: f64,
    threshold: NaiveDate,
}

/// Enabled rules of one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommissionRules {
    early: Option<DatedRule>,
    standard: Option<DatedRule>,
    extra_books: Option<f64>,
}

impl CommissionRules {
    pub fn from_settings(settings: &[CommissionSetting]) -> Self {
        let mut rules = CommissionRules::default();
        for s in settings.iter().filter(|s| s.is_enabled && s.commission_percent > 0.0) {
            match s.commission_type {
                CommissionType::Early => {
                    rules.early = s.threshold_date.map(|threshold| DatedRule {
                        percent: s.commission_percent,
                        threshold,
                    })
                }
                CommissionType::Standard => {
                    rules.standard = s.threshold_date.map(|threshold| DatedRule {
                        percent: s.commission_percent,
                        threshold,
                    })
                }
                CommissionType::ExtraBooks => rules.extra_books = Some(s.commission_percent),
            }
        }
        rules
    }

    pub fn is_empty(&self) -> bool {
        self.early.is_none() && self.standard.is_none() && self.extra_books.is_none()
    }
}

fn row(payment: &PaymentFact, commission_type: CommissionType, percent: f64) -> DerivedCommission {
    DerivedCommission {
        distribution_id: payment.distribution_id.clone(),
        commission_type,
        payment_date: payment.payment_date,
        commission_date: payment.commission_date,
        payment_amount: payment.amount,
        commission_percent: percent,
        commission_amount: round2(payment.amount * percent / 100.0),
        level_1_value: payment.level_1_value.clone(),
    }
}

/// Rows earned by one payment: extra books independently, then early or
/// else standard (never both)
pub fn evaluate_payment(payment: &PaymentFact, rules: &CommissionRules) -> Vec<DerivedCommission> {
    let mut rows = Vec::with_capacity(2);
    if payment.amount <= 0.0 {
        return rows;
    }

    if payment.is_extra_book {
        if let Some(percent) = rules.extra_books {
            rows.push(row(payment, CommissionType::ExtraBooks, percent));
        }
    }

    match (rules.early, rules.standard) {
        (Some(early), _) if payment.commission_date <= early.threshold => {
            rows.push(row(payment, CommissionType::Early, early.percent));
        }
        (_, Some(standard)) if payment.commission_date <= standard.threshold => {
            rows.push(row(payment, CommissionType::Standard, standard.percent));
        }
        _ => {}
    }
    rows
}

/// Every commission row for `payments`, in payment order
pub fn derive_commissions(payments: &[PaymentFact], settings: &[CommissionSetting]) -> Vec<DerivedCommission> {
    let rules = CommissionRules::from_settings(settings);
    if rules.is_empty() {
        return Vec::new();
    }
    payments
        .iter()
        .flat_map(|p| evaluate_payment(p, &rules))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn setting(t: CommissionType, percent: f64, threshold: Option<NaiveDate>) -> CommissionSetting {
        CommissionSetting {
            event_id: "e".into(),
            commission_type: t,
            is_enabled: true,
            commission_percent: percent,
            threshold_date: threshold,
            updated_at: None,
        }
    }

    fn fact(amount: f64, date: NaiveDate, is_extra_book: bool) -> PaymentFact {
        PaymentFact {
            distribution_id: "d1".into(),
            payment_date: date,
            commission_date: date,
            amount,
            is_extra_book,
            level_1_value: "Wing A".into(),
        }
    }

    fn settings() -> Vec<CommissionSetting> {
        vec![
            setting(CommissionType::Early, 10.0, Some(d(10, 15))),
            setting(CommissionType::Standard, 5.0, Some(d(10, 31))),
            setting(CommissionType::ExtraBooks, 2.0, None),
        ]
    }

    #[test]
    fn test_early_then_standard_partial_payments() {
        // Книга 10 × 50 = 500: 300 до раннего срока, 200 до стандартного
        let rows = derive_commissions(
            &[fact(300.0, d(10, 10), false), fact(200.0, d(10, 20), false)],
            &settings(),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].commission_type, CommissionType::Early);
        assert_eq!(rows[0].commission_amount, 30.0);
        assert_eq!(rows[1].commission_type, CommissionType::Standard);
        assert_eq!(rows[1].commission_amount, 10.0);
        let total: f64 = rows.iter().map(|r| r.commission_amount).sum();
        assert_eq!(total, 40.0);
    }

    #[test]
    fn test_early_and_standard_never_both() {
        for day in [1, 15, 16, 31] {
            let rows = evaluate_payment(&fact(100.0, d(10, day), false), &CommissionRules::from_settings(&settings()));
            let dated = rows
                .iter()
                .filter(|r| r.commission_type != CommissionType::ExtraBooks)
                .count();
            assert_eq!(dated, 1, "day {}", day);
        }
        assert!(evaluate_payment(&fact(100.0, d(11, 1), false), &CommissionRules::from_settings(&settings()))
            .is_empty());
    }

    #[test]
    fn test_extra_books_stacks_and_is_date_independent() {
        let rules = CommissionRules::from_settings(&settings());

        let early = evaluate_payment(&fact(250.0, d(10, 1), true), &rules);
        assert_eq!(early.len(), 2);
        let extra: Vec<_> = early
            .iter()
            .filter(|r| r.commission_type == CommissionType::ExtraBooks)
            .collect();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].commission_amount, 5.0);

        let late = evaluate_payment(&fact(250.0, d(12, 1), true), &rules);
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].commission_type, CommissionType::ExtraBooks);
    }

    #[test]
    fn test_commission_date_overrides_payment_date() {
        let mut p = fact(100.0, d(10, 20), false);
        p.commission_date = d(10, 14);
        let rows = derive_commissions(&[p], &settings());
        assert_eq!(rows[0].commission_type, CommissionType::Early);
        assert_eq!(rows[0].payment_date, d(10, 20));
    }

    #[test]
    fn test_disabled_rules_and_rounding() {
        let mut s = settings();
        s[0].is_enabled = false;
        let rows = derive_commissions(&[fact(33.4, d(10, 1), false)], &s);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commission_type, CommissionType::Standard);
        assert_eq!(rows[0].commission_amount, 1.67);

        assert!(derive_commissions(&[fact(100.0, d(10, 1), true)], &[]).is_empty());
    }
}
