use crate::enums::CommissionType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Commission rule of one type for one event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionSetting {
    pub event_id: String,
    pub commission_type: CommissionType,
    pub is_enabled: bool,
    pub commission_percent: f64,
    /// Last eligible commission date for early/standard; unused for extra books
    pub threshold_date: Option<NaiveDate>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommissionSetting {
    /// Placeholder returned for types that were never configured
    pub fn disabled(event_id: &str, commission_type: CommissionType) -> Self {
        Self {
            event_id: event_id.to_string(),
            commission_type,
            is_enabled: false,
            commission_percent: 0.0,
            threshold_date: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionSettingInput {
    pub commission_type: CommissionType,
    pub is_enabled: bool,
    pub commission_percent: f64,
    pub threshold_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCommissionSettingsDto {
    pub settings: Vec<CommissionSettingInput>,
}

/// Checks one save request as a whole
pub fn validate_settings(inputs: &[CommissionSettingInput]) -> Result<(), String> {
    let mut seen = Vec::new();
    for input in inputs {
        if seen.contains(&input.commission_type) {
            return Err(format!(
                "Commission type '{}' is listed twice",
                input.commission_type.code()
            ));
        }
        seen.push(input.commission_type);

        if !(0.0..=100.0).contains(&input.commission_percent) {
            return Err(format!(
                "{} commission percent must be between 0 and 100",
                input.commission_type.display_name()
            ));
        }
        if input.is_enabled
            && input.commission_type.requires_threshold()
            && input.threshold_date.is_none()
        {
            return Err(format!(
                "{} commission needs a threshold date",
                input.commission_type.display_name()
            ));
        }
    }

    let threshold = |t: CommissionType| {
        inputs
            .iter()
            .find(|i| i.commission_type == t && i.is_enabled)
            .and_then(|i| i.threshold_date)
    };
    if let (Some(early), Some(standard)) = (
        threshold(CommissionType::Early),
        threshold(CommissionType::Standard),
    ) {
        if standard < early {
            return Err("Standard threshold cannot be before the early threshold".into());
        }
    }
    Ok(())
}

/// Settings the event would have after the save: stored rules of types not
/// in the request plus the submitted ones
pub fn merge_with_stored(
    stored: &[CommissionSetting],
    inputs: &[CommissionSettingInput],
) -> Vec<CommissionSettingInput> {
    let mut merged: Vec<CommissionSettingInput> = stored
        .iter()
        .filter(|s| !inputs.iter().any(|i| i.commission_type == s.commission_type))
        .map(|s| CommissionSettingInput {
            commission_type: s.commission_type,
            is_enabled: s.is_enabled,
            commission_percent: s.commission_percent,
            threshold_date: s.threshold_date,
        })
        .collect();
    merged.extend(inputs.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(t: CommissionType, pct: f64, date: Option<(i32, u32, u32)>) -> CommissionSettingInput {
        CommissionSettingInput {
            commission_type: t,
            is_enabled: true,
            commission_percent: pct,
            threshold_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[test]
    fn test_valid_settings() {
        let inputs = vec![
            input(CommissionType::Early, 10.0, Some((2025, 10, 1))),
            input(CommissionType::Standard, 5.0, Some((2025, 10, 15))),
            input(CommissionType::ExtraBooks, 2.5, None),
        ];
        assert!(validate_settings(&inputs).is_ok());
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(validate_settings(&[input(CommissionType::Early, 120.0, Some((2025, 1, 1)))]).is_err());
        assert!(validate_settings(&[input(CommissionType::Standard, 5.0, None)]).is_err());
        assert!(validate_settings(&[
            input(CommissionType::Early, 10.0, Some((2025, 10, 15))),
            input(CommissionType::Standard, 5.0, Some((2025, 10, 1))),
        ])
        .is_err());
        assert!(validate_settings(&[
            input(CommissionType::ExtraBooks, 1.0, None),
            input(CommissionType::ExtraBooks, 2.0, None),
        ])
        .is_err());
    }

    #[test]
    fn test_partial_save_checked_against_stored() {
        let stored = vec![CommissionSetting {
            event_id: "e".into(),
            commission_type: CommissionType::Early,
            is_enabled: true,
            commission_percent: 10.0,
            threshold_date: NaiveDate::from_ymd_opt(2025, 10, 15),
            updated_at: None,
        }];
        let too_early = [input(CommissionType::Standard, 5.0, Some((2025, 10, 1)))];
        assert!(validate_settings(&too_early).is_ok());
        assert!(validate_settings(&merge_with_stored(&stored, &too_early)).is_err());

        let later = [input(CommissionType::Standard, 5.0, Some((2025, 10, 31)))];
        let merged = merge_with_stored(&stored, &later);
        assert_eq!(merged.len(), 2);
        assert!(validate_settings(&merged).is_ok());

        // Переданный тип заменяет сохранённый
        let moved_early = [input(CommissionType::Early, 10.0, Some((2025, 9, 1)))];
        assert_eq!(merge_with_stored(&stored, &moved_early).len(), 1);
    }

    #[test]
    fn test_disabled_threshold_not_required() {
        let mut early = input(CommissionType::Early, 0.0, None);
        early.is_enabled = false;
        assert!(validate_settings(&[early]).is_ok());
    }
}
