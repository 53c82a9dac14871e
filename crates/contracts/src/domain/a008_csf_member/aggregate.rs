use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Contributor to the community social fund
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsfMember {
    pub id: String,
    pub community_id: String,
    pub flat_number: String,
    pub member_name: String,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub joined_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfMemberDto {
    pub flat_number: String,
    pub member_name: String,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub joined_on: Option<NaiveDate>,
}

impl CsfMemberDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.flat_number.trim().is_empty() {
            return Err("Flat number cannot be empty".into());
        }
        if self.member_name.trim().is_empty() {
            return Err("Member name cannot be empty".into());
        }
        if let Some(email) = self.email.as_ref().filter(|e| !e.trim().is_empty()) {
            if !email.contains('@') {
                return Err("Invalid email".into());
            }
        }
        Ok(())
    }
}
