use crate::enums::{DeletionStatus, DeletionTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group admin's request to delete an event or a CSF member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletionRequest {
    pub id: String,
    pub community_id: String,
    pub target_type: DeletionTarget,
    pub target_id: String,
    /// Human readable name of the target at request time
    pub target_label: String,
    pub reason: String,
    pub status: DeletionStatus,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_note: Option<String>,
}

impl DeletionRequest {
    pub fn is_decided(&self) -> bool {
        self.status != DeletionStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeletionRequestDto {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecideDeletionRequestDto {
    pub note: Option<String>,
}
