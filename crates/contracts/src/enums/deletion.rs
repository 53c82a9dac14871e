use serde::{Deserialize, Serialize};

/// What a deletion request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionTarget {
    LotteryEvent,
    CsfMember,
}

impl DeletionTarget {
    pub fn code(&self) -> &'static str {
        match self {
            DeletionTarget::LotteryEvent => "lottery_event",
            DeletionTarget::CsfMember => "csf_member",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "lottery_event" => Some(DeletionTarget::LotteryEvent),
            "csf_member" => Some(DeletionTarget::CsfMember),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Pending,
    Approved,
    Rejected,
}

impl DeletionStatus {
    pub fn code(&self) -> &'static str {
        match self {
            DeletionStatus::Pending => "pending",
            DeletionStatus::Approved => "approved",
            DeletionStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(DeletionStatus::Pending),
            "approved" => Some(DeletionStatus::Approved),
            "rejected" => Some(DeletionStatus::Rejected),
            _ => None,
        }
    }
}
