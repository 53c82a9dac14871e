use serde::{Deserialize, Serialize};

/// Modules that can be switched on or off per community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    Lottery,
    Csf,
}

impl FeatureKey {
    pub fn code(&self) -> &'static str {
        match self {
            FeatureKey::Lottery => "lottery",
            FeatureKey::Csf => "csf",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureKey::Lottery => "Lottery fundraising",
            FeatureKey::Csf => "Community Social Fund",
        }
    }

    pub fn all() -> Vec<FeatureKey> {
        vec![FeatureKey::Lottery, FeatureKey::Csf]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "lottery" => Some(FeatureKey::Lottery),
            "csf" => Some(FeatureKey::Csf),
            _ => None,
        }
    }
}
