use crate::domain::common::{AggregateId, BaseAggregate};
use crate::enums::FeatureKey;
use serde::{Deserialize, Serialize};

crate::uuid_id!(CommunityId);

// ============================================================================
// Aggregate Root
// ============================================================================

/// Housing society / community that owns lotteries and a social fund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    #[serde(flatten)]
    pub base: BaseAggregate<CommunityId>,

    pub address: Option<String>,

    #[serde(default)]
    pub is_active: bool,
}

impl Community {
    pub fn new_for_insert(
        code: String,
        name: String,
        address: Option<String>,
        comment: Option<String>,
    ) -> Self {
        let mut base = BaseAggregate::new(CommunityId::new_v4(), code, name);
        base.comment = comment;
        Self {
            base,
            address,
            is_active: true,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn update(&mut self, dto: &CommunityDto) {
        self.base.code = dto.code.trim().to_uppercase();
        self.base.description = dto.name.trim().to_string();
        self.base.comment = dto.comment.clone();
        self.address = dto.address.clone();
        if let Some(is_active) = dto.is_active {
            self.is_active = is_active;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Community code cannot be empty".into());
        }
        if self.base.code.len() > 32 {
            return Err("Community code is limited to 32 characters".into());
        }
        if self.base.description.trim().is_empty() {
            return Err("Community name cannot be empty".into());
        }
        Ok(())
    }

    /// Вызывается перед сохранением
    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityDto {
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub is_active: Option<bool>,
}

/// Feature toggle state of one community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityFeature {
    pub community_id: String,
    pub feature: FeatureKey,
    pub is_enabled: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFeatureDto {
    pub feature: FeatureKey,
    pub is_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_normalizes_code() {
        let mut c = Community::new_for_insert("x".into(), "X".into(), None, None);
        c.update(&CommunityDto {
            id: None,
            code: " green-park ".into(),
            name: " Green Park ".into(),
            address: None,
            comment: None,
            is_active: Some(false),
        });
        assert_eq!(c.base.code, "GREEN-PARK");
        assert_eq!(c.base.description, "Green Park");
        assert!(!c.is_active);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let c = Community::new_for_insert("GP".into(), "  ".into(), None, None);
        assert!(c.validate().is_err());
    }
}
