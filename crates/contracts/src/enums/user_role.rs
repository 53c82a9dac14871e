use serde::{Deserialize, Serialize};

/// Роли пользователей системы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Manages communities, group admins and system health
    Admin,
    /// Runs lottery and CSF for exactly one community
    GroupAdmin,
}

impl UserRole {
    pub fn code(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::GroupAdmin => "group_admin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::GroupAdmin => "Group admin",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(UserRole::Admin),
            "group_admin" => Some(UserRole::GroupAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
