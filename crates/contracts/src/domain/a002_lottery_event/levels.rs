use serde::{Deserialize, Serialize};

/// At most this many nested distribution levels (e.g. Wing > Floor > Flat)
pub const MAX_LEVELS: usize = 5;

/// Separator used in the flattened `distribution_path`
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionLevel {
    pub id: String,
    pub event_id: String,
    /// 1-based depth
    pub level_number: i32,
    pub level_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelValue {
    pub id: String,
    pub event_id: String,
    pub level_number: i32,
    pub value_name: String,
    pub parent_value_id: Option<String>,
}

/// Value with its children, for tree rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelValueNode {
    pub id: String,
    pub level_number: i32,
    pub value_name: String,
    pub children: Vec<LevelValueNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTree {
    pub levels: Vec<DistributionLevel>,
    pub roots: Vec<LevelValueNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLevelsDto {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLevelValueDto {
    pub level_number: i32,
    pub value_name: String,
    pub parent_value_id: Option<String>,
}

/// Joins path segments into the stored `distribution_path` form
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Splits a stored path back into trimmed segments
pub fn split_path(path: &str) -> Vec<String> {
    if path.trim().is_empty() {
        return Vec::new();
    }
    path.split('>').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_join_split() {
        let path = join_path(&["WingA", " Floor1 ", "Flat101"]);
        assert_eq!(path, "WingA > Floor1 > Flat101");
        assert_eq!(split_path(&path), vec!["WingA", "Floor1", "Flat101"]);
        assert!(split_path("  ").is_empty());
    }
}
