//! Equipment profiles - user-defined weight constraints for suggestions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A weight constraint, either global or scoped to one exercise
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EquipmentConstraint {
    /// When None, applies to all exercises
    pub exercise_id: Option<String>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub increment_size: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentProfile {
    pub id: String,
    pub name: String,
    pub location: String,
    pub constraints: Vec<EquipmentConstraint>,
    pub is_default: bool,
}

impl EquipmentProfile {
    /// Profile created on first run: standard home dumbbells
    pub fn default_home() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Default Equipment".to_string(),
            location: "Home".to_string(),
            constraints: vec![EquipmentConstraint {
                exercise_id: None,
                min_weight: Some(5.0),
                max_weight: Some(100.0),
                increment_size: Some(5.0),
                notes: Some("Standard dumbbells (5lb increments)".to_string()),
            }],
            is_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_home_profile() {
        let profile = EquipmentProfile::default_home();
        assert!(profile.is_default);
        assert_eq!(profile.constraints.len(), 1);
        assert!(profile.constraints[0].exercise_id.is_none());
        assert_eq!(profile.constraints[0].increment_size, Some(5.0));
    }
}
