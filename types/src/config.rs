use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::constants::{DEFAULT_REWARD_ITEM, DEFAULT_SKIN_ID};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum RewardConfigError {
    #[error("RewardItem must not be empty")]
    EmptyItem,
}

/// Which item a claim hands out. Loaded once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Item short name passed to the grant primitive.
    #[serde(rename = "RewardItem", default = "default_reward_item")]
    pub item: String,
    /// Skin applied to the granted stack; `0` means no skin.
    #[serde(rename = "RewardSkinID", default)]
    pub skin_id: u64,
}

fn default_reward_item() -> String {
    DEFAULT_REWARD_ITEM.to_string()
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            item: default_reward_item(),
            skin_id: DEFAULT_SKIN_ID,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), RewardConfigError> {
        if self.item.trim().is_empty() {
            return Err(RewardConfigError::EmptyItem);
        }
        Ok(())
    }

    pub fn has_skin(&self) -> bool {
        self.skin_id != DEFAULT_SKIN_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RewardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RewardConfig::default());
        assert_eq!(config.item, "blood");
        assert!(!config.has_skin());
    }

    #[test]
    fn uses_pascal_case_field_names() {
        let config: RewardConfig =
            serde_json::from_str(r#"{"RewardItem": "scrap", "RewardSkinID": 1234}"#).unwrap();
        assert_eq!(config.item, "scrap");
        assert_eq!(config.skin_id, 1234);
        assert!(config.has_skin());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"RewardItem": "scrap", "RewardSkinID": 1234})
        );
    }

    #[test]
    fn rejects_negative_skin() {
        assert!(serde_json::from_str::<RewardConfig>(r#"{"RewardSkinID": -1}"#).is_err());
    }

    #[test]
    fn blank_item_is_invalid() {
        let config = RewardConfig {
            item: "  ".to_string(),
            skin_id: 0,
        };
        assert_eq!(config.validate(), Err(RewardConfigError::EmptyItem));
    }
}
