//! Plan persistence

use std::path::{Path, PathBuf};

use super::Plan;
use crate::error::{Result, SocialError};

/// Reads and writes a plan file, `queue/plan.json` by default
#[derive(Debug, Clone)]
pub struct PlanStore {
    path: PathBuf,
}

impl PlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the plan as pretty JSON, creating parent directories
    pub fn save(&self, plan: &Plan) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(plan)
            .map_err(|e| SocialError::InvalidInput(format!("Plan is not serializable: {}", e)))?;
        std::fs::write(&self.path, json)?;

        tracing::info!("Saved plan with {} items to {}", plan.items.len(), self.path.display());
        Ok(self.path.clone())
    }

    pub fn load(&self) -> Result<Plan> {
        if !self.path.exists() {
            return Err(SocialError::NotFound(format!(
                "Plan not found: {}",
                self.path.display()
            )));
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| SocialError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlanItem;
    use crate::types::Network;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_plan() -> Plan {
        Plan {
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            timezone: "America/Chicago".to_string(),
            items: vec![PlanItem {
                draft: PathBuf::from("/work/drafts/a-twitter.md"),
                platform: Network::Twitter,
                scheduled_at: DateTime::parse_from_rfc3339("2024-01-02T09:00:00-06:00").unwrap(),
                account_id: "tw-1".to_string(),
            }],
        }
    }

    #[test]
    fn test_save_then_load_is_equal() {
        let temp_dir = TempDir::new().unwrap();
        let store = PlanStore::new(temp_dir.path().join("queue").join("plan.json"));

        let location = store.save(&sample_plan()).unwrap();
        assert!(location.exists());
        assert_eq!(store.load().unwrap(), sample_plan());
    }

    #[test]
    fn test_saved_json_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = PlanStore::new(temp_dir.path().join("plan.json"));
        store.save(&sample_plan()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["timezone"], "America/Chicago");
        assert_eq!(value["items"][0]["platform"], "twitter");
        assert_eq!(value["items"][0]["scheduled_at"], "2024-01-02T09:00:00-06:00");
        assert_eq!(value["items"][0]["account_id"], "tw-1");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = PlanStore::new(temp_dir.path().join("plan.json"));
        assert!(matches!(store.load(), Err(SocialError::NotFound(_))));
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plan.json");
        std::fs::write(&path, "{\"items\": [").unwrap();

        let err = PlanStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SocialError::Corrupt { .. }));
    }
}
