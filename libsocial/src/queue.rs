//! Remote queue management: list, snapshot, cancel, reschedule

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::accounts::AccountResolver;
use crate::error::{Result, SocialError};
use crate::events::{EventKind, EventLog};
use crate::remote::{PostingApi, RemotePost};
use crate::types::Network;

pub const SNAPSHOT_FILE: &str = "publer_snapshot.json";

/// Networks included in a sync
const SYNCED_NETWORKS: [Network; 2] = [Network::LinkedIn, Network::Twitter];

/// A scheduled post tagged with the network it was fetched for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPost {
    #[serde(flatten)]
    pub post: RemotePost,
    pub platform: Network,
}

/// Local copy of the remote queue at `state/publer_snapshot.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub synced_at: DateTime<Utc>,
    pub posts: Vec<SnapshotPost>,
    pub counts: BTreeMap<String, usize>,
}

impl QueueSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SocialError::NotFound(format!(
                "Queue snapshot not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SocialError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

pub struct QueueManager {
    api: Arc<dyn PostingApi>,
    resolver: AccountResolver,
    events: EventLog,
    state_dir: PathBuf,
}

impl QueueManager {
    pub fn new(api: Arc<dyn PostingApi>, state_dir: &Path) -> Self {
        Self {
            resolver: AccountResolver::new(api.clone()),
            api,
            events: EventLog::new(state_dir),
            state_dir: state_dir.to_path_buf(),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(SNAPSHOT_FILE)
    }

    /// Scheduled posts, optionally for one network's account only
    pub async fn list(&mut self, platform: Option<&Network>) -> Result<Vec<RemotePost>> {
        let account_id = match platform {
            Some(network) => Some(self.resolver.resolve(network).await?),
            None => None,
        };
        Ok(self.api.list_posts(account_id.as_deref()).await?)
    }

    /// Fetch the queue for every synced network and write the snapshot
    ///
    /// Networks with no connected account are counted as zero. Any remote
    /// error aborts the sync before the snapshot is touched.
    pub async fn sync(&mut self) -> Result<QueueSnapshot> {
        let mut posts = Vec::new();
        let mut counts = BTreeMap::new();

        for network in &SYNCED_NETWORKS {
            let account_id = match self.resolver.resolve(network).await {
                Ok(id) => id,
                Err(SocialError::AccountNotFound { .. }) => {
                    tracing::debug!("No {} account connected, skipping", network);
                    counts.insert(network.to_string(), 0);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let fetched = self.api.list_posts(Some(&account_id)).await?;
            counts.insert(network.to_string(), fetched.len());
            posts.extend(fetched.into_iter().map(|post| SnapshotPost {
                post,
                platform: network.clone(),
            }));
        }

        let snapshot = QueueSnapshot {
            synced_at: Utc::now(),
            posts,
            counts,
        };

        std::fs::create_dir_all(&self.state_dir)?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| SocialError::InvalidInput(format!("Snapshot is not serializable: {}", e)))?;
        std::fs::write(self.snapshot_path(), json)?;

        self.events.record(
            EventKind::QueueSynced,
            json!({ "post_count": snapshot.posts.len(), "counts": snapshot.counts }),
        );
        tracing::info!("Synced {} scheduled posts", snapshot.posts.len());
        Ok(snapshot)
    }

    pub async fn cancel(&self, post_id: &str) -> Result<()> {
        match self.api.delete_post(post_id).await {
            Ok(()) => {
                self.events
                    .record(EventKind::PostCancelled, json!({ "post_id": post_id }));
                Ok(())
            }
            Err(e) => {
                self.events.record(
                    EventKind::CancelFailed,
                    json!({ "post_id": post_id, "error": e.to_string() }),
                );
                Err(e.into())
            }
        }
    }

    pub async fn reschedule(&self, post_id: &str, new_time: DateTime<FixedOffset>) -> Result<()> {
        match self.api.reschedule_post(post_id, new_time).await {
            Ok(()) => {
                self.events.record(
                    EventKind::PostRescheduled,
                    json!({ "post_id": post_id, "new_time": new_time }),
                );
                Ok(())
            }
            Err(e) => {
                self.events.record(
                    EventKind::RescheduleFailed,
                    json!({ "post_id": post_id, "new_time": new_time, "error": e.to_string() }),
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::mock::{MockApi, MockConfig};
    use tempfile::TempDir;

    fn queue_api() -> Arc<MockApi> {
        Arc::new(MockApi::new(
            MockConfig::default()
                .with_account("tw-1", "twitter")
                .with_account("li-1", "linkedin")
                .with_post("1", "twitter")
                .with_post("2", "twitter")
                .with_post("3", "linkedin"),
        ))
    }

    #[tokio::test]
    async fn test_list_with_platform_uses_account_filter() {
        let temp_dir = TempDir::new().unwrap();
        let api = queue_api();
        let mut manager = QueueManager::new(api.clone(), temp_dir.path());

        let posts = manager.list(Some(&Network::from_name("x"))).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(manager.list(None).await.unwrap().len(), 3);

        let listed = api.config().listed_accounts.lock().unwrap().clone();
        assert_eq!(listed, vec![Some("tw-1".to_string()), None]);
    }

    #[tokio::test]
    async fn test_sync_writes_snapshot_and_event() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = QueueManager::new(queue_api(), temp_dir.path());

        let snapshot = manager.sync().await.unwrap();
        assert_eq!(snapshot.counts["twitter"], 2);
        assert_eq!(snapshot.counts["linkedin"], 1);

        let loaded = QueueSnapshot::load(&manager.snapshot_path()).unwrap();
        assert_eq!(loaded, snapshot);

        let events = EventLog::new(temp_dir.path()).read_all().unwrap();
        assert_eq!(events[0].kind, EventKind::QueueSynced);
        assert_eq!(events[0].data["post_count"], 3);
    }

    #[tokio::test]
    async fn test_sync_counts_missing_account_as_zero() {
        let temp_dir = TempDir::new().unwrap();
        let api = Arc::new(MockApi::new(
            MockConfig::default()
                .with_account("tw-1", "twitter")
                .with_post("1", "twitter"),
        ));
        let mut manager = QueueManager::new(api, temp_dir.path());

        let snapshot = manager.sync().await.unwrap();
        assert_eq!(snapshot.counts["linkedin"], 0);
        assert_eq!(snapshot.counts["twitter"], 1);
    }

    #[tokio::test]
    async fn test_sync_propagates_remote_errors() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = MockConfig::default();
        config.accounts_error = Some(RemoteError::Network("timeout".to_string()));
        let mut manager = QueueManager::new(Arc::new(MockApi::new(config)), temp_dir.path());

        assert!(manager.sync().await.is_err());
        assert!(!manager.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_cancel_success_and_failure_events() {
        let temp_dir = TempDir::new().unwrap();
        let api = queue_api();
        let manager = QueueManager::new(api.clone(), temp_dir.path());
        manager.cancel("1").await.unwrap();
        assert_eq!(*api.config().deleted.lock().unwrap(), vec!["1".to_string()]);

        let mut failing = MockConfig::default();
        failing.mutation_error = Some(RemoteError::Http {
            status: 404,
            body: "no such post".to_string(),
        });
        let failing_manager = QueueManager::new(Arc::new(MockApi::new(failing)), temp_dir.path());
        assert!(failing_manager.cancel("9").await.is_err());

        let kinds: Vec<_> = EventLog::new(temp_dir.path())
            .read_all()
            .unwrap()
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::PostCancelled, EventKind::CancelFailed]);
    }

    #[tokio::test]
    async fn test_reschedule_sends_new_time() {
        let temp_dir = TempDir::new().unwrap();
        let api = queue_api();
        let manager = QueueManager::new(api.clone(), temp_dir.path());
        let when = DateTime::parse_from_rfc3339("2024-02-01T10:00:00-06:00").unwrap();

        manager.reschedule("2", when).await.unwrap();

        let rescheduled = api.config().rescheduled.lock().unwrap().clone();
        assert_eq!(rescheduled, vec![("2".to_string(), when)]);
        let events = EventLog::new(temp_dir.path()).read_all().unwrap();
        assert_eq!(events[0].kind, EventKind::PostRescheduled);
        assert_eq!(events[0].data["new_time"], "2024-02-01T10:00:00-06:00");
    }
}
