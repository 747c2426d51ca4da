//! Pipeline overview for `social status`

use serde::Serialize;
use std::collections::BTreeMap;

use crate::drafts::DraftStore;
use crate::error::{Result, SocialError};
use crate::ideas::IdeaStore;
use crate::planner::PlanStore;
use crate::queue::QueueManager;
use crate::types::{DraftStatus, IdeaStatus, Network};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdeaCounts {
    pub ready: usize,
    pub drafted: usize,
    pub review: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftCounts {
    pub draft: usize,
    pub approved: usize,
    pub scheduled: usize,
    /// Drafts per network, any status
    pub by_platform: BTreeMap<String, usize>,
}

/// Remote queue counts, or the error that prevented fetching them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCounts {
    Counts(BTreeMap<String, usize>),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub ideas: IdeaCounts,
    pub drafts: DraftCounts,
    /// Items in the saved plan; `None` when no plan exists
    pub plan_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteCounts>,
}

impl PipelineStatus {
    /// Count local state; a corrupt plan is an error, a missing one is not
    pub fn collect(ideas: &IdeaStore, drafts: &DraftStore, plan: &PlanStore) -> Result<Self> {
        let mut status = PipelineStatus::default();

        for idea in ideas.list(None)? {
            match idea.status {
                IdeaStatus::Ready => status.ideas.ready += 1,
                IdeaStatus::Drafted => status.ideas.drafted += 1,
                IdeaStatus::Review => status.ideas.review += 1,
            }
        }

        for draft in drafts.list(None, None)? {
            match draft.status {
                DraftStatus::Draft => status.drafts.draft += 1,
                DraftStatus::Approved => status.drafts.approved += 1,
                DraftStatus::Scheduled => status.drafts.scheduled += 1,
            }
            let platform = draft
                .platform
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *status.drafts.by_platform.entry(platform).or_default() += 1;
        }

        status.plan_items = match plan.load() {
            Ok(plan) => Some(plan.items.len()),
            Err(SocialError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(status)
    }

    /// Add remote queue counts; failures are reported inline
    ///
    /// Read-only: the snapshot file is left alone.
    pub async fn with_remote(mut self, queue: &mut QueueManager) -> Self {
        let mut counts = BTreeMap::new();
        for network in [Network::LinkedIn, Network::Twitter] {
            match queue.list(Some(&network)).await {
                Ok(posts) => {
                    counts.insert(network.to_string(), posts.len());
                }
                Err(SocialError::AccountNotFound { .. }) => {
                    counts.insert(network.to_string(), 0);
                }
                Err(e) => {
                    tracing::warn!("Could not fetch remote queue: {}", e);
                    self.remote = Some(RemoteCounts::Error(e.to_string()));
                    return self;
                }
            }
        }
        self.remote = Some(RemoteCounts::Counts(counts));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::ideas::NewIdea;
    use crate::remote::mock::{MockApi, MockConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_collect_counts() {
        let temp_dir = TempDir::new().unwrap();
        let ideas = IdeaStore::new(temp_dir.path().join("ideas"));
        let drafts = DraftStore::new(temp_dir.path().join("drafts"));
        let plan = PlanStore::new(temp_dir.path().join("queue/plan.json"));

        ideas.create(NewIdea::new("one", "note", "1")).unwrap();
        ideas
            .create(NewIdea::new("two", "note", "2").with_status(IdeaStatus::Review))
            .unwrap();

        std::fs::create_dir_all(drafts.dir()).unwrap();
        std::fs::write(drafts.dir().join("a.md"), "---\nplatform: x\nstatus: approved\n---\na").unwrap();
        std::fs::write(drafts.dir().join("b.md"), "---\nplatform: linkedin\nstatus: draft\n---\nb").unwrap();

        let status = PipelineStatus::collect(&ideas, &drafts, &plan).unwrap();
        assert_eq!(status.ideas.ready, 1);
        assert_eq!(status.ideas.review, 1);
        assert_eq!(status.drafts.approved, 1);
        assert_eq!(status.drafts.draft, 1);
        assert_eq!(status.drafts.by_platform["twitter"], 1);
        assert_eq!(status.plan_items, None);
        assert!(status.remote.is_none());
    }

    #[tokio::test]
    async fn test_remote_counts_per_network() {
        let temp_dir = TempDir::new().unwrap();
        let api = MockApi::new(
            MockConfig::default()
                .with_account("tw-1", "twitter")
                .with_post("1", "twitter")
                .with_post("2", "twitter"),
        );
        let mut queue = QueueManager::new(Arc::new(api), temp_dir.path());

        let status = PipelineStatus::default().with_remote(&mut queue).await;
        let Some(RemoteCounts::Counts(counts)) = status.remote else {
            panic!("Expected counts");
        };
        assert_eq!(counts["twitter"], 2);
        assert_eq!(counts["linkedin"], 0);
        assert!(!queue.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_remote_error_is_inline() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = MockConfig::default();
        config.accounts_error = Some(RemoteError::Network("offline".to_string()));
        let mut queue = QueueManager::new(Arc::new(MockApi::new(config)), temp_dir.path());

        let status = PipelineStatus::default().with_remote(&mut queue).await;
        match status.remote {
            Some(RemoteCounts::Error(msg)) => assert!(msg.contains("offline")),
            other => panic!("Expected inline error, got {:?}", other),
        }
    }
}
