//! Replaying a plan against the posting service

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::{Plan, PlanItem};
use crate::compose::postable_text;
use crate::config::ApplyConfig;
use crate::drafts::DraftStore;
use crate::error::{ConfigError, Result};
use crate::events::{EventKind, EventLog};
use crate::remote::{JobStatus, PostingApi, ScheduleRequest};
use crate::types::{DraftStatus, Network};

/// How to follow up on an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyPolicy {
    /// Wait before each job-status check
    pub poll_delay: Duration,
    /// Job-status checks per submission; zero skips checking
    pub poll_attempts: u32,
}

impl Default for ApplyPolicy {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_secs(2),
            poll_attempts: 1,
        }
    }
}

impl From<&ApplyConfig> for ApplyPolicy {
    fn from(config: &ApplyConfig) -> Self {
        Self {
            poll_delay: Duration::from_secs(config.poll_delay_secs),
            poll_attempts: config.poll_attempts,
        }
    }
}

/// Why a single plan item was not scheduled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    #[error("Draft file not found")]
    MissingDraft,

    #[error("No post text found in draft")]
    EmptyContent,

    /// The service accepted the request but the job reported failures
    #[error("Rejected by remote: {0}")]
    RemoteRejected(String),

    /// Transport error or non-2xx response
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledItem {
    pub draft: PathBuf,
    pub platform: Network,
    pub scheduled_at: DateTime<FixedOffset>,
    pub job_id: Option<String>,
    /// Text that was (or in a dry run would be) submitted
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem {
    pub draft: PathBuf,
    pub platform: Network,
    #[serde(serialize_with = "serialize_display")]
    pub error: ItemFailure,
}

fn serialize_display<S: serde::Serializer>(error: &ItemFailure, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of applying a plan
///
/// There is no overall success flag; compare the two lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyResult {
    pub successes: Vec<ScheduledItem>,
    pub failures: Vec<FailedItem>,
    pub dry_run: bool,
}

pub struct PlanApplier {
    api: Arc<dyn PostingApi>,
    drafts: DraftStore,
    events: EventLog,
    policy: ApplyPolicy,
}

impl PlanApplier {
    pub fn new(api: Arc<dyn PostingApi>, drafts: DraftStore, events: EventLog) -> Self {
        Self {
            api,
            drafts,
            events,
            policy: ApplyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ApplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit every plan item in order
    ///
    /// Item failures are collected and never stop the run. A dry run touches
    /// neither the remote service nor the event log. A live run without a
    /// credential fails before the first item.
    pub async fn apply(&self, plan: &Plan, dry_run: bool) -> Result<ApplyResult> {
        let mut result = ApplyResult {
            dry_run,
            ..Default::default()
        };
        if plan.items.is_empty() {
            return Ok(result);
        }

        if !dry_run && !self.api.is_configured() {
            return Err(ConfigError::MissingCredential(
                "posting service API key is not set".to_string(),
            )
            .into());
        }

        for item in &plan.items {
            match self.apply_item(item, dry_run).await {
                Ok(scheduled) => {
                    if !dry_run {
                        self.record_success(&scheduled);
                    }
                    result.successes.push(scheduled);
                }
                Err(error) => {
                    tracing::warn!("Failed to schedule {}: {}", item.draft.display(), error);
                    let failed = FailedItem {
                        draft: item.draft.clone(),
                        platform: item.platform.clone(),
                        error,
                    };
                    if !dry_run {
                        self.events.record(
                            EventKind::ScheduleFailed,
                            json!({
                                "draft": failed.draft,
                                "platform": failed.platform,
                                "scheduled_at": item.scheduled_at,
                                "error": failed.error.to_string(),
                            }),
                        );
                    }
                    result.failures.push(failed);
                }
            }
        }

        tracing::info!(
            "Applied plan: {} scheduled, {} failed{}",
            result.successes.len(),
            result.failures.len(),
            if dry_run { " (dry run)" } else { "" }
        );
        Ok(result)
    }

    async fn apply_item(&self, item: &PlanItem, dry_run: bool) -> std::result::Result<ScheduledItem, ItemFailure> {
        let path = self.drafts.resolve(&item.draft);
        let content = std::fs::read_to_string(&path).map_err(|_| ItemFailure::MissingDraft)?;

        let text = postable_text(&content);
        if text.is_empty() {
            return Err(ItemFailure::EmptyContent);
        }

        let mut scheduled = ScheduledItem {
            draft: item.draft.clone(),
            platform: item.platform.clone(),
            scheduled_at: item.scheduled_at,
            job_id: None,
            text,
        };
        if dry_run {
            return Ok(scheduled);
        }

        let request = ScheduleRequest {
            network: item.platform.clone(),
            text: scheduled.text.clone(),
            account_id: item.account_id.clone(),
            scheduled_at: item.scheduled_at,
        };
        let response = self
            .api
            .schedule(&request)
            .await
            .map_err(|e| ItemFailure::RemoteUnavailable(e.to_string()))?;

        if let Some(job_id) = &response.job_id {
            let status = self.poll_job(job_id).await?;
            if let Some(status) = status.filter(JobStatus::has_failures) {
                return Err(ItemFailure::RemoteRejected(status.failure_detail()));
            }
        }

        scheduled.job_id = response.job_id;
        Ok(scheduled)
    }

    /// Check the job up to `poll_attempts` times, stopping once it settles
    async fn poll_job(&self, job_id: &str) -> std::result::Result<Option<JobStatus>, ItemFailure> {
        let mut last = None;
        for attempt in 1..=self.policy.poll_attempts {
            tokio::time::sleep(self.policy.poll_delay).await;
            let status = self
                .api
                .job_status(job_id)
                .await
                .map_err(|e| ItemFailure::RemoteUnavailable(format!("job status: {}", e)))?;

            tracing::debug!("Job {} check {}: {:?}", job_id, attempt, status.status);
            let settled = status.is_complete() || status.has_failures();
            last = Some(status);
            if settled {
                break;
            }
        }
        Ok(last)
    }

    fn record_success(&self, scheduled: &ScheduledItem) {
        self.events.record(
            EventKind::PostScheduled,
            json!({
                "draft": scheduled.draft,
                "platform": scheduled.platform,
                "scheduled_at": scheduled.scheduled_at,
                "job_id": scheduled.job_id,
            }),
        );

        if let Err(e) = self.drafts.set_status(&scheduled.draft, DraftStatus::Scheduled) {
            tracing::warn!(
                "Scheduled {} but could not mark the draft: {}",
                scheduled.draft.display(),
                e
            );
        }
    }
}
