//! In-memory posting service for tests
//!
//! Behaviour is configured up front through [`MockConfig`]; every call is
//! counted and every schedule request recorded so tests can assert on what
//! reached the "remote" side. Counters live behind `Arc<Mutex<_>>` so a test
//! can keep a handle to them after the mock is moved into a resolver or
//! applier.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{
    Account, InsightsRequest, JobStatus, PostingApi, RemotePost, ScheduleRequest,
    ScheduleResponse, Workspace,
};
use crate::error::RemoteError;

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub is_configured: bool,
    pub accounts: Vec<Account>,
    /// Error returned by `list_accounts`
    pub accounts_error: Option<RemoteError>,
    /// Job id handed back by `schedule`
    pub job_id: Option<String>,
    /// Errors returned by successive `schedule` calls; `None` entries succeed
    pub schedule_errors: Arc<Mutex<VecDeque<Option<RemoteError>>>>,
    /// Status returned by `job_status`
    pub job_status: JobStatus,
    pub posts: Vec<RemotePost>,
    /// Error returned by delete and reschedule calls
    pub mutation_error: Option<RemoteError>,
    /// Body returned by `me`
    pub me: Value,
    pub workspaces: Vec<Workspace>,
    /// Body returned by `post_insights`
    pub insights: Value,

    pub accounts_calls: Arc<Mutex<usize>>,
    pub schedule_calls: Arc<Mutex<usize>>,
    pub job_status_calls: Arc<Mutex<usize>>,
    pub scheduled: Arc<Mutex<Vec<ScheduleRequest>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
    pub rescheduled: Arc<Mutex<Vec<(String, DateTime<FixedOffset>)>>>,
    pub listed_accounts: Arc<Mutex<Vec<Option<String>>>>,
    pub insights_requests: Arc<Mutex<Vec<InsightsRequest>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            is_configured: true,
            accounts: Vec::new(),
            accounts_error: None,
            job_id: None,
            schedule_errors: Arc::new(Mutex::new(VecDeque::new())),
            job_status: JobStatus {
                status: Some("complete".to_string()),
                ..Default::default()
            },
            posts: Vec::new(),
            mutation_error: None,
            me: Value::Object(Map::new()),
            workspaces: Vec::new(),
            insights: Value::Object(Map::new()),
            accounts_calls: Arc::new(Mutex::new(0)),
            schedule_calls: Arc::new(Mutex::new(0)),
            job_status_calls: Arc::new(Mutex::new(0)),
            scheduled: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            rescheduled: Arc::new(Mutex::new(Vec::new())),
            listed_accounts: Arc::new(Mutex::new(Vec::new())),
            insights_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockConfig {
    pub fn with_account(mut self, id: &str, provider: &str) -> Self {
        self.accounts.push(Account {
            id: id.to_string(),
            provider: provider.to_string(),
            name: None,
        });
        self
    }

    pub fn with_job(mut self, job_id: &str) -> Self {
        self.job_id = Some(job_id.to_string());
        self
    }

    /// Make the job report a failure for `account_id`
    pub fn with_job_failure(mut self, account_id: &str, reason: &str) -> Self {
        let mut failures = Map::new();
        failures.insert(account_id.to_string(), Value::String(reason.to_string()));
        self.job_status.payload.failures = failures;
        self
    }

    /// Queue an outcome for the next unclaimed `schedule` call
    pub fn then_schedule(self, outcome: Option<RemoteError>) -> Self {
        if let Ok(mut queue) = self.schedule_errors.lock() {
            queue.push_back(outcome);
        }
        self
    }

    pub fn with_post(mut self, id: &str, network: &str) -> Self {
        self.posts.push(RemotePost {
            id: id.to_string(),
            text: format!("post {}", id),
            scheduled_at: None,
            network: network.to_string(),
        });
        self
    }

    pub fn with_workspace(mut self, id: &str, name: &str) -> Self {
        self.workspaces.push(Workspace {
            id: id.to_string(),
            name: Some(name.to_string()),
        });
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.is_configured = false;
        self
    }
}

pub struct MockApi {
    config: MockConfig,
}

impl MockApi {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Configured mock with one twitter and one linkedin account
    pub fn with_default_accounts() -> Self {
        Self::new(
            MockConfig::default()
                .with_account("tw-1", "twitter")
                .with_account("li-1", "linkedin"),
        )
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn schedule_call_count(&self) -> usize {
        count(&self.config.schedule_calls)
    }

    pub fn accounts_call_count(&self) -> usize {
        count(&self.config.accounts_calls)
    }

    pub fn job_status_call_count(&self) -> usize {
        count(&self.config.job_status_calls)
    }

    pub fn scheduled_requests(&self) -> Vec<ScheduleRequest> {
        self.config
            .scheduled
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

fn count(counter: &Arc<Mutex<usize>>) -> usize {
    counter.lock().map(|c| *c).unwrap_or(0)
}

fn bump(counter: &Arc<Mutex<usize>>) {
    if let Ok(mut c) = counter.lock() {
        *c += 1;
    }
}

#[async_trait]
impl PostingApi for MockApi {
    fn is_configured(&self) -> bool {
        self.config.is_configured
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RemoteError> {
        bump(&self.config.accounts_calls);
        match &self.config.accounts_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.config.accounts.clone()),
        }
    }

    async fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse, RemoteError> {
        bump(&self.config.schedule_calls);

        let outcome = self
            .config
            .schedule_errors
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .flatten();
        if let Some(err) = outcome {
            return Err(err);
        }

        if let Ok(mut scheduled) = self.config.scheduled.lock() {
            scheduled.push(request.clone());
        }
        Ok(ScheduleResponse {
            job_id: self.config.job_id.clone(),
        })
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatus, RemoteError> {
        bump(&self.config.job_status_calls);
        Ok(self.config.job_status.clone())
    }

    async fn list_posts(&self, account_id: Option<&str>) -> Result<Vec<RemotePost>, RemoteError> {
        if let Ok(mut listed) = self.config.listed_accounts.lock() {
            listed.push(account_id.map(str::to_string));
        }

        let Some(account_id) = account_id else {
            return Ok(self.config.posts.clone());
        };
        let provider = self
            .config
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.provider.to_lowercase());
        Ok(self
            .config
            .posts
            .iter()
            .filter(|p| Some(p.network.to_lowercase()) == provider)
            .cloned()
            .collect())
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), RemoteError> {
        if let Some(err) = &self.config.mutation_error {
            return Err(err.clone());
        }
        if let Ok(mut deleted) = self.config.deleted.lock() {
            deleted.push(post_id.to_string());
        }
        Ok(())
    }

    async fn reschedule_post(
        &self,
        post_id: &str,
        scheduled_at: DateTime<FixedOffset>,
    ) -> Result<(), RemoteError> {
        if let Some(err) = &self.config.mutation_error {
            return Err(err.clone());
        }
        if let Ok(mut rescheduled) = self.config.rescheduled.lock() {
            rescheduled.push((post_id.to_string(), scheduled_at));
        }
        Ok(())
    }

    async fn me(&self) -> Result<Value, RemoteError> {
        if !self.config.is_configured {
            return Err(RemoteError::MissingCredential);
        }
        Ok(self.config.me.clone())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        Ok(self.config.workspaces.clone())
    }

    async fn post_insights(&self, request: &InsightsRequest) -> Result<Value, RemoteError> {
        if let Ok(mut requests) = self.config.insights_requests.lock() {
            requests.push(request.clone());
        }
        Ok(self.config.insights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Network;
    use chrono::TimeZone;

    fn request() -> ScheduleRequest {
        ScheduleRequest {
            network: Network::Twitter,
            text: "hi".to_string(),
            account_id: "tw-1".to_string(),
            scheduled_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_schedule_records_requests() {
        let api = MockApi::new(MockConfig::default().with_job("job-1"));
        let response = api.schedule(&request()).await.unwrap();

        assert_eq!(response.job_id.as_deref(), Some("job-1"));
        assert_eq!(api.schedule_call_count(), 1);
        assert_eq!(api.scheduled_requests(), vec![request()]);
    }

    #[tokio::test]
    async fn test_queued_schedule_errors_apply_in_order() {
        let api = MockApi::new(
            MockConfig::default()
                .then_schedule(Some(RemoteError::Network("down".to_string())))
                .then_schedule(None),
        );

        assert!(api.schedule(&request()).await.is_err());
        assert!(api.schedule(&request()).await.is_ok());
        assert!(api.schedule(&request()).await.is_ok());
        assert_eq!(api.schedule_call_count(), 3);
        assert_eq!(api.scheduled_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_list_posts_filters_by_account_provider() {
        let api = MockApi::new(
            MockConfig::default()
                .with_account("tw-1", "twitter")
                .with_post("1", "twitter")
                .with_post("2", "linkedin"),
        );

        assert_eq!(api.list_posts(None).await.unwrap().len(), 2);
        let twitter = api.list_posts(Some("tw-1")).await.unwrap();
        assert_eq!(twitter.len(), 1);
        assert_eq!(twitter[0].id, "1");
    }
}
