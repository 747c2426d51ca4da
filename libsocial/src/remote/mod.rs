//! Remote posting service
//!
//! [`PostingApi`] is the seam between the pipeline and the hosted scheduling
//! service. [`publer::PublerClient`] talks HTTP; [`mock::MockApi`] records
//! calls for tests.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{RemoteError, SocialError};
use crate::types::Network;

pub mod mock;
pub mod publer;

/// A connected social account on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A workspace the API key has access to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Post insights window for one account, both dates inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightsRequest {
    pub account_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl InsightsRequest {
    pub fn new(account_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> crate::error::Result<Self> {
        if from > to {
            return Err(SocialError::InvalidInput(format!(
                "insights window starts after it ends ({} > {})",
                from, to
            )));
        }
        Ok(Self {
            account_id: account_id.into(),
            from,
            to,
        })
    }

    /// `from` / `to` query parameters as `YYYY-MM-DD`
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// One post to place on the schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub network: Network,
    pub text: String,
    pub account_id: String,
    pub scheduled_at: DateTime<FixedOffset>,
}

impl ScheduleRequest {
    /// Single-post bulk body for `POST /posts/schedule`
    pub fn to_payload(&self) -> Value {
        let mut networks = Map::new();
        networks.insert(
            self.network.as_str().to_string(),
            json!({ "type": "status", "text": self.text }),
        );

        json!({
            "bulk": {
                "state": "scheduled",
                "posts": [{
                    "networks": networks,
                    "accounts": [{
                        "id": self.account_id,
                        "scheduled_at": self.scheduled_at.to_rfc3339(),
                    }],
                }],
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "optional_id_from_string_or_number")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobPayload {
    #[serde(default)]
    pub failures: Map<String, Value>,
}

/// Result of `GET /job_status/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payload: JobPayload,
}

impl JobStatus {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }

    pub fn has_failures(&self) -> bool {
        !self.payload.failures.is_empty()
    }

    /// Failure map rendered as compact JSON
    pub fn failure_detail(&self) -> String {
        Value::Object(self.payload.failures.clone()).to_string()
    }
}

/// A post sitting in the remote queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub network: String,
}

impl RemotePost {
    /// Normalize a post object from the service
    ///
    /// Field names vary between endpoints (`text`/`content`,
    /// `scheduled_at`/`send_at`, `network`/`provider`). Posts without an id
    /// are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| value.get(*name).and_then(Value::as_str))
                .map(str::to_string)
        };

        Some(Self {
            id,
            text: field(&["text", "content"]).unwrap_or_default(),
            scheduled_at: field(&["scheduled_at", "send_at"]),
            network: field(&["network", "provider"]).unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

/// Operations the pipeline needs from the scheduling service
#[async_trait]
pub trait PostingApi: Send + Sync {
    /// Whether a credential is available; remote calls fail without one
    fn is_configured(&self) -> bool;

    async fn list_accounts(&self) -> Result<Vec<Account>, RemoteError>;

    async fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse, RemoteError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, RemoteError>;

    /// Scheduled posts, optionally limited to one account
    async fn list_posts(&self, account_id: Option<&str>) -> Result<Vec<RemotePost>, RemoteError>;

    async fn delete_post(&self, post_id: &str) -> Result<(), RemoteError>;

    async fn reschedule_post(
        &self,
        post_id: &str,
        scheduled_at: DateTime<FixedOffset>,
    ) -> Result<(), RemoteError>;

    /// Profile of the key's owner; succeeds only with a valid credential
    async fn me(&self) -> Result<Value, RemoteError>;

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError>;

    /// Per-post analytics for one account, returned as the service sends it
    async fn post_insights(&self, request: &InsightsRequest) -> Result<Value, RemoteError>;
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn optional_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_payload_shape() {
        let request = ScheduleRequest {
            network: Network::from_name("x"),
            text: "Hello".to_string(),
            account_id: "acc-1".to_string(),
            scheduled_at: FixedOffset::west_opt(6 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
                .unwrap(),
        };

        assert_eq!(
            request.to_payload(),
            json!({
                "bulk": {
                    "state": "scheduled",
                    "posts": [{
                        "networks": {"twitter": {"type": "status", "text": "Hello"}},
                        "accounts": [{"id": "acc-1", "scheduled_at": "2024-01-01T09:00:00-06:00"}]
                    }]
                }
            })
        );
    }

    #[test]
    fn test_job_status_failures() {
        let status: JobStatus = serde_json::from_value(json!({
            "status": "complete",
            "payload": {"failures": {"acc-1": "duplicate content"}}
        }))
        .unwrap();
        assert!(status.is_complete());
        assert!(status.has_failures());
        assert!(status.failure_detail().contains("duplicate content"));

        let empty: JobStatus = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.is_complete());
        assert!(!empty.has_failures());
    }

    #[test]
    fn test_account_numeric_id() {
        let account: Account =
            serde_json::from_value(json!({"id": 42, "provider": "linkedin"})).unwrap();
        assert_eq!(account.id, "42");
        assert_eq!(account.name, None);
    }

    #[test]
    fn test_schedule_response_job_id_shapes() {
        let numeric: ScheduleResponse = serde_json::from_value(json!({"job_id": 12345})).unwrap();
        assert_eq!(numeric.job_id.as_deref(), Some("12345"));

        let text: ScheduleResponse = serde_json::from_value(json!({"job_id": "job-1"})).unwrap();
        assert_eq!(text.job_id.as_deref(), Some("job-1"));

        let missing: ScheduleResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.job_id, None);
        let null: ScheduleResponse = serde_json::from_value(json!({"job_id": null})).unwrap();
        assert_eq!(null.job_id, None);
    }

    #[test]
    fn test_insights_request_window() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let request = InsightsRequest::new("li-1", from, to).unwrap();
        assert_eq!(
            request.query(),
            [("from", "2024-01-01".to_string()), ("to", "2024-01-31".to_string())]
        );

        let err = InsightsRequest::new("li-1", to, from).unwrap_err();
        assert!(matches!(err, SocialError::InvalidInput(_)));
    }

    #[test]
    fn test_remote_post_normalization() {
        let post = RemotePost::from_value(&json!({
            "id": 7,
            "content": "hi",
            "send_at": "2024-01-01T09:00:00Z",
            "provider": "twitter"
        }))
        .unwrap();
        assert_eq!(post.id, "7");
        assert_eq!(post.text, "hi");
        assert_eq!(post.scheduled_at.as_deref(), Some("2024-01-01T09:00:00Z"));
        assert_eq!(post.network, "twitter");

        assert!(RemotePost::from_value(&json!({"text": "no id"})).is_none());
    }
}
