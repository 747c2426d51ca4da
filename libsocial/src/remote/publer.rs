//! Publer HTTP client

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use super::{
    Account, InsightsRequest, JobStatus, PostingApi, RemotePost, ScheduleRequest,
    ScheduleResponse, Workspace,
};
use crate::config::PublerConfig;
use crate::error::{RemoteError, Result};

pub const WORKSPACE_HEADER: &str = "Publer-Workspace-Id";

pub struct PublerClient {
    http: reqwest::Client,
    base_url: String,
    workspace_id: Option<String>,
    api_key: Option<SecretString>,
}

impl PublerClient {
    /// Build a client, reading the API key from the configured env var
    pub fn new(config: &PublerConfig) -> Result<Self> {
        Self::with_api_key(config, config.api_key())
    }

    pub fn with_api_key(config: &PublerConfig, api_key: Option<SecretString>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RemoteError::from)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            workspace_id: config.workspace_id.clone().filter(|id| !id.is_empty()),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> std::result::Result<RequestBuilder, RemoteError> {
        let api_key = self.api_key.as_ref().ok_or(RemoteError::MissingCredential)?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer-API {}", api_key.expose_secret()),
            );
        if let Some(workspace_id) = &self.workspace_id {
            builder = builder.header(WORKSPACE_HEADER, workspace_id);
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder) -> std::result::Result<Response, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Remote returned {}: {}", status, body);
        Err(RemoteError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> std::result::Result<T, RemoteError> {
        let response = Self::send(builder).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Accept either a bare array or an object wrapping it under `key`
fn unwrap_list(value: Value, key: &str) -> std::result::Result<Vec<Value>, RemoteError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(RemoteError::Decode(format!("missing '{}' list", key))),
        },
        other => Err(RemoteError::Decode(format!(
            "expected list of {}, got {}",
            key, other
        ))),
    }
}

#[async_trait]
impl PostingApi for PublerClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list_accounts(&self) -> std::result::Result<Vec<Account>, RemoteError> {
        let value: Value = Self::send_json(self.request(Method::GET, "/accounts")?).await?;
        unwrap_list(value, "accounts")?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| RemoteError::Decode(e.to_string())))
            .collect()
    }

    async fn schedule(&self, request: &ScheduleRequest) -> std::result::Result<ScheduleResponse, RemoteError> {
        let builder = self
            .request(Method::POST, "/posts/schedule")?
            .json(&request.to_payload());
        Self::send_json(builder).await
    }

    async fn job_status(&self, job_id: &str) -> std::result::Result<JobStatus, RemoteError> {
        let path = format!("/job_status/{}", job_id);
        Self::send_json(self.request(Method::GET, &path)?).await
    }

    async fn list_posts(&self, account_id: Option<&str>) -> std::result::Result<Vec<RemotePost>, RemoteError> {
        let mut builder = self
            .request(Method::GET, "/posts")?
            .query(&[("state", "scheduled")]);
        if let Some(id) = account_id {
            builder = builder.query(&[("account_ids[]", id)]);
        }

        let value: Value = Self::send_json(builder).await?;
        Ok(unwrap_list(value, "posts")?
            .iter()
            .filter_map(RemotePost::from_value)
            .collect())
    }

    async fn delete_post(&self, post_id: &str) -> std::result::Result<(), RemoteError> {
        let path = format!("/posts/{}", post_id);
        Self::send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn reschedule_post(
        &self,
        post_id: &str,
        scheduled_at: DateTime<FixedOffset>,
    ) -> std::result::Result<(), RemoteError> {
        let path = format!("/posts/{}", post_id);
        let builder = self
            .request(Method::PUT, &path)?
            .json(&json!({ "scheduled_at": scheduled_at.to_rfc3339() }));
        Self::send(builder).await?;
        Ok(())
    }

    async fn me(&self) -> std::result::Result<Value, RemoteError> {
        Self::send_json(self.request(Method::GET, "/me")?).await
    }

    async fn list_workspaces(&self) -> std::result::Result<Vec<Workspace>, RemoteError> {
        let value: Value = Self::send_json(self.request(Method::GET, "/workspaces")?).await?;
        unwrap_list(value, "workspaces")?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| RemoteError::Decode(e.to_string())))
            .collect()
    }

    async fn post_insights(&self, request: &InsightsRequest) -> std::result::Result<Value, RemoteError> {
        let path = format!("/analytics/{}/post_insights", request.account_id);
        let builder = self.request(Method::GET, &path)?.query(&request.query());
        Self::send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured_tracks_key() {
        let config = PublerConfig::default();
        let without = PublerClient::with_api_key(&config, None).unwrap();
        assert!(!without.is_configured());

        let with = PublerClient::with_api_key(&config, Some(SecretString::from("k"))).unwrap();
        assert!(with.is_configured());
    }

    #[tokio::test]
    async fn test_request_without_key_fails_before_network() {
        let mut config = PublerConfig::default();
        config.base_url = "http://127.0.0.1:9".to_string();
        let client = PublerClient::with_api_key(&config, None).unwrap();

        let err = client.list_accounts().await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingCredential));
    }

    #[test]
    fn test_unwrap_list_shapes() {
        assert_eq!(unwrap_list(json!([1, 2]), "posts").unwrap().len(), 2);
        assert_eq!(unwrap_list(json!({"posts": [1]}), "posts").unwrap().len(), 1);
        assert!(unwrap_list(json!({"other": []}), "posts").is_err());
        assert!(unwrap_list(json!("nope"), "posts").is_err());
    }
}
