//! Jira REST client and issue-key resolution.
//!
//! [`IssueTracker`] is the seam the HTTP layer depends on; [`JiraClient`] is
//! the real implementation against the Jira Cloud v3 API.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::config::{JiraCredentials, JiraSettings};
use crate::errors::{ServiceError, TrackerError};

static ISSUE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([A-Z]+-\d+)(?:/|$)").unwrap());

/// Fetches raw issues by key.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_issue(&self, issue_key: &str) -> Result<Value, TrackerError>;
}

/// Jira Cloud client using basic auth (email + API token).
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    credentials: Option<JiraCredentials>,
}

impl JiraClient {
    pub fn new(settings: &JiraSettings) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("luigi/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::Connection(e.to_string()))?;
        Ok(Self {
            http,
            credentials: settings.credentials.clone(),
        })
    }

    fn issue_url(base_url: &str, issue_key: &str) -> String {
        format!(
            "{}/rest/api/3/issue/{}",
            base_url.trim_end_matches('/'),
            issue_key
        )
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, issue_key: &str) -> Result<Value, TrackerError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(TrackerError::MissingCredentials)?;
        let url = Self::issue_url(&creds.base_url, issue_key);
        tracing::info!(issue = issue_key, "fetching issue from Jira");

        let resp = self
            .http
            .get(&url)
            .basic_auth(&creds.email, Some(&creds.api_token))
            .header("Accept", "application/json")
            .query(&[("expand", "names")])
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(issue = issue_key, status = status.as_u16(), "Jira returned an error");
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))
    }
}

fn classify(err: reqwest::Error) -> TrackerError {
    if err.is_timeout() {
        TrackerError::Timeout
    } else {
        TrackerError::Connection(err.to_string())
    }
}

/// Pull the issue key (e.g. `PAY-42`) out of a browse URL.
pub fn issue_key_from_url(url: &str) -> Result<String, ServiceError> {
    ISSUE_KEY_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ServiceError::Validation("Could not extract issue key from the provided URL".to_string())
        })
}

/// Pick the issue key from a request: an explicit id wins over a URL.
pub fn resolve_issue_key(
    issue_id: Option<&str>,
    issue_url: Option<&str>,
) -> Result<String, ServiceError> {
    fn non_empty(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }
    match (non_empty(issue_id), non_empty(issue_url)) {
        (Some(id), _) => Ok(id.to_string()),
        (None, Some(url)) => issue_key_from_url(url),
        (None, None) => Err(ServiceError::Validation(
            "Either issueId or issueUrl must be provided".to_string(),
        )),
    }
}
