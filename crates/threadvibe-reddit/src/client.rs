//! HTTP client for Reddit's OAuth API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use threadvibe_core::CommentSource;

use crate::submission::{Submission, Thing};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("missing environment variable {0}")]
    Config(&'static str),
    #[error("not a submission URL: {0}")]
    BadUrl(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed with status {status}: {body}")]
    Auth { status: u16, body: String },
    #[error("submission not found: {0}")]
    NotFound(String),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Data-source credentials, supplied through the environment at process
/// start. The process refuses to start without them.
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditConfig {
    pub fn from_env() -> Result<Self, RedditError> {
        Ok(Self {
            client_id: require_env("REDDIT_CLIENT_ID")?,
            client_secret: require_env("REDDIT_CLIENT_SECRET")?,
            user_agent: require_env("REDDIT_USER_AGENT")?,
        })
    }
}

fn require_env(key: &'static str) -> Result<String, RedditError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(RedditError::Config(key))
}

/// One configured client per process; requests themselves are
/// stateless, each fetching its own short-lived access token.
pub struct RedditClient {
    http: reqwest::Client,
    config: RedditConfig,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self, RedditError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Resolve a submission URL to the submission and its comment
    /// forest.
    pub async fn resolve(&self, url: &str) -> Result<Submission, RedditError> {
        let id = submission_id(url)?;
        let token = self.access_token().await?;

        info!(id = %id, "resolving submission");
        let resp = self
            .http
            .get(format!("{API_BASE}/comments/{id}"))
            .bearer_auth(&token)
            .query(&[("limit", "500"), ("raw_json", "1")])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RedditError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let listings: Vec<Thing> = resp.json().await?;
        let submission = Submission::from_listings(url, listings)?;
        debug!(id = %submission.id, title = %submission.title, "resolved submission");
        Ok(submission)
    }

    async fn access_token(&self) -> Result<String, RedditError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: AccessToken = resp.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CommentSource for RedditClient {
    async fn fetch_comments(&self, url: &str, limit: usize) -> anyhow::Result<Vec<String>> {
        let submission = self.resolve(url).await?;
        Ok(submission.flattened_comments(limit))
    }
}

/// Extract the submission id from a `/comments/{id}` URL path segment.
fn submission_id(url: &str) -> Result<String, RedditError> {
    let path = url.splitn(2, "//").nth(1).unwrap_or(url);
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    while let Some(segment) = segments.next() {
        if segment == "comments" {
            return segments
                .next()
                .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(|id| id.to_string())
                .ok_or_else(|| RedditError::BadUrl(url.to_string()));
        }
    }

    Err(RedditError::BadUrl(url.to_string()))
}
