use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;

/// Dimension string the hit-count query is broken down by.
pub const HIT_CONTENTS: &str = "endpoint|api_key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitsQuery {
    pub api_key: String,
    pub hit_contents: String,
}

impl HitsQuery {
    pub fn for_key(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            hit_contents: HIT_CONTENTS.to_string(),
        }
    }
}

/// Source of API usage statistics. The response body is passed through to
/// the view undecoded beyond JSON.
#[async_trait]
pub trait Analytics: Send + Sync {
    async fn total_hits(&self, query: &HitsQuery) -> Result<serde_json::Value, AppError>;
}

#[derive(Debug, Clone)]
pub struct HttpAnalytics {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpAnalytics {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Analytics for HttpAnalytics {
    async fn total_hits(&self, query: &HitsQuery) -> Result<serde_json::Value, AppError> {
        let endpoint = format!("{}/hits/total", self.base_url.trim_end_matches('/'));
        let url = reqwest::Url::parse_with_params(
            &endpoint,
            &[
                ("api_key", query.api_key.as_str()),
                ("hit_contents", query.hit_contents.as_str()),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build analytics URL: {e}")))?;

        let body = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body)
    }
}

/// Used when no analytics service is configured.
#[derive(Debug, Clone, Default)]
pub struct NoAnalytics;

#[async_trait]
impl Analytics for NoAnalytics {
    async fn total_hits(&self, _query: &HitsQuery) -> Result<serde_json::Value, AppError> {
        Ok(serde_json::Value::Null)
    }
}

pub fn from_config(config: &Config) -> Arc<dyn Analytics> {
    match &config.analytics_url {
        Some(url) => Arc::new(HttpAnalytics::new(url.clone())),
        None => {
            tracing::warn!("ANALYTICS_URL not set, hit counts will be empty");
            Arc::new(NoAnalytics)
        }
    }
}
