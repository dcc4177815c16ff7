//! Outbound ops-channel messaging.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{ConfigError, SLACK_TOKEN_VAR};

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const SLACK_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Team chat capability. One call, one message; no retries here.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackChannel {
    client: reqwest::Client,
    bot_token: String,
    endpoint: String,
}

impl SlackChannel {
    /// Fails on a blank token so the problem shows up once at startup instead
    /// of on every breach.
    pub fn new(bot_token: impl Into<String>) -> Result<Self, ConfigError> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential(SLACK_TOKEN_VAR));
        }
        let client = reqwest::Client::builder()
            .timeout(SLACK_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            bot_token,
            endpoint: SLACK_POST_MESSAGE_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl MessageChannel for SlackChannel {
    async fn send(&self, channel_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "channel": channel_id,
            "text": text,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to reach Slack")?;

        if !response.status().is_success() {
            bail!("Slack API returned HTTP {}", response.status());
        }

        let reply: SlackReply = response
            .json()
            .await
            .context("Slack reply was not valid JSON")?;

        if !reply.ok {
            bail!(
                "Slack API error: {}",
                reply.error.as_deref().unwrap_or("unknown_error")
            );
        }

        Ok(())
    }
}
