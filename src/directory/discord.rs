use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::traits::DiscordDirectory;
use crate::types::{DirectoryChannel, DirectoryError, DirectoryUser};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord REST directory client.
pub struct DiscordRestApi {
    http: reqwest::Client,
    bot_token: String,
}

impl DiscordRestApi {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.to_string(),
        }
    }

    /// Fetch a REST resource. HTTP 404 classifies as `NotFound`; any
    /// other non-success status is an upstream failure.
    async fn api_get(&self, path: &str) -> Result<Value, DirectoryError> {
        let url = format!("{}/{}", API_BASE, path);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
            .map_err(|e| DirectoryError::Upstream(e.into()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(path, "Discord resource not found");
            return Err(DirectoryError::NotFound(format!("discord {}", path)));
        }
        if !status.is_success() {
            return Err(DirectoryError::Upstream(anyhow::anyhow!(
                "Discord API {} failed: HTTP {}",
                path,
                status
            )));
        }
        resp.json()
            .await
            .map_err(|e| DirectoryError::Upstream(e.into()))
    }
}

/// Display name chain: server-agnostic global name, else the account
/// username, else the raw id.
fn user_from_response(body: &Value, user_id: &str) -> DirectoryUser {
    let pick = |key: &str| -> Option<String> {
        body.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };
    let display_name = pick("global_name")
        .or_else(|| pick("username"))
        .unwrap_or_else(|| user_id.to_string());
    let avatar_url = body
        .get("avatar")
        .and_then(|v| v.as_str())
        .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", user_id, hash));
    DirectoryUser {
        display_name,
        avatar_url,
    }
}

#[async_trait]
impl DiscordDirectory for DiscordRestApi {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError> {
        let body = self.api_get(&format!("users/{}", user_id)).await?;
        Ok(user_from_response(&body, user_id))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError> {
        let body = self.api_get(&format!("channels/{}", channel_id)).await?;
        // DM channels carry no name; treat them like a missing channel so
        // the resolver lands on its literal-placeholder path.
        match body.get("name").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
            Some(name) => Ok(DirectoryChannel {
                name: name.to_string(),
            }),
            None => Err(DirectoryError::NotFound(format!(
                "discord channel {} has no name",
                channel_id
            ))),
        }
    }
}
