use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::traits::SlackDirectory;
use crate::types::{DirectoryChannel, DirectoryError, DirectoryUser, Usergroup};

/// Slack Web API directory client.
pub struct SlackWebApi {
    http: reqwest::Client,
    bot_token: String,
}

impl SlackWebApi {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.to_string(),
        }
    }

    /// Make a GET-style Slack API call. `ok=false` responses whose error
    /// code ends in `_not_found` classify as `NotFound`; everything else
    /// is an upstream failure.
    async fn api_get(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, DirectoryError> {
        let url = format!("https://slack.com/api/{}", method);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .query(query)
            .send()
            .await
            .map_err(|e| DirectoryError::Upstream(e.into()))?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| DirectoryError::Upstream(e.into()))?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = body.get("error").and_then(|v| v.as_str()).unwrap_or("unknown");
            debug!(method, error, "Slack API call failed");
            if error.ends_with("_not_found") {
                return Err(DirectoryError::NotFound(format!("slack {}", error)));
            }
            return Err(DirectoryError::Upstream(anyhow::anyhow!(
                "Slack API {} failed: {}",
                method,
                error
            )));
        }
        Ok(body)
    }
}

/// Collapse the profile name fallback chain: display name, real name,
/// account name, then the raw id.
fn user_from_response(body: &Value, user_id: &str) -> DirectoryUser {
    let user = body.get("user").cloned().unwrap_or(Value::Null);
    let profile = user.get("profile").cloned().unwrap_or(Value::Null);
    let pick = |key: &str| -> Option<String> {
        profile
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };
    let display_name = pick("display_name")
        .or_else(|| pick("real_name"))
        .or_else(|| {
            user.get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| user_id.to_string());
    let avatar_url = pick("image_original")
        .or_else(|| pick("image_1024"))
        .or_else(|| pick("image_512"))
        .or_else(|| pick("image_192"));
    DirectoryUser {
        display_name,
        avatar_url,
    }
}

fn channel_from_response(body: &Value, channel_id: &str) -> DirectoryChannel {
    let name = body
        .get("channel")
        .and_then(|c| c.get("name"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(channel_id)
        .to_string();
    DirectoryChannel { name }
}

fn usergroups_from_response(body: &Value) -> Vec<Usergroup> {
    body.get("usergroups")
        .and_then(|v| v.as_array())
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| {
                    let id = g.get("id").and_then(|v| v.as_str())?;
                    let handle = g.get("handle").and_then(|v| v.as_str())?;
                    Some(Usergroup {
                        id: id.to_string(),
                        handle: handle.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SlackDirectory for SlackWebApi {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError> {
        let body = self.api_get("users.info", &[("user", user_id)]).await?;
        Ok(user_from_response(&body, user_id))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError> {
        let body = self
            .api_get("conversations.info", &[("channel", channel_id)])
            .await?;
        Ok(channel_from_response(&body, channel_id))
    }

    async fn list_usergroups(&self) -> Result<Vec<Usergroup>, DirectoryError> {
        let body = self.api_get("usergroups.list", &[]).await?;
        Ok(usergroups_from_response(&body))
    }
}
