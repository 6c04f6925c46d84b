use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::traits::{DiscordDirectory, MappingStore, SlackDirectory};
use crate::types::{BroadcastScope, DirectoryChannel, DirectoryError, DirectoryUser, Usergroup};

/// Resolves platform-local user/channel/group ids to mention strings
/// valid on the other platform.
///
/// Resolution order is fixed: the mapping store is authoritative (a
/// linked id never triggers a live call), then a cache-backed directory
/// lookup, then a literal placeholder when the directory reports the id
/// as unknown. Any other directory failure propagates and aborts the
/// conversion it belongs to.
pub struct IdentityResolver {
    store: Arc<dyn MappingStore>,
    slack: Arc<dyn SlackDirectory>,
    discord: Arc<dyn DiscordDirectory>,
    slack_users: TtlCache<String, DirectoryUser, DirectoryError>,
    slack_channels: TtlCache<String, DirectoryChannel, DirectoryError>,
    slack_usergroups: TtlCache<(), Vec<Usergroup>, DirectoryError>,
    discord_users: TtlCache<String, DirectoryUser, DirectoryError>,
    discord_channels: TtlCache<String, DirectoryChannel, DirectoryError>,
}

impl IdentityResolver {
    pub fn new(
        store: Arc<dyn MappingStore>,
        slack: Arc<dyn SlackDirectory>,
        discord: Arc<dyn DiscordDirectory>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            slack,
            discord,
            slack_users: TtlCache::new(ttl),
            slack_channels: TtlCache::new(ttl),
            slack_usergroups: TtlCache::new(ttl),
            discord_users: TtlCache::new(ttl),
            discord_channels: TtlCache::new(ttl),
        }
    }

    /// Slack user id -> Discord mention.
    pub async fn slack_user_to_discord(&self, user_id: &str) -> anyhow::Result<String> {
        if let Some(link) = self.store.user_by_slack(user_id).await? {
            return Ok(format!("<@{}>", link.discord_id));
        }
        let slack = self.slack.clone();
        let result = self
            .slack_users
            .lookup(user_id.to_string(), move |id| async move {
                slack.user_info(&id).await
            })
            .await;
        match result {
            Ok(user) => Ok(format!("@{}", user.display_name)),
            Err(e) if e.is_not_found() => {
                warn!(user_id, "Slack user not found, using literal placeholder");
                Ok(format!("@{}", user_id))
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }

    /// Slack channel id -> Discord mention.
    pub async fn slack_channel_to_discord(&self, channel_id: &str) -> anyhow::Result<String> {
        if let Some(link) = self.store.channel_by_slack(channel_id).await? {
            return Ok(format!("<#{}>", link.discord_channel));
        }
        let slack = self.slack.clone();
        let result = self
            .slack_channels
            .lookup(channel_id.to_string(), move |id| async move {
                slack.channel_info(&id).await
            })
            .await;
        match result {
            Ok(channel) => Ok(format!("#{}", channel.name)),
            Err(e) if e.is_not_found() => {
                warn!(channel_id, "Slack channel not found, using literal placeholder");
                Ok(format!("#{}", channel_id))
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }

    /// Slack usergroup id -> Discord text. No persisted mapping exists
    /// for groups; this is always a list-then-find through the cache.
    pub async fn slack_usergroup_to_discord(&self, usergroup_id: &str) -> anyhow::Result<String> {
        let slack = self.slack.clone();
        let result = self
            .slack_usergroups
            .lookup((), move |_| async move { slack.list_usergroups().await })
            .await;
        let groups = match result {
            Ok(groups) => groups,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(anyhow::Error::new(e)),
        };
        match groups.iter().find(|g| g.id == usergroup_id) {
            Some(group) => Ok(format!("@{}", group.handle)),
            None => {
                debug!(usergroup_id, "usergroup not listed, using literal placeholder");
                Ok(format!("@&{}", usergroup_id))
            }
        }
    }

    /// Broadcast mentions translate by a pure table, no lookup involved.
    pub fn broadcast_to_discord(&self, scope: BroadcastScope) -> &'static str {
        match scope {
            BroadcastScope::Here => "@here",
            BroadcastScope::Everyone => "@everyone",
        }
    }

    /// Discord user id -> Slack-deliverable mention.
    pub async fn discord_user_to_slack(&self, user_id: &str) -> anyhow::Result<String> {
        if let Some(link) = self.store.user_by_discord(user_id).await? {
            return Ok(format!("<@{}>", link.slack_id));
        }
        let discord = self.discord.clone();
        let result = self
            .discord_users
            .lookup(user_id.to_string(), move |id| async move {
                discord.user_info(&id).await
            })
            .await;
        match result {
            Ok(user) => Ok(format!("@{}", user.display_name)),
            Err(e) if e.is_not_found() => {
                warn!(user_id, "Discord user not found, using literal placeholder");
                Ok(format!("@{}", user_id))
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }

    /// Discord channel id -> Slack-deliverable mention.
    pub async fn discord_channel_to_slack(&self, channel_id: &str) -> anyhow::Result<String> {
        if let Some(link) = self.store.channel_by_discord(channel_id).await? {
            return Ok(format!("<#{}>", link.slack_channel));
        }
        let discord = self.discord.clone();
        let result = self
            .discord_channels
            .lookup(channel_id.to_string(), move |id| async move {
                discord.channel_info(&id).await
            })
            .await;
        match result {
            Ok(channel) => Ok(format!("#{}", channel.name)),
            Err(e) if e.is_not_found() => {
                warn!(channel_id, "Discord channel not found, using literal placeholder");
                Ok(format!("#{}", channel_id))
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }
}
