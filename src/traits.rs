use async_trait::async_trait;

use crate::types::{ChannelLink, DirectoryChannel, DirectoryError, DirectoryUser, UserLink, Usergroup};

/// Read/write contract of the persisted identity-mapping store.
///
/// Reads return `None` for an unlinked id. Mutations are insert/delete
/// only; a link is never updated in place, so each row is assumed atomic
/// and no cross-row transactions are needed.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn user_by_slack(&self, slack_id: &str) -> anyhow::Result<Option<UserLink>>;
    async fn user_by_discord(&self, discord_id: &str) -> anyhow::Result<Option<UserLink>>;
    async fn channel_by_slack(&self, slack_channel: &str) -> anyhow::Result<Option<ChannelLink>>;
    async fn channel_by_discord(&self, discord_channel: &str)
        -> anyhow::Result<Option<ChannelLink>>;

    async fn link_user(&self, link: &UserLink) -> anyhow::Result<()>;
    async fn unlink_user_by_discord(&self, discord_id: &str) -> anyhow::Result<()>;
    async fn connect_channel(&self, link: &ChannelLink) -> anyhow::Result<()>;
    async fn disconnect_channel_by_discord(&self, discord_channel: &str) -> anyhow::Result<()>;
}

/// Live directory lookups against the Slack Web API.
#[async_trait]
pub trait SlackDirectory: Send + Sync {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError>;
    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError>;
    async fn list_usergroups(&self) -> Result<Vec<Usergroup>, DirectoryError>;
}

/// Live directory lookups against the Discord REST API.
#[async_trait]
pub trait DiscordDirectory: Send + Sync {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError>;
    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError>;
}
