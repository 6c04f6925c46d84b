//! Test infrastructure: in-memory mapping store and scripted fake
//! directories with call counters, used by the resolver, walker, and
//! substituter tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::traits::{DiscordDirectory, MappingStore, SlackDirectory};
use crate::types::{
    ChannelLink, DirectoryChannel, DirectoryError, DirectoryUser, UserLink, Usergroup,
};

// ---------------------------------------------------------------------------
// MemoryMappingStore
// ---------------------------------------------------------------------------

/// In-memory mapping store with the same uniqueness rules as the SQLite
/// implementation.
pub struct MemoryMappingStore {
    users: Mutex<Vec<UserLink>>,
    channels: Mutex<Vec<ChannelLink>>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
        }
    }

    /// Seed a user link without uniqueness checks.
    pub async fn add_user(&self, link: UserLink) {
        self.users.lock().await.push(link);
    }

    /// Seed a channel link without uniqueness checks.
    pub async fn add_channel(&self, link: ChannelLink) {
        self.channels.lock().await.push(link);
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn user_by_slack(&self, slack_id: &str) -> anyhow::Result<Option<UserLink>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|l| l.slack_id == slack_id)
            .cloned())
    }

    async fn user_by_discord(&self, discord_id: &str) -> anyhow::Result<Option<UserLink>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|l| l.discord_id == discord_id)
            .cloned())
    }

    async fn channel_by_slack(&self, slack_channel: &str) -> anyhow::Result<Option<ChannelLink>> {
        Ok(self
            .channels
            .lock()
            .await
            .iter()
            .find(|l| l.slack_channel == slack_channel)
            .cloned())
    }

    async fn channel_by_discord(
        &self,
        discord_channel: &str,
    ) -> anyhow::Result<Option<ChannelLink>> {
        Ok(self
            .channels
            .lock()
            .await
            .iter()
            .find(|l| l.discord_channel == discord_channel)
            .cloned())
    }

    async fn link_user(&self, link: &UserLink) -> anyhow::Result<()> {
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|l| l.slack_id == link.slack_id || l.discord_id == link.discord_id)
        {
            anyhow::bail!("user link already exists");
        }
        users.push(link.clone());
        Ok(())
    }

    async fn unlink_user_by_discord(&self, discord_id: &str) -> anyhow::Result<()> {
        self.users
            .lock()
            .await
            .retain(|l| l.discord_id != discord_id);
        Ok(())
    }

    async fn connect_channel(&self, link: &ChannelLink) -> anyhow::Result<()> {
        let mut channels = self.channels.lock().await;
        if channels.iter().any(|l| {
            l.slack_channel == link.slack_channel || l.discord_channel == link.discord_channel
        }) {
            anyhow::bail!("channel link already exists");
        }
        channels.push(link.clone());
        Ok(())
    }

    async fn disconnect_channel_by_discord(&self, discord_channel: &str) -> anyhow::Result<()> {
        self.channels
            .lock()
            .await
            .retain(|l| l.discord_channel != discord_channel);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake directories
// ---------------------------------------------------------------------------

/// Fake Slack directory: scripted users/channels/usergroups, per-kind
/// call counters, and an optional forced upstream failure.
pub struct FakeSlackDirectory {
    users: Mutex<HashMap<String, DirectoryUser>>,
    channels: Mutex<HashMap<String, DirectoryChannel>>,
    usergroups: Mutex<Vec<Usergroup>>,
    user_failure: Mutex<Option<String>>,
    user_calls: AtomicUsize,
    channel_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeSlackDirectory {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            usergroups: Mutex::new(Vec::new()),
            user_failure: Mutex::new(None),
            user_calls: AtomicUsize::new(0),
            channel_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub async fn add_user(&self, id: &str, display_name: &str) {
        self.users.lock().await.insert(
            id.to_string(),
            DirectoryUser {
                display_name: display_name.to_string(),
                avatar_url: None,
            },
        );
    }

    pub async fn add_channel(&self, id: &str, name: &str) {
        self.channels.lock().await.insert(
            id.to_string(),
            DirectoryChannel {
                name: name.to_string(),
            },
        );
    }

    pub async fn add_usergroup(&self, id: &str, handle: &str) {
        self.usergroups.lock().await.push(Usergroup {
            id: id.to_string(),
            handle: handle.to_string(),
        });
    }

    /// Make every subsequent user lookup fail with an upstream error.
    pub async fn fail_users_with(&self, message: &str) {
        *self.user_failure.lock().await = Some(message.to_string());
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlackDirectory for FakeSlackDirectory {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.user_failure.lock().await.as_ref() {
            return Err(DirectoryError::Upstream(anyhow::anyhow!("{}", message)));
        }
        self.users
            .lock()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("slack user {}", user_id)))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        self.channels
            .lock()
            .await
            .get(channel_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("slack channel {}", channel_id)))
    }

    async fn list_usergroups(&self) -> Result<Vec<Usergroup>, DirectoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.usergroups.lock().await.clone())
    }
}

/// Fake Discord directory, same shape as [`FakeSlackDirectory`].
pub struct FakeDiscordDirectory {
    users: Mutex<HashMap<String, DirectoryUser>>,
    channels: Mutex<HashMap<String, DirectoryChannel>>,
    user_failure: Mutex<Option<String>>,
    user_calls: AtomicUsize,
    channel_calls: AtomicUsize,
}

impl FakeDiscordDirectory {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            user_failure: Mutex::new(None),
            user_calls: AtomicUsize::new(0),
            channel_calls: AtomicUsize::new(0),
        }
    }

    pub async fn add_user(&self, id: &str, display_name: &str) {
        self.users.lock().await.insert(
            id.to_string(),
            DirectoryUser {
                display_name: display_name.to_string(),
                avatar_url: None,
            },
        );
    }

    pub async fn add_channel(&self, id: &str, name: &str) {
        self.channels.lock().await.insert(
            id.to_string(),
            DirectoryChannel {
                name: name.to_string(),
            },
        );
    }

    pub async fn fail_users_with(&self, message: &str) {
        *self.user_failure.lock().await = Some(message.to_string());
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscordDirectory for FakeDiscordDirectory {
    async fn user_info(&self, user_id: &str) -> Result<DirectoryUser, DirectoryError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.user_failure.lock().await.as_ref() {
            return Err(DirectoryError::Upstream(anyhow::anyhow!("{}", message)));
        }
        self.users
            .lock()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("discord user {}", user_id)))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<DirectoryChannel, DirectoryError> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        self.channels
            .lock()
            .await
            .get(channel_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("discord channel {}", channel_id)))
    }
}
