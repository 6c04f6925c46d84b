use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::traits::MappingStore;
use crate::types::{ChannelLink, UserLink};

/// SQLite-backed identity/channel mapping store.
///
/// Rows are only ever inserted and deleted (link/unlink, connect/
/// disconnect); there is no in-place update, so single-row statements are
/// all the atomicity this store needs.
pub struct SqliteMappingStore {
    pool: SqlitePool,
}

impl SqliteMappingStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        migrate(&pool).await?;
        info!(db_path, "mapping store initialized");
        Ok(Self { pool })
    }
}

/// Idempotent migrations; safe to run on every startup.
async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_links (
            slack_id TEXT NOT NULL UNIQUE,
            discord_id TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channel_links (
            slack_channel TEXT NOT NULL UNIQUE,
            discord_channel TEXT NOT NULL UNIQUE,
            discord_webhook TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<UserLink> {
    Ok(UserLink {
        slack_id: row.try_get("slack_id")?,
        discord_id: row.try_get("discord_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn channel_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<ChannelLink> {
    Ok(ChannelLink {
        slack_channel: row.try_get("slack_channel")?,
        discord_channel: row.try_get("discord_channel")?,
        discord_webhook: row.try_get("discord_webhook")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MappingStore for SqliteMappingStore {
    async fn user_by_slack(&self, slack_id: &str) -> anyhow::Result<Option<UserLink>> {
        let row = sqlx::query("SELECT * FROM user_links WHERE slack_id = ?")
            .bind(slack_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_discord(&self, discord_id: &str) -> anyhow::Result<Option<UserLink>> {
        let row = sqlx::query("SELECT * FROM user_links WHERE discord_id = ?")
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn channel_by_slack(&self, slack_channel: &str) -> anyhow::Result<Option<ChannelLink>> {
        let row = sqlx::query("SELECT * FROM channel_links WHERE slack_channel = ?")
            .bind(slack_channel)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(channel_from_row).transpose()
    }

    async fn channel_by_discord(
        &self,
        discord_channel: &str,
    ) -> anyhow::Result<Option<ChannelLink>> {
        let row = sqlx::query("SELECT * FROM channel_links WHERE discord_channel = ?")
            .bind(discord_channel)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(channel_from_row).transpose()
    }

    async fn link_user(&self, link: &UserLink) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO user_links (slack_id, discord_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&link.slack_id)
        .bind(&link.discord_id)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unlink_user_by_discord(&self, discord_id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM user_links WHERE discord_id = ?")
            .bind(discord_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn connect_channel(&self, link: &ChannelLink) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO channel_links (slack_channel, discord_channel, discord_webhook, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&link.slack_channel)
        .bind(&link.discord_channel)
        .bind(&link.discord_webhook)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn disconnect_channel_by_discord(&self, discord_channel: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM channel_links WHERE discord_channel = ?")
            .bind(discord_channel)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
