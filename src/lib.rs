//! Message-content transcoding core for a Slack↔Discord relay.
//!
//! Converts Slack rich-text block trees into Discord markdown, rewrites
//! Discord mention syntax into Slack-deliverable text, and resolves
//! cross-platform identity references through a persisted mapping store,
//! a single-flight TTL cache, and live directory lookups.

pub mod cache;
pub mod config;
pub mod convert;
pub mod directory;
pub mod state;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use convert::Converter;

use std::sync::Arc;
use std::time::Duration;

/// Wire a [`Converter`] from configuration: SQLite-backed mapping store
/// plus live Slack and Discord directory clients.
pub async fn converter_from_config(config: &config::AppConfig) -> anyhow::Result<Converter> {
    let store = Arc::new(state::SqliteMappingStore::new(&config.state.db_path).await?);
    let slack = Arc::new(directory::SlackWebApi::new(&config.slack.bot_token));
    let discord = Arc::new(directory::DiscordRestApi::new(&config.discord.bot_token));
    Ok(Converter::new(
        store,
        slack,
        discord,
        Duration::from_secs(config.cache.ttl_secs),
    ))
}
