mod blocks;
mod plaintext;
mod resolver;

pub use resolver::IdentityResolver;

use std::sync::Arc;
use std::time::Duration;

use crate::traits::{DiscordDirectory, MappingStore, SlackDirectory};
use crate::types::Block;

/// Message-content transcoding facade.
///
/// Owns the identity resolver (and through it the per-kind lookup
/// caches); one converter is shared by every relayed-message task.
pub struct Converter {
    resolver: IdentityResolver,
}

impl Converter {
    pub fn new(
        store: Arc<dyn MappingStore>,
        slack: Arc<dyn SlackDirectory>,
        discord: Arc<dyn DiscordDirectory>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(store, slack, discord, cache_ttl),
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Render a structured Slack block tree as Discord markdown.
    ///
    /// Unsupported content degrades to visible placeholders and never
    /// fails; only an upstream directory or store failure errors out, and
    /// then the whole document conversion is aborted.
    pub async fn render_blocks(&self, blocks: &[Block]) -> anyhow::Result<String> {
        blocks::render_blocks(&self.resolver, blocks).await
    }

    /// Rewrite Discord mention syntax in plain text into
    /// Slack-deliverable form. Same failure contract as
    /// [`Converter::render_blocks`].
    pub async fn render_plain_text(&self, text: &str) -> anyhow::Result<String> {
        plaintext::substitute(&self.resolver, text).await
    }
}
