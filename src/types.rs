use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A verified cross-platform user link. Created by an explicit link
/// command, deleted by unlink, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLink {
    pub slack_id: String,
    pub discord_id: String,
    pub created_at: DateTime<Utc>,
}

/// A connected channel pair plus the webhook used for outbound delivery
/// on the Discord side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelLink {
    pub slack_channel: String,
    pub discord_channel: String,
    pub discord_webhook: String,
    pub created_at: DateTime<Utc>,
}

/// Directory lookup failure taxonomy.
///
/// `NotFound` is recovered locally (the resolver falls back to a literal
/// placeholder); anything else aborts the whole conversion.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{0} not found in remote directory")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound(_))
    }
}

/// Minimal user record from a platform directory. `display_name` is the
/// already-collapsed fallback chain (display name, else real name, else
/// the raw id); `avatar_url` is carried for webhook impersonation.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryChannel {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Usergroup {
    pub id: String,
    pub handle: String,
}

/// Style flags for a single leaf run. One flag-set applies to the whole
/// run; nested independent spans are not modeled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strike: bool,
    #[serde(default)]
    pub code: bool,
}

impl Style {
    fn from_value(value: Option<&Value>) -> Style {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// Broadcast scope of an `@here` / `@everyone` style mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastScope {
    Here,
    Everyone,
}

/// A top-level Slack message block.
///
/// Parsed from event JSON by an exhaustive match on the `type` tag;
/// anything unrecognized lands in `Unknown` carrying the raw tag, so the
/// renderer can emit a visible placeholder instead of dropping content.
#[derive(Debug, Clone)]
pub enum Block {
    RichText(Vec<RichTextPart>),
    /// Slack `markdown` block: flat markup passed through unchanged.
    Markup(String),
    Unknown(String),
}

/// A structural element inside a rich-text block. `List` items are
/// themselves structural elements, which is what makes rendering
/// recursive.
#[derive(Debug, Clone)]
pub enum RichTextPart {
    Preformatted(Vec<RichTextElement>),
    Section(Vec<RichTextElement>),
    Quote(Vec<RichTextElement>),
    List { ordered: bool, items: Vec<RichTextPart> },
    Unknown(String),
}

/// A leaf element of a rich-text tree.
#[derive(Debug, Clone)]
pub enum RichTextElement {
    Text { text: String, style: Style },
    Link { url: String, label: Option<String>, style: Style },
    Broadcast { scope: BroadcastScope, style: Style },
    Emoji { name: String, unicode: Option<String>, style: Style },
    ChannelRef { channel_id: String, style: Style },
    UserRef { user_id: String, style: Style },
    UsergroupRef { usergroup_id: String, style: Style },
    Unknown(String),
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn tag_of(value: &Value) -> String {
    value
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("untyped")
        .to_string()
}

impl Block {
    /// Parse the `blocks` array of a Slack message event.
    pub fn parse_all(blocks: &Value) -> Vec<Block> {
        blocks
            .as_array()
            .map(|items| items.iter().map(Block::from_value).collect())
            .unwrap_or_default()
    }

    pub fn from_value(value: &Value) -> Block {
        match value.get("type").and_then(|v| v.as_str()) {
            Some("rich_text") => {
                let parts = value
                    .get("elements")
                    .and_then(|v| v.as_array())
                    .map(|items| items.iter().map(RichTextPart::from_value).collect())
                    .unwrap_or_default();
                Block::RichText(parts)
            }
            Some("markdown") => Block::Markup(str_field(value, "text").unwrap_or_default()),
            _ => Block::Unknown(tag_of(value)),
        }
    }
}

impl RichTextPart {
    pub fn from_value(value: &Value) -> RichTextPart {
        let children = |value: &Value| -> Vec<RichTextElement> {
            value
                .get("elements")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().map(RichTextElement::from_value).collect())
                .unwrap_or_default()
        };
        match value.get("type").and_then(|v| v.as_str()) {
            Some("rich_text_preformatted") => RichTextPart::Preformatted(children(value)),
            Some("rich_text_section") => RichTextPart::Section(children(value)),
            Some("rich_text_quote") => RichTextPart::Quote(children(value)),
            Some("rich_text_list") => {
                let ordered = value.get("style").and_then(|v| v.as_str()) == Some("ordered");
                let items = value
                    .get("elements")
                    .and_then(|v| v.as_array())
                    .map(|items| items.iter().map(RichTextPart::from_value).collect())
                    .unwrap_or_default();
                RichTextPart::List { ordered, items }
            }
            _ => RichTextPart::Unknown(tag_of(value)),
        }
    }
}

impl RichTextElement {
    pub fn from_value(value: &Value) -> RichTextElement {
        let style = Style::from_value(value.get("style"));
        match value.get("type").and_then(|v| v.as_str()) {
            Some("text") => RichTextElement::Text {
                text: str_field(value, "text").unwrap_or_default(),
                style,
            },
            Some("link") => RichTextElement::Link {
                url: str_field(value, "url").unwrap_or_default(),
                label: str_field(value, "text"),
                style,
            },
            Some("broadcast") => RichTextElement::Broadcast {
                scope: if value.get("range").and_then(|v| v.as_str()) == Some("here") {
                    BroadcastScope::Here
                } else {
                    BroadcastScope::Everyone
                },
                style,
            },
            Some("emoji") => RichTextElement::Emoji {
                name: str_field(value, "name").unwrap_or_default(),
                unicode: str_field(value, "unicode"),
                style,
            },
            Some("channel") => RichTextElement::ChannelRef {
                channel_id: str_field(value, "channel_id").unwrap_or_default(),
                style,
            },
            Some("user") => RichTextElement::UserRef {
                user_id: str_field(value, "user_id").unwrap_or_default(),
                style,
            },
            Some("usergroup") => RichTextElement::UsergroupRef {
                usergroup_id: str_field(value, "usergroup_id").unwrap_or_default(),
                style,
            },
            _ => RichTextElement::Unknown(tag_of(value)),
        }
    }
}
