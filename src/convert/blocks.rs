use futures::future::{try_join_all, BoxFuture, FutureExt};

use super::resolver::IdentityResolver;
use crate::types::{Block, RichTextElement, RichTextPart, Style};

/// Visible placeholders for shapes this renderer does not understand.
/// Content loss must be detectable in the output, never silent.
const UNSUPPORTED_BLOCK: &str = "<?unsupported_block?>";
const UNSUPPORTED_RICH_BLOCK: &str = "<?unsupported_rich_block?>";
const UNSUPPORTED_ELEMENT: &str = "<?unsupported_element?>";

/// Render a Slack block tree into Discord markdown. Reference leaves go
/// through the resolver; everything else is pure string assembly.
pub(crate) async fn render_blocks(
    resolver: &IdentityResolver,
    blocks: &[Block],
) -> anyhow::Result<String> {
    let rendered = try_join_all(blocks.iter().map(|b| render_block(resolver, b))).await?;
    Ok(rendered.join("\n"))
}

async fn render_block(resolver: &IdentityResolver, block: &Block) -> anyhow::Result<String> {
    match block {
        Block::RichText(parts) => {
            let rendered = try_join_all(parts.iter().map(|p| render_part(resolver, p))).await?;
            Ok(rendered.join("\n").trim().to_string())
        }
        // Flat markup passes through; Discord reads standard markdown.
        Block::Markup(text) => Ok(text.clone()),
        Block::Unknown(_) => Ok(UNSUPPORTED_BLOCK.to_string()),
    }
}

/// List items are themselves structural parts, so this is recursive and
/// needs the boxed-future indirection.
fn render_part<'a>(
    resolver: &'a IdentityResolver,
    part: &'a RichTextPart,
) -> BoxFuture<'a, anyhow::Result<String>> {
    async move {
        match part {
            RichTextPart::Preformatted(children) => {
                let rendered =
                    try_join_all(children.iter().map(|e| render_element(resolver, e))).await?;
                Ok(format!("```\n{}\n```", rendered.join("\n")))
            }
            RichTextPart::Section(children) => render_elements(resolver, children).await,
            RichTextPart::Quote(children) => {
                let body = render_elements(resolver, children).await?;
                Ok(prepend_each_line(&body, "> "))
            }
            RichTextPart::List { ordered, items } => {
                let rendered =
                    try_join_all(items.iter().map(|i| render_part(resolver, i))).await?;
                let mut lines = Vec::new();
                for (i, item) in rendered.iter().enumerate() {
                    if item.is_empty() {
                        continue;
                    }
                    let (first, rest) = match item.split_once('\n') {
                        Some((first, rest)) => (first, Some(rest)),
                        None => (item.as_str(), None),
                    };
                    let mut line = if *ordered {
                        format!("{}. {}", i + 1, first)
                    } else {
                        format!("- {}", first)
                    };
                    if let Some(rest) = rest {
                        line.push('\n');
                        line.push_str(&prepend_each_line(rest, "  "));
                    }
                    lines.push(line);
                }
                Ok(lines.join("\n"))
            }
            RichTextPart::Unknown(_) => Ok(UNSUPPORTED_RICH_BLOCK.to_string()),
        }
    }
    .boxed()
}

async fn render_elements(
    resolver: &IdentityResolver,
    elements: &[RichTextElement],
) -> anyhow::Result<String> {
    let rendered = try_join_all(elements.iter().map(|e| render_element(resolver, e))).await?;
    Ok(rendered.concat().trim().to_string())
}

async fn render_element(
    resolver: &IdentityResolver,
    element: &RichTextElement,
) -> anyhow::Result<String> {
    match element {
        RichTextElement::Text { text, style } => Ok(wrap_styled(text, style)),
        RichTextElement::Link { url, label, style } => {
            let label = label.as_deref().filter(|l| !l.is_empty()).unwrap_or(url);
            Ok(wrap_styled(&format!("[{}]({})", label, url), style))
        }
        RichTextElement::Broadcast { scope, style } => {
            Ok(wrap_styled(resolver.broadcast_to_discord(*scope), style))
        }
        RichTextElement::Emoji { name, unicode, style } => {
            let glyph = match unicode {
                Some(glyph) => glyph.clone(),
                None => format!(":{}:", name),
            };
            Ok(wrap_styled(&glyph, style))
        }
        RichTextElement::ChannelRef { channel_id, style } => {
            let mention = resolver.slack_channel_to_discord(channel_id).await?;
            Ok(wrap_styled(&mention, style))
        }
        RichTextElement::UserRef { user_id, style } => {
            let mention = resolver.slack_user_to_discord(user_id).await?;
            Ok(wrap_styled(&mention, style))
        }
        RichTextElement::UsergroupRef { usergroup_id, style } => {
            let mention = resolver.slack_usergroup_to_discord(usergroup_id).await?;
            Ok(wrap_styled(&mention, style))
        }
        RichTextElement::Unknown(_) => Ok(UNSUPPORTED_ELEMENT.to_string()),
    }
}

/// Compose style flags into a delimiter prefix in fixed priority order
/// (bold, italic, strike, code); the suffix is the character-reverse of
/// the prefix so the outermost-opened flag closes last. One combined run
/// per leaf; nested independent spans are not modeled.
fn wrap_styled(text: &str, style: &Style) -> String {
    let mut prefix = String::new();
    if style.bold {
        prefix.push_str("**");
    }
    if style.italic {
        prefix.push('*');
    }
    if style.strike {
        prefix.push_str("~~");
    }
    if style.code {
        prefix.push('`');
    }
    let suffix: String = prefix.chars().rev().collect();
    format!("{}{}{}", prefix, text, suffix)
}

fn prepend_each_line(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
