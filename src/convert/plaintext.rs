use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::resolver::IdentityResolver;

/// Discord inline mention syntax: `<@123…>` for users, `<#123…>` for
/// channels.
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([@#])([0-9]+)>").expect("mention pattern is valid"));

/// Rewrite Discord mention syntax in `text` into Slack-deliverable form.
///
/// Two passes: first collect the distinct matched segments and resolve
/// each one exactly once, then rebuild the string in a single sweep over
/// the original match positions. Sequential find-and-replace would be
/// wrong here: a replacement value may itself look like a mention and
/// must not be re-matched.
pub(crate) async fn substitute(
    resolver: &IdentityResolver,
    text: &str,
) -> anyhow::Result<String> {
    let mut replacements: HashMap<String, String> = HashMap::new();
    for caps in MENTION.captures_iter(text) {
        let (Some(whole), Some(sigil), Some(id)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if replacements.contains_key(whole.as_str()) {
            continue;
        }
        let replacement = match sigil.as_str() {
            "@" => resolver.discord_user_to_slack(id.as_str()).await?,
            _ => resolver.discord_channel_to_slack(id.as_str()).await?,
        };
        replacements.insert(whole.as_str().to_string(), replacement);
    }
    if replacements.is_empty() {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in MENTION.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if let Some(replacement) = replacements.get(m.as_str()) {
            out.push_str(replacement);
        } else {
            out.push_str(m.as_str());
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}
