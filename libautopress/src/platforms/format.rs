//! Laying out a social summary for a specific network

use crate::generator::SocialDraft;

const ELLIPSIS: char = '…';

/// `#Tag` list with `#`, spaces and non-word characters removed from each tag
pub fn format_hashtags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| {
            tag.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything that follows the summary text for `network`
fn tail(network: &str, hashtags: &str, url: Option<&str>) -> String {
    let mut out = String::new();
    if !hashtags.is_empty() {
        let separator = if network == "instagram" { "\n.\n.\n.\n" } else { "\n\n" };
        out.push_str(separator);
        out.push_str(hashtags);
    }
    if let Some(url) = url.filter(|u| !u.is_empty()) {
        let separator = match network {
            "twitter" | "instagram" if !hashtags.is_empty() => "\n",
            _ => "\n\n",
        };
        out.push_str(separator);
        out.push_str(url);
    }
    out
}

/// Final post text: summary, hashtags and link in the network's layout
pub fn format_post(network: &str, text: &str, hashtags: &[String], url: Option<&str>) -> String {
    format!("{}{}", text.trim(), tail(network, &format_hashtags(hashtags), url))
}

/// Format a draft, shortening the summary to fit `limit` characters
///
/// The summary is cut on a character boundary and given an ellipsis. When
/// the hashtags alone leave no room they are dropped. If even the link does
/// not fit the full post is returned unchanged for validation to reject.
pub fn fit_post(network: &str, draft: &SocialDraft, url: Option<&str>, limit: Option<usize>) -> String {
    let full = format_post(network, &draft.text, &draft.hashtags, url);
    let limit = match limit {
        Some(limit) if full.chars().count() > limit => limit,
        _ => return full,
    };

    let text = draft.text.trim();
    for hashtags in [draft.hashtags.as_slice(), &[][..]] {
        let suffix = tail(network, &format_hashtags(hashtags), url);
        let room = limit.saturating_sub(suffix.chars().count());
        // One character of summary plus the ellipsis at minimum
        if room < 2 {
            continue;
        }
        if text.chars().count() <= room {
            return format!("{}{}", text, suffix);
        }
        let cut: String = text.chars().take(room - 1).collect();
        return format!("{}{}{}", cut.trim_end(), ELLIPSIS, suffix);
    }

    full
}
