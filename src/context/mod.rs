//! Conversational context assembly.
//!
//! Turns an ancestor chain plus the detected mentions into the bounded,
//! role-tagged message sequence handed to the generation service, and
//! provides the shrink-on-rejection retry loop around that call.
//!
//! Assembly prioritizes recency over completeness: only the last
//! [`CONTEXT_WINDOW`] chain entries survive, mention strings are rewritten
//! to quoted canonical names so the downstream model cannot confuse two
//! records with overlapping names, the agent's own reply footers are
//! stripped before re-ingestion, and user entries carry their author's
//! name so attribution survives the uniform role tagging.

use crate::catalog::AliasRewrite;
use crate::models::{DiscussionItem, Message, Role};
use crate::rendering::FOOTER_MARKER;
use crate::{Error, Result};
use std::future::Future;
use tracing::debug;

/// Maximum number of chain entries kept in the assembled context.
pub const CONTEXT_WINDOW: usize = 5;

/// Trailing lines dropped from agent messages that predate the footer
/// marker.
const LEGACY_FOOTER_LINES: usize = 4;

/// Builds role-tagged message sequences from conversation chains.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    /// The agent's own author identity, for role classification.
    agent_identity: String,
}

impl ContextAssembler {
    /// Creates an assembler for the given agent identity.
    #[must_use]
    pub fn new(agent_identity: impl Into<String>) -> Self {
        Self {
            agent_identity: agent_identity.into(),
        }
    }

    /// Assembles the context window for a chain.
    ///
    /// Never returns more than [`CONTEXT_WINDOW`] messages; older ancestry
    /// is discarded outright.
    #[must_use]
    pub fn assemble(&self, chain: &[DiscussionItem], rewrites: &[AliasRewrite]) -> Vec<Message> {
        let start = chain.len().saturating_sub(CONTEXT_WINDOW);
        chain[start..]
            .iter()
            .map(|item| self.message_for(item, rewrites))
            .collect()
    }

    /// Builds the single message for one chain entry.
    fn message_for(&self, item: &DiscussionItem, rewrites: &[AliasRewrite]) -> Message {
        let role = if item.author.eq_ignore_ascii_case(&self.agent_identity) {
            Role::Agent
        } else {
            Role::Author
        };

        match role {
            Role::Agent => {
                let text = strip_footer(&item.content_text());
                Message::agent(rewrite_aliases(&text, rewrites))
            }
            Role::Author => {
                let text = rewrite_aliases(&item.content_text(), rewrites);
                Message::author(format!("{}: {text}", item.author))
            }
        }
    }
}

/// Removes the agent's own reply footer from a previously posted reply.
///
/// Replies carry a fixed delimiter before the footer block; anything from
/// the first delimiter on is dropped. Replies without the delimiter are
/// legacy and lose their last [`LEGACY_FOOTER_LINES`] lines instead.
#[must_use]
pub fn strip_footer(text: &str) -> String {
    if let Some(pos) = text.find(FOOTER_MARKER) {
        return text[..pos].trim_end().to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    let keep = lines.len().saturating_sub(LEGACY_FOOTER_LINES);
    lines[..keep].join("\n").trim_end().to_string()
}

/// Rewrites every occurrence of a matched mention to the quoted canonical
/// display name.
///
/// Matching is case-insensitive and hyphen-insensitive, mirroring the
/// normalization the scanner applied when it found the mention in the
/// first place.
#[must_use]
pub fn rewrite_aliases(text: &str, rewrites: &[AliasRewrite]) -> String {
    let mut current = text.to_string();
    for rewrite in rewrites {
        if rewrite.matched.is_empty() {
            continue;
        }
        current = replace_normalized(
            &current,
            &rewrite.matched,
            &format!("\"{}\"", rewrite.canonical),
        );
    }
    current
}

/// Replaces every occurrence of `needle` (given in normalized form) inside
/// `text`, matching against the normalized view of `text` but splicing the
/// replacement into the original.
fn replace_normalized(text: &str, needle: &str, replacement: &str) -> String {
    // Normalized view plus a byte-offset map back into the original. Each
    // normalized byte records the original byte position it came from.
    let mut normalized = String::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (byte_pos, ch) in text.char_indices() {
        let folded = if ch == '-' { ' ' } else { ch };
        for lowered in folded.to_lowercase() {
            let mut buf = [0u8; 4];
            let encoded = lowered.encode_utf8(&mut buf);
            for _ in 0..encoded.len() {
                offsets.push(byte_pos);
            }
            normalized.push_str(encoded);
        }
    }
    offsets.push(text.len());

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search_from = 0;
    while let Some(found) = normalized[search_from..].find(needle) {
        let norm_start = search_from + found;
        let norm_end = norm_start + needle.len();
        let (Some(&orig_start), Some(&orig_end)) = (offsets.get(norm_start), offsets.get(norm_end))
        else {
            break;
        };
        if orig_start < cursor {
            // A multi-byte fold straddled the previous replacement; skip.
            search_from = norm_end;
            continue;
        }
        result.push_str(&text[cursor..orig_start]);
        result.push_str(replacement);
        cursor = orig_end;
        search_from = norm_end;
    }
    result.push_str(&text[cursor..]);
    result
}

/// Runs `attempt` over a message sequence, shrinking the context from the
/// oldest end on every context rejection.
///
/// Attempt 0 submits the full sequence; each rejection drops one more of
/// the oldest messages. A sequence of length `L` that is always rejected
/// is attempted exactly `L + 1` times (the last attempt is empty) before
/// `give_up` produces the terminal fallback value. Errors other than
/// [`Error::ContextRejected`] propagate immediately.
///
/// # Errors
///
/// Returns the first non-rejection error `attempt` produces.
pub async fn retry_with_shrink<T, A, Fut, F>(
    messages: &[Message],
    mut attempt: A,
    give_up: F,
) -> Result<T>
where
    A: FnMut(Vec<Message>) -> Fut,
    Fut: Future<Output = Result<T>>,
    F: FnOnce() -> T,
{
    for dropped in 0..=messages.len() {
        match attempt(messages[dropped..].to_vec()).await {
            Ok(value) => return Ok(value),
            Err(Error::ContextRejected(cause)) => {
                debug!(dropped, %cause, "context rejected, dropping oldest message and retrying");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(give_up())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(id: &str, author: &str, body: &str) -> DiscussionItem {
        DiscussionItem {
            id: id.to_string(),
            parent: Some("p".to_string()),
            thread: Some("t".to_string()),
            author: author.to_string(),
            title: None,
            body: body.to_string(),
            processed: false,
            created: None,
        }
    }

    fn rewrite(matched: &str, canonical: &str) -> AliasRewrite {
        AliasRewrite {
            matched: matched.to_string(),
            canonical: canonical.to_string(),
        }
    }

    #[test]
    fn test_window_is_bounded() {
        let assembler = ContextAssembler::new("armiger");
        let chain: Vec<_> = (0..9)
            .map(|i| item(&format!("i{i}"), "user", &format!("message {i}")))
            .collect();
        let messages = assembler.assemble(&chain, &[]);
        assert_eq!(messages.len(), CONTEXT_WINDOW);
        // The window keeps the most recent entries.
        assert!(messages[0].content.ends_with("message 4"));
        assert!(messages[4].content.ends_with("message 8"));
    }

    #[test]
    fn test_roles_classified_by_identity() {
        let assembler = ContextAssembler::new("armiger");
        let chain = vec![item("1", "alys", "hello"), item("2", "Armiger", "hi there")];
        let messages = assembler.assemble(&chain, &[]);
        assert_eq!(messages[0].role, Role::Author);
        assert_eq!(messages[1].role, Role::Agent);
    }

    #[test]
    fn test_author_messages_carry_identity_prefix() {
        let assembler = ContextAssembler::new("armiger");
        let chain = vec![item("1", "alys", "which is faster?")];
        let messages = assembler.assemble(&chain, &[]);
        assert_eq!(messages[0].content, "alys: which is faster?");
    }

    #[test]
    fn test_root_title_included() {
        let assembler = ContextAssembler::new("armiger");
        let mut root = item("1", "alys", "long debate");
        root.parent = None;
        root.title = Some("Sword question".to_string());
        let messages = assembler.assemble(&[root], &[]);
        assert_eq!(messages[0].content, "alys: Sword question\n\nlong debate");
    }

    #[test]
    fn test_mentions_rewritten_to_quoted_canonical_names() {
        let assembler = ContextAssembler::new("armiger");
        let chain = vec![item("1", "alys", "the long-sword or the waraxe?")];
        let messages = assembler.assemble(
            &chain,
            &[
                rewrite("long sword", "Longsword"),
                rewrite("waraxe", "War Axe"),
            ],
        );
        assert_eq!(
            messages[0].content,
            "alys: the \"Longsword\" or the \"War Axe\"?"
        );
    }

    #[test]
    fn test_agent_footer_stripped_via_marker() {
        let assembler = ContextAssembler::new("armiger");
        let body = format!("The mace wins in windup.{FOOTER_MARKER}[compare](https://example)");
        let chain = vec![item("1", "armiger", &body)];
        let messages = assembler.assemble(&chain, &[]);
        assert_eq!(messages[0].content, "The mace wins in windup.");
    }

    #[test]
    fn test_legacy_agent_message_trimmed_by_line_count() {
        let assembler = ContextAssembler::new("armiger");
        let body = "answer line\nsecond line\nlink line\nlink line 2\nbot line\nsignoff";
        let chain = vec![item("1", "armiger", body)];
        let messages = assembler.assemble(&chain, &[]);
        assert_eq!(messages[0].content, "answer line\nsecond line");
    }

    #[test]
    fn test_rewrite_is_case_insensitive() {
        let out = rewrite_aliases("LONGSWORD wins", &[rewrite("longsword", "Longsword")]);
        assert_eq!(out, "\"Longsword\" wins");
    }

    #[test]
    fn test_rewrite_replaces_all_occurrences() {
        let out = rewrite_aliases("mace, mace, and more mace", &[rewrite("mace", "Mace")]);
        assert_eq!(out, "\"Mace\", \"Mace\", and more \"Mace\"");
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let messages = vec![Message::author("a: hi")];
        let result = retry_with_shrink(
            &messages,
            |ctx| async move { Ok(format!("saw {} messages", ctx.len())) },
            || "fallback".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(result, "saw 1 messages");
    }

    #[tokio::test]
    async fn test_retry_attempt_count_is_len_plus_one() {
        let messages: Vec<_> = (0..4)
            .map(|i| Message::author(format!("u: {i}")))
            .collect();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let result = retry_with_shrink(
            &messages,
            move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::ContextRejected("too large".to_string()))
                }
            },
            || "gave up".to_string(),
        )
        .await
        .unwrap();

        assert_eq!(result, "gave up");
        assert_eq!(attempts.load(Ordering::SeqCst), messages.len() + 1);
    }

    #[tokio::test]
    async fn test_retry_drops_oldest_first() {
        let messages = vec![
            Message::author("u: oldest"),
            Message::author("u: middle"),
            Message::author("u: newest"),
        ];
        let result = retry_with_shrink(
            &messages,
            |ctx| async move {
                if ctx.len() == 3 {
                    Err(Error::ContextRejected("too large".to_string()))
                } else {
                    Ok(ctx[0].content.clone())
                }
            },
            String::new,
        )
        .await
        .unwrap();
        assert_eq!(result, "u: middle");
    }

    #[tokio::test]
    async fn test_retry_propagates_other_errors() {
        let messages = vec![Message::author("u: hi")];
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let result: Result<String> = retry_with_shrink(
            &messages,
            move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::operation("generate", "network down"))
                }
            },
            String::new,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
