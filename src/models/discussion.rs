//! Discussion stream types.
//!
//! [`DiscussionItem`] is the unit the polling loops hand to the agent: a
//! post (thread root, title + body) or a comment (body only). [`Thread`]
//! and [`ThreadNode`] carry the full reply tree used for ancestor-chain
//! reconstruction, and [`Message`] is the role-tagged unit the context
//! assembler produces from a chain entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item of the discussion stream: a thread root or a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionItem {
    /// Stable identifier issued by the platform.
    pub id: String,
    /// Identifier of the direct parent; absent for thread roots.
    pub parent: Option<String>,
    /// Identifier of the thread root this item belongs to; absent for
    /// thread roots themselves.
    pub thread: Option<String>,
    /// Author identity.
    pub author: String,
    /// Title; present on thread roots only.
    pub title: Option<String>,
    /// Body text (selftext for roots, comment body for replies).
    pub body: String,
    /// Whether the agent has already marked this item processed on the
    /// platform side.
    pub processed: bool,
    /// Creation time, when the platform reports one.
    pub created: Option<DateTime<Utc>>,
}

impl DiscussionItem {
    /// Whether this item is a thread root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The full text content: title and body for roots, body alone for
    /// replies.
    #[must_use]
    pub fn content_text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{title}\n\n{}", self.body),
            _ => self.body.clone(),
        }
    }

    /// Id of the thread this item lives in (its own id for roots).
    #[must_use]
    pub fn thread_id(&self) -> &str {
        self.thread.as_deref().unwrap_or(&self.id)
    }
}

/// A thread root together with its full reply tree.
#[derive(Debug, Clone)]
pub struct Thread {
    /// The thread root item.
    pub root: DiscussionItem,
    /// Top-level replies, each with its own nested replies.
    pub replies: Vec<ThreadNode>,
}

/// One node of a reply tree.
#[derive(Debug, Clone)]
pub struct ThreadNode {
    /// The reply at this node.
    pub item: DiscussionItem,
    /// Replies to this reply.
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    /// A leaf node with no replies.
    #[must_use]
    pub const fn leaf(item: DiscussionItem) -> Self {
        Self {
            item,
            replies: Vec::new(),
        }
    }
}

/// Ordered ancestor path from a thread root to a target item, inclusive.
pub type ConversationChain = Vec<DiscussionItem>;

/// Role tag of a context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Written by a discussion participant.
    Author,
    /// Written by the agent itself.
    Agent,
}

/// One role-tagged unit of assembled conversational context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who the content is attributed to.
    pub role: Role,
    /// The content.
    pub content: String,
}

impl Message {
    /// Builds an author-attributed message.
    #[must_use]
    pub fn author(content: impl Into<String>) -> Self {
        Self {
            role: Role::Author,
            content: content.into(),
        }
    }

    /// Builds an agent-attributed message.
    #[must_use]
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}
