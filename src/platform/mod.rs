//! Discussion platform seams.
//!
//! The agent never talks to the platform directly; it goes through three
//! narrow async traits so the polling loops, the chain resolver, and the
//! reply pipeline can be exercised against in-memory fakes. The one real
//! implementation is [`RedditClient`].

mod reddit;

pub use reddit::RedditClient;

use crate::Result;
use crate::models::{DiscussionItem, Thread};
use async_trait::async_trait;

/// Polls the two discussion streams.
#[async_trait]
pub trait DiscussionStream: Send + Sync {
    /// Most recent top-level posts, newest first, up to `limit`.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<DiscussionItem>>;

    /// Most recent comments, newest first, up to `limit`.
    async fn recent_comments(&self, limit: usize) -> Result<Vec<DiscussionItem>>;
}

/// Expands a thread root into its full reply tree.
#[async_trait]
pub trait ThreadReader: Send + Sync {
    /// Fetches the thread root and every reply under it, unbounded depth
    /// and breadth.
    async fn thread(&self, root_id: &str) -> Result<Thread>;
}

/// Posts replies and flags items as handled on the platform side.
#[async_trait]
pub trait ReplyPoster: Send + Sync {
    /// Posts a reply under the given item; returns the new reply's id.
    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<String>;

    /// Marks an item processed so later polls can skip it cheaply.
    async fn mark_processed(&self, id: &str) -> Result<()>;
}
