//! Reddit JSON API client.
//!
//! Thin pass-through over the listing, comment-tree, and submit endpoints.
//! Item ids are platform fullnames (`t1_…` for comments, `t3_…` for posts);
//! the only place a bare id appears is the comment-tree URL.
//!
//! The client takes a ready access token from configuration. Token refresh
//! and rate limiting are out of scope.

use super::{DiscussionStream, ReplyPoster, ThreadReader};
use crate::models::{DiscussionItem, Thread, ThreadNode};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::DateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Reddit API client for one community.
pub struct RedditClient {
    /// API base URL.
    base_url: String,
    /// Community (subreddit) name, without the `r/` prefix.
    community: String,
    /// User agent sent with every request.
    user_agent: String,
    /// OAuth access token, when configured.
    access_token: Option<SecretString>,
    /// HTTP client.
    client: reqwest::Client,
}

impl RedditClient {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://oauth.reddit.com";

    /// Creates a client for the given community.
    #[must_use]
    pub fn new(community: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            community: community.into(),
            user_agent: user_agent.into(),
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the OAuth access token.
    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Builds a GET request with the standard headers.
    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("User-Agent", &self.user_agent);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    /// Builds a POST request with the standard headers.
    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("User-Agent", &self.user_agent);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    /// Fetches one listing endpoint and converts its children.
    async fn listing(&self, operation: &str, path: &str, limit: usize) -> Result<Vec<DiscussionItem>> {
        let listing: Listing = self
            .get(&format!("{path}?limit={limit}"))
            .send()
            .await
            .map_err(|e| Error::operation(operation, e))?
            .error_for_status()
            .map_err(|e| Error::operation(operation, e))?
            .json()
            .await
            .map_err(|e| Error::operation(operation, e))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(Envelope::into_item)
            .collect())
    }
}

#[async_trait]
impl DiscussionStream for RedditClient {
    async fn recent_posts(&self, limit: usize) -> Result<Vec<DiscussionItem>> {
        self.listing(
            "recent_posts",
            &format!("/r/{}/new.json", self.community),
            limit,
        )
        .await
    }

    async fn recent_comments(&self, limit: usize) -> Result<Vec<DiscussionItem>> {
        self.listing(
            "recent_comments",
            &format!("/r/{}/comments.json", self.community),
            limit,
        )
        .await
    }
}

#[async_trait]
impl ThreadReader for RedditClient {
    async fn thread(&self, root_id: &str) -> Result<Thread> {
        // The comment-tree endpoint wants the bare id, not the fullname.
        let bare = bare_id(root_id);
        let listings: Vec<Listing> = self
            .get(&format!("/comments/{bare}.json"))
            .send()
            .await
            .map_err(|e| Error::operation("fetch_thread", e))?
            .error_for_status()
            .map_err(|e| Error::operation("fetch_thread", e))?
            .json()
            .await
            .map_err(|e| Error::operation("fetch_thread", e))?;

        let mut listings = listings.into_iter();
        let root = listings
            .next()
            .and_then(|l| l.data.children.into_iter().next())
            .and_then(Envelope::into_item)
            .ok_or_else(|| Error::operation("fetch_thread", "thread root missing"))?;

        let replies = listings
            .next()
            .map(|l| convert_tree(l.data.children))
            .unwrap_or_default();

        Ok(Thread { root, replies })
    }
}

#[async_trait]
impl ReplyPoster for RedditClient {
    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<String> {
        let response: SubmitResponse = self
            .post("/api/comment")
            .form(&[
                ("api_type", "json"),
                ("thing_id", parent_id),
                ("text", body),
            ])
            .send()
            .await
            .map_err(|e| Error::operation("post_reply", e))?
            .error_for_status()
            .map_err(|e| Error::operation("post_reply", e))?
            .json()
            .await
            .map_err(|e| Error::operation("post_reply", e))?;

        response
            .json
            .data
            .things
            .into_iter()
            .next()
            .map(|thing| fullname(&thing.kind, &thing.data.id))
            .ok_or_else(|| Error::operation("post_reply", "no comment in submit response"))
    }

    async fn mark_processed(&self, id: &str) -> Result<()> {
        self.post("/api/save")
            .form(&[("id", id)])
            .send()
            .await
            .map_err(|e| Error::operation("mark_processed", e))?
            .error_for_status()
            .map_err(|e| Error::operation("mark_processed", e))?;
        Ok(())
    }
}

/// Strips the `tN_` kind prefix from a fullname.
fn bare_id(id: &str) -> &str {
    id.split_once('_').map_or(id, |(_, rest)| rest)
}

/// Joins a kind and a bare id back into a fullname.
fn fullname(kind: &str, id: &str) -> String {
    format!("{kind}_{id}")
}

/// Converts a comment-listing forest into thread nodes.
fn convert_tree(children: Vec<Envelope>) -> Vec<ThreadNode> {
    children
        .into_iter()
        .filter_map(|mut envelope| {
            let nested = match std::mem::take(&mut envelope.data.replies) {
                Replies::Listing(listing) => listing.data.children,
                Replies::Absent(_) => Vec::new(),
            };
            envelope.into_item().map(|item| ThreadNode {
                item,
                replies: convert_tree(nested),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// A listing envelope.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

/// The children of a listing.
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Envelope>,
}

/// One kinded thing in a listing.
#[derive(Debug, Deserialize)]
struct Envelope {
    kind: String,
    data: ThingData,
}

impl Envelope {
    /// Converts a `t1`/`t3` thing into a discussion item; other kinds (e.g.
    /// `more` stubs) are dropped.
    fn into_item(self) -> Option<DiscussionItem> {
        match self.kind.as_str() {
            "t3" => Some(DiscussionItem {
                id: fullname("t3", &self.data.id),
                parent: None,
                thread: None,
                author: self.data.author.unwrap_or_default(),
                title: self.data.title,
                body: self.data.selftext.unwrap_or_default(),
                processed: self.data.saved,
                created: timestamp(self.data.created_utc),
            }),
            "t1" => Some(DiscussionItem {
                id: fullname("t1", &self.data.id),
                parent: self.data.parent_id,
                thread: self.data.link_id,
                author: self.data.author.unwrap_or_default(),
                title: None,
                body: self.data.body.unwrap_or_default(),
                processed: self.data.saved,
                created: timestamp(self.data.created_utc),
            }),
            _ => None,
        }
    }
}

/// Payload fields shared by posts and comments.
#[derive(Debug, Deserialize)]
struct ThingData {
    id: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    link_id: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    saved: bool,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    replies: Replies,
}

/// The `replies` field is a nested listing, or an empty string when there
/// are none.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Replies {
    /// Nested reply listing.
    Listing(Box<Listing>),
    /// No replies (the API sends `""`).
    Absent(String),
}

impl Default for Replies {
    fn default() -> Self {
        Self::Absent(String::new())
    }
}

/// Submit endpoint response envelope.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    json: SubmitJson,
}

#[derive(Debug, Deserialize)]
struct SubmitJson {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(default)]
    things: Vec<SubmitThing>,
}

#[derive(Debug, Deserialize)]
struct SubmitThing {
    kind: String,
    data: SubmitThingData,
}

#[derive(Debug, Deserialize)]
struct SubmitThingData {
    id: String,
}

/// Converts an epoch-seconds float into a UTC timestamp.
#[allow(clippy::cast_possible_truncation)]
fn timestamp(epoch: Option<f64>) -> Option<chrono::DateTime<chrono::Utc>> {
    epoch.and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id_strips_kind_prefix() {
        assert_eq!(bare_id("t3_abc"), "abc");
        assert_eq!(bare_id("t1_def"), "def");
        assert_eq!(bare_id("plain"), "plain");
    }

    #[test]
    fn test_post_envelope_conversion() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"kind": "t3", "data": {"id": "abc", "author": "alys", "title": "Best 1h?", "selftext": "mace or axe", "saved": false, "created_utc": 1700000000.0}}"#,
        )
        .unwrap();
        let item = envelope.into_item().unwrap();
        assert_eq!(item.id, "t3_abc");
        assert!(item.is_root());
        assert_eq!(item.title.as_deref(), Some("Best 1h?"));
        assert!(item.created.is_some());
    }

    #[test]
    fn test_comment_envelope_conversion() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"kind": "t1", "data": {"id": "def", "author": "bors", "body": "mace wins", "parent_id": "t3_abc", "link_id": "t3_abc", "saved": true}}"#,
        )
        .unwrap();
        let item = envelope.into_item().unwrap();
        assert_eq!(item.id, "t1_def");
        assert_eq!(item.parent.as_deref(), Some("t3_abc"));
        assert_eq!(item.thread.as_deref(), Some("t3_abc"));
        assert!(item.processed);
    }

    #[test]
    fn test_more_stub_dropped() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"kind": "more", "data": {"id": "xyz"}}"#).unwrap();
        assert!(envelope.into_item().is_none());
    }

    #[test]
    fn test_reply_tree_conversion() {
        let listing: Listing = serde_json::from_str(
            r#"{"data": {"children": [
                {"kind": "t1", "data": {"id": "a", "author": "one", "body": "top",
                    "parent_id": "t3_root", "link_id": "t3_root",
                    "replies": {"data": {"children": [
                        {"kind": "t1", "data": {"id": "b", "author": "two", "body": "nested",
                            "parent_id": "t1_a", "link_id": "t3_root", "replies": ""}}
                    ]}}}}
            ]}}"#,
        )
        .unwrap();
        let tree = convert_tree(listing.data.children);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].item.id, "t1_a");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].item.id, "t1_b");
    }
}
