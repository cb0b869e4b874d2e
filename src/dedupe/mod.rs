//! Persisted idempotency ledger.
//!
//! Three append-only sets keep the agent from answering twice or talking to
//! itself: ids of replies the agent authored, ids of threads/items already
//! replied to, and a hand-maintained banlist of authors to always skip.
//! Each set lives in its own JSON file, loaded at startup and rewritten in
//! full after every mutation, so a crash loses at most the in-flight item.
//!
//! All mutations go through one async mutex. Handlers run concurrently and
//! unordered; without the single-writer discipline two of them could each
//! read the pre-update set and the second write would erase the first's
//! addition.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// The three persisted idempotency sets.
#[derive(Debug, Default, Clone)]
pub struct ProcessedState {
    /// Ids of replies the agent itself authored.
    pub authored: BTreeSet<String>,
    /// Ids of threads/items the agent already replied to.
    pub replied: BTreeSet<String>,
    /// Author identities to always skip.
    pub banned: BTreeSet<String>,
}

/// Persisted idempotency guard with single-writer mutation discipline.
pub struct DedupeGuard {
    /// Directory holding the three state files.
    dir: PathBuf,
    /// The in-memory state, serialized behind one lock.
    state: Mutex<ProcessedState>,
}

const AUTHORED_FILE: &str = "authored.json";
const REPLIED_FILE: &str = "replied.json";
const BANNED_FILE: &str = "banned.json";

impl DedupeGuard {
    /// Loads the guard from a state directory, creating it if missing.
    ///
    /// Absent files load as empty sets.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or a state
    /// file exists but cannot be read or parsed.
    pub async fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::operation("create_state_dir", e))?;

        let state = ProcessedState {
            authored: load_set(&dir.join(AUTHORED_FILE)).await?,
            replied: load_set(&dir.join(REPLIED_FILE)).await?,
            banned: load_set(&dir.join(BANNED_FILE)).await?,
        };

        Ok(Self {
            dir,
            state: Mutex::new(state),
        })
    }

    /// Whether the agent already replied to this thread or item.
    pub async fn already_replied(&self, id: &str) -> bool {
        self.state.lock().await.replied.contains(id)
    }

    /// Whether the agent itself authored this item.
    pub async fn already_authored(&self, id: &str) -> bool {
        self.state.lock().await.authored.contains(id)
    }

    /// Whether this author is on the banlist.
    pub async fn is_banned(&self, author: &str) -> bool {
        self.state.lock().await.banned.contains(author)
    }

    /// Whether an item in the given thread should still be processed.
    ///
    /// A thread already replied to is skipped, unless the item addresses
    /// the agent directly; direct address always overrides the skip so a
    /// user naming the agent gets a fresh answer.
    pub async fn should_process(&self, thread_id: &str, direct_address: bool) -> bool {
        direct_address || !self.already_replied(thread_id).await
    }

    /// Records a reply id the agent authored and persists immediately.
    ///
    /// # Errors
    ///
    /// Returns an error when the state file cannot be written.
    pub async fn record_authored(&self, id: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.authored.insert(id.into());
        persist_set(&self.dir.join(AUTHORED_FILE), &state.authored).await
    }

    /// Records a thread/item id as replied to and persists immediately.
    ///
    /// # Errors
    ///
    /// Returns an error when the state file cannot be written.
    pub async fn record_replied(&self, id: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.replied.insert(id.into());
        persist_set(&self.dir.join(REPLIED_FILE), &state.replied).await
    }

    /// A snapshot of the current state, for status reporting.
    pub async fn snapshot(&self) -> ProcessedState {
        self.state.lock().await.clone()
    }
}

/// Loads one set file; a missing file is an empty set.
async fn load_set(path: &Path) -> Result<BTreeSet<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|e| Error::operation("parse_state_file", format!("{}: {e}", path.display()))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(err) => Err(Error::operation(
            "read_state_file",
            format!("{}: {err}", path.display()),
        )),
    }
}

/// Rewrites one set file in full.
async fn persist_set(path: &Path, set: &BTreeSet<String>) -> Result<()> {
    let contents = serde_json::to_string_pretty(set)
        .map_err(|e| Error::operation("serialize_state_file", e))?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::operation("write_state_file", format!("{}: {e}", path.display())))
}
