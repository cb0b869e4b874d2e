//! # Armiger
//!
//! A discussion-stream agent that spots weapon mentions and replies with
//! stat-grounded comparisons.
//!
//! Armiger watches a community discussion stream (posts and comments),
//! detects references to entries in a weapon catalog, reconstructs the
//! conversation leading up to each mention, and asks a generative text
//! service for a reply grounded in the weapons' actual statistics.
//!
//! ## Architecture
//!
//! - Catalog indexing: deduplicated keyword/alias lookup tables, built once
//!   at startup ([`catalog`])
//! - Mention scanning: longest-match-first substring extraction ([`scan`])
//! - Chain resolution: root-to-item ancestor reconstruction ([`chain`])
//! - Context assembly: bounded, role-tagged message sequences with adaptive
//!   shrink-on-rejection retry ([`context`])
//! - Dedupe guard: persisted idempotency ledger behind a single writer
//!   ([`dedupe`])
//!
//! External collaborators (discussion platform, catalog source, generation
//! service) sit behind async trait seams in [`platform`], [`catalog`], and
//! [`llm`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use armiger::catalog::CatalogIndex;
//! use armiger::scan::MentionScanner;
//!
//! let index = CatalogIndex::build(&records)?;
//! let scanner = MentionScanner::new(index.detection_candidates());
//! let found = scanner.scan("the longsword beats the mace in range");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod agent;
pub mod catalog;
pub mod chain;
pub mod cli;
pub mod config;
pub mod context;
pub mod dedupe;
pub mod llm;
pub mod models;
pub mod observability;
pub mod platform;
pub mod rendering;
pub mod scan;

// Re-exports for convenience
pub use catalog::CatalogIndex;
pub use chain::ChainResolver;
pub use config::ArmigerConfig;
pub use context::ContextAssembler;
pub use dedupe::DedupeGuard;
pub use llm::{ChatMessage, ChatRole, MentionClassifier, TextGenerator};
pub use models::{ConversationChain, DiscussionItem, Message, Role, WeaponRecord};
pub use scan::MentionScanner;

/// Error type for armiger operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed configuration, empty identifiers, bad CLI arguments |
/// | `OperationFailed` | I/O errors, HTTP failures, JSON (de)serialization failures |
/// | `AliasConflict` | Two catalog records claim the same alias string |
/// | `ContextRejected` | The generation service refused the context as too large or malformed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Required configuration values are missing (e.g., no agent identity)
    /// - A CLI argument cannot be interpreted
    /// - A catalog document is structurally unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur on the state files
    /// - Platform, catalog, or generation HTTP requests fail
    /// - A response body cannot be deserialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Two catalog records claim the same alias.
    ///
    /// Aliases are unambiguous strong references; a collision is a data
    /// error in the catalog and must be surfaced, never silently resolved.
    #[error("alias '{alias}' claimed by both '{first}' and '{second}'")]
    AliasConflict {
        /// The colliding alias string (normalized form).
        alias: String,
        /// Id of the record that registered the alias first.
        first: String,
        /// Id of the record that attempted to register it again.
        second: String,
    },

    /// The generation service rejected the submitted context.
    ///
    /// Raised when the service reports the message sequence as oversized or
    /// otherwise invalid. This is the only error class the degradation
    /// protocol retries; see [`context::retry_with_shrink`].
    #[error("context rejected by generation service: {0}")]
    ContextRejected(String),
}

/// Result type alias for armiger operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an [`Error::OperationFailed`] with a named operation.
    pub fn operation(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::operation("load_state", "disk on fire");
        assert_eq!(err.to_string(), "operation 'load_state' failed: disk on fire");

        let err = Error::AliasConflict {
            alias: "blade".to_string(),
            first: "falchion".to_string(),
            second: "cutlass".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "alias 'blade' claimed by both 'falchion' and 'cutlass'"
        );
    }
}
