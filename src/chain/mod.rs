//! Ancestor-chain resolution.
//!
//! Given a discussion item, reconstructs the ordered path from its thread
//! root down to the item itself. The reply tree comes from an injected
//! [`ThreadReader`]; the search over it is an explicit iterative
//! depth-first walk so arbitrarily deep threads cannot overflow the stack.

use crate::models::{ConversationChain, DiscussionItem, ThreadNode};
use crate::platform::ThreadReader;
use crate::Result;
use std::sync::Arc;
use tracing::warn;

/// Resolves discussion items to their root-to-item ancestor chains.
pub struct ChainResolver {
    /// Thread expansion collaborator.
    reader: Arc<dyn ThreadReader>,
}

impl ChainResolver {
    /// Creates a resolver over the given thread reader.
    #[must_use]
    pub fn new(reader: Arc<dyn ThreadReader>) -> Self {
        Self { reader }
    }

    /// Reconstructs the ancestor chain of `item`, root first, `item` last.
    ///
    /// A thread root resolves to the singleton chain `[item]` without any
    /// platform call. When the item cannot be found in the fetched tree
    /// (deleted mid-flight, or the tree is inconsistent) the chain degrades
    /// to `[root]` instead of failing; losing ancestry must never abort
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns an error only when the thread itself cannot be fetched.
    pub async fn resolve(&self, item: &DiscussionItem) -> Result<ConversationChain> {
        if item.is_root() {
            return Ok(vec![item.clone()]);
        }

        let thread = self.reader.thread(item.thread_id()).await?;

        match find_path(&thread.replies, &item.id) {
            Some(mut path) => {
                path.insert(0, thread.root);
                Ok(path)
            }
            None => {
                warn!(id = %item.id, thread = %thread.root.id, "item not found in reply tree, degrading to root-only chain");
                Ok(vec![thread.root])
            }
        }
    }
}

/// Searches the reply forest for `target`, returning the top-to-target path.
///
/// Iterative depth-first traversal with an explicit stack; the stack's node
/// trail at the moment of the hit IS the path.
fn find_path(replies: &[ThreadNode], target: &str) -> Option<Vec<DiscussionItem>> {
    // (node, index of the next child to descend into)
    let mut stack: Vec<(&ThreadNode, usize)> = Vec::new();

    for top in replies {
        stack.push((top, 0));

        while let Some(&(node, next_child)) = stack.last() {
            if next_child == 0 && node.item.id == target {
                return Some(stack.iter().map(|(n, _)| n.item.clone()).collect());
            }

            if let Some(child) = node.replies.get(next_child) {
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }
                stack.push((child, 0));
            } else {
                stack.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Thread, ThreadNode};
    use async_trait::async_trait;

    fn item(id: &str, parent: Option<&str>) -> DiscussionItem {
        DiscussionItem {
            id: id.to_string(),
            parent: parent.map(ToString::to_string),
            thread: parent.map(|_| "s".to_string()),
            author: "someone".to_string(),
            title: None,
            body: format!("body of {id}"),
            processed: false,
            created: None,
        }
    }

    struct FixedThread(Thread);

    #[async_trait]
    impl ThreadReader for FixedThread {
        async fn thread(&self, _root_id: &str) -> Result<Thread> {
            Ok(self.0.clone())
        }
    }

    /// Root `s` with replies a -> b -> c and a sibling branch.
    fn fixture() -> Thread {
        Thread {
            root: item("s", None),
            replies: vec![
                ThreadNode {
                    item: item("a", Some("s")),
                    replies: vec![ThreadNode {
                        item: item("b", Some("a")),
                        replies: vec![ThreadNode::leaf(item("c", Some("b")))],
                    }],
                },
                ThreadNode::leaf(item("other", Some("s"))),
            ],
        }
    }

    #[tokio::test]
    async fn test_root_resolves_to_singleton() {
        let resolver = ChainResolver::new(Arc::new(FixedThread(fixture())));
        let root = item("s", None);
        let chain = resolver.resolve(&root).await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id, "s");
    }

    #[tokio::test]
    async fn test_deep_item_resolves_full_path() {
        let resolver = ChainResolver::new(Arc::new(FixedThread(fixture())));
        let c = item("c", Some("b"));
        let chain = resolver.resolve(&c).await.unwrap();
        let ids: Vec<_> = chain.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_sibling_branch_not_included() {
        let resolver = ChainResolver::new(Arc::new(FixedThread(fixture())));
        let b = item("b", Some("a"));
        let chain = resolver.resolve(&b).await.unwrap();
        let ids: Vec<_> = chain.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_item_degrades_to_root() {
        let resolver = ChainResolver::new(Arc::new(FixedThread(fixture())));
        let ghost = item("deleted", Some("a"));
        let chain = resolver.resolve(&ghost).await.unwrap();
        let ids: Vec<_> = chain.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s"]);
    }

    #[test]
    fn test_find_path_deep_tree_does_not_recurse() {
        // A 10k-deep chain would blow a recursive walk; the iterative one
        // just grows its explicit stack.
        let mut node = ThreadNode::leaf(item("leaf", Some("p")));
        for depth in (0..10_000).rev() {
            node = ThreadNode {
                item: item(&format!("n{depth}"), Some("x")),
                replies: vec![node],
            };
        }
        let path = find_path(std::slice::from_ref(&node), "leaf").unwrap();
        assert_eq!(path.len(), 10_001);
        assert_eq!(path.last().unwrap().id, "leaf");
    }
}
