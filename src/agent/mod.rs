//! The agent runtime.
//!
//! Two timer-driven polling loops (posts and comments) feed every fetched
//! item into its own task, bounded by a semaphore. Each handler runs the
//! full pipeline: skip checks, mention scan, gate, chain resolution,
//! context assembly, generation under the degradation protocol, reply
//! posting, and state recording. A handler failure is caught and logged at
//! the task boundary; it never takes down the loops or other handlers.

use crate::catalog::CatalogIndex;
use crate::chain::ChainResolver;
use crate::config::ArmigerConfig;
use crate::context::{self, ContextAssembler};
use crate::dedupe::DedupeGuard;
use crate::llm::{prompts, ChatMessage, MentionClassifier, TextGenerator};
use crate::models::{DiscussionItem, WeaponRecord};
use crate::platform::{DiscussionStream, ReplyPoster, ThreadReader};
use crate::rendering;
use crate::scan::{normalize, MentionScanner};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Upper bound on concurrently running item handlers.
const MAX_CONCURRENT_HANDLERS: usize = 8;

/// The external collaborators an agent is wired to.
pub struct Collaborators {
    /// Polls the discussion streams.
    pub stream: Arc<dyn DiscussionStream>,
    /// Expands thread reply trees.
    pub reader: Arc<dyn ThreadReader>,
    /// Posts replies and flags items.
    pub poster: Arc<dyn ReplyPoster>,
    /// Generates reply text.
    pub generator: Arc<dyn TextGenerator>,
    /// Optional relevance gate for single-mention items.
    pub classifier: Option<Arc<dyn MentionClassifier>>,
}

/// Why an item was skipped without a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// The platform already flags the item as processed.
    AlreadyProcessed,
    /// The agent wrote the item itself.
    OwnItem,
    /// The author is on the banlist.
    BannedAuthor,
    /// The item contains a configured ignore phrase.
    IgnorePhrase,
    /// The thread was already replied to and the agent is not addressed.
    AlreadyReplied,
    /// Not enough mentions to act on.
    TooFewMentions,
    /// The relevance classifier said no.
    ClassifierDeclined,
}

/// What handling an item amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Skipped before generation.
    Skipped(Skip),
    /// A generated reply was posted.
    Replied {
        /// Id of the posted reply.
        reply_id: String,
    },
    /// Generation was exhausted; the fixed fallback was posted because the
    /// agent was addressed directly.
    FallbackReplied {
        /// Id of the posted fallback reply.
        reply_id: String,
    },
    /// Generation was exhausted and the agent stayed silent.
    Silent,
}

/// Result of the generation stage, before posting.
enum Generation {
    Answer(String),
    Exhausted,
}

/// The assembled agent.
pub struct Agent {
    config: ArmigerConfig,
    index: CatalogIndex,
    scanner: MentionScanner,
    resolver: ChainResolver,
    assembler: ContextAssembler,
    guard: DedupeGuard,
    stream: Arc<dyn DiscussionStream>,
    poster: Arc<dyn ReplyPoster>,
    generator: Arc<dyn TextGenerator>,
    classifier: Option<Arc<dyn MentionClassifier>>,
    limiter: Arc<Semaphore>,
}

impl Agent {
    /// Wires up an agent from its parts.
    #[must_use]
    pub fn new(
        config: ArmigerConfig,
        index: CatalogIndex,
        guard: DedupeGuard,
        collaborators: Collaborators,
    ) -> Self {
        let scanner = MentionScanner::new(index.detection_candidates());
        let resolver = ChainResolver::new(Arc::clone(&collaborators.reader));
        let assembler = ContextAssembler::new(config.identity.clone());
        Self {
            config,
            index,
            scanner,
            resolver,
            assembler,
            guard,
            stream: collaborators.stream,
            poster: collaborators.poster,
            generator: collaborators.generator,
            classifier: collaborators.classifier,
            limiter: Arc::new(Semaphore::new(MAX_CONCURRENT_HANDLERS)),
        }
    }

    /// Runs both polling loops until the process is stopped.
    pub async fn run(self: Arc<Self>) {
        info!(
            community = %self.config.platform.community,
            records = self.index.len(),
            keywords = self.index.keyword_count(),
            "agent starting"
        );

        let posts = tokio::spawn(Self::poll_loop(Arc::clone(&self), StreamKind::Posts));
        let comments = tokio::spawn(Self::poll_loop(self, StreamKind::Comments));
        let _ = tokio::join!(posts, comments);
    }

    /// One polling loop. Poll failures are logged and the loop keeps
    /// ticking; they never crash the process.
    async fn poll_loop(agent: Arc<Self>, kind: StreamKind) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(agent.config.platform.poll_interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let limit = agent.config.platform.batch_limit;
            let fetched = match kind {
                StreamKind::Posts => agent.stream.recent_posts(limit).await,
                StreamKind::Comments => agent.stream.recent_comments(limit).await,
            };
            match fetched {
                Ok(items) => {
                    debug!(stream = kind.name(), count = items.len(), "poll tick");
                    agent.dispatch(items);
                }
                Err(err) => {
                    error!(stream = kind.name(), error = %err, "poll failed");
                }
            }
        }
    }

    /// Spawns one bounded handler task per fetched item.
    fn dispatch(self: &Arc<Self>, items: Vec<DiscussionItem>) {
        for item in items {
            let agent = Arc::clone(self);
            tokio::spawn(async move {
                let Ok(_permit) = Arc::clone(&agent.limiter).acquire_owned().await else {
                    return;
                };
                match agent.handle_item(&item).await {
                    Ok(outcome) => debug!(id = %item.id, ?outcome, "item handled"),
                    Err(err) => error!(id = %item.id, error = %err, "item handler failed"),
                }
            });
        }
    }

    /// Runs the full pipeline for one item.
    ///
    /// # Errors
    ///
    /// Returns an error when a platform or generation call fails outright;
    /// the dispatch layer logs it with the item id.
    pub async fn handle_item(&self, item: &DiscussionItem) -> Result<Outcome> {
        if item.processed {
            return Ok(Outcome::Skipped(Skip::AlreadyProcessed));
        }
        if item.author.eq_ignore_ascii_case(&self.config.identity) {
            return Ok(Outcome::Skipped(Skip::OwnItem));
        }
        if self.guard.is_banned(&item.author).await {
            return Ok(Outcome::Skipped(Skip::BannedAuthor));
        }

        let normalized = normalize(&item.content_text());
        if self.contains_ignore_phrase(&normalized) {
            return Ok(Outcome::Skipped(Skip::IgnorePhrase));
        }

        let identity = normalize(&self.config.identity);
        let direct_address = !identity.is_empty() && normalized.contains(&identity);
        if !self
            .guard
            .should_process(item.thread_id(), direct_address)
            .await
        {
            return Ok(Outcome::Skipped(Skip::AlreadyReplied));
        }

        let found = self.scanner.scan(&item.content_text());
        debug!(id = %item.id, mentions = ?found, direct_address, "scanned item");

        if let Some(skip) = self.gate(item, &found, direct_address).await {
            return Ok(Outcome::Skipped(skip));
        }

        let generation = self.generate_reply(item, &found).await?;
        self.settle(item, &found, direct_address, generation).await
    }

    /// Whether any configured ignore phrase occurs in the normalized text.
    fn contains_ignore_phrase(&self, normalized: &str) -> bool {
        self.config
            .catalog
            .ignore_phrases
            .iter()
            .any(|phrase| normalized.contains(&normalize(phrase)))
    }

    /// Applies the mention-count gate. `None` means proceed.
    async fn gate(
        &self,
        item: &DiscussionItem,
        found: &[String],
        direct_address: bool,
    ) -> Option<Skip> {
        if direct_address || found.len() >= self.config.gate.min_mentions {
            return None;
        }
        if found.len() == 1 && self.config.gate.use_classifier {
            if let Some(classifier) = &self.classifier {
                return match classifier.classify(&item.content_text()).await {
                    Ok(true) => None,
                    Ok(false) => Some(Skip::ClassifierDeclined),
                    Err(err) => {
                        // A broken gate counts as "no"; the item stays
                        // eligible for a later direct address.
                        warn!(id = %item.id, error = %err, "classifier failed");
                        Some(Skip::ClassifierDeclined)
                    }
                };
            }
        }
        Some(Skip::TooFewMentions)
    }

    /// Resolves the chain, assembles the context, and runs generation under
    /// the degradation protocol.
    async fn generate_reply(&self, item: &DiscussionItem, found: &[String]) -> Result<Generation> {
        let chain = self.resolver.resolve(item).await?;
        let rewrites = self.index.alias_rewrites(found);
        let messages = self.assembler.assemble(&chain, &rewrites);

        let records = self.comparison_records(found);
        let table = rendering::stat_table(&records)?;
        let preamble = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::assistant(format!("{}{table}", prompts::GROUNDING_PREFIX)),
        ];

        let generator = Arc::clone(&self.generator);
        let model = self.config.generation.model.clone();

        context::retry_with_shrink(
            &messages,
            move |window| {
                let mut chat = preamble.clone();
                chat.extend(window.iter().map(ChatMessage::from));
                let generator = Arc::clone(&generator);
                let model = model.clone();
                async move { generator.generate(&chat, &model).await.map(Generation::Answer) }
            },
            || Generation::Exhausted,
        )
        .await
    }

    /// Posts whatever the generation stage produced and records the
    /// outcome. The item is marked processed in every branch so a failing
    /// generation cannot cause a retry storm.
    async fn settle(
        &self,
        item: &DiscussionItem,
        found: &[String],
        direct_address: bool,
        generation: Generation,
    ) -> Result<Outcome> {
        match generation {
            Generation::Answer(answer) => {
                let records = self.comparison_records(found);
                let body = rendering::compose_reply(
                    &answer,
                    &self.config.catalog.comparison_base_url,
                    &records,
                );
                let reply_id = self.poster.post_reply(&item.id, &body).await?;
                info!(id = %item.id, reply_id = %reply_id, "reply posted");

                self.guard.record_authored(reply_id.clone()).await?;
                self.guard.record_replied(item.thread_id()).await?;
                self.mark_processed(item).await;
                Ok(Outcome::Replied { reply_id })
            }
            Generation::Exhausted => {
                warn!(id = %item.id, "generation exhausted after shrinking context");
                self.guard.record_replied(item.thread_id()).await?;
                self.mark_processed(item).await;

                if direct_address {
                    let reply_id = self
                        .poster
                        .post_reply(&item.id, prompts::FALLBACK_REPLY)
                        .await?;
                    self.guard.record_authored(reply_id.clone()).await?;
                    Ok(Outcome::FallbackReplied { reply_id })
                } else {
                    Ok(Outcome::Silent)
                }
            }
        }
    }

    /// The records to compare: every mentioned record plus the configured
    /// flagship, deduplicated.
    fn comparison_records(&self, found: &[String]) -> Vec<&WeaponRecord> {
        let mut records = self.index.records_for_mentions(found);
        if let Some(flagship) = &self.config.catalog.flagship {
            if !records.iter().any(|r| &r.id == flagship) {
                if let Some(record) = self.index.record(flagship) {
                    records.push(record);
                }
            }
        }
        records
    }

    /// Best-effort platform-side processed flag; failure only logs.
    async fn mark_processed(&self, item: &DiscussionItem) {
        if let Err(err) = self.poster.mark_processed(&item.id).await {
            warn!(id = %item.id, error = %err, "could not mark item processed");
        }
    }
}

/// Which of the two streams a polling loop serves.
#[derive(Debug, Clone, Copy)]
enum StreamKind {
    Posts,
    Comments,
}

impl StreamKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Comments => "comments",
        }
    }
}
