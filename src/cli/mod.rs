//! CLI command implementations.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Start the agent: poll the streams and reply to mentions |
//! | `scan` | Scan a piece of text against the catalog, print the mentions |
//! | `catalog` | Fetch the catalog, build the index, print a summary |
//! | `status` | Show the persisted idempotency state |
//!
//! The factory functions at the bottom build the real collaborators from
//! configuration; everything above them works purely through the trait
//! seams.

// Allow print_stdout/stderr in CLI module (consistent with main.rs)
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use crate::agent::{Agent, Collaborators};
use crate::catalog::{CatalogIndex, CatalogSource, DirCatalogSource, HttpCatalogSource};
use crate::config::ArmigerConfig;
use crate::dedupe::DedupeGuard;
use crate::llm::{build_http_client, LlmHttpConfig, OpenAiClient};
use crate::models::WeaponRecord;
use crate::platform::RedditClient;
use crate::scan::MentionScanner;
use crate::Result;
use std::sync::Arc;

/// Runs the agent until the process is stopped.
///
/// # Errors
///
/// Returns an error when configuration is incomplete or the catalog cannot
/// be fetched/indexed at startup. Once the loops are running nothing is
/// fatal.
pub async fn cmd_run(config: ArmigerConfig) -> Result<()> {
    config.validate_for_run()?;

    let records = load_catalog(&config).await?;
    let index = CatalogIndex::build(&records)?;
    let guard = DedupeGuard::load(&config.state_dir).await?;

    let platform = Arc::new(build_platform_client(&config));
    let llm = Arc::new(build_llm_client(&config));

    let classifier: Option<Arc<dyn crate::llm::MentionClassifier>> = if config.gate.use_classifier
    {
        Some(Arc::clone(&llm))
    } else {
        None
    };

    let collaborators = Collaborators {
        stream: Arc::clone(&platform),
        reader: Arc::clone(&platform),
        poster: platform,
        generator: llm,
        classifier,
    };

    let agent = Arc::new(Agent::new(config, index, guard, collaborators));
    agent.run().await;
    Ok(())
}

/// Scans a piece of text and prints what the agent would detect.
///
/// # Errors
///
/// Returns an error when the catalog cannot be fetched or indexed.
pub async fn cmd_scan(config: ArmigerConfig, text: &str) -> Result<()> {
    let records = load_catalog(&config).await?;
    let index = CatalogIndex::build(&records)?;
    let scanner = MentionScanner::new(index.detection_candidates());

    let found = scanner.scan(text);
    if found.is_empty() {
        println!("no mentions");
        return Ok(());
    }

    println!("mentions: {}", found.join(", "));
    for record in index.records_for_mentions(&found) {
        println!("  {} -> {} ({})", record.id, record.name, record.handedness());
    }
    for rewrite in index.alias_rewrites(&found) {
        println!("  rewrite: {} -> \"{}\"", rewrite.matched, rewrite.canonical);
    }
    Ok(())
}

/// Fetches the catalog, builds the index, and prints a summary.
///
/// Surfaces alias conflicts as a hard error, making this the offline check
/// for catalog data problems.
///
/// # Errors
///
/// Returns an error when the catalog cannot be fetched or indexed.
pub async fn cmd_catalog(config: ArmigerConfig) -> Result<()> {
    let records = load_catalog(&config).await?;
    let index = CatalogIndex::build(&records)?;

    println!(
        "{} records, {} keywords",
        index.len(),
        index.keyword_count()
    );
    for record in index.records() {
        let aliases = if record.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", record.aliases.join(", "))
        };
        println!("  {:<12} {}{aliases}", record.id, record.name);
    }
    Ok(())
}

/// Prints the persisted idempotency state.
///
/// # Errors
///
/// Returns an error when the state files cannot be read.
pub async fn cmd_status(config: ArmigerConfig) -> Result<()> {
    let guard = DedupeGuard::load(&config.state_dir).await?;
    let state = guard.snapshot().await;

    println!("state dir: {}", config.state_dir.display());
    println!("  authored replies: {}", state.authored.len());
    println!("  replied threads:  {}", state.replied.len());
    println!("  banned authors:   {}", state.banned.len());
    Ok(())
}

/// Fetches the catalog from whichever source is configured.
async fn load_catalog(config: &ArmigerConfig) -> Result<Vec<WeaponRecord>> {
    let source: Box<dyn CatalogSource> = if let Some(dir) = &config.catalog.dir {
        Box::new(DirCatalogSource::new(dir))
    } else if let Some(url) = &config.catalog.listing_url {
        Box::new(HttpCatalogSource::new(url.clone(), reqwest::Client::new()))
    } else {
        return Err(crate::Error::InvalidInput(
            "no catalog source configured (set catalog.listing_url or catalog.dir)".to_string(),
        ));
    };
    source.fetch().await
}

/// Builds the platform client from configuration.
fn build_platform_client(config: &ArmigerConfig) -> RedditClient {
    let mut client = RedditClient::new(
        config.platform.community.clone(),
        config.user_agent.clone(),
    )
    .with_base_url(config.platform.base_url.clone());
    if let Some(token) = config.platform.access_token.clone() {
        client = client.with_access_token(token);
    }
    client
}

/// Builds the LLM client from configuration.
fn build_llm_client(config: &ArmigerConfig) -> OpenAiClient {
    let mut http = LlmHttpConfig::default();
    if let Some(timeout_ms) = config.generation.timeout_ms {
        http.timeout_ms = timeout_ms;
    }
    if let Some(connect_timeout_ms) = config.generation.connect_timeout_ms {
        http.connect_timeout_ms = connect_timeout_ms;
    }

    let mut client = OpenAiClient::new(build_http_client(http))
        .with_classifier_model(config.generation.classifier_model.clone());
    if let Some(key) = config.generation.api_key.clone() {
        client = client.with_api_key(key);
    }
    if let Some(base_url) = &config.generation.base_url {
        client = client.with_endpoint(base_url.clone());
    }
    client
}
