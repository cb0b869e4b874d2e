//! Catalog sources.
//!
//! The catalog is published as one JSON document per weapon. The agent
//! fetches all of them once at startup; a document that fails to fetch or
//! parse is skipped with a warning so one bad record cannot take the whole
//! catalog down.

use crate::models::WeaponRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A read-only supplier of catalog records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches every available record.
    ///
    /// # Errors
    ///
    /// Returns an error only when the source as a whole is unreachable;
    /// individually malformed records are skipped.
    async fn fetch(&self) -> Result<Vec<WeaponRecord>>;
}

/// One entry of a remote catalog listing.
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    download_url: Option<String>,
}

/// Catalog source backed by a remote listing endpoint.
///
/// The listing endpoint returns a JSON array of `{name, download_url}`
/// entries; every `.json` entry is fetched and parsed as a [`WeaponRecord`].
pub struct HttpCatalogSource {
    /// Listing endpoint URL.
    listing_url: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl HttpCatalogSource {
    /// Creates a source over the given listing endpoint.
    #[must_use]
    pub fn new(listing_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            listing_url: listing_url.into(),
            client,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<WeaponRecord>> {
        let entries: Vec<ListingEntry> = self
            .client
            .get(&self.listing_url)
            .send()
            .await
            .map_err(|e| Error::operation("catalog_listing", e))?
            .error_for_status()
            .map_err(|e| Error::operation("catalog_listing", e))?
            .json()
            .await
            .map_err(|e| Error::operation("catalog_listing", e))?;

        let mut records = Vec::new();
        for entry in entries {
            if !entry.name.ends_with(".json") {
                continue;
            }
            let Some(url) = entry.download_url else {
                warn!(file = %entry.name, "catalog entry has no download url");
                continue;
            };
            match self.fetch_record(&url).await {
                Ok(record) => {
                    debug!(file = %entry.name, id = %record.id, "fetched catalog record");
                    records.push(record);
                }
                Err(err) => {
                    warn!(file = %entry.name, error = %err, "skipping catalog record");
                }
            }
        }

        Ok(records)
    }
}

impl HttpCatalogSource {
    /// Fetches and parses a single record document.
    async fn fetch_record(&self, url: &str) -> Result<WeaponRecord> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::operation("catalog_record", e))?
            .error_for_status()
            .map_err(|e| Error::operation("catalog_record", e))?
            .json()
            .await
            .map_err(|e| Error::operation("catalog_record", e))
    }
}

/// Catalog source backed by a local directory of JSON documents.
///
/// Useful for offline runs and tests; reads every `*.json` file in the
/// directory, non-recursively.
pub struct DirCatalogSource {
    /// Directory holding one JSON document per record.
    dir: PathBuf,
}

impl DirCatalogSource {
    /// Creates a source over the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CatalogSource for DirCatalogSource {
    async fn fetch(&self) -> Result<Vec<WeaponRecord>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::operation("catalog_dir", e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::operation("catalog_dir", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable catalog file");
                    continue;
                }
            };
            match serde_json::from_str::<WeaponRecord>(&contents) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed catalog file");
                }
            }
        }

        // Directory iteration order is platform-dependent; keep the catalog
        // deterministic.
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dir_source_reads_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"id": "zw", "name": "Zweihander"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{"id": "ah", "name": "Axe of Holding"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();

        let source = DirCatalogSource::new(dir.path());
        let records = source.fetch().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ah", "zw"]);
    }

    #[tokio::test]
    async fn test_dir_source_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.json"), r#"{"id": "m", "name": "Mace"}"#).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let source = DirCatalogSource::new(dir.path());
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "m");
    }

    #[tokio::test]
    async fn test_dir_source_missing_dir_errors() {
        let source = DirCatalogSource::new("/definitely/not/here");
        assert!(source.fetch().await.is_err());
    }
}
