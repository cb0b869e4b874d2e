//! Catalog indexing.
//!
//! Builds the keyword and alias lookup tables the scanner and the context
//! assembler work from. Keywords are many-to-many (a category tag maps to
//! every record carrying it); aliases are strictly one-to-one and a
//! collision between records is surfaced as [`Error::AliasConflict`].

mod source;

pub use source::{CatalogSource, DirCatalogSource, HttpCatalogSource};

use crate::models::WeaponRecord;
use crate::scan::normalize;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Shorthand tokens contributed by handedness category tags.
static HANDEDNESS_SHORTHAND: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let one_handed: &'static [&'static str] = &["1h"];
        let two_handed: &'static [&'static str] = &["2h"];
        HashMap::from([("one handed", one_handed), ("two handed", two_handed)])
    });

/// A found mention string paired with the canonical display name it should
/// be rewritten to before the context is submitted downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRewrite {
    /// The normalized string that matched in the text.
    pub matched: String,
    /// The canonical display name of the record it refers to.
    pub canonical: String,
}

/// Read-only keyword/alias index over the weapon catalog.
///
/// Built once at startup; every lookup after that is immutable.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    /// Records by id, in catalog order.
    records: Vec<WeaponRecord>,
    /// Position of each record id in `records`.
    by_id: HashMap<String, usize>,
    /// Normalized keyword -> ids of every record it can refer to.
    keywords: HashMap<String, BTreeSet<String>>,
    /// Normalized alias -> the one record id it refers to.
    aliases: HashMap<String, String>,
}

impl CatalogIndex {
    /// Builds the index from raw catalog records.
    ///
    /// Records without a usable id or name are skipped with a warning.
    /// Duplicate record ids keep the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasConflict`] when two distinct records claim the
    /// same alias string.
    pub fn build(records: &[WeaponRecord]) -> Result<Self> {
        let mut index = Self::default();

        for record in records {
            if !record.is_indexable() {
                warn!(id = %record.id, "skipping malformed catalog record");
                continue;
            }
            if index.by_id.contains_key(&record.id) {
                warn!(id = %record.id, "skipping duplicate catalog record id");
                continue;
            }

            index.by_id.insert(record.id.clone(), index.records.len());
            index.records.push(record.clone());

            index.register_keyword(&record.name, &record.id);
            for tag in &record.weapon_types {
                index.register_keyword(tag, &record.id);
                for shorthand in shorthand_tokens(tag) {
                    index.register_keyword(shorthand, &record.id);
                }
            }
            for alias in &record.aliases {
                index.register_keyword(alias, &record.id);
            }

            index.register_alias(&record.name, &record.id)?;
            for alias in &record.aliases {
                index.register_alias(alias, &record.id)?;
            }
        }

        Ok(index)
    }

    /// Registers both normalized variants of `word` as keywords for `id`.
    fn register_keyword(&mut self, word: &str, id: &str) {
        for variant in variants(word) {
            self.keywords
                .entry(variant)
                .or_default()
                .insert(id.to_string());
        }
    }

    /// Registers both normalized variants of `word` as an alias of `id`.
    ///
    /// A record may re-register its own alias (the canonical name is always
    /// one of its own aliases); only a claim by a different record is a
    /// conflict.
    fn register_alias(&mut self, word: &str, id: &str) -> Result<()> {
        for variant in variants(word) {
            match self.aliases.get(&variant) {
                Some(existing) if existing != id => {
                    return Err(Error::AliasConflict {
                        alias: variant,
                        first: existing.clone(),
                        second: id.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    self.aliases.insert(variant, id.to_string());
                }
            }
        }
        Ok(())
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All indexed records, in catalog order.
    #[must_use]
    pub fn records(&self) -> &[WeaponRecord] {
        &self.records
    }

    /// Number of distinct keyword strings.
    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<&WeaponRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// Looks up the one record an alias refers to.
    #[must_use]
    pub fn record_for_alias(&self, alias: &str) -> Option<&WeaponRecord> {
        self.aliases.get(alias).and_then(|id| self.record(id))
    }

    /// Ids of every record a keyword can refer to.
    #[must_use]
    pub fn ids_for_keyword(&self, keyword: &str) -> Vec<&str> {
        self.keywords
            .get(keyword)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every keyword string, for handing to the scanner.
    #[must_use]
    pub fn detection_candidates(&self) -> Vec<String> {
        self.keywords.keys().cloned().collect()
    }

    /// The distinct records referred to by a set of found mentions, in
    /// first-mention order.
    #[must_use]
    pub fn records_for_mentions(&self, found: &[String]) -> Vec<&WeaponRecord> {
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();
        for mention in found {
            for id in self.ids_for_keyword(mention) {
                if seen.insert(id.to_string()) {
                    if let Some(record) = self.record(id) {
                        records.push(record);
                    }
                }
            }
        }
        records
    }

    /// Rewrite instructions for the found mentions that are unambiguous
    /// aliases.
    ///
    /// Generic keywords (shared category tags) are not rewritten; only a
    /// string that names exactly one record can be safely replaced with
    /// that record's canonical display name.
    #[must_use]
    pub fn alias_rewrites(&self, found: &[String]) -> Vec<AliasRewrite> {
        found
            .iter()
            .filter_map(|mention| {
                self.record_for_alias(mention).map(|record| AliasRewrite {
                    matched: mention.clone(),
                    canonical: record.name.clone(),
                })
            })
            .collect()
    }
}

/// The normalized forms a candidate string is registered under: the literal
/// normalization and the whitespace-stripped one, so "long sword" and
/// "longsword" both resolve.
fn variants(word: &str) -> Vec<String> {
    let literal = normalize(word);
    let stripped: String = literal.split_whitespace().collect();
    if stripped == literal || stripped.is_empty() {
        vec![literal]
    } else {
        vec![literal, stripped]
    }
}

/// Shorthand synonym tokens derived from a category tag, if any.
fn shorthand_tokens(tag: &str) -> &'static [&'static str] {
    HANDEDNESS_SHORTHAND
        .get(normalize(tag).as_str())
        .copied()
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, aliases: &[&str], types: &[&str]) -> WeaponRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "aliases": aliases,
            "weaponTypes": types,
        }))
        .unwrap()
    }

    #[test]
    fn test_name_registered_as_keyword_and_alias() {
        let index = CatalogIndex::build(&[record("ls", "Longsword", &[], &["Sword"])]).unwrap();
        assert_eq!(index.ids_for_keyword("longsword"), vec!["ls"]);
        assert_eq!(index.record_for_alias("longsword").unwrap().id, "ls");
    }

    #[test]
    fn test_both_spacing_variants_resolve() {
        let index = CatalogIndex::build(&[record("ds", "Dane Axe", &[], &[])]).unwrap();
        assert_eq!(index.record_for_alias("dane axe").unwrap().id, "ds");
        assert_eq!(index.record_for_alias("daneaxe").unwrap().id, "ds");
    }

    #[test]
    fn test_shared_tag_is_ambiguous_keyword() {
        let index = CatalogIndex::build(&[
            record("ls", "Longsword", &[], &["Sword"]),
            record("ss", "Shortsword", &[], &["Sword"]),
        ])
        .unwrap();
        assert_eq!(index.ids_for_keyword("sword"), vec!["ls", "ss"]);
        // A shared tag is not an alias.
        assert!(index.record_for_alias("sword").is_none());
    }

    #[test]
    fn test_alias_conflict_is_surfaced() {
        let err = CatalogIndex::build(&[
            record("fal", "Falchion", &["blade"], &[]),
            record("cut", "Cutlass", &["blade"], &[]),
        ])
        .unwrap_err();
        match err {
            Error::AliasConflict { alias, first, second } => {
                assert_eq!(alias, "blade");
                assert_eq!(first, "fal");
                assert_eq!(second, "cut");
            }
            other => panic!("expected AliasConflict, got {other}"),
        }
    }

    #[test]
    fn test_handedness_shorthand_derived() {
        let index =
            CatalogIndex::build(&[record("mc", "Mace", &[], &["One Handed", "Club"])]).unwrap();
        assert_eq!(index.ids_for_keyword("1h"), vec!["mc"]);
        assert_eq!(index.ids_for_keyword("one handed"), vec!["mc"]);
        assert_eq!(index.ids_for_keyword("onehanded"), vec!["mc"]);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let index = CatalogIndex::build(&[
            record("", "Nameless", &[], &[]),
            record("ok", "Mace", &[], &[]),
        ])
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.record("ok").is_some());
    }

    #[test]
    fn test_records_for_mentions_deduplicates() {
        let index = CatalogIndex::build(&[
            record("ls", "Longsword", &["bastard sword"], &["Sword"]),
            record("ss", "Shortsword", &[], &["Sword"]),
        ])
        .unwrap();
        let found = vec!["longsword".to_string(), "sword".to_string()];
        let records = index.records_for_mentions(&found);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ls", "ss"]);
    }

    #[test]
    fn test_alias_rewrites_skip_ambiguous_keywords() {
        let index = CatalogIndex::build(&[
            record("ls", "Longsword", &["bastard sword"], &["Sword"]),
            record("ss", "Shortsword", &[], &["Sword"]),
        ])
        .unwrap();
        let found = vec!["bastardsword".to_string(), "sword".to_string()];
        let rewrites = index.alias_rewrites(&found);
        assert_eq!(
            rewrites,
            vec![AliasRewrite {
                matched: "bastardsword".to_string(),
                canonical: "Longsword".to_string(),
            }]
        );
    }
}
