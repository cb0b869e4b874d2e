//! Mention scanning.
//!
//! Extracts catalog mentions from free text with a deterministic
//! longest-match-first substring pass. Matching is pure substring
//! containment, not word-boundary aware: a candidate embedded inside an
//! unrelated longer word will match. Callers needing precision must
//! pre-filter their candidate set.

/// Longest-match-first substring scanner over a fixed candidate set.
///
/// Candidates are ordered once at construction: by descending length, ties
/// broken lexicographically so that two same-length candidates matching at
/// the same position always resolve the same way.
#[derive(Debug, Clone)]
pub struct MentionScanner {
    /// Candidates in scan order (longest first, then lexicographic).
    candidates: Vec<String>,
}

impl MentionScanner {
    /// Builds a scanner over the given candidate strings.
    ///
    /// Candidates are expected in normalized form (see [`normalize`]);
    /// anything else will simply never match.
    #[must_use]
    pub fn new(mut candidates: Vec<String>) -> Self {
        candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        candidates.dedup();
        Self { candidates }
    }

    /// The candidates in scan order.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Scans `text` and returns the matched candidates in match order.
    ///
    /// Each candidate that occurs in the (normalized) text is reported once,
    /// and every occurrence of it is consumed before shorter candidates are
    /// tried. A longer candidate therefore shadows any shorter candidate it
    /// contains: given `{"longsword", "sword"}`, the text "the longsword"
    /// yields `["longsword"]` only.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<String> {
        let mut scratch = normalize(text);
        let mut found = Vec::new();

        for candidate in &self.candidates {
            if candidate.is_empty() {
                continue;
            }
            if scratch.contains(candidate.as_str()) {
                scratch = scratch.replace(candidate.as_str(), "");
                found.push(candidate.clone());
            }
        }

        found
    }
}

/// Normalizes text for scanning: hyphens become spaces, then lowercase.
///
/// The same rule is applied to candidate strings at index-construction time,
/// so "war-axe" in a comment matches the "war axe" keyword.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.replace('-', " ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn scanner(candidates: &[&str]) -> MentionScanner {
        MentionScanner::new(candidates.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_longer_candidate_consumes_shorter() {
        let s = scanner(&["longsword", "sword"]);
        assert_eq!(s.scan("the longsword is great"), vec!["longsword"]);
    }

    #[test]
    fn test_both_match_when_spans_are_disjoint() {
        let s = scanner(&["longsword", "sword"]);
        let found = s.scan("the longsword is a sword");
        assert_eq!(found, vec!["longsword", "sword"]);
    }

    #[test]
    fn test_repeated_mention_reported_once() {
        let s = scanner(&["mace"]);
        assert_eq!(s.scan("mace mace mace"), vec!["mace"]);
    }

    #[test]
    fn test_all_occurrences_consumed_before_shorter() {
        // Both occurrences of "longsword" are removed, so "sword" has
        // nothing left to match inside them.
        let s = scanner(&["longsword", "sword"]);
        assert_eq!(s.scan("longsword vs longsword"), vec!["longsword"]);
    }

    #[test_case("the war-axe is fast", &["war axe"], &["war axe"]; "hyphen folded to space")]
    #[test_case("THE LONGSWORD", &["longsword"], &["longsword"]; "case folded")]
    #[test_case("nothing here", &["mace"], &[]; "no match")]
    fn test_normalization(text: &str, candidates: &[&str], want: &[&str]) {
        let s = scanner(candidates);
        assert_eq!(s.scan(text), want);
    }

    #[test]
    fn test_substring_false_positive_is_accepted() {
        // Documented limitation: containment only, no word boundaries.
        let s = scanner(&["mace"]);
        assert_eq!(s.scan("grimace"), vec!["mace"]);
    }

    #[test]
    fn test_same_length_tie_breaks_lexicographically() {
        let a = scanner(&["bill", "axe2"]);
        let b = scanner(&["axe2", "bill"]);
        assert_eq!(a.candidates(), b.candidates());
        assert_eq!(a.candidates()[0], "axe2");
    }

    #[test]
    fn test_no_overlap_leakage() {
        // No reported match may still be findable as a substring of another
        // reported match's consumed span.
        let s = scanner(&["dane axe", "axe", "dane"]);
        let found = s.scan("the dane axe rules");
        assert_eq!(found, vec!["dane axe"]);
    }

    #[test]
    fn test_match_order_follows_scan_order() {
        let s = scanner(&["axe", "halberd"]);
        // "halberd" is longer, so it is scanned (and reported) first even
        // though "axe" appears earlier in the text.
        assert_eq!(s.scan("axe and halberd"), vec!["halberd", "axe"]);
    }
}
