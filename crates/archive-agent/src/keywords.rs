//! Keyword extraction for corpus search predicates and intent signals.
//!
//! No stemming and no ranking. First-occurrence order is preserved so the
//! strongest user-chosen term leads the search predicate.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "in", "on", "at", "to", "for", "of", "and",
    "or", "but", "with", "from", "by", "as", "how", "what", "where", "when", "why", "which",
    "who", "i", "you", "me", "my", "your", "about", "tell", "have", "do", "does", "did", "can",
    "could", "would", "should", "there", "their", "this", "that", "these", "those", "want",
    "like", "know", "some", "any", "more", "into", "kind", "after", "before",
];

/// Extract deduplicated lowercase keywords longer than three characters,
/// with stop words removed. Deterministic and side-effect-free.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in text.to_lowercase().split_whitespace() {
        let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
        if clean.len() <= 3 || STOP_WORDS.contains(&clean) {
            continue;
        }
        if seen.insert(clean.to_string()) {
            keywords.push(clean.to_string());
        }
    }

    keywords
}
