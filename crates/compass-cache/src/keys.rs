//! Deterministic cache keys and category TTLs.
//!
//! Every key follows the `category:part1:part2...` convention so categories
//! never collide. Free-form content (query text, embedding input) is
//! normalized and digested before it becomes a key part.

use sha2::{Digest as _, Sha256};
use std::time::Duration;

/// Cache categories with their fixed TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Result sets of executed queries.
    QueryResult,
    /// Per-conversation context objects.
    ConversationContext,
    /// Rendered greeting text.
    Greeting,
    /// Generated reports with dependency lists.
    Report,
    /// Text embeddings.
    Embedding,
    /// Chart configuration payloads.
    ChartConfig,
    /// Routing decisions.
    Route,
}

impl CacheCategory {
    /// Key prefix for this category.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::QueryResult => "query",
            Self::ConversationContext => "context",
            Self::Greeting => "greeting",
            Self::Report => "report",
            Self::Embedding => "embedding",
            Self::ChartConfig => "chart",
            Self::Route => "route",
        }
    }

    /// Time-to-live applied to entries of this category.
    #[must_use]
    pub const fn ttl(self) -> Duration {
        match self {
            Self::QueryResult => Duration::from_secs(60 * 60),
            Self::ConversationContext => Duration::from_secs(24 * 60 * 60),
            Self::Greeting => Duration::from_secs(7 * 24 * 60 * 60),
            Self::Report => Duration::from_secs(4 * 60 * 60),
            Self::Embedding => Duration::from_secs(30 * 24 * 60 * 60),
            Self::ChartConfig => Duration::from_secs(2 * 60 * 60),
            Self::Route => Duration::from_secs(15 * 60),
        }
    }
}

/// Builds a namespaced key from a category and its discriminators.
#[must_use]
pub fn cache_key(category: CacheCategory, discriminators: &[&str]) -> String {
    let mut key = category.prefix().to_owned();
    for part in discriminators {
        key.push(':');
        key.push_str(part);
    }
    key
}

/// Hex digest of normalized content parts.
///
/// Normalization lowercases and collapses internal whitespace so
/// insignificant formatting differences hit the same entry.
#[must_use]
pub fn content_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(normalize(part).as_bytes());
        hasher.update([0]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    // 8 bytes of digest is plenty for key dispersion and keeps keys short.
    for byte in digest.iter().take(8) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = cache_key(CacheCategory::Greeting, &["user-1", "morning"]);
        assert_eq!(key, "greeting:user-1:morning");
    }

    #[test]
    fn test_digest_is_deterministic() {
        let one = content_digest(&["Show me top 5 suppliers", "sales_db"]);
        let two = content_digest(&["Show me top 5 suppliers", "sales_db"]);
        assert_eq!(one, two);
        assert_eq!(one.len(), 16);
    }

    #[test]
    fn test_digest_normalizes_whitespace_and_case() {
        let one = content_digest(&["Show  me   Top 5 SUPPLIERS"]);
        let two = content_digest(&["show me top 5 suppliers"]);
        assert_eq!(one, two);
    }

    #[test]
    fn test_digest_part_boundaries_matter() {
        // "ab" + "c" must not collide with "a" + "bc".
        let one = content_digest(&["ab", "c"]);
        let two = content_digest(&["a", "bc"]);
        assert_ne!(one, two);
    }

    #[test]
    fn test_category_ttls() {
        assert_eq!(CacheCategory::QueryResult.ttl(), Duration::from_secs(3_600));
        assert_eq!(
            CacheCategory::Embedding.ttl(),
            Duration::from_secs(2_592_000)
        );
        assert!(CacheCategory::Route.ttl() < CacheCategory::QueryResult.ttl());
    }
}
