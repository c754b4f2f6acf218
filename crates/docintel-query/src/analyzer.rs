use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use docintel_core::error::{Error, Result};
use docintel_core::types::{QueryIntent, QueryType};

/// Checked in order; the first intent with a matching pattern wins, so a
/// query that both defines and compares is a `Definition`.
static INTENT_PATTERNS: LazyLock<Vec<(QueryType, Vec<Regex>)>> = LazyLock::new(|| {
    let table: [(QueryType, &[&str]); 7] = [
        (QueryType::Definition, &[r"^what is ", r"^what are ", r"^define ", r"^definition of "]),
        (QueryType::Comparison, &[r"compare ", r"difference between ", r"versus", r" vs ", r"similar to", r"contrast "]),
        (QueryType::Summary, &[r"^summarize ", r"^summary of ", r"give me a summary", r"overview of "]),
        (QueryType::Explanation, &[r"^explain ", r"^how does ", r"^why does ", r"how come", r"reasoning behind"]),
        (QueryType::Listing, &[r"^list ", r"^enumerate ", r"what are all ", r"show me all ", r"give me all "]),
        (QueryType::Procedural, &[r"^how to ", r"^how do i ", r"^steps to ", r"procedure for ", r"process of "]),
        (QueryType::Conceptual, &[r"relationship between", r"how .* relate", r"connection between", r"impact of .* on"]),
    ];
    table
        .into_iter()
        .map(|(qt, patterns)| {
            let compiled: Vec<Regex> = patterns.iter().map(|p| Regex::new(p).expect("intent pattern is valid")).collect();
            (qt, compiled)
        })
        .collect()
});

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex is valid"));
static TITLE_CASE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:-[A-Za-z]+)*(?:\s+[A-Z][a-z]+(?:-[A-Za-z]+)*)*\b").expect("title case regex is valid")
});
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted phrase regex is valid"));

const KEYWORD_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it", "its", "of", "on",
    "that", "the", "to", "was", "will", "with", "what", "when", "where", "who", "why", "how", "can", "could", "would",
    "should", "me", "you", "this", "these",
];

const ENTITY_STOP_WORDS: &[&str] = &[
    "what", "is", "are", "the", "how", "why", "when", "where", "who", "does", "do", "did", "can", "could", "would",
    "should", "a", "an", "compare", "explain", "define", "summarize", "list", "tell", "me", "about", "between", "of",
    "in", "on", "to", "for", "with", "and",
];

/// Classifies queries and extracts the terms used to steer retrieval.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAnalyzer {
    expand: bool,
}

impl QueryAnalyzer {
    pub fn new() -> Self { Self::default() }

    /// Also fill `expanded_query` with an intent-specific suffix.
    pub fn with_expansion(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn analyze(&self, query: &str) -> Result<QueryIntent> {
        if query.trim().is_empty() {
            return Err(Error::invalid_argument("query cannot be empty"));
        }
        let query_type = classify_query_type(query);
        let entities = extract_entities(query);
        let keywords = extract_keywords(query);
        let expanded_query = if self.expand { expand_query(query, query_type) } else { query.to_string() };
        let confidence: f32 = if !entities.is_empty() || keywords.len() > 2 { 1.0 } else { 0.7 };
        debug!(%query_type, keywords = keywords.len(), entities = entities.len(), confidence, "analyzed query");
        Ok(QueryIntent { original_query: query.to_string(), query_type, keywords, entities, expanded_query, confidence })
    }
}

pub fn analyze_query(query: &str) -> Result<QueryIntent> {
    QueryAnalyzer::new().analyze(query)
}

pub fn classify_query_type(query: &str) -> QueryType {
    let q = query.trim().to_lowercase();
    INTENT_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&q)))
        .map(|(qt, _)| *qt)
        .unwrap_or(QueryType::Factual)
}

/// Lowercased terms with punctuation, stop words and tokens of two
/// characters or fewer removed.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    PUNCTUATION
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !KEYWORD_STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Title-case runs and double-quoted phrases, in order of appearance.
pub fn extract_entities(query: &str) -> Vec<String> {
    let runs = TITLE_CASE_RUN.find_iter(query).flat_map(|m| split_on_stop_words(m.as_str()));
    let quoted = QUOTED.captures_iter(query).filter_map(|c| c.get(1)).map(|m| m.as_str().trim().to_string());

    let mut seen = HashSet::new();
    runs.chain(quoted)
        .filter(|e| e.chars().count() > 2)
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

fn is_entity_stop_word(word: &str) -> bool {
    ENTITY_STOP_WORDS.contains(&word.to_lowercase().as_str())
}

/// Break a title-case run wherever a stop word appears, so "Bank Of
/// America" yields "Bank" and "America".
fn split_on_stop_words(run: &str) -> Vec<String> {
    run.split_whitespace()
        .collect::<Vec<_>>()
        .split(|w| is_entity_stop_word(w))
        .filter(|words| !words.is_empty())
        .map(|words| words.join(" "))
        .collect()
}

/// Append an intent-specific hint to widen recall. Factual queries are
/// returned unchanged.
pub fn expand_query(query: &str, query_type: QueryType) -> String {
    let suffix = match query_type {
        QueryType::Definition => "What is the meaning and explanation?",
        QueryType::Comparison => "What are the similarities and differences?",
        QueryType::Summary => "Provide key points and main concepts.",
        QueryType::Explanation => "Include details, reasons, and examples.",
        QueryType::Listing => "Include all relevant items and categories.",
        QueryType::Procedural => "Include steps, methods, and best practices.",
        QueryType::Conceptual => "Include relationships, connections, and implications.",
        QueryType::Factual => return query.to_string(),
    };
    format!("{query} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_trimmed_from_run_edges() {
        assert_eq!(strip_stop_words("Compare Few-Shot").as_deref(), Some("Few-Shot"));
        assert_eq!(strip_stop_words("What"), None);
        assert_eq!(strip_stop_words("Tell Me About Rust"), Some("Rust".to_string()));
    }
}
