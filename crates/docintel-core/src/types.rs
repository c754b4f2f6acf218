//! Domain types shared by the chunker, the query analyzer, the indexes and
//! the retriever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type Meta = BTreeMap<String, String>;

/// Key/value constraints applied to chunk metadata at search time.
pub type MetadataFilter = BTreeMap<String, String>;

/// How a text is split into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    #[default]
    Recursive,
    Semantic,
    Sentence,
    Paragraph,
}

impl ChunkStrategy {
    pub const ALL: [ChunkStrategy; 4] = [Self::Recursive, Self::Semantic, Self::Sentence, Self::Paragraph];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Semantic => "semantic",
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ChunkStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "semantic" => Ok(Self::Semantic),
            "sentence" => Ok(Self::Sentence),
            "paragraph" => Ok(Self::Paragraph),
            other => Err(Error::invalid_argument(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

/// Metadata attached to every chunk.
///
/// Well-known fields are typed; anything strategy or caller specific goes
/// into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ChunkStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Meta,
}

impl ChunkMetadata {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self { source: Some(source.into()), ..Self::default() }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a field by name, known fields first, then extras.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "source" => self.source.clone(),
            "strategy" => self.strategy.map(|s| s.as_str().to_string()),
            "chunk_size" => self.chunk_size.map(|v| v.to_string()),
            "token_count" => self.token_count.map(|v| v.to_string()),
            "total_chunks" => self.total_chunks.map(|v| v.to_string()),
            "position" => self.position.map(|v| v.to_string()),
            _ => self.extra.get(key).cloned(),
        }
    }

    pub fn matches(&self, filter: &MetadataFilter) -> bool {
        filter.iter().all(|(k, v)| self.get(k).as_deref() == Some(v.as_str()))
    }
}

/// A contiguous span of a source text, prepared for embedding.
///
/// `start..end` are byte offsets into the chunked text and `text` is exactly
/// that slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub token_count: usize,
    pub metadata: ChunkMetadata,
}

/// Purpose of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Factual,
    Comparison,
    Summary,
    Explanation,
    Listing,
    Procedural,
    Conceptual,
    Definition,
}

impl QueryType {
    pub const ALL: [QueryType; 8] = [
        Self::Factual,
        Self::Comparison,
        Self::Summary,
        Self::Explanation,
        Self::Listing,
        Self::Procedural,
        Self::Conceptual,
        Self::Definition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Factual => "factual",
            Self::Comparison => "comparison",
            Self::Summary => "summary",
            Self::Explanation => "explanation",
            Self::Listing => "listing",
            Self::Procedural => "procedural",
            Self::Conceptual => "conceptual",
            Self::Definition => "definition",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Result of analysing one query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub original_query: String,
    pub query_type: QueryType,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub expanded_query: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Similarity,
    /// Maximal marginal relevance.
    Diversity,
}

/// Retrieval hints derived from a query intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStrategy {
    pub k: usize,
    pub mode: SearchMode,
    pub score_threshold: f32,
}

/// Indicates which engine produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Keyword,
}

/// The minimal surface returned by all indexes. `score` is higher-is-better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub chunk_id: Option<usize>,
    pub metadata: ChunkMetadata,
    pub score: f32,
    pub source: SourceKind,
}

impl SearchHit {
    /// Build a vector hit from a distance where `0.0` means identical.
    pub fn from_distance(text: impl Into<String>, chunk_id: Option<usize>, metadata: ChunkMetadata, distance: f32) -> Self {
        Self { text: text.into(), chunk_id, metadata, score: 1.0 - distance, source: SourceKind::Vector }
    }
}

/// One retrieved chunk with its current score and 1-based rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub chunk_id: Option<usize>,
    pub metadata: ChunkMetadata,
    pub score: f32,
    pub rank: usize,
}

impl RetrievalResult {
    pub fn from_hit(hit: SearchHit, rank: usize) -> Self {
        Self { text: hit.text, chunk_id: hit.chunk_id, metadata: hit.metadata, score: hit.score, rank }
    }
}
