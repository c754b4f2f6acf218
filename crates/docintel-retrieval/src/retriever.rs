use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use docintel_core::config::RetrievalConfig;
use docintel_core::error::{Error, Result};
use docintel_core::traits::{KeywordIndex, VectorIndex};
use docintel_core::types::{MetadataFilter, QueryIntent, RetrievalResult, SearchHit, SearchMode};
use docintel_query::suggest_strategy;

/// Candidates fetched per requested result in diversity mode.
pub const DIVERSITY_FETCH_FACTOR: usize = 3;
pub const DIVERSITY_LAMBDA: f32 = 0.5;

const KEYWORD_BOOST: f32 = 0.05;
const ENTITY_BOOST: f32 = 0.1;
const POSITION_BOOST: f32 = 0.1;
const POSITION_DECAY: f32 = 0.01;

/// Characters of text used to recognise the same chunk across result lists.
const DEDUP_PREFIX_CHARS: usize = 100;

pub struct Retriever<VI> where VI: VectorIndex {
    index: VI,
    keyword: Option<Box<dyn KeywordIndex>>,
    config: RetrievalConfig,
}

impl<VI> Retriever<VI> where VI: VectorIndex {
    pub fn new(index: VI, config: RetrievalConfig) -> Self { Self { index, keyword: None, config } }

    /// Use a real lexical index for the keyword half of `hybrid_search`.
    pub fn with_keyword_index(mut self, keyword: Box<dyn KeywordIndex>) -> Self {
        self.keyword = Some(keyword);
        self
    }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    pub fn index(&self) -> &VI { &self.index }

    pub fn keyword_index(&self) -> Option<&dyn KeywordIndex> { self.keyword.as_deref() }

    /// Fetch, filter and re-rank chunks for `query`.
    ///
    /// With an intent, `k`, mode and score threshold all come from its
    /// suggested strategy. Without one, the explicit `k` or `default_k` is used.
    pub fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
        intent: Option<&QueryIntent>,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        let strategy = intent.map(suggest_strategy);
        let (k, mode, threshold) = match strategy {
            Some(s) => (s.k, s.mode, s.score_threshold),
            None if self.config.diversity_enabled => (k.unwrap_or(self.config.default_k), SearchMode::Diversity, 0.0),
            None => (k.unwrap_or(self.config.default_k), SearchMode::Similarity, 0.0),
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = match mode {
            SearchMode::Similarity => self.index.similarity_search(query, k, filters),
            SearchMode::Diversity => {
                self.index.diversity_search(query, k, k * DIVERSITY_FETCH_FACTOR, DIVERSITY_LAMBDA, filters)
            }
        }
        .map_err(Error::external)?;
        let fetched = hits.len();

        let mut results: Vec<RetrievalResult> = hits
            .into_iter()
            .take(k)
            .filter(|h| h.score >= threshold)
            .enumerate()
            .map(|(i, h)| RetrievalResult::from_hit(h, i + 1))
            .collect();

        if self.config.use_reranking && results.len() > 1 {
            rerank(&mut results, intent);
        } else {
            sort_and_rank(&mut results);
        }
        debug!(query, k, ?mode, threshold, fetched, kept = results.len(), "retrieved");
        Ok(results)
    }

    /// Weighted fusion of semantic and keyword retrieval. Each list is
    /// normalised by its own best score before combining; chunks are matched
    /// across lists by their leading text, and each list contributes at most
    /// one term per chunk.
    pub fn hybrid_search(&self, query: &str, k: usize, semantic_weight: f32) -> Result<Vec<RetrievalResult>> {
        if !(0.0..=1.0).contains(&semantic_weight) {
            return Err(Error::invalid_argument(format!("semantic_weight must be within [0, 1], got {semantic_weight}")));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let fetch = k * 2;
        let semantic = self.retrieve(query, Some(fetch), None, None)?;
        let keyword = match &self.keyword {
            Some(kw) => kw
                .search(query, fetch)
                .map_err(Error::external)?
                .into_iter()
                .enumerate()
                .map(|(i, h)| RetrievalResult::from_hit(h, i + 1))
                .collect(),
            None => semantic.clone(),
        };

        let keyword_weight = 1.0 - semantic_weight;
        let mut combined: HashMap<String, f32> = HashMap::new();
        for (list, weight) in [(&semantic, semantic_weight), (&keyword, keyword_weight)] {
            let max = list.iter().map(|r| r.score).fold(f32::NEG_INFINITY, f32::max);
            let mut best: HashMap<String, f32> = HashMap::new();
            for r in list.iter() {
                let normalized = if max > 0.0 { r.score / max } else { 0.0 };
                let entry = best.entry(prefix_key(&r.text)).or_insert(0.0);
                *entry = entry.max(normalized);
            }
            for (key, normalized) in best {
                *combined.entry(key).or_insert(0.0) += normalized * weight;
            }
        }

        let mut seen = HashSet::new();
        let mut merged: Vec<RetrievalResult> = semantic
            .into_iter()
            .chain(keyword)
            .filter_map(|mut r| {
                let key = prefix_key(&r.text);
                if !seen.insert(key.clone()) {
                    return None;
                }
                r.score = combined.get(&key).copied().unwrap_or(0.0);
                Some(r)
            })
            .collect();
        sort_and_rank(&mut merged);
        merged.truncate(k);
        debug!(query, k, semantic_weight, lexical = self.keyword.is_some(), results = merged.len(), "hybrid search");
        Ok(merged)
    }

    /// Retrieve, then widen each hit with up to `window` neighbouring chunks
    /// of the same source on either side.
    pub fn retrieve_with_context(&self, query: &str, k: Option<usize>, window: usize) -> Result<Vec<RetrievalResult>> {
        let mut results = self.retrieve(query, k, None, None)?;
        if window == 0 {
            return Ok(results);
        }
        for result in &mut results {
            let (Some(chunk_id), Some(source)) = (result.chunk_id, result.metadata.source.clone()) else { continue };
            let neighbours = self.index.neighbors(&source, chunk_id, window).map_err(Error::external)?;
            if neighbours.is_empty() {
                continue;
            }
            result.text = join_texts(&neighbours);
            result.metadata.extra.insert("expanded_context".into(), "true".into());
        }
        Ok(results)
    }
}

/// Boost scores by keyword, entity and position signals, then re-sort and
/// re-rank in place.
pub fn rerank(results: &mut [RetrievalResult], intent: Option<&QueryIntent>) {
    for r in results.iter_mut() {
        let mut boost = 0.0;
        if let Some(intent) = intent {
            let text = r.text.to_lowercase();
            let keyword_matches = intent.keywords.iter().filter(|kw| text.contains(&kw.to_lowercase())).count();
            let entity_matches = intent.entities.iter().filter(|e| text.contains(&e.to_lowercase())).count();
            boost += keyword_matches as f32 * KEYWORD_BOOST + entity_matches as f32 * ENTITY_BOOST;
        }
        boost += position_boost(r.chunk_id);
        r.score += boost;
    }
    sort_and_rank(results);
}

fn position_boost(chunk_id: Option<usize>) -> f32 {
    chunk_id.map_or(0.0, |id| (POSITION_BOOST - id as f32 * POSITION_DECAY).max(0.0))
}

/// Stable sort by descending score and assign ranks 1..N.
fn sort_and_rank(results: &mut [RetrievalResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    for (i, r) in results.iter_mut().enumerate() {
        r.rank = i + 1;
    }
}

fn prefix_key(text: &str) -> String { text.chars().take(DEDUP_PREFIX_CHARS).collect() }

fn join_texts(hits: &[SearchHit]) -> String {
    hits.iter().map(|h| h.text.as_str()).collect::<Vec<_>>().join("\n\n")
}
