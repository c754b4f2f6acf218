use docintel_core::types::{QueryIntent, QueryType, RetrievalStrategy, SearchMode};

/// Retrieval hints for an intent. The retriever treats these as defaults,
/// not limits.
pub fn strategy_for(query_type: QueryType) -> RetrievalStrategy {
    let (k, mode, score_threshold) = match query_type {
        QueryType::Factual => (3, SearchMode::Similarity, 0.7),
        QueryType::Comparison => (6, SearchMode::Diversity, 0.6),
        QueryType::Summary => (8, SearchMode::Similarity, 0.65),
        QueryType::Explanation => (5, SearchMode::Similarity, 0.7),
        QueryType::Listing => (10, SearchMode::Diversity, 0.5),
        QueryType::Procedural => (5, SearchMode::Similarity, 0.75),
        QueryType::Conceptual => (6, SearchMode::Diversity, 0.6),
        // precise answers need few, highly relevant chunks
        QueryType::Definition => (2, SearchMode::Similarity, 0.8),
    };
    RetrievalStrategy { k, mode, score_threshold }
}

pub fn suggest_strategy(intent: &QueryIntent) -> RetrievalStrategy {
    strategy_for(intent.query_type)
}
