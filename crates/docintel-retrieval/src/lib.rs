//! docintel-retrieval
//!
//! Intent-aware retrieval over a `VectorIndex`: strategy resolution,
//! heuristic re-ranking, hybrid semantic + keyword fusion and neighbouring
//! context expansion. `metrics` grades result lists and chunk sets.

pub mod metrics;
pub mod retriever;

pub use metrics::{chunk_statistics, retrieval_metrics, ChunkStatistics, QualityGrade, RetrievalMetrics};
pub use retriever::{rerank, Retriever};
