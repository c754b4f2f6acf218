//! docintel-vector
//!
//! In-process vector index with cosine similarity and maximal marginal
//! relevance search, plus a deterministic hashing embedder for offline use
//! and tests.

pub mod embed;
pub mod memory;

pub use embed::HashEmbedder;
pub use memory::MemoryVectorIndex;
