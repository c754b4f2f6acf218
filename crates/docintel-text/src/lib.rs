//! docintel-text
//!
//! Tantivy-backed BM25 keyword index over chunk text. Used by the retriever
//! for hybrid search.

pub mod tantivy_utils;
pub mod index;

pub use index::TantivyKeywordIndex;
