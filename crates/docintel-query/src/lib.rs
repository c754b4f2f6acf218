//! docintel-query
//!
//! Pattern-based query intent classification, keyword and entity extraction,
//! and per-intent retrieval hints.

pub mod analyzer;
pub mod strategy;

pub use analyzer::{analyze_query, classify_query_type, expand_query, extract_entities, extract_keywords, QueryAnalyzer};
pub use strategy::{strategy_for, suggest_strategy};
