//! docintel-rag
//!
//! Prompt construction and answer generation over retrieved chunks, and the
//! end-to-end `DocumentPipeline` (ingest, analyze, retrieve, generate).

pub mod generator;
pub mod pipeline;
pub mod prompts;

pub use generator::{Answer, ContextualGenerator, SourceRef};
pub use pipeline::{DocumentPipeline, IngestReport, PipelineAnswer};
pub use prompts::PromptLibrary;
