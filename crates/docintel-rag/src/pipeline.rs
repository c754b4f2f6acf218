use serde::Serialize;
use std::path::Path;
use tracing::info;

use docintel_core::data_processor::{DataProcessor, ProcessedDocument};
use docintel_core::error::{Error, Result};
use docintel_core::traits::{ChunkStore, TextGenerator, VectorIndex};
use docintel_core::types::{QueryIntent, RetrievalResult};
use docintel_query::QueryAnalyzer;
use docintel_retrieval::Retriever;

use crate::generator::{Answer, ContextualGenerator};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Everything produced while answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineAnswer {
    pub intent: QueryIntent,
    pub results: Vec<RetrievalResult>,
    pub answer: Answer,
}

/// Ingest documents into the retriever's indexes and answer questions
/// against them.
pub struct DocumentPipeline<VI, G> where VI: VectorIndex + ChunkStore, G: TextGenerator {
    processor: DataProcessor,
    analyzer: QueryAnalyzer,
    retriever: Retriever<VI>,
    generator: ContextualGenerator<G>,
}

impl<VI, G> DocumentPipeline<VI, G> where VI: VectorIndex + ChunkStore, G: TextGenerator {
    pub fn new(processor: DataProcessor, retriever: Retriever<VI>, generator: ContextualGenerator<G>) -> Self {
        Self { processor, analyzer: QueryAnalyzer::new(), retriever, generator }
    }

    pub fn with_analyzer(mut self, analyzer: QueryAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn processor(&self) -> &DataProcessor { &self.processor }

    pub fn retriever(&self) -> &Retriever<VI> { &self.retriever }

    pub fn generator(&self) -> &ContextualGenerator<G> { &self.generator }

    /// Clean, chunk and index one document. Returns the number of chunks.
    pub fn ingest_text(&self, content: &str, source: &str) -> Result<usize> {
        let document = self.processor.process_text(content, source);
        self.index_documents(&[document]).map(|r| r.chunks)
    }

    /// Read, chunk and index one file under `data_dir`.
    pub fn ingest_file(&self, file_path: &Path, data_dir: &Path) -> Result<usize> {
        let document = self.processor.process_file(file_path, data_dir)?;
        self.index_documents(&[document]).map(|r| r.chunks)
    }

    pub fn ingest_directory(&self, data_dir: &Path) -> Result<IngestReport> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("data directory {}", data_dir.display())));
        }
        let documents = self.processor.process_directory(data_dir)?;
        self.index_documents(&documents)
    }

    fn index_documents(&self, documents: &[ProcessedDocument]) -> Result<IngestReport> {
        let chunks: Vec<_> = documents.iter().flat_map(|d| d.chunks.iter().cloned()).collect();
        self.retriever.index().add_chunks(&chunks).map_err(Error::external)?;
        if let Some(keyword) = self.retriever.keyword_index() {
            keyword.index(&chunks).map_err(Error::external)?;
        }
        let report = IngestReport { documents: documents.len(), chunks: chunks.len() };
        info!(documents = report.documents, chunks = report.chunks, "ingested");
        Ok(report)
    }

    /// Analyze, retrieve with the intent's strategy and generate an answer.
    /// The intent decides how many chunks are fetched.
    pub fn ask(&self, query: &str) -> Result<PipelineAnswer> {
        let intent = self.analyzer.analyze(query)?;
        let results = self.retriever.retrieve(&intent.expanded_query, None, Some(&intent), None)?;
        self.answer(query, intent, results)
    }

    /// Same as `ask` but retrieves with semantic + keyword fusion.
    pub fn ask_hybrid(&self, query: &str, k: Option<usize>) -> Result<PipelineAnswer> {
        let intent = self.analyzer.analyze(query)?;
        let config = self.retriever.config();
        let results = self.retriever.hybrid_search(&intent.expanded_query, k.unwrap_or(config.default_k), config.semantic_weight)?;
        self.answer(query, intent, results)
    }

    fn answer(&self, query: &str, intent: QueryIntent, results: Vec<RetrievalResult>) -> Result<PipelineAnswer> {
        let answer = self.generator.generate_with_fallback(query, &results, Some(&intent))?;
        info!(query, query_type = %intent.query_type, results = results.len(), confidence = answer.confidence, fallback = answer.fallback_used, "answered");
        Ok(PipelineAnswer { intent, results, answer })
    }
}
