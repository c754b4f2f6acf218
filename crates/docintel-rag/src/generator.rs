use serde::Serialize;
use tracing::{debug, warn};

use docintel_core::config::GenerationConfig;
use docintel_core::error::{Error, Result};
use docintel_core::traits::TextGenerator;
use docintel_core::types::{QueryIntent, RetrievalResult};

use crate::prompts::PromptLibrary;

pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information to answer your question.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
const UNSURE_CONFIDENCE: f32 = 0.3;
const FALLBACK_CONFIDENCE: f32 = 0.6;
const MAX_RETRIEVAL_CONFIDENCE: f32 = 0.95;
const LONG_ANSWER_WORDS: usize = 30;
const LONG_ANSWER_BONUS: f32 = 0.1;

/// Citation for one chunk that fed an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub chunk_id: Option<usize>,
    pub score: f32,
    pub preview: String,
    pub source: Option<String>,
    pub page: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub confidence: f32,
    pub fallback_used: bool,
}

/// Formats retrieved chunks into an intent-specific prompt and hands it to
/// a `TextGenerator`.
pub struct ContextualGenerator<G> where G: TextGenerator {
    llm: G,
    prompts: PromptLibrary,
    config: GenerationConfig,
}

impl<G> ContextualGenerator<G> where G: TextGenerator {
    pub fn new(llm: G, prompts: PromptLibrary, config: GenerationConfig) -> Self { Self { llm, prompts, config } }

    pub fn prompts(&self) -> &PromptLibrary { &self.prompts }

    pub fn build_prompt(&self, query: &str, docs: &[RetrievalResult], intent: Option<&QueryIntent>) -> String {
        let context = format_context(docs, self.config.include_citations);
        self.prompts.render(intent.map(|i| i.query_type), &context, query)
    }

    /// Answer `query` from `docs`. With no documents the canned answer is
    /// returned without calling the generator.
    pub fn generate(&self, query: &str, docs: &[RetrievalResult], intent: Option<&QueryIntent>) -> Result<Answer> {
        if docs.is_empty() {
            return Ok(Answer { answer: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new(), confidence: 0.0, fallback_used: false });
        }
        let prompt = self.build_prompt(query, docs, intent);
        debug!(prompt_chars = prompt.len(), docs = docs.len(), "generating answer");
        let raw = self.llm.generate(&prompt).map_err(Error::external)?;
        let answer = raw.trim().to_string();
        let confidence = confidence(&answer, docs);
        Ok(Answer { answer, sources: self.sources(docs), confidence, fallback_used: false })
    }

    /// Like `generate`, but a generator failure is retried once with a bare
    /// prompt over the first few documents. A second failure is returned.
    pub fn generate_with_fallback(&self, query: &str, docs: &[RetrievalResult], intent: Option<&QueryIntent>) -> Result<Answer> {
        match self.generate(query, docs, intent) {
            Err(e) if e.is_external() => {
                warn!(error = %e, "generation failed, retrying with simple prompt");
                let prompt = self.simple_prompt(query, docs);
                let raw = self.llm.generate(&prompt).map_err(Error::external)?;
                Ok(Answer {
                    answer: raw.trim().to_string(),
                    sources: self.sources(docs),
                    confidence: FALLBACK_CONFIDENCE,
                    fallback_used: true,
                })
            }
            other => other,
        }
    }

    pub fn simple_prompt(&self, query: &str, docs: &[RetrievalResult]) -> String {
        let context: Vec<&str> = docs.iter().take(self.config.fallback_context_chunks).map(|d| d.text.as_str()).collect();
        format!("Context: {}\n\nQuestion: {query}\n\nAnswer:", context.join("\n\n"))
    }

    fn sources(&self, docs: &[RetrievalResult]) -> Vec<SourceRef> {
        docs.iter()
            .map(|d| SourceRef {
                chunk_id: d.chunk_id,
                score: (d.score * 1000.0).round() / 1000.0,
                preview: preview(&d.text, self.config.preview_chars),
                source: d.metadata.source.clone(),
                page: d.metadata.extra.get("page").cloned(),
                section: d.metadata.extra.get("section").cloned(),
            })
            .collect()
    }
}

/// `[Source i, Chunk c]` headed blocks separated by rules. Without
/// citations only the texts are joined.
pub fn format_context(docs: &[RetrievalResult], include_citations: bool) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, d)| {
            if include_citations {
                let chunk = d.chunk_id.unwrap_or(i + 1);
                format!("[Source {}, Chunk {chunk}]\n{}", i + 1, d.text)
            } else {
                d.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn confidence(answer: &str, docs: &[RetrievalResult]) -> f32 {
    let lowered = answer.to_lowercase();
    if answer.trim().is_empty() || lowered.contains("don't know") || lowered.contains("cannot answer") {
        return UNSURE_CONFIDENCE;
    }
    let mut confidence = if docs.is_empty() {
        0.5
    } else {
        let avg = docs.iter().map(|d| d.score).sum::<f32>() / docs.len() as f32;
        avg.min(MAX_RETRIEVAL_CONFIDENCE)
    };
    if answer.split_whitespace().count() > LONG_ANSWER_WORDS {
        confidence += LONG_ANSWER_BONUS;
    }
    confidence.min(1.0)
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
