use std::collections::VecDeque;
use std::sync::Mutex;

use docintel_core::config::GenerationConfig;
use docintel_core::traits::TextGenerator;
use docintel_core::types::{ChunkMetadata, QueryType, RetrievalResult};
use docintel_core::Error;
use docintel_query::analyze_query;
use docintel_rag::generator::{confidence, format_context, NO_CONTEXT_ANSWER};
use docintel_rag::{ContextualGenerator, PromptLibrary};

/// Replays scripted replies in order and records every prompt.
#[derive(Default)]
struct ScriptedLlm { replies: Mutex<VecDeque<Result<String, String>>>, prompts: Mutex<Vec<String>> }

impl ScriptedLlm {
    fn new(replies: Vec<Result<&str, &str>>) -> Self {
        let replies = replies.into_iter().map(|r| r.map(str::to_string).map_err(str::to_string)).collect();
        Self { replies: Mutex::new(replies), prompts: Mutex::new(Vec::new()) }
    }
}

impl TextGenerator for &ScriptedLlm {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        match self.replies.lock().expect("replies lock").pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }
}

fn doc(text: &str, chunk_id: usize, score: f32) -> RetrievalResult {
    RetrievalResult { text: text.to_string(), chunk_id: Some(chunk_id), metadata: ChunkMetadata::with_source("guide.txt"), score, rank: 1 }
}

fn generator(llm: &ScriptedLlm) -> ContextualGenerator<&ScriptedLlm> {
    ContextualGenerator::new(llm, PromptLibrary::new(), GenerationConfig::default())
}

#[test]
fn no_documents_skips_the_generator() {
    let llm = ScriptedLlm::default();
    let answer = generator(&llm).generate("anything?", &[], None).expect("generate");
    assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
    assert_eq!(answer.confidence, 0.0);
    assert!(answer.sources.is_empty());
    assert!(llm.prompts.lock().expect("prompts lock").is_empty());
}

#[test]
fn prompt_uses_intent_template_and_citations() {
    let llm = ScriptedLlm::default();
    let generator = generator(&llm);
    let intent = analyze_query("What is tinder?").expect("analyze");
    let docs = vec![doc("Tinder is dry material.", 4, 0.9), doc("It catches sparks.", 5, 0.8)];
    let prompt = generator.build_prompt("What is tinder?", &docs, Some(&intent));
    assert!(prompt.starts_with("You are a dictionary providing clear definitions."));
    assert!(prompt.contains("[Source 1, Chunk 4]\nTinder is dry material.\n\n---\n\n[Source 2, Chunk 5]\nIt catches sparks."));
    assert!(prompt.contains("Question: What is tinder?"));

    let default_prompt = generator.build_prompt("What is tinder?", &docs, None);
    assert!(default_prompt.starts_with("You are a helpful assistant"));
    assert_eq!(format_context(&docs, false), "Tinder is dry material.\n\n---\n\nIt catches sparks.");
}

#[test]
fn answer_carries_sources_and_confidence() {
    let long = "word ".repeat(40);
    let llm = ScriptedLlm::new(vec![Ok(long.as_str())]);
    let docs = vec![doc(&"x".repeat(250), 0, 0.8123), doc("short", 1, 0.6)];
    let answer = generator(&llm).generate("q", &docs, None).expect("generate");
    assert!(!answer.fallback_used);
    assert!((answer.confidence - 0.806_15).abs() < 1e-4);
    assert_eq!(answer.sources.len(), 2);
    assert!((answer.sources[0].score - 0.812).abs() < 1e-6);
    assert_eq!(answer.sources[0].preview.chars().count(), 203);
    assert!(answer.sources[0].preview.ends_with("..."));
    assert_eq!(answer.sources[1].preview, "short");
    assert_eq!(answer.sources[1].source.as_deref(), Some("guide.txt"));
}

#[test]
fn confidence_rules() {
    let docs = vec![doc("a", 0, 0.99), doc("b", 1, 0.99)];
    assert_eq!(confidence("", &docs), 0.3);
    assert_eq!(confidence("I don't know.", &docs), 0.3);
    assert_eq!(confidence("I CANNOT ANSWER that", &docs), 0.3);
    assert!((confidence("Short answer.", &docs) - 0.95).abs() < 1e-6);
    assert!((confidence(&"w ".repeat(31), &docs) - 1.0).abs() < 1e-6);
    assert!((confidence("Short answer.", &[]) - 0.5).abs() < 1e-6);
}

#[test]
fn fallback_retries_once_with_simple_prompt() {
    let llm = ScriptedLlm::new(vec![Err("rate limited"), Ok("  Dry grass.  ")]);
    let docs: Vec<_> = (0..5).map(|i| doc(&format!("chunk {i}"), i, 0.9)).collect();
    let answer = generator(&llm).generate_with_fallback("What is tinder?", &docs, None).expect("fallback");
    assert_eq!(answer.answer, "Dry grass.");
    assert!(answer.fallback_used);
    assert!((answer.confidence - 0.6).abs() < 1e-6);
    assert_eq!(answer.sources.len(), 5);

    let prompts = llm.prompts.lock().expect("prompts lock");
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1], "Context: chunk 0\n\nchunk 1\n\nchunk 2\n\nQuestion: What is tinder?\n\nAnswer:");
}

#[test]
fn second_failure_propagates() {
    let llm = ScriptedLlm::new(vec![Err("down"), Err("still down")]);
    let err = generator(&llm).generate_with_fallback("q", &[doc("a", 0, 0.5)], None).expect_err("should fail");
    assert!(matches!(err, Error::ExternalService(_)));
    assert_eq!(err.to_string(), "still down");
}

#[test]
fn prompt_library_overrides_from_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prompts.toml");
    std::fs::write(&path, "[templates]\ndefinition = \"DEF {context} :: {question}\"\ndefault = \"ANY {question} {context}\"\n").expect("write");
    let library = PromptLibrary::from_toml(&path).expect("load");
    assert_eq!(library.render(Some(QueryType::Definition), "ctx {question}", "q?"), "DEF ctx {question} :: q?");
    assert_eq!(library.render(None, "ctx", "q?"), "ANY q? ctx");
    assert!(library.template(Some(QueryType::Listing)).starts_with("You are an assistant creating comprehensive lists."));

    std::fs::write(&path, "[templates]\nsummary = \"no slots\"\n").expect("write");
    assert!(matches!(PromptLibrary::from_toml(&path), Err(Error::InvalidConfig(_))));
    std::fs::write(&path, "[templates]\npoetry = \"{context} {question}\"\n").expect("write");
    assert!(matches!(PromptLibrary::from_toml(&path), Err(Error::InvalidConfig(_))));
    assert!(matches!(PromptLibrary::from_toml(dir.path().join("missing.toml")), Err(Error::NotFound(_))));
}
