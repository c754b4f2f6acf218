use std::fs;

use docintel_core::config::{GenerationConfig, RetrievalConfig};
use docintel_core::data_processor::DataProcessor;
use docintel_core::traits::TextGenerator;
use docintel_core::types::QueryType;
use docintel_core::{Chunker, Error};
use docintel_rag::{ContextualGenerator, DocumentPipeline, PromptLibrary};
use docintel_retrieval::Retriever;
use docintel_text::TantivyKeywordIndex;
use docintel_vector::{HashEmbedder, MemoryVectorIndex};

struct CannedLlm;

impl TextGenerator for CannedLlm {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        anyhow::ensure!(prompt.contains("Context:"), "prompt without context");
        Ok("Tinder is any dry material that catches a spark.".to_string())
    }
}

fn pipeline(with_keywords: bool) -> DocumentPipeline<MemoryVectorIndex, CannedLlm> {
    let processor = DataProcessor::new(Chunker::from_name(200, 0, "paragraph").expect("chunker")).with_cleaner(None);
    let mut retriever = Retriever::new(MemoryVectorIndex::new(Box::new(HashEmbedder::default())), RetrievalConfig::default());
    if with_keywords {
        retriever = retriever.with_keyword_index(Box::new(TantivyKeywordIndex::in_memory().expect("keyword index")));
    }
    let generator = ContextualGenerator::new(CannedLlm, PromptLibrary::new(), GenerationConfig::default());
    DocumentPipeline::new(processor, retriever, generator)
}

fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("fire.txt"), "Tinder catches a spark.\n\nKindling feeds the flame.").expect("write");
    fs::create_dir(dir.path().join("water")).expect("mkdir");
    fs::write(dir.path().join("water/storage.txt"), "Rain barrels store water.\n\nBoil water before drinking.").expect("write");
    fs::write(dir.path().join("notes.md"), "not ingested").expect("write");
    dir
}

#[test]
fn ingest_then_ask() {
    let dir = data_dir();
    let pipeline = pipeline(false);
    let report = pipeline.ingest_directory(dir.path()).expect("ingest");
    assert_eq!((report.documents, report.chunks), (2, 4));

    let out = pipeline.ask("List tinder that catches a spark").expect("ask");
    assert_eq!(out.intent.query_type, QueryType::Listing);
    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0].text, "Tinder catches a spark.");
    assert_eq!(out.results[0].rank, 1);
    assert_eq!(out.answer.answer, "Tinder is any dry material that catches a spark.");
    assert_eq!(out.answer.sources[0].source.as_deref(), Some("fire.txt"));
    assert!(!out.answer.fallback_used);
}

#[test]
fn hybrid_ask_uses_keyword_index() {
    let dir = data_dir();
    let pipeline = pipeline(true);
    pipeline.ingest_directory(dir.path()).expect("ingest");
    let out = pipeline.ask_hybrid("tinder", Some(2)).expect("ask");
    assert_eq!(out.results.len(), 2);
    assert_eq!(out.results[0].text, "Tinder catches a spark.");
    assert!(out.results[0].score > out.results[1].score);
}

#[test]
fn ingest_text_counts_chunks() {
    let pipeline = pipeline(false);
    assert_eq!(pipeline.ingest_text("One.\n\nTwo.\n\nThree.", "inline").expect("ingest"), 3);
    assert_eq!(pipeline.ingest_text("   ", "blank").expect("ingest"), 0);
}

#[test]
fn bad_inputs_are_reported() {
    let pipeline = pipeline(false);
    let missing = tempfile::tempdir().expect("tempdir").path().join("nope");
    assert!(matches!(pipeline.ingest_directory(&missing), Err(Error::NotFound(_))));
    assert!(matches!(pipeline.ask("  "), Err(Error::InvalidArgument(_))));
}

#[test]
fn unanswerable_question_gets_canned_reply() {
    let pipeline = pipeline(false);
    let out = pipeline.ask("What is tinder?").expect("ask");
    assert!(out.results.is_empty());
    assert_eq!(out.answer.confidence, 0.0);
}

#[test]
fn ingest_file_accepts_invalid_utf8() {
    let dir = data_dir();
    fs::write(dir.path().join("latin1.txt"), b"Caf\xE9 stove notes.\n\nTinder stays dry in tins.").expect("write");
    let pipeline = pipeline(false);
    let files = pipeline.processor().list_txt_files(dir.path());
    assert_eq!(files.len(), 3);
    let chunks: usize = files.iter().map(|f| pipeline.ingest_file(f, dir.path()).expect("ingest")).sum();
    assert_eq!(chunks, 6);
    assert_eq!(pipeline.retriever().index().len(), 6);
}
