use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

use docintel_core::clean::TextCleaner;
use docintel_core::config::{expand_path, ChunkingConfig, Config};
use docintel_core::data_processor::DataProcessor;
use docintel_core::types::{ChunkMetadata, ChunkStrategy, MetadataFilter};

fn paragraph_processor() -> DataProcessor {
    DataProcessor::from_config(ChunkingConfig { chunk_size: 400, chunk_overlap: 0, strategy: ChunkStrategy::Paragraph })
        .expect("processor")
}

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text that survives cleaning").unwrap();

    let docs = paragraph_processor().process_directory(dir).expect("process");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(docs[0].chunks[0].text, "Short text that survives cleaning");
    assert_eq!(docs[0].chunks[0].metadata.source.as_deref(), Some("a.txt"));
}

#[test]
fn process_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo charlie").unwrap();
    fs::write(dir.join("b.txt"), "delta echo foxtrot").unwrap();
    fs::write(dir.join("notes.md"), "ignored markdown file").unwrap();

    let docs = paragraph_processor().process_directory_limited(dir, 1).expect("process limited");

    assert_eq!(docs.len(), 1, "limited to one source document");
    assert_eq!(docs[0].source, "a.txt");
}

#[test]
fn nested_files_keep_relative_source_names() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("guides").join("prompting");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("intro.txt"), "Prompt engineering basics explained.").unwrap();

    let docs = paragraph_processor().process_directory(tmp.path()).expect("process");
    let source = docs[0].chunks[0].metadata.source.clone().expect("source");
    assert!(source.ends_with("intro.txt"));
    assert!(source.starts_with("guides"));
}

#[test]
fn raw_mode_skips_cleaning() {
    let processor = paragraph_processor().with_cleaner(None);
    let doc = processor.process_text("Visit https://example.com now", "raw.txt");
    assert!(doc.chunks[0].text.contains("https://example.com"));

    let cleaned = paragraph_processor().with_cleaner(Some(TextCleaner { min_line_length: 0, ..TextCleaner::default() }));
    let doc = cleaned.process_text("Visit https://example.com now", "clean.txt");
    assert!(!doc.chunks[0].text.contains("https://"));
}

#[test]
fn config_merges_files_and_environment() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                [chunking]
                chunk_size = 600
                strategy = "semantic"

                [retrieval]
                default_k = 7
            "#,
        )?;
        jail.create_file("config.test.toml", "[retrieval]\nuse_reranking = false\n")?;
        jail.set_env("RUST_ENV", "test");
        jail.set_env("APP_CHUNKING__CHUNK_OVERLAP", "60");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.chunking.chunk_size, 600);
        assert_eq!(settings.chunking.chunk_overlap, 60);
        assert_eq!(settings.chunking.strategy, ChunkStrategy::Semantic);
        assert_eq!(settings.retrieval.default_k, 7);
        assert!(!settings.retrieval.use_reranking);
        assert!((settings.retrieval.semantic_weight - 0.7).abs() < 1e-6, "untouched fields keep defaults");
        let k: usize = config.get("retrieval.default_k").map_err(|e| e.to_string())?;
        assert_eq!(k, 7);
        Ok(())
    });
}

#[test]
fn config_rejects_overlap_not_smaller_than_size() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n")?;
        jail.set_env("RUST_ENV", "prod");
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn expand_path_substitutes_environment_variables() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("DOCINTEL_DATA_ROOT", "/srv/docintel");
        assert_eq!(expand_path("${DOCINTEL_DATA_ROOT}/txt"), PathBuf::from("/srv/docintel/txt"));
        assert_eq!(expand_path("data/txt"), PathBuf::from("data/txt"));
        assert_eq!(expand_path("$DOCINTEL_UNSET_VARIABLE/txt"), PathBuf::from("$DOCINTEL_UNSET_VARIABLE/txt"));
        Ok(())
    });
}

#[test]
fn process_file_replaces_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let file_path = tmp.path().join("menu.txt");
    fs::write(&file_path, b"caf\xFF menu items").unwrap();
    let processor = paragraph_processor().with_cleaner(None);

    let doc = processor.process_file(&file_path, tmp.path()).expect("lossy read");
    assert_eq!(doc.source, "menu.txt");
    assert_eq!(doc.chunks[0].text, "caf\u{FFFD} menu items");
    assert_eq!(processor.list_txt_files(tmp.path()), vec![file_path]);
}

#[test]
fn metadata_filter_matches_known_and_extra_fields() {
    let metadata = ChunkMetadata { position: Some(0.5), ..ChunkMetadata::with_source("a.txt").with_extra("page", "3") };
    assert_eq!(metadata.get("position").as_deref(), Some("0.5"));
    let filter: MetadataFilter = [("position", "0.5"), ("source", "a.txt"), ("page", "3")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert!(metadata.matches(&filter));
    let miss: MetadataFilter = [("position".to_string(), "0.25".to_string())].into_iter().collect();
    assert!(!metadata.matches(&miss));
}
