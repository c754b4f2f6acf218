use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chunker::Chunker;
use crate::clean::TextCleaner;
use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, ChunkMetadata};

/// Chunks of one source document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub source: String,
    pub char_count: usize,
    pub chunks: Vec<Chunk>,
}

/// Turns `.txt` files into cleaned, chunked documents.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    chunker: Chunker,
    cleaner: Option<TextCleaner>,
}

impl DataProcessor {
    pub fn new(chunker: Chunker) -> Self { Self { chunker, cleaner: Some(TextCleaner::default()) } }

    pub fn from_config(config: ChunkingConfig) -> Result<Self> { Ok(Self::new(Chunker::new(config)?)) }

    /// Replace the cleaner; `None` chunks raw text.
    pub fn with_cleaner(mut self, cleaner: Option<TextCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn chunker(&self) -> &Chunker { &self.chunker }

    pub fn process_text(&self, content: &str, source: &str) -> ProcessedDocument {
        let text = match &self.cleaner {
            Some(cleaner) => cleaner.clean(content),
            None => content.to_string(),
        };
        let base = ChunkMetadata::with_source(source).with_extra("format", "txt");
        let chunks = self.chunker.chunk(&text, Some(&base));
        debug!(source, chars = text.len(), chunks = chunks.len(), "processed document");
        ProcessedDocument { source: source.to_string(), char_count: text.chars().count(), chunks }
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<ProcessedDocument>> {
        self.process_files(data_dir, self.list_txt_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<ProcessedDocument>> {
        let mut files = self.list_txt_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "limited to first files");
        }
        self.process_files(data_dir, files)
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<ProcessedDocument>> {
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            documents.push(self.process_file(file_path, data_dir)?);
        }
        let total: usize = documents.iter().map(|d| d.chunks.len()).sum();
        info!(files = documents.len(), chunks = total, "processed directory");
        Ok(documents)
    }

    /// Read one file (invalid UTF-8 is replaced, not rejected) and chunk it.
    /// The source name is the path relative to `data_dir`.
    pub fn process_file(&self, file_path: &Path, data_dir: &Path) -> Result<ProcessedDocument> {
        let content = self.read_file_content(file_path)?;
        let source = self.source_name(file_path, data_dir);
        Ok(self.process_text(&content, &source))
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn source_name(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        relative_path.to_string_lossy().to_string()
    }

    /// `.txt` files under `root`, sorted by path.
    pub fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
            .map(|e| e.path().to_path_buf())
            .collect();
        txt_files.sort();
        txt_files
    }
}
