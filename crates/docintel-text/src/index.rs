use anyhow::Result;
use std::path::PathBuf;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexWriter, TantivyDocument};
use tracing::{debug, warn};

use docintel_core::traits::KeywordIndex;
use docintel_core::types::{Chunk, ChunkMetadata, SearchHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer, FIELD_CHUNK_ID, FIELD_METADATA, FIELD_SOURCE, FIELD_TEXT};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 keyword index over chunk text.
pub struct TantivyKeywordIndex {
	index: Index,
	chunk_id_field: Field,
	source_field: Field,
	text_field: Field,
	metadata_field: Field,
}

impl TantivyKeywordIndex {
	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	/// Create a fresh on-disk index, wiping whatever was at `index_dir`.
	pub fn create_in_dir(index_dir: PathBuf) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(&index_dir)?; }
		std::fs::create_dir_all(&index_dir)?;
		Self::from_index(Index::create_in_dir(&index_dir, build_schema())?)
	}

	pub fn open_in_dir(index_dir: PathBuf) -> Result<Self> {
		Self::from_index(Index::open_in_dir(&index_dir)?)
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let chunk_id_field = schema.get_field(FIELD_CHUNK_ID)?;
		let source_field = schema.get_field(FIELD_SOURCE)?;
		let text_field = schema.get_field(FIELD_TEXT)?;
		let metadata_field = schema.get_field(FIELD_METADATA)?;
		Ok(Self { index, chunk_id_field, source_field, text_field, metadata_field })
	}

	pub fn num_docs(&self) -> Result<u64> {
		Ok(self.index.reader()?.searcher().num_docs())
	}
}

impl KeywordIndex for TantivyKeywordIndex {
	fn index(&self, chunks: &[Chunk]) -> Result<()> {
		let mut index_writer: IndexWriter = self.index.writer(WRITER_MEMORY_BYTES)?;
		for c in chunks {
			let doc = doc!(
				self.chunk_id_field => c.id as u64,
				self.source_field => c.metadata.source.clone().unwrap_or_default(),
				self.text_field => c.text.clone(),
				self.metadata_field => serde_json::to_string(&c.metadata)?,
			);
			index_writer.add_document(doc)?;
		}
		index_writer.commit()?;
		debug!(chunks = chunks.len(), "keyword index committed");
		Ok(())
	}

	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 || query.trim().is_empty() { return Ok(Vec::new()); }
		let searcher = self.index.reader()?.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		let (q, errors) = qp.parse_query_lenient(query);
		if !errors.is_empty() { warn!(query, errors = errors.len(), "lenient keyword query parse"); }
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let text = doc.get_first(self.text_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let chunk_id = doc.get_first(self.chunk_id_field).and_then(|v| v.as_u64()).map(|id| id as usize);
			let metadata: ChunkMetadata = match doc.get_first(self.metadata_field).and_then(|v| v.as_str()) {
				Some(raw) => serde_json::from_str(raw)?,
				None => ChunkMetadata::default(),
			};
			hits.push(SearchHit { text, chunk_id, metadata, score, source: SourceKind::Keyword });
		}
		Ok(hits)
	}
}
