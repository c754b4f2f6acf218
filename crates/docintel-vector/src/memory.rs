use anyhow::{anyhow, bail, Result};
use std::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use docintel_core::traits::{ChunkStore, Embedder, VectorIndex};
use docintel_core::types::{Chunk, MetadataFilter, SearchHit};

struct Entry { chunk: Chunk, vector: Vec<f32> }

/// Brute-force cosine index held in memory.
pub struct MemoryVectorIndex {
	embedder: Box<dyn Embedder>,
	entries: RwLock<Vec<Entry>>,
}

impl MemoryVectorIndex {
	pub fn new(embedder: Box<dyn Embedder>) -> Self { Self { embedder, entries: RwLock::new(Vec::new()) } }

	/// Embed and store chunks. Returns the number added.
	pub fn add(&self, chunks: &[Chunk]) -> Result<usize> {
		if chunks.is_empty() { return Ok(0); }
		let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
		let embeddings = self.embedder.embed_batch(&texts)?;
		if embeddings.len() != chunks.len() { bail!("embedder returned {} vectors for {} chunks", embeddings.len(), chunks.len()); }
		if let Some(bad) = embeddings.iter().find(|e| e.len() != self.embedder.dim()) {
			bail!("embedding dimension {} does not match embedder dimension {}", bad.len(), self.embedder.dim());
		}
		let mut entries = self.entries.write().map_err(|_| anyhow!("vector index lock poisoned"))?;
		entries.extend(chunks.iter().cloned().zip(embeddings).map(|(chunk, vector)| Entry { chunk, vector }));
		debug!(added = chunks.len(), total = entries.len(), "vector index updated");
		Ok(chunks.len())
	}

	pub fn len(&self) -> usize { self.entries.read().map(|e| e.len()).unwrap_or(0) }

	pub fn is_empty(&self) -> bool { self.len() == 0 }

	fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Entry>>> {
		self.entries.read().map_err(|_| anyhow!("vector index lock poisoned"))
	}

	fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		self.embedder.embed_batch(&[query.to_string()])?.pop().ok_or_else(|| anyhow!("embedder returned no vector for query"))
	}

	/// Indices of the `k` entries most similar to `q_vec`, best first.
	fn ranked(entries: &[Entry], q_vec: &[f32], k: usize, filters: Option<&MetadataFilter>) -> Vec<(usize, f32)> {
		let mut scored: Vec<(usize, f32)> = entries
			.iter()
			.enumerate()
			.filter(|(_, e)| filters.map_or(true, |f| e.chunk.metadata.matches(f)))
			.map(|(i, e)| (i, cosine(q_vec, &e.vector)))
			.collect();
		scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
		scored.truncate(k);
		scored
	}
}

fn hit(entry: &Entry, similarity: f32) -> SearchHit {
	SearchHit::from_distance(entry.chunk.text.clone(), Some(entry.chunk.id), entry.chunk.metadata.clone(), 1.0 - similarity)
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl VectorIndex for MemoryVectorIndex {
	fn similarity_search(&self, query: &str, k: usize, filters: Option<&MetadataFilter>) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let q_vec = self.embed_query(query)?;
		let entries = self.read()?;
		Ok(Self::ranked(&entries, &q_vec, k, filters).into_iter().map(|(i, s)| hit(&entries[i], s)).collect())
	}

	fn diversity_search(&self, query: &str, k: usize, fetch_k: usize, lambda: f32, filters: Option<&MetadataFilter>) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let q_vec = self.embed_query(query)?;
		let entries = self.read()?;
		let mut candidates = Self::ranked(&entries, &q_vec, fetch_k.max(k), filters);
		let mut selected: Vec<(usize, f32)> = Vec::with_capacity(k);
		while selected.len() < k && !candidates.is_empty() {
			let mut best = 0usize;
			let mut best_score = f32::NEG_INFINITY;
			for (pos, (idx, relevance)) in candidates.iter().enumerate() {
				let redundancy = selected
					.iter()
					.map(|(s, _)| cosine(&entries[*idx].vector, &entries[*s].vector))
					.fold(0f32, f32::max);
				let mmr = lambda * relevance - (1.0 - lambda) * redundancy;
				if mmr > best_score { best_score = mmr; best = pos; }
			}
			selected.push(candidates.remove(best));
		}
		Ok(selected.into_iter().map(|(i, s)| hit(&entries[i], s)).collect())
	}

	fn neighbors(&self, source: &str, chunk_id: usize, window: usize) -> Result<Vec<SearchHit>> {
		let entries = self.read()?;
		let lo = chunk_id.saturating_sub(window);
		let hi = chunk_id.saturating_add(window);
		let mut found: Vec<&Entry> = entries
			.iter()
			.filter(|e| e.chunk.metadata.source.as_deref() == Some(source))
			.filter(|e| (lo..=hi).contains(&e.chunk.id))
			.collect();
		found.sort_by_key(|e| e.chunk.id);
		Ok(found.into_iter().map(|e| hit(e, 0.0)).collect())
	}
}

impl ChunkStore for MemoryVectorIndex {
	fn add_chunks(&self, chunks: &[Chunk]) -> Result<usize> { self.add(chunks) }
}
