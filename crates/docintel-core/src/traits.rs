use crate::types::{Chunk, MetadataFilter, SearchHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour lookup over embedded chunks.
pub trait VectorIndex: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize, filters: Option<&MetadataFilter>) -> anyhow::Result<Vec<SearchHit>>;

    /// Select `k` of the best `fetch_k` candidates, trading relevance against
    /// mutual dissimilarity by `lambda` (1.0 = relevance only). Indexes
    /// without diversity support answer with plain similarity.
    fn diversity_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda: f32,
        filters: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let _ = (fetch_k, lambda);
        self.similarity_search(query, k, filters)
    }

    /// Chunks of `source` whose ids lie within `window` of `chunk_id`,
    /// ordered by id.
    fn neighbors(&self, source: &str, chunk_id: usize, window: usize) -> anyhow::Result<Vec<SearchHit>> {
        let _ = (source, chunk_id, window);
        Ok(Vec::new())
    }
}

/// Write side of a vector index: embeds and stores chunks.
pub trait ChunkStore: Send + Sync {
    fn add_chunks(&self, chunks: &[Chunk]) -> anyhow::Result<usize>;
}

/// Lexical (term based) index over chunk text.
pub trait KeywordIndex: Send + Sync {
    fn index(&self, chunks: &[Chunk]) -> anyhow::Result<()>;
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Text-generation service.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

impl<T: VectorIndex + ?Sized> VectorIndex for Box<T> {
    fn similarity_search(&self, query: &str, k: usize, filters: Option<&MetadataFilter>) -> anyhow::Result<Vec<SearchHit>> {
        (**self).similarity_search(query, k, filters)
    }
    fn diversity_search(&self, query: &str, k: usize, fetch_k: usize, lambda: f32, filters: Option<&MetadataFilter>) -> anyhow::Result<Vec<SearchHit>> {
        (**self).diversity_search(query, k, fetch_k, lambda, filters)
    }
    fn neighbors(&self, source: &str, chunk_id: usize, window: usize) -> anyhow::Result<Vec<SearchHit>> {
        (**self).neighbors(source, chunk_id, window)
    }
}

impl<T: VectorIndex + ?Sized> VectorIndex for std::sync::Arc<T> {
    fn similarity_search(&self, query: &str, k: usize, filters: Option<&MetadataFilter>) -> anyhow::Result<Vec<SearchHit>> {
        (**self).similarity_search(query, k, filters)
    }
    fn diversity_search(&self, query: &str, k: usize, fetch_k: usize, lambda: f32, filters: Option<&MetadataFilter>) -> anyhow::Result<Vec<SearchHit>> {
        (**self).diversity_search(query, k, fetch_k, lambda, filters)
    }
    fn neighbors(&self, source: &str, chunk_id: usize, window: usize) -> anyhow::Result<Vec<SearchHit>> {
        (**self).neighbors(source, chunk_id, window)
    }
}

impl<T: ChunkStore + ?Sized> ChunkStore for std::sync::Arc<T> {
    fn add_chunks(&self, chunks: &[Chunk]) -> anyhow::Result<usize> { (**self).add_chunks(chunks) }
}
