use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docintel_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 256;

/// Bag-of-words embedder: every token is hashed into one of `dim` buckets
/// and the result is L2-normalised. Texts sharing words end up close in
/// cosine space, which is enough for offline runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
	pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

	pub fn embed_text(&self, text: &str) -> Vec<f32> {
		let mut v = vec![0f32; self.dim];
		for token in tokens(text) {
			let mut hasher = XxHash64::with_seed(0);
			token.hash(&mut hasher);
			let idx = (hasher.finish() as usize) % self.dim;
			v[idx] += 1.0;
		}
		let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
		if norm > 0.0 { for x in &mut v { *x /= norm; } }
		v
	}
}

impl Default for HashEmbedder {
	fn default() -> Self { Self::new(DEFAULT_DIM) }
}

impl Embedder for HashEmbedder {
	fn dim(&self) -> usize { self.dim }

	fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		Ok(texts.iter().map(|t| self.embed_text(t)).collect())
	}
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|t| !t.is_empty())
		.map(str::to_lowercase)
}
