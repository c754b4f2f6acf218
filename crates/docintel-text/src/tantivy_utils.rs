use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, INDEXED, STRING, STORED};
use tantivy::tokenizer::{TextAnalyzer, SimpleTokenizer, LowerCaser, StopWordFilter};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "text_with_stopwords";

pub const FIELD_CHUNK_ID: &str = "chunk_id";
pub const FIELD_SOURCE: &str = "source";
pub const FIELD_TEXT: &str = "text";
pub const FIELD_METADATA: &str = "metadata";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field(FIELD_CHUNK_ID, INDEXED | STORED);
	schema_builder.add_text_field(FIELD_SOURCE, STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field(FIELD_TEXT, text_options);
	// serialized ChunkMetadata, stored only
	schema_builder.add_text_field(FIELD_METADATA, STORED);
	schema_builder.build()
}

/// Terms dropped before indexing and at query time.
pub const STOP_WORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "did", "do", "does", "for", "from",
	"had", "has", "have", "he", "how", "if", "in", "is", "it", "its", "may", "might", "not", "of", "on", "or",
	"should", "so", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to",
	"was", "what", "when", "where", "which", "who", "why", "will", "with", "would",
];

/// Lowercasing word tokenizer with `STOP_WORDS` removed.
pub fn chunk_text_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|w| w.to_string())))
		.build()
}

/// Make `TOKENIZER_NAME` resolvable for `index`; required before writing or
/// parsing queries against the text field.
pub fn register_tokenizer(index: &Index) {
	index.tokenizers().register(TOKENIZER_NAME, chunk_text_analyzer());
}

#[cfg(test)]
mod tests {
	use super::*;
	use tantivy::tokenizer::TokenStream;

	#[test]
	fn analyzer_lowercases_and_drops_stop_words() {
		let mut analyzer = chunk_text_analyzer();
		let mut stream = analyzer.token_stream("What is THE best Tinder for a spark");
		let mut terms = Vec::new();
		while stream.advance() {
			terms.push(stream.token().text.clone());
		}
		assert_eq!(terms, vec!["best", "tinder", "spark"]);
	}
}
